//! POST: article acceptance
//!
//! After the `340` prompt the connection switches from line reads to raw
//! byte reads and runs two independent pieces of bookkeeping over the
//! stream: the end-of-message detector (a four-state machine that survives
//! read boundaries) and the posting-length accounting that enforces the
//! selected group's line limit. When the limit trips, accumulation stops
//! but consumption continues to the real terminator so the client's framing
//! stays intact.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Duration, timeout};
use tracing::{error, info};

use super::connection::Connection;
use crate::mailgw::MailGateway;
use crate::{NewsError, Result, group, response};

/// End-of-message detector state
///
/// The terminator is a `.` alone on a line: line break, dot, line break.
/// Tolerates both `\r\n` and bare `\n`, and a dot appearing mid-line can
/// never terminate because it is only significant straight after a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EomState {
    /// Mid-line
    Scan,
    /// Just consumed a line break
    LineStart,
    /// Saw a lone `.` immediately after a line break
    Dot,
    /// Terminator complete
    Done,
}

impl EomState {
    fn advance(self, byte: u8) -> EomState {
        match (self, byte) {
            (EomState::Scan, b'\n' | b'\r') => EomState::LineStart,
            (EomState::LineStart, b'\n' | b'\r') => EomState::LineStart,
            (EomState::LineStart, b'.') => EomState::Dot,
            (EomState::Dot, b'\n' | b'\r') => EomState::Done,
            (EomState::Done, _) => EomState::Done,
            _ => EomState::Scan,
        }
    }
}

/// What the accumulation loop hands back to the POST handler
struct Posting {
    text: String,
    state: EomState,
    too_long: bool,
}

impl Connection {
    /// POST. Returns false when the transport died and the connection
    /// must be torn down without a reply
    pub(super) async fn cmd_post(&mut self) -> Result<bool> {
        self.send(response::SEND_ARTICLE).await?;

        // the line limit comes from the session's selected group; with no
        // selection the posting is unlimited and the target group's own
        // policy still applies at Post time
        let post_limit = self
            .session
            .current_group()
            .map(|group| group.post_limit())
            .unwrap_or(0);

        let timeout_secs = self.config.timeout_secs;
        let collected = {
            let read = collect_posting(&mut self.reader, post_limit);
            if timeout_secs == 0 {
                read.await
            } else {
                match timeout(Duration::from_secs(timeout_secs), read).await {
                    Ok(result) => result,
                    Err(_) => {
                        info!("POST from {} timed out", self.peer);
                        return Ok(false);
                    }
                }
            }
        };

        let posting = match collected {
            Ok(posting) => posting,
            Err(NewsError::ConnectionClosed) => {
                info!("Read zero from {} during POST", self.peer);
                return Ok(false);
            }
            Err(NewsError::Io(err)) => {
                info!("Read error from {} (error = {err})", self.peer);
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        if posting.too_long {
            self.send(&format!(
                "411 Not Posted: article exceeds sanity line limit of {post_limit}."
            ))
            .await?;
            return Ok(true);
        }

        if posting.state != EomState::Done {
            // unreachable given the loop invariants, checked anyway
            self.send("411 Not Posted: protocol error (missing end of message).")
                .await?;
            return Ok(true);
        }

        let (mut header, body) = match group::parse_article(&posting.text) {
            Ok(split) => split,
            Err(err) => {
                self.send(&format!("441 {err}")).await?;
                return Ok(true);
            }
        };

        group::update_path(&mut header, &self.config.server_name);

        // post through a fresh group snapshot so the session's selected
        // group and article are never disturbed
        let poster = self.peer.ip().to_string();
        let posted = group::post(
            &self.spool,
            &self.config.server_name,
            &mut header,
            &body,
            &poster,
        );
        let target = match posted {
            Ok((target, _number)) => target,
            Err(err) => {
                self.send(&format!("441 {err}")).await?;
                return Ok(true);
            }
        };

        self.send(response::ARTICLE_POSTED).await?;

        if target.cc_enabled() {
            let message = MailGateway::cc_message(&target, &header, &body);
            if let Err(err) = self.mailgw.send(&message).await {
                // the posting is already durable; the mail copy is best-effort
                error!("ccpost mail handoff failed - {err}");
            }
        }

        Ok(true)
    }
}

/// Accumulate posted bytes until the end-of-message terminator
///
/// Lines longer than 80 characters count as multiple lines against
/// `post_limit` (0 = unlimited). Once over the limit, bytes are consumed
/// but no longer stored.
async fn collect_posting<R: AsyncRead + Unpin>(reader: &mut R, post_limit: u64) -> Result<Posting> {
    let mut bytes = Vec::with_capacity(4096);
    let mut state = EomState::Scan;
    let mut line_chars = 0u64;
    let mut line_count = 0u64;
    let mut too_long = false;
    let mut byte = [0u8; 1];

    loop {
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            return Err(NewsError::ConnectionClosed);
        }
        let c = byte[0];

        line_chars += 1;
        if line_chars > 80 || c == b'\n' {
            line_chars = 0;
            line_count += 1;
        }
        if post_limit > 0 && line_count > post_limit {
            too_long = true;
        }

        if !too_long {
            bytes.push(c);
        }

        state = state.advance(c);
        if state == EomState::Done {
            break;
        }
    }

    Ok(Posting {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        state,
        too_long,
    })
}
