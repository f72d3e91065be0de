//! Connection I/O: reply writing and length-capped line reads
//!
//! Input accepts both CRLF and bare LF line endings; output is always CRLF.
//! The inactivity timeout re-arms at the top of every command read. Lines
//! past the configured cap are cut short rather than rejected: the overflow
//! simply arrives as the next command line, so a hostile peer cannot grow
//! the buffer without bound.

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::time::{Duration, timeout};
use tracing::debug;

use super::connection::Connection;
use crate::{NewsError, Result};

impl Connection {
    /// Send one reply line (or a fixed multi-line block), CRLF terminated
    pub(super) async fn send(&mut self, msg: &str) -> Result<()> {
        self.writer.write_all(msg.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        debug!("SEND: {msg}");
        Ok(())
    }

    /// Read the next command line, under the inactivity timeout
    ///
    /// Returns `Ok(None)` when the peer closes the connection.
    pub(super) async fn read_command_line(&mut self) -> Result<Option<String>> {
        let timeout_secs = self.config.timeout_secs;
        let cap = self.config.max_line_len;
        let read = read_line_capped(&mut self.reader, cap);

        if timeout_secs == 0 {
            read.await
        } else {
            match timeout(Duration::from_secs(timeout_secs), read).await {
                Ok(result) => result,
                Err(_) => Err(NewsError::Timeout),
            }
        }
    }
}

/// Read one CRLF- or LF-terminated line, truncating at `cap` bytes
async fn read_line_capped(
    reader: &mut BufReader<OwnedReadHalf>,
    cap: usize,
) -> Result<Option<String>> {
    let mut buf = Vec::with_capacity(128);
    let mut byte = [0u8; 1];

    loop {
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            // clean close; a partial line is discarded like the full
            // connection teardown it is
            return Ok(None);
        }

        match byte[0] {
            b'\n' => break,
            b'\r' => {
                // consume the LF that normally follows
                let _ = reader.read(&mut byte).await?;
                break;
            }
            c => {
                buf.push(c);
                if buf.len() >= cap.saturating_sub(2) {
                    break; // truncated; the rest becomes the next line
                }
            }
        }
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
