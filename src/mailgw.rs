//! Mail gateway bridge
//!
//! Groups can be configured to mail a copy of every accepted posting to a
//! list of addresses. This module builds that outbound message (a
//! whitelisted subset of the article's headers plus routing headers from
//! the group's configuration) and pipes it into the configured mail
//! command's stdin. Gateway failures are the caller's to log; a posting
//! that already hit the spool stays accepted either way.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::group::Group;
use crate::{NewsError, Result};

/// Header fields copied verbatim (with their continuation lines) from the
/// posted article into the mailed copy. From/Subject identify the message,
/// References/Message-ID preserve threading, Content-Type/MIME-Version
/// keep MIME intact.
const PRESERVED_HEADERS: &[&str] = &[
    "From",
    "Subject",
    "References",
    "Xref",
    "Path",
    "Content-Type",
    "MIME-Version",
    "Message-ID",
];

/// Hands CC-mail copies to an external mail transfer command
#[derive(Debug, Clone)]
pub struct MailGateway {
    sendmail: String,
}

impl MailGateway {
    /// Create a gateway around a shell command (e.g. `/usr/sbin/sendmail -t`)
    pub fn new(sendmail: impl Into<String>) -> Self {
        Self {
            sendmail: sendmail.into(),
        }
    }

    /// Build the complete outbound message for a posting to `group`
    pub fn cc_message(group: &Group, header: &[String], body: &[String]) -> String {
        let mut msg = String::new();

        msg.push_str(&format!("To: {}\n", group.void_email()));
        // The address list can be long; one Bcc: per address keeps every
        // header line short.
        msg.push_str(&break_line("Bcc: ", group.cc_addresses(), ','));

        for line in preserved_headers(header) {
            msg.push_str(line);
            msg.push('\n');
        }

        if let Some(reply_to) = group.reply_to() {
            msg.push_str(&format!("Reply-To: {reply_to}\n"));
        }
        // Errors-To: so the group admin hears about delivery problems
        msg.push_str(&format!("Errors-To: {}\n", group.creator()));

        msg.push('\n');
        msg.push_str(&format!("[posted to {}]\n\n", group.name()));
        for line in body {
            msg.push_str(line);
            msg.push('\n');
        }

        msg
    }

    /// Pipe `message` into the mail command's stdin and wait for it
    pub async fn send(&self, message: &str) -> Result<()> {
        debug!("invoking mail gateway: {}", self.sendmail);

        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(&self.sendmail)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| NewsError::MailGateway(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(message.as_bytes())
                .await
                .map_err(|e| NewsError::MailGateway(e.to_string()))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| NewsError::MailGateway(e.to_string()))?;
        if !status.success() {
            return Err(NewsError::MailGateway(format!(
                "mail command exited with {status}"
            )));
        }
        Ok(())
    }
}

/// Break a long separated list into one prefixed line per element
///
/// `break_line("Bcc: ", "a@x,b@y", ',')` yields two `Bcc:` lines. Empty
/// elements are dropped.
fn break_line(prefix: &str, line: &str, sep: char) -> String {
    let mut out = String::new();
    for part in line.split(sep) {
        if !part.is_empty() {
            out.push_str(prefix);
            out.push_str(part);
            out.push('\n');
        }
    }
    out
}

/// The whitelisted header lines of a posting, continuations included
fn preserved_headers(header: &[String]) -> Vec<&String> {
    let mut out = Vec::new();
    let mut preserving = false;

    for line in header {
        if line.starts_with(' ') || line.starts_with('\t') {
            // continuation belongs to whatever decision its parent line got
            if preserving {
                out.push(line);
            }
            continue;
        }

        preserving = PRESERVED_HEADERS.iter().any(|name| {
            line.len() > name.len()
                && line.is_char_boundary(name.len())
                && line.as_bytes()[name.len()] == b':'
                && line[..name.len()].eq_ignore_ascii_case(name)
        });
        if preserving {
            out.push(line);
        }
    }

    out
}
