//! Article entity
//!
//! An article is a sequence of header lines and body lines, identified by
//! its number within a group and by its globally unique message-ID. Header
//! folding is preserved exactly as stored; continuation lines (leading
//! whitespace) are only joined when a single header *value* is requested.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::spool::Spool;
use crate::{NewsError, Result};

/// One article loaded from the spool
#[derive(Debug, Clone)]
pub struct Article {
    number: u64,
    message_id: String,
    header: Vec<String>,
    body: Vec<String>,
}

/// Look up a header value by field name, case-insensitively
///
/// Returns the value with continuation lines unfolded (joined by single
/// spaces). The stored lines themselves are never modified.
pub fn header_value(header: &[String], name: &str) -> Option<String> {
    let mut iter = header.iter().enumerate();
    let (at, line) = iter.find(|(_, line)| {
        line.len() > name.len()
            && line.is_char_boundary(name.len())
            && line.as_bytes()[name.len()] == b':'
            && line[..name.len()].eq_ignore_ascii_case(name)
    })?;

    let mut value = line[name.len() + 1..].trim().to_string();
    for cont in &header[at + 1..] {
        if !(cont.starts_with(' ') || cont.starts_with('\t')) {
            break;
        }
        value.push(' ');
        value.push_str(cont.trim());
    }
    Some(value)
}

impl Article {
    /// Load article `number` from `group`
    pub fn load(spool: &Spool, group: &str, number: u64) -> Result<Self> {
        let (header, body) = spool.load_article(group, number)?;
        if header.is_empty() {
            return Err(NewsError::MalformedArticle(format!(
                "article {number} in {group} has no header"
            )));
        }
        let message_id =
            header_value(&header, "Message-ID").unwrap_or_else(|| "<unknown>".to_string());
        Ok(Self {
            number,
            message_id,
            header,
            body,
        })
    }

    /// Article number within its group
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Message-ID in `<...>` form
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Stored header lines, folding preserved
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Stored body lines
    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Unfolded value of one header field, if present
    pub fn header_field(&self, name: &str) -> Option<String> {
        header_value(&self.header, name)
    }

    /// Build the XOVER line for this article
    ///
    /// Emits the article number and then one tab-separated field per entry
    /// of `fmt` (the server's LIST OVERVIEW.FMT order). Absent headers
    /// produce empty fields; `Bytes:` and `Lines:` are computed over the
    /// stored body, not the header.
    pub fn overview(&self, fmt: &[String]) -> String {
        let mut line = self.number.to_string();

        for field in fmt {
            let name = field.split(':').next().unwrap_or(field);
            line.push('\t');
            if name.eq_ignore_ascii_case("bytes") {
                let bytes: usize = self.body.iter().map(|l| l.len() + 2).sum();
                line.push_str(&bytes.to_string());
            } else if name.eq_ignore_ascii_case("lines") {
                line.push_str(&self.body.len().to_string());
            } else if let Some(value) = self.header_field(name) {
                // a tab inside a value would shift every following field
                line.push_str(&value.replace('\t', " "));
            }
        }

        line
    }

    /// Stream header and body (blank-line separated), dot-stuffed
    pub async fn send_article<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> std::io::Result<()> {
        write_stuffed(writer, &self.header).await?;
        writer.write_all(b"\r\n").await?;
        write_stuffed(writer, &self.body).await
    }

    /// Stream the header lines, dot-stuffed
    pub async fn send_head<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> std::io::Result<()> {
        write_stuffed(writer, &self.header).await
    }

    /// Stream the body lines, dot-stuffed
    pub async fn send_body<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> std::io::Result<()> {
        write_stuffed(writer, &self.body).await
    }
}

/// Write lines CRLF-terminated, doubling any leading dot so payload lines
/// can never be mistaken for the multi-line terminator. The terminating
/// `.` line itself is the caller's job.
async fn write_stuffed<W: AsyncWrite + Unpin>(
    writer: &mut W,
    lines: &[String],
) -> std::io::Result<()> {
    for line in lines {
        if line.starts_with('.') {
            writer.write_all(b".").await?;
        }
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
    }
    Ok(())
}
