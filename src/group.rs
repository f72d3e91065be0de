//! Group entity and the posting pipeline
//!
//! A `Group` is the in-memory snapshot of one newsgroup's metadata and
//! article range, loaded fresh from the spool by every command that needs
//! current data. The posting pipeline lives here too: splitting a received
//! posting into header and body, stamping the `Path:` header, synthesizing
//! the headers a well-formed article must carry, and handing the result to
//! the spool.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::article::header_value;
use crate::spool::{GroupInfo, Spool};
use crate::{NewsError, Result};

/// In-memory snapshot of one newsgroup
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    start: u64,
    end: u64,
    total: u64,
    info: GroupInfo,
}

impl Group {
    pub(crate) fn from_spool(
        name: String,
        start: u64,
        end: u64,
        total: u64,
        info: GroupInfo,
    ) -> Self {
        Self {
            name,
            start,
            end,
            total,
            info,
        }
    }

    /// Load a group's current state from the spool
    pub fn load(spool: &Spool, name: &str) -> Result<Self> {
        spool.load_group(name)
    }

    /// Dot-separated group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowest retained article number (`end + 1` when the group is empty)
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Highest article number ever published; may exceed the highest
    /// article still present
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Count of articles currently present (the range may be sparse)
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether posting is permitted
    pub fn post_ok(&self) -> bool {
        self.info.postok
    }

    /// Posting size cap in 80-column lines; 0 means unlimited
    pub fn post_limit(&self) -> u64 {
        self.info.postlimit
    }

    /// Group creation time (unix seconds)
    pub fn ctime(&self) -> i64 {
        self.info.ctime
    }

    /// Group creator address
    pub fn creator(&self) -> &str {
        &self.info.creator
    }

    /// One-line description for LIST NEWSGROUPS
    pub fn description(&self) -> &str {
        &self.info.description
    }

    /// Whether postings are copied out by mail
    pub fn cc_enabled(&self) -> bool {
        !self.info.ccpost.is_empty()
    }

    /// Comma-separated CC-mail address list
    pub fn cc_addresses(&self) -> &str {
        &self.info.ccpost
    }

    /// Reply-To: address for CC-mail copies, if configured
    pub fn reply_to(&self) -> Option<&str> {
        (!self.info.replyto.is_empty()).then_some(self.info.replyto.as_str())
    }

    /// Placeholder To: address for CC-mail copies
    pub fn void_email(&self) -> &str {
        &self.info.voidemail
    }
}

/// Split raw posted text into header and body lines
///
/// The split is the first blank line; everything before it is header
/// (folding preserved verbatim), everything after is body. The client's
/// dot-stuffing is removed and the trailing `.` terminator line dropped.
/// Both `\r\n` and bare `\n` input survive.
pub fn parse_article(raw: &str) -> Result<(Vec<String>, Vec<String>)> {
    let mut lines: Vec<String> = raw
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();

    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    if lines.last().is_some_and(|l| l == ".") {
        lines.pop(); // end-of-message terminator
    }

    for line in &mut lines {
        if line.starts_with("..") {
            line.remove(0);
        }
    }

    let Some(at) = lines.iter().position(|l| l.is_empty()) else {
        return Err(NewsError::MalformedArticle(
            "couldn't find separator between header and body".to_string(),
        ));
    };
    if at == 0 {
        return Err(NewsError::MalformedArticle(
            "article has an empty header".to_string(),
        ));
    }

    let body = lines.split_off(at + 1);
    lines.pop(); // the separator line itself
    Ok((lines, body))
}

/// Prepend this server's identity to the `Path:` header
///
/// The existing path chain is preserved after a `!` separator; a missing
/// `Path:` header is inserted at the top of the header block.
pub fn update_path(header: &mut Vec<String>, server_name: &str) {
    for line in header.iter_mut() {
        if line.len() > 5 && line.is_char_boundary(5) && line[..5].eq_ignore_ascii_case("path:") {
            let rest = line[5..].trim_start();
            *line = format!("Path: {server_name}!{rest}");
            return;
        }
    }
    header.insert(0, format!("Path: {server_name}"));
}

/// Accept a posting: validate, synthesize required headers, store
///
/// The destination is the first entry of the `Newsgroups:` header. A fresh
/// group snapshot is loaded for the check so posting never depends on (or
/// disturbs) any session's selected group. Returns the destination group
/// and the assigned article number; the group is what the CC-mail bridge
/// needs afterwards.
pub fn post(
    spool: &Spool,
    server_name: &str,
    header: &mut Vec<String>,
    body: &[String],
    poster: &str,
) -> Result<(Group, u64)> {
    let newsgroups = header_value(header, "Newsgroups").ok_or_else(|| {
        NewsError::PostingFailed("no Newsgroups: header in posting".to_string())
    })?;
    let group_name = newsgroups
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| NewsError::PostingFailed("empty Newsgroups: header".to_string()))?
        .to_string();

    let group = spool.load_group(&group_name)?;
    if !group.post_ok() {
        return Err(NewsError::PostingNotPermitted);
    }

    if header_value(header, "Message-ID").is_none() {
        header.push(format!("Message-ID: <{}@{server_name}>", Uuid::new_v4()));
    }
    if header_value(header, "Date").is_none() {
        header.push(format!(
            "Date: {}",
            Utc::now().format("%a, %d %b %Y %H:%M:%S +0000")
        ));
    }

    let number = spool.store_article(&group_name, header, body)?;
    info!("article {number} posted to {group_name} by {poster}");
    Ok((group, number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seed(root: &std::path::Path, name: &str, info: &str) {
        let dir = root.join(name.replace('.', "/"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".info"), info).unwrap();
    }

    #[test]
    fn test_parse_article_splits_on_first_blank_line() {
        let raw = "From: a@b\r\nSubject: hi\r\n\r\nbody one\r\nbody two\r\n.\r";
        let (header, body) = parse_article(raw).unwrap();
        assert_eq!(header, vec!["From: a@b", "Subject: hi"]);
        assert_eq!(body, vec!["body one", "body two"]);
    }

    #[test]
    fn test_parse_article_lf_only() {
        let raw = "From: a@b\n\nbody\n.\n";
        let (header, body) = parse_article(raw).unwrap();
        assert_eq!(header, vec!["From: a@b"]);
        assert_eq!(body, vec!["body"]);
    }

    #[test]
    fn test_parse_article_unstuffs_dots() {
        let raw = "From: a@b\r\n\r\n..leading dot line\r\n...\r\n.\r";
        let (_, body) = parse_article(raw).unwrap();
        assert_eq!(body, vec![".leading dot line", ".."]);
    }

    #[test]
    fn test_parse_article_preserves_folding() {
        let raw = "Subject: one\r\n\ttwo\r\nFrom: a@b\r\n\r\nbody\r\n.\r";
        let (header, _) = parse_article(raw).unwrap();
        assert_eq!(header[1], "\ttwo");
    }

    #[test]
    fn test_parse_article_no_separator_fails() {
        let raw = "From: a@b\r\nSubject: no body here\r\n.\r";
        assert!(matches!(
            parse_article(raw),
            Err(NewsError::MalformedArticle(_))
        ));
    }

    #[test]
    fn test_update_path_prepends_to_existing_chain() {
        let mut header = vec!["From: a@b".to_string(), "Path: relay!origin".to_string()];
        update_path(&mut header, "news.test");
        assert_eq!(header[1], "Path: news.test!relay!origin");
    }

    #[test]
    fn test_update_path_inserts_when_absent() {
        let mut header = vec!["From: a@b".to_string()];
        update_path(&mut header, "news.test");
        assert_eq!(header[0], "Path: news.test");
        assert_eq!(header.len(), 2);
    }

    #[test]
    fn test_update_path_case_insensitive() {
        let mut header = vec!["PATH: origin".to_string()];
        update_path(&mut header, "news.test");
        assert_eq!(header[0], "Path: news.test!origin");
    }

    #[test]
    fn test_post_synthesizes_message_id_and_date() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path(), "alt.test", "");
        let spool = Spool::new(tmp.path());

        let mut header = vec![
            "From: poster@example.com".to_string(),
            "Newsgroups: alt.test".to_string(),
            "Subject: synth".to_string(),
        ];
        let body = vec!["hello".to_string()];

        let (group, number) = post(&spool, "news.test", &mut header, &body, "127.0.0.1").unwrap();
        assert_eq!(group.name(), "alt.test");
        assert_eq!(number, 1);

        let id = header_value(&header, "Message-ID").unwrap();
        assert!(id.starts_with('<') && id.ends_with("@news.test>"));
        assert!(header_value(&header, "Date").is_some());

        // stored and findable by the synthesized ID
        assert_eq!(
            spool.find_article_by_message_id("alt.test", &id).unwrap(),
            1
        );
    }

    #[test]
    fn test_post_keeps_existing_message_id() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path(), "alt.test", "");
        let spool = Spool::new(tmp.path());

        let mut header = vec![
            "Newsgroups: alt.test".to_string(),
            "Message-ID: <mine@elsewhere>".to_string(),
        ];
        post(&spool, "news.test", &mut header, &[], "peer").unwrap();
        assert_eq!(
            header_value(&header, "Message-ID").as_deref(),
            Some("<mine@elsewhere>")
        );
    }

    #[test]
    fn test_post_requires_newsgroups_header() {
        let tmp = TempDir::new().unwrap();
        let spool = Spool::new(tmp.path());
        let mut header = vec!["From: a@b".to_string()];
        assert!(matches!(
            post(&spool, "news.test", &mut header, &[], "peer"),
            Err(NewsError::PostingFailed(_))
        ));
    }

    #[test]
    fn test_post_honors_postok() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path(), "alt.closed", "postok = false\n");
        let spool = Spool::new(tmp.path());

        let mut header = vec!["Newsgroups: alt.closed".to_string()];
        assert!(matches!(
            post(&spool, "news.test", &mut header, &[], "peer"),
            Err(NewsError::PostingNotPermitted)
        ));
    }

    #[test]
    fn test_post_targets_first_of_newsgroups_list() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path(), "alt.first", "");
        let spool = Spool::new(tmp.path());

        let mut header = vec!["Newsgroups: alt.first, alt.second".to_string()];
        let (group, _) = post(&spool, "news.test", &mut header, &[], "peer").unwrap();
        assert_eq!(group.name(), "alt.first");
    }

    #[test]
    fn test_cc_accessors() {
        let tmp = TempDir::new().unwrap();
        seed(
            tmp.path(),
            "rush.general",
            concat!(
                "ccpost = \"a@x.com,b@y.com\"\n",
                "replyto = \"list@x.com\"\n",
                "voidemail = \"noreply@x.com\"\n",
                "creator = \"admin@x.com\"\n",
            ),
        );
        let group = Spool::new(tmp.path()).load_group("rush.general").unwrap();
        assert!(group.cc_enabled());
        assert_eq!(group.cc_addresses(), "a@x.com,b@y.com");
        assert_eq!(group.reply_to(), Some("list@x.com"));
        assert_eq!(group.void_email(), "noreply@x.com");
        assert_eq!(group.creator(), "admin@x.com");
    }
}
