//! Server configuration
//!
//! Loaded once at startup from a TOML file and passed read-only into the
//! listener and every connection. Every field has a default so the server
//! can start with an empty file (or none at all) for local testing.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::{NewsError, Result};

/// News server configuration
///
/// # Example
///
/// ```toml
/// listen = "0.0.0.0:119"
/// server_name = "news.example.com"
/// spool_dir = "/var/spool/newsd"
/// timeout_secs = 43200
/// sendmail = "/usr/sbin/sendmail -t"
/// log_filter = "info"
/// ```
#[must_use]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address and port to listen on
    pub listen: SocketAddr,

    /// This server's identity: prepended to `Path:` headers and used as the
    /// domain of synthesized Message-IDs
    pub server_name: String,

    /// Root of the article spool (one subtree per group)
    pub spool_dir: PathBuf,

    /// Inactivity timeout in seconds; 0 disables the timeout
    pub timeout_secs: u64,

    /// Maximum accepted length of a single protocol line; longer lines are
    /// truncated at this bound rather than rejected
    pub max_line_len: usize,

    /// Command handed the CC-mail copy of a posting on stdin
    pub sendmail: String,

    /// Default `tracing` filter (overridden by `RUST_LOG`)
    pub log_filter: String,

    /// Overview fields, in XOVER output order, as echoed by
    /// `LIST OVERVIEW.FMT`
    pub overview_fmt: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ([0, 0, 0, 0], 119).into(),
            server_name: "localhost".to_string(),
            spool_dir: PathBuf::from("/var/spool/newsd"),
            timeout_secs: 43200,
            max_line_len: 1024,
            sendmail: "/usr/sbin/sendmail -t".to_string(),
            log_filter: "info".to_string(),
            overview_fmt: default_overview_fmt(),
        }
    }
}

fn default_overview_fmt() -> Vec<String> {
    [
        "Subject:",
        "From:",
        "Date:",
        "Message-ID:",
        "References:",
        "Bytes:",
        "Lines:",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| NewsError::Metadata(e.to_string()))
    }
}
