//! News server error types

use thiserror::Error;

/// Protocol, storage, and posting errors
#[derive(Error, Debug)]
pub enum NewsError {
    /// IO error during network or spool operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inactivity timeout fired
    #[error("Connection timeout")]
    Timeout,

    /// Peer closed the connection
    #[error("Connection closed")]
    ConnectionClosed,

    /// Group name failed validation before touching the filesystem
    #[error("{0}")]
    InvalidGroupName(String),

    /// No such newsgroup in the spool
    #[error("{0}")]
    NoSuchGroup(String),

    /// No such article by number or message-ID
    #[error("{0}")]
    NoSuchArticle(String),

    /// Article number outside the group's retained range
    #[error("no such article in group (range {start}-{end})")]
    ArticleOutOfRange {
        /// Lowest valid article number
        start: u64,
        /// Highest valid article number
        end: u64,
    },

    /// Posting not permitted to this group
    #[error("posting not allowed to this group")]
    PostingNotPermitted,

    /// Posting rejected (missing headers, storage failure, ...)
    #[error("{0}")]
    PostingFailed(String),

    /// Posted text could not be split into header and body
    #[error("{0}")]
    MalformedArticle(String),

    /// Group metadata or configuration could not be parsed
    #[error("invalid metadata: {0}")]
    Metadata(String),

    /// Mail gateway handoff failed
    #[error("mail gateway: {0}")]
    MailGateway(String),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type alias using NewsError
pub type Result<T> = std::result::Result<T, NewsError>;
