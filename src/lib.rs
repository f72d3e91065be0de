//! newsd: a small NNTP news server backed by a filesystem spool
//!
//! Speaks RFC 977 plus the RFC 2980 reader extensions (LIST variants,
//! LISTGROUP, XOVER, MODE READER, DATE) over plain TCP. Articles live in a
//! directory tree: one subtree per group, one file per article, with
//! per-group metadata and a message-ID index alongside. Each accepted
//! connection runs in its own task with its own session cursors; concurrent
//! posters are serialized per group by an advisory file lock, so several
//! server processes can even share one spool.
//!
//! Streaming transfer (CHECK/TAKETHIS), wildmat patterns, distribution
//! lists, and NEWNEWS are answered with the appropriate refusals rather
//! than implemented.

/// Article entity and header access
pub mod article;
/// Server configuration (TOML)
pub mod config;
mod error;
/// Group entity and the posting pipeline
pub mod group;
/// CC-mail gateway bridge
pub mod mailgw;
/// Reply codes and reply formatting
pub mod response;
/// TCP listener and per-connection protocol engine
pub mod server;
/// Filesystem spool storage
pub mod spool;
/// Group name validation
pub mod validation;

pub use article::Article;
pub use config::Config;
pub use error::{NewsError, Result};
pub use group::Group;
pub use mailgw::MailGateway;
pub use server::NewsServer;
pub use spool::Spool;
