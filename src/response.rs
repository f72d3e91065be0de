//! NNTP reply codes and server-side reply formatting
//!
//! The observable protocol surface of the server is the set of status lines
//! it emits. The fixed texts here match RFC 977 / RFC 2980 reader behavior
//! and are asserted literally by the integration tests.

/// Greeting sent on accept
pub const GREETING: &str = "200 newsd news server ready - posting ok";

/// Reply to QUIT
pub const GOODBYE: &str = "205 goodbye.";

/// Continue prompt for POST
pub const SEND_ARTICLE: &str = "340 Continue posting; Period on a line by itself to end";

/// Successful POST
pub const ARTICLE_POSTED: &str = "240 Article posted successfully.";

/// Reply to CHECK/TAKETHIS (this server is not a feed)
pub const NOT_A_FEED: &str = "400 not accepting articles - we are not a news feed";

/// Catch-all for unrecognized commands
pub const UNKNOWN_COMMAND: &str = "500 Command not understood";

/// Format the `211 total start end name` reply to a successful GROUP
pub fn group_selected(total: u64, start: u64, end: u64, name: &str) -> String {
    format!("211 {total} {start} {end} {name} group selected")
}

/// Format the status line shared by ARTICLE/HEAD/BODY/STAT and NEXT
///
/// The trailer text varies with the code; all report `number message-id`.
pub fn retrieval_reply(code: u16, number: u64, message_id: &str) -> String {
    let trailer = match code {
        codes::ARTICLE_FOLLOWS => "article retrieved - head and body follow",
        codes::HEAD_FOLLOWS => "article retrieved - head follows",
        codes::BODY_FOLLOWS => "article retrieved - body follows",
        _ => "article retrieved - request text separately",
    };
    format!("{code} {number} {message_id} {trailer}")
}

/// NNTP reply codes emitted by this server (RFC 977, RFC 2980)
#[allow(dead_code)]
pub mod codes {
    /// Help text follows
    pub const HELP_TEXT_FOLLOWS: u16 = 100;
    /// Server date/time
    pub const SERVER_DATE: u16 = 111;
    /// Server ready, posting allowed
    pub const READY_POSTING_ALLOWED: u16 = 200;
    /// Extension list follows
    pub const EXTENSIONS_FOLLOW: u16 = 202;
    /// Closing connection
    pub const CLOSING_CONNECTION: u16 = 205;
    /// Group selected
    pub const GROUP_SELECTED: u16 = 211;
    /// List information follows
    pub const LIST_INFORMATION_FOLLOWS: u16 = 215;
    /// Article follows
    pub const ARTICLE_FOLLOWS: u16 = 220;
    /// Head follows
    pub const HEAD_FOLLOWS: u16 = 221;
    /// Body follows
    pub const BODY_FOLLOWS: u16 = 222;
    /// Article stat
    pub const ARTICLE_STAT: u16 = 223;
    /// Overview information follows
    pub const OVERVIEW_INFO_FOLLOWS: u16 = 224;
    /// List of new newsgroups follows
    pub const NEW_NEWSGROUPS_FOLLOW: u16 = 231;
    /// Article posted successfully
    pub const ARTICLE_POSTED: u16 = 240;
    /// Send article to be posted
    pub const SEND_ARTICLE: u16 = 340;
    /// Service unavailable / article not accepted
    pub const SERVICE_UNAVAILABLE: u16 = 400;
    /// No such newsgroup (also: posting rejected, RFC 977 POST wording)
    pub const NO_SUCH_GROUP: u16 = 411;
    /// No newsgroup selected
    pub const NO_GROUP_SELECTED: u16 = 412;
    /// No current article
    pub const NO_CURRENT_ARTICLE: u16 = 420;
    /// No next article
    pub const NO_NEXT_ARTICLE: u16 = 421;
    /// No article with that number
    pub const NO_SUCH_ARTICLE_NUMBER: u16 = 423;
    /// No article with that message-id
    pub const NO_SUCH_ARTICLE_ID: u16 = 430;
    /// Transfer rejected; do not retry
    pub const TRANSFER_REJECTED: u16 = 437;
    /// Posting failed
    pub const POSTING_FAILED: u16 = 441;
    /// Command not recognized
    pub const COMMAND_NOT_RECOGNIZED: u16 = 500;
    /// Command syntax error
    pub const COMMAND_SYNTAX_ERROR: u16 = 501;
    /// Feature not supported
    pub const FEATURE_NOT_SUPPORTED: u16 = 503;
}
