//! Article retrieval (HEAD/BODY/ARTICLE/STAT) and XOVER
//!
//! The four retrieval verbs share one handler: they differ only in status
//! code and in what they stream afterwards. Whether the article cursor
//! moves depends on how the article was addressed (RFC 977): an explicit
//! number moves it, a `<message-id>` lookup or a bare repeat never does.

use super::connection::Connection;
use crate::Result;
use crate::article::Article;
use crate::response::{codes, retrieval_reply};

impl Connection {
    /// Shared handler for HEAD, BODY, ARTICLE, and STAT
    pub(super) async fn cmd_retrieve(&mut self, verb: &str, arg: &str) -> Result<()> {
        let (name, start, end) = match self.session.current_group() {
            Some(group) => (group.name().to_string(), group.start(), group.end()),
            None => return self.send("412 Not currently in newsgroup").await,
        };

        let (number, updates_cursor) = if arg.starts_with('<') {
            // by message-ID: side-effect-free on the cursor
            match self.spool.find_article_by_message_id(&name, arg) {
                Ok(number) => (number, false),
                Err(_) => return self.send("430 no such article found").await,
            }
        } else if arg.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            match arg.parse::<u64>() {
                Ok(number) => (number, true),
                Err(_) => return self.send("501 bad article number").await,
            }
        } else if arg.is_empty() {
            // repeat the current article; nothing moves
            let current = self
                .session
                .current_article()
                .map(|article| article.number())
                .unwrap_or(0);
            (current, false)
        } else {
            return self.send("501 bad argument").await;
        };

        if number < start || number > end {
            return self
                .send(&format!(
                    "423 no such article in group (range {start}-{end})"
                ))
                .await;
        }

        let article = match Article::load(&self.spool, &name, number) {
            Ok(article) => article,
            Err(err) => return self.send(&format!("430 no such article: {err}")).await,
        };

        match verb {
            "ARTICLE" => {
                self.send(&retrieval_reply(
                    codes::ARTICLE_FOLLOWS,
                    number,
                    article.message_id(),
                ))
                .await?;
                article.send_article(&mut self.writer).await?;
                self.send(".").await?;
            }
            "HEAD" => {
                self.send(&retrieval_reply(
                    codes::HEAD_FOLLOWS,
                    number,
                    article.message_id(),
                ))
                .await?;
                article.send_head(&mut self.writer).await?;
                self.send(".").await?;
            }
            "BODY" => {
                self.send(&retrieval_reply(
                    codes::BODY_FOLLOWS,
                    number,
                    article.message_id(),
                ))
                .await?;
                article.send_body(&mut self.writer).await?;
                self.send(".").await?;
            }
            _ => {
                // STAT: status line only
                self.send(&retrieval_reply(
                    codes::ARTICLE_STAT,
                    number,
                    article.message_id(),
                ))
                .await?;
            }
        }

        if updates_cursor {
            self.session.select_article(Some(article));
        }
        Ok(())
    }

    /// XOVER [range]: overview lines for a clamped article range (RFC 2980)
    pub(super) async fn cmd_xover(&mut self, arg: &str) -> Result<()> {
        let (name, group_start, group_end) = match self.session.current_group() {
            Some(group) => (group.name().to_string(), group.start(), group.end()),
            None => return self.send("412 Not in a newsgroup").await,
        };

        let (mut from, mut to) = (group_start, group_end);
        if !arg.is_empty() {
            match parse_range(arg) {
                Some((start, end)) => {
                    from = start;
                    to = end.unwrap_or(group_end);
                }
                None => return self.send("501 bad range argument").await,
            }
        }
        let (from, to) = clamp_range(from, to, group_start, group_end);

        let fmt = self.config.overview_fmt.clone();
        self.send("224 overview follows").await?;
        for number in from..=to {
            // articles expired out of the middle of the range are skipped,
            // not reported
            let Ok(article) = Article::load(&self.spool, &name, number) else {
                continue;
            };
            self.send(&article.overview(&fmt)).await?;
        }
        self.send(".").await
    }
}

/// Parse an XOVER range argument
///
/// `n` is the single point `n-n`, `n-` runs to the end of the group
/// (`None`), `n-m` is the closed range.
fn parse_range(arg: &str) -> Option<(u64, Option<u64>)> {
    match arg.split_once('-') {
        Some((from, "")) => Some((from.parse().ok()?, None)),
        Some((from, to)) => Some((from.parse().ok()?, Some(to.parse().ok()?))),
        None => {
            let n = arg.parse().ok()?;
            Some((n, Some(n)))
        }
    }
}

/// Clamp a requested range into the group's `[start, end]`
///
/// An inverted range after clamping collapses to its start point.
fn clamp_range(mut from: u64, mut to: u64, start: u64, end: u64) -> (u64, u64) {
    if from < start {
        from = start;
    }
    if from > end {
        from = end;
    }
    if to < start {
        to = start;
    }
    if to > end {
        to = end;
    }
    if from > to {
        to = from;
    }
    (from, to)
}
