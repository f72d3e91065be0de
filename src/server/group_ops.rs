//! GROUP, LISTGROUP, and NEXT
//!
//! These are the commands that move the session's cursors. A failed load
//! must leave both cursors exactly as they were (RFC 977), so groups are
//! loaded into locals and only assigned into the session on success.

use super::connection::Connection;
use crate::article::Article;
use crate::group::Group;
use crate::response::{self, codes};
use crate::Result;

impl Connection {
    /// GROUP: select a group and re-anchor the article cursor (RFC 977)
    pub(super) async fn cmd_group(&mut self, arg: &str) -> Result<()> {
        if arg.is_empty() {
            return self
                .send("501 syntax error; expected 'GROUP <group-name>'")
                .await;
        }

        let group = match Group::load(&self.spool, arg) {
            Ok(group) => group,
            Err(err) => {
                // prior selection stays in place
                return self.send(&format!("411 No such newsgroup: {err}")).await;
            }
        };

        let article = Article::load(&self.spool, group.name(), group.start()).ok();
        let reply =
            response::group_selected(group.total(), group.start(), group.end(), group.name());
        self.session.select_group(group, article);
        self.send(&reply).await
    }

    /// LISTGROUP [group]: list every article number in range (RFC 2980)
    pub(super) async fn cmd_listgroup(&mut self, arg: &str) -> Result<()> {
        if !arg.is_empty() {
            match Group::load(&self.spool, arg) {
                Ok(group) => {
                    let article = Article::load(&self.spool, group.name(), group.start()).ok();
                    self.session.select_group(group, article);
                }
                Err(err) => {
                    return self.send(&format!("411 No such newsgroup: {err}")).await;
                }
            }
        }

        let (name, start, end) = match self.session.current_group() {
            Some(group) => (group.name().to_string(), group.start(), group.end()),
            None => return self.send("412 Not currently in newsgroup").await,
        };

        if arg.is_empty() {
            // RFC 2980: current article moves to the group's first
            let article = Article::load(&self.spool, &name, start).ok();
            self.session.select_article(article);
        }

        self.send("211 list of article numbers follow").await?;
        for number in start..=end {
            self.send(&number.to_string()).await?;
        }
        self.send(".").await
    }

    /// NEXT: advance the article cursor by exactly one (RFC 977)
    pub(super) async fn cmd_next(&mut self) -> Result<()> {
        let (name, start, end) = match self.session.current_group() {
            Some(group) => (group.name().to_string(), group.start(), group.end()),
            None => return self.send("412 no newsgroup selected").await,
        };

        let Some(current) = self.session.current_article() else {
            return self.send("420 no article has been selected").await;
        };

        let next = current.number() + 1;
        if next < start || next > end {
            return self.send("421 no next article in this group").await;
        }

        match Article::load(&self.spool, &name, next) {
            Ok(article) => {
                let reply =
                    response::retrieval_reply(codes::ARTICLE_STAT, next, article.message_id());
                self.session.select_article(Some(article));
                self.send(&reply).await
            }
            Err(err) => {
                // cursor stays on the previous article
                self.send(&format!("421 error retrieving article {next}: {err}"))
                    .await
            }
        }
    }
}
