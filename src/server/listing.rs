//! LIST and its RFC 2980 sub-commands, plus NEWGROUPS
//!
//! Every listing enumerates the spool fresh and loads each group for its
//! current counters; groups that fail to load mid-listing are skipped so
//! one damaged `.info` file cannot break the whole reply.

use super::connection::Connection;
use crate::Result;
use crate::group::Group;

impl Connection {
    /// LIST [ACTIVE|ACTIVE.TIMES|NEWSGROUPS|OVERVIEW.FMT|...] (RFC 977/2980)
    pub(super) async fn cmd_list(&mut self, arg1: &str, arg2: &str) -> Result<()> {
        if arg1.eq_ignore_ascii_case("EXTENSIONS") {
            return self
                .send(concat!(
                    "202 Extensions supported:\r\n",
                    "LISTGROUP\r\n",
                    "MODE\r\n",
                    "XREPLIC\r\n",
                    "XOVER\r\n",
                    "DATE\r\n",
                    "."
                ))
                .await;
        }

        if arg1.is_empty() || arg1.eq_ignore_ascii_case("ACTIVE") {
            if !arg2.is_empty() {
                return self
                    .send("501 LIST ACTIVE <wildmat>: wildmats not supported")
                    .await;
            }

            self.send("215 list of newsgroups follows").await?;
            for name in self.spool.enumerate_groups() {
                let Ok(group) = Group::load(&self.spool, &name) else {
                    continue;
                };
                let flag = if group.post_ok() { 'y' } else { 'n' };
                let line = format!("{} {} {} {}", group.name(), group.total(), group.start(), flag);
                self.send(&line).await?;
            }
            return self.send(".").await;
        }

        if arg1.eq_ignore_ascii_case("ACTIVE.TIMES") {
            self.send("215 information follows").await?;
            for name in self.spool.enumerate_groups() {
                let Ok(group) = Group::load(&self.spool, &name) else {
                    continue;
                };
                let line = format!("{} {} {}", group.name(), group.ctime(), group.creator());
                self.send(&line).await?;
            }
            return self.send(".").await;
        }

        if arg1.eq_ignore_ascii_case("NEWSGROUPS") {
            self.send("215 information follows").await?;
            for name in self.spool.enumerate_groups() {
                let Ok(group) = Group::load(&self.spool, &name) else {
                    continue;
                };
                let line = format!("{} {}", group.name(), group.description());
                self.send(&line).await?;
            }
            return self.send(".").await;
        }

        if arg1.eq_ignore_ascii_case("OVERVIEW.FMT") {
            self.send("215 information follows").await?;
            let fmt = self.config.overview_fmt.clone();
            for field in &fmt {
                self.send(field).await?;
            }
            return self.send(".").await;
        }

        if arg1.eq_ignore_ascii_case("SUBSCRIPTIONS") {
            // no default subscription list is configured on this server
            self.send("215 information follows").await?;
            return self.send(".").await;
        }

        if arg1.eq_ignore_ascii_case("DISTRIBUTIONS") || arg1.eq_ignore_ascii_case("DISTRIB.PATS") {
            return self.send("503 Not implemented on this server").await;
        }

        self.send("501 Syntax error").await
    }

    /// NEWGROUPS <YYMMDD> <HHMMSS> [GMT] [<distributions>] (RFC 977)
    pub(super) async fn cmd_newgroups(&mut self, arg1: &str, arg2: &str) -> Result<()> {
        let six_digits = |s: &str| s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit());
        if !six_digits(arg1) || !six_digits(arg2) {
            return self.send("501 Bad or missing date/time arguments").await;
        }

        // TODO: parse the date/time and filter on each group's ctime
        self.send("231 list of new newsgroups follows").await?;
        for name in self.spool.enumerate_groups() {
            if Group::load(&self.spool, &name).is_ok() {
                self.send(&name).await?;
            }
        }
        self.send(".").await
    }
}
