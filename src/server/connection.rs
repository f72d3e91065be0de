//! Per-connection command loop
//!
//! One `Connection` per accepted socket: it owns the session cursor state,
//! reads command lines, and dispatches on the (case-insensitive) keyword.
//! Commands take up to two arguments; anything further on the line is
//! ignored. Handler implementations are spread over the sibling modules the
//! same way the protocol groups them.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info};

use super::state::Session;
use crate::config::Config;
use crate::mailgw::MailGateway;
use crate::response;
use crate::spool::Spool;
use crate::{NewsError, Result};

pub(super) struct Connection {
    pub(super) reader: BufReader<OwnedReadHalf>,
    pub(super) writer: OwnedWriteHalf,
    pub(super) config: Arc<Config>,
    pub(super) spool: Spool,
    pub(super) mailgw: MailGateway,
    pub(super) session: Session,
    pub(super) peer: SocketAddr,
}

impl Connection {
    pub(super) fn new(stream: TcpStream, peer: SocketAddr, config: Arc<Config>) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
            spool: Spool::new(&config.spool_dir),
            mailgw: MailGateway::new(config.sendmail.clone()),
            config,
            session: Session::new(),
            peer,
        }
    }

    /// Run the session until QUIT, timeout, or the peer goes away
    pub(super) async fn serve(mut self) -> Result<()> {
        self.send(response::GREETING).await?;

        loop {
            let line = match self.read_command_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(NewsError::Timeout) => {
                    info!("connection from {} timed out", self.peer);
                    break;
                }
                Err(err) => {
                    debug!("read error from {}: {err}", self.peer);
                    break;
                }
            };
            info!("GOT: {line}");

            let mut words = line.split_whitespace();
            let Some(cmd) = words.next() else {
                continue;
            };
            let cmd = cmd.to_ascii_uppercase();
            let arg1 = words.next().unwrap_or("").to_string();
            let arg2 = words.next().unwrap_or("").to_string();

            match cmd.as_str() {
                // transport extensions this server refuses (RFC 2980)
                "CHECK" | "TAKETHIS" => self.send(response::NOT_A_FEED).await?,
                "MODE" => self.cmd_mode(&arg1).await?,
                "LIST" => self.cmd_list(&arg1, &arg2).await?,
                "LISTGROUP" => self.cmd_listgroup(&arg1).await?,
                "XREPLIC" => {
                    self.send("437 'xreplic' not implemented on this server")
                        .await?
                }
                "XOVER" => self.cmd_xover(&arg1).await?,
                "GROUP" => self.cmd_group(&arg1).await?,
                "HELP" => self.cmd_help().await?,
                "NEWGROUPS" => self.cmd_newgroups(&arg1, &arg2).await?,
                "NEWNEWS" => self.send("501 Command not implemented on server").await?,
                "NEXT" => self.cmd_next().await?,
                "HEAD" | "BODY" | "ARTICLE" | "STAT" => self.cmd_retrieve(&cmd, &arg1).await?,
                "POST" => {
                    if !self.cmd_post().await? {
                        break; // transport died mid-posting
                    }
                }
                "DATE" => {
                    // RFC 2980: time is GMT, not local
                    let reply = format!("111 {}", Utc::now().format("%Y%m%d%H%M%S"));
                    self.send(&reply).await?;
                }
                "QUIT" => {
                    self.send(response::GOODBYE).await?;
                    break;
                }
                _ => self.send(response::UNKNOWN_COMMAND).await?,
            }
        }

        info!("Connection from {} closed", self.peer);
        Ok(())
    }

    async fn cmd_mode(&mut self, arg: &str) -> Result<()> {
        if arg.eq_ignore_ascii_case("stream") {
            self.send("500 Streaming not implemented on this server")
                .await
        } else if arg.eq_ignore_ascii_case("reader") {
            self.send("200 newsd news server ready (posting ok)").await
        } else {
            self.send("500 What?").await
        }
    }

    async fn cmd_help(&mut self) -> Result<()> {
        self.send("100 help text follows").await?;
        self.send(concat!(
            "CHECK\r\n",
            "TAKETHIS\r\n",
            "MODE [stream|reader]\r\n",
            "LIST [active|active.times|distributions|distrib.pats|newsgroups|overview.fmt|subscriptions]\r\n",
            "LISTGROUP [newsgroup]\r\n",
            "XREPLIC\r\n",
            "XOVER [msg#|msg#-|msg#-msg#]\r\n",
            "GROUP newsgroup\r\n",
            "HELP\r\n",
            "NEWGROUPS [YY]yymmdd hhmmss [GMT|UTC] [distributions]\r\n",
            "NEWNEWS\r\n",
            "NEXT\r\n",
            "HEAD [msg#|<msgid>]\r\n",
            "BODY [msg#|<msgid>]\r\n",
            "ARTICLE [msg#|<msgid>]\r\n",
            "STAT [msg#|<msgid>]\r\n",
            "POST\r\n",
            "DATE\r\n",
            "QUIT\r\n",
            "."
        ))
        .await
    }
}
