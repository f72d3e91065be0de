//! Shared integration harness
//!
//! Seeds a temporary spool, starts a real server on an ephemeral port, and
//! drives it with a scripted line-oriented client over TCP.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use newsd::{Config, NewsServer};

pub struct TestServer {
    pub addr: SocketAddr,
    _spool: TempDir,
}

impl TestServer {
    /// Start a server over a spool populated by `seed`
    pub async fn start(seed: impl FnOnce(&Path)) -> TestServer {
        let spool = TempDir::new().unwrap();
        seed(spool.path());

        let config = Config {
            listen: "127.0.0.1:0".parse().unwrap(),
            server_name: "news.test".to_string(),
            spool_dir: spool.path().to_path_buf(),
            timeout_secs: 30,
            sendmail: "cat > /dev/null".to_string(),
            ..Config::default()
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = NewsServer::new(config);
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        TestServer {
            addr,
            _spool: spool,
        }
    }
}

/// Create a group directory with its `.info` metadata
pub fn seed_group(root: &Path, name: &str, info: &str) {
    let dir = root.join(name.replace('.', "/"));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".info"), info).unwrap();
}

/// Drop an article file into a group directory
pub fn seed_article(root: &Path, group: &str, number: u64, text: &str) {
    let dir = root.join(group.replace('.', "/"));
    fs::write(dir.join(number.to_string()), text).unwrap();
}

/// A plausible stored article for fixtures
pub fn article_text(number: u64, group: &str) -> String {
    format!(
        "From: poster{number}@example.com\n\
         Newsgroups: {group}\n\
         Message-ID: <{number}@{group}>\n\
         Subject: article {number}\n\
         \n\
         body of article {number}\n"
    )
}

pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connect and consume the greeting
    pub async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Client {
            reader: BufReader::new(reader),
            writer,
        };
        let greeting = client.read_line().await;
        assert_eq!(greeting, "200 newsd news server ready - posting ok");
        client
    }

    pub async fn read_line(&mut self) -> String {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        assert!(n > 0, "server closed the connection unexpectedly");
        line.trim_end().to_string()
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.unwrap();
    }

    /// Send a command and read its single status line
    pub async fn cmd(&mut self, line: &str) -> String {
        self.send_raw(&format!("{line}\r\n")).await;
        self.read_line().await
    }

    /// Send a command and collect its multi-line payload up to the `.`
    pub async fn cmd_multiline(&mut self, line: &str) -> (String, Vec<String>) {
        let status = self.cmd(line).await;
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await;
            if line == "." {
                break;
            }
            lines.push(line);
        }
        (status, lines)
    }
}
