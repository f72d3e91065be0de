//! NNTP server: listener setup and per-connection dispatch
//!
//! The listener accepts TCP connections and hands each one to its own
//! spawned task running a [`connection::Connection`]. Connections share
//! nothing in memory; the filesystem spool is the only state they have in
//! common.

mod articles;
mod connection;
mod group_ops;
mod io;
mod listing;
mod posting;
mod state;

use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::Result;
use crate::config::Config;
use connection::Connection;

/// The news server: owns the configuration, accepts connections
#[must_use]
pub struct NewsServer {
    config: Arc<Config>,
}

impl NewsServer {
    /// Create a server around a loaded configuration
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Bind the configured listen address
    ///
    /// SO_REUSEADDR is set so a restart does not trip over sockets still in
    /// TIME_WAIT from the previous run.
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen;
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(128)?;
        socket.set_nonblocking(true)?;

        Ok(TcpListener::from_std(socket.into())?)
    }

    /// Bind and serve forever
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind()?;
        info!("listening on {}", self.config.listen);
        self.serve(listener).await
    }

    /// Accept connections on an existing listener, one task per connection
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            info!("Connection from host {}, port {}", peer.ip(), peer.port());

            let config = Arc::clone(&self.config);
            tokio::spawn(async move {
                if let Err(err) = Connection::new(stream, peer, config).serve().await {
                    debug!("connection from {peer} ended with error: {err}");
                }
            });
        }
    }
}
