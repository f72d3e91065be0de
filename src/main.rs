//! newsd binary: load configuration, initialize logging, serve

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use newsd::{Config, NewsServer};

#[tokio::main]
async fn main() -> newsd::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&PathBuf::from(path))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone())),
        )
        .init();

    info!("newsd v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "serving spool {} on {}",
        config.spool_dir.display(),
        config.listen
    );

    NewsServer::new(config).run().await
}
