use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dropdown;
mod feed_types;
mod locator;
mod map;
mod poller;
mod reconciler;
mod server;
mod source;
mod state;

use config::Config;
use dropdown::TrainDropdown;
use locator::Locator;
use map::WebMap;
use poller::Poller;
use server::{ServerState, routes};
use source::DigitrafficClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 1. Configuration
    let config = Config::from_env()?;
    info!("Train feed: {}", config.feed_url);

    // 2. Shared display model
    let source = Arc::new(
        DigitrafficClient::new(config.feed_url.clone(), config.http_timeout)
            .context("Failed to build HTTP client")?,
    );
    let map = Arc::new(WebMap::new());
    let dropdown = Arc::new(TrainDropdown::new());

    // 3. Poller (first fetch happens immediately)
    let poller = Poller::new(source.clone(), map.clone(), dropdown.clone());
    let poller_handle = poller.start(config.poll_interval);

    // 4. HTTP Server
    let state = Arc::new(ServerState {
        map: map.clone(),
        dropdown,
        locator: Locator::new(source, map),
    });
    let (addr, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(
            ([0, 0, 0, 0], config.port),
            shutdown_signal(tokio::signal::ctrl_c()),
        )
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Server running at http://localhost:{}", addr.port());

    server.await;

    info!("Shutting down...");
    let poller = poller_handle.stop().await?;
    info!("Poller stopped with {} trains on the map", poller.markers().len());
    Ok(())
}

/// Resolves when `signal` fires. If the handler cannot be installed the
/// server keeps running instead of shutting down straight away.
async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_on_signal() {
        let signal = async { Ok(()) };
        let done = tokio::time::timeout(Duration::from_secs(1), shutdown_signal(signal)).await;
        assert!(done.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_signal_handler_keeps_running() {
        let failing = async { Err(std::io::Error::other("no signal handler")) };
        let done = tokio::time::timeout(Duration::from_secs(3600), shutdown_signal(failing)).await;
        assert!(done.is_err());
    }
}
