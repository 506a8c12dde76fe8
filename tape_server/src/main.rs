//! Market tape quote service.
//!
//! This binary serves `GET .../quotes?symbols=...` over HTTP. Internally, it wires
//! together three main building blocks:
//!
//! - `FinnhubProvider`: performs one upstream lookup per symbol.
//! - `QuoteAggregator`: fans a request out to the provider in parallel and keeps only the
//!   quotes that came back valid within the upstream timeout.
//! - `InMemoryResponseCache`: shares rendered responses between identical requests for the
//!   cache TTL; a background janitor evicts stale entries.
//!
//! Concurrency and shutdown:
//! - Requests are handled on the Tokio runtime by axum; the cache is the only shared state.
//! - Ctrl+C stops accepting connections and lets in-flight requests finish.
//!
//! Configuration (flags or environment):
//! - `--bind` / `TAPE_BIND` (default `0.0.0.0:8787`)
//! - `--upstream-url` / `TAPE_UPSTREAM_URL`
//! - `--api-key` / `FINNHUB_API_KEY` (required)
//! - `--cache-ttl-secs` / `TAPE_CACHE_TTL_SECS` (default 15)
//! - `--upstream-timeout-ms` / `TAPE_UPSTREAM_TIMEOUT_MS` (default 5000)
//! - `RUST_LOG` for log filtering (default `info`)
#![warn(missing_docs)]
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{debug, error, info};
use tape_common::Result;
use tape_server::args::Args;
use tape_server::model::response_cache::InMemoryResponseCache;
use tape_server::upstream::FinnhubProvider;
use tape_server::{AppState, QuoteAggregator, ServerConfig, create_router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_logger();
    let config = ServerConfig::from_args(Args::parse())?;
    info!("Starting quote service: {:?}", config);

    let provider = FinnhubProvider::new(
        &config.upstream_url,
        config.api_key.clone(),
        config.upstream_timeout,
    )?;
    let aggregator = QuoteAggregator::new(Arc::new(provider), config.upstream_timeout);

    let cache = Arc::new(InMemoryResponseCache::new());
    start_cache_janitor(Arc::clone(&cache), config.cache_ttl);

    let app = create_router(AppState::new(aggregator, cache, config.cache_ttl));
    let listener = TcpListener::bind(config.bind).await?;
    info!("Quote service listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Quote service stopped");
    Ok(())
}

/// Periodically evict expired cache entries so keys that are never requested
/// again do not accumulate.
fn start_cache_janitor(cache: Arc<InMemoryResponseCache>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = cache.purge_expired();
            if evicted > 0 {
                debug!("Evicted {} expired responses, {} cached", evicted, cache.len());
            }
        }
    });
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received. Shutting down quote service..."),
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {}", e);
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
