//! Tape client: polls the quote service for a watchlist and prints the tape.
//!
//! The watchlist comes from `--path` (a text file), `--symbols` (comma-separated),
//! or the built-in default, in that order. The service is polled immediately and
//! then every `--interval-secs`; each state change is logged as one tape line.
//! Without an endpoint the client only renders the placeholder tape.
//!
//! Usage example (CLI):
//! ```bash
//! tape_client --endpoint quotes.example.com/api --symbols AAPL,MSFT,NVDA
//! tape_client --endpoint /api --origin https://example.com --path ./watchlist.txt
//! ```
#![warn(missing_docs)]
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{debug, error, info};
use tape_client::args::Args;
use tape_client::fetcher::REQUEST_TIMEOUT;
use tape_client::tape::render_line;
use tape_client::{HttpQuoteSource, QuoteEndpoint, QuotePoller, QuoteSource};
use tape_common::tickers::WatchlistParser;
use tape_common::{Result, TapeError, Watchlist};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_logger();
    let args = Args::parse();

    let watchlist = load_watchlist(&args)?;
    info!("Watchlist: {}", watchlist.query_value());

    let source: Option<Arc<dyn QuoteSource>> = match args.endpoint.as_deref() {
        Some(raw) => {
            let endpoint = QuoteEndpoint::parse(raw, args.origin.as_deref())?;
            let source = HttpQuoteSource::new(&endpoint, &watchlist, REQUEST_TIMEOUT)?;
            Some(Arc::new(source) as Arc<dyn QuoteSource>)
        }
        None => None,
    };

    let handle = QuotePoller::spawn(source, Duration::from_secs(args.interval_secs));
    let mut rx = handle.subscribe();
    info!("{}", render_line(&rx.borrow_and_update(), &watchlist));

    info!("Client is running. Press Ctrl+C to exit.");
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Ctrl+C received. Shutting down client..."),
                    Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                }
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Poller stopped publishing");
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if let Some(e) = snapshot.last_error() {
                    debug!("Last poll error: {}", e);
                }
                info!("{}", render_line(&snapshot, &watchlist));
            }
        }
    }

    handle.shutdown().await;
    info!("Client stopped");
    Ok(())
}

fn load_watchlist(args: &Args) -> Result<Watchlist> {
    if let Some(raw) = args.path.as_deref() {
        let file_path = normalize_path(raw);
        if !is_file_exist(&file_path) {
            return Err(TapeError::Config(format!(
                "watchlist file not found: {}",
                file_path.display()
            )));
        }
        let file = File::open(&file_path)?;
        return Watchlist::parse_from_file(BufReader::new(file));
    }
    match args.symbols.as_deref() {
        Some(raw) => Watchlist::from_csv(raw),
        None => Ok(Watchlist::default()),
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

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

fn is_file_exist(path: &PathBuf) -> bool {
    path.exists() && path.is_file()
}
