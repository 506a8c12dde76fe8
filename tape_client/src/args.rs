//! Command-line arguments for the tape client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use tape_common::net::DEFAULT_POLL_INTERVAL;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Quote service URL. Polling is disabled when absent.
    /// A bare host gets `https://`; a `/path` is resolved against `--origin`.
    #[arg(long, env = "MARKET_TAPE_URL")]
    pub endpoint: Option<String>,

    /// Origin used to resolve a relative endpoint path.
    #[arg(long, env = "MARKET_TAPE_ORIGIN")]
    pub origin: Option<String>,

    /// Comma-separated symbols to watch.
    #[arg(long, conflicts_with = "path")]
    pub symbols: Option<String>,

    /// Path to a text file with symbols to watch.
    /// Symbols may be separated by commas, spaces, or new lines.
    #[arg(long)]
    pub path: Option<String>,

    /// Seconds between polls.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub interval_secs: u64,
}
