//! Command-line arguments for the quote service.
//!
//! Every flag can also be supplied through the environment (a `.env` file is
//! loaded first). See `main` for end-to-end usage.
use clap::Parser;
use tape_common::net::{CACHE_TTL, DEFAULT_PORT, UPSTREAM_TIMEOUT, addr};

use crate::upstream::DEFAULT_UPSTREAM_URL;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Socket address to listen on.
    #[arg(long, env = "TAPE_BIND", default_value_t = addr("0.0.0.0", DEFAULT_PORT))]
    pub bind: String,

    /// Base URL of the upstream quote API.
    #[arg(long, env = "TAPE_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    /// Upstream API credential.
    #[arg(long, env = "FINNHUB_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Lifetime of cached `/quotes` responses, in seconds.
    #[arg(long, env = "TAPE_CACHE_TTL_SECS", default_value_t = CACHE_TTL.as_secs())]
    pub cache_ttl_secs: u64,

    /// Deadline for each upstream lookup, in milliseconds.
    #[arg(long, env = "TAPE_UPSTREAM_TIMEOUT_MS", default_value_t = UPSTREAM_TIMEOUT.as_millis() as u64)]
    pub upstream_timeout_ms: u64,
}
