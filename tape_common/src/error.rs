//! Error types shared between the tape server and client.
//!
//! The `TapeError` enum unifies the failure cases of both sides: I/O and
//! JSON handling, HTTP transport, configuration problems, and the upstream or
//! service responses that do not carry usable quotes. Request handlers and the
//! poller recover from all of them locally; only startup code lets them escape.
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Unified error type shared by server and client.
#[derive(Error, Debug)]
pub enum TapeError {
    /// I/O error originating from the standard library, sockets or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// HTTP transport failure (connect, TLS, body read, client-side timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured endpoint could not be turned into an absolute URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Missing or contradictory configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error while parsing a watchlist file into symbols.
    #[error("Parse watchlist error: {0}")]
    ParseWatchlist(String),

    /// The quote service answered with a non-success status.
    #[error("Quote fetch failed: {0}")]
    ServiceStatus(u16),

    /// The upstream provider answered a symbol lookup with a non-success status.
    #[error("Upstream returned status {status} for {symbol}")]
    UpstreamStatus {
        /// Symbol that was being looked up.
        symbol: String,
        /// HTTP status code returned by the provider.
        status: u16,
    },

    /// The upstream payload for a symbol is missing fields or has invalid numbers.
    #[error("Upstream payload rejected for {0}")]
    UpstreamPayload(String),

    /// A response parsed fine but contained no usable quotes.
    #[error("Quote fetch returned no quotes")]
    EmptyQuotes,

    /// An operation did not settle within its deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}
