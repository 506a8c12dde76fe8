//! Market tape quote service.
//!
//! Answers `GET .../quotes?symbols=A,B,C` with a best-effort snapshot of the
//! requested symbols, fetched in parallel from an upstream provider and cached
//! for a short TTL. Building blocks:
//!
//! - `upstream`: `QuoteProvider` seam and the Finnhub-compatible provider.
//! - `aggregator`: parallel fan-out with per-symbol failure isolation.
//! - `model::response_cache`: shared TTL cache for rendered responses.
//! - `routes`: axum router, validation, CORS and cache handling.
//! - `args` / `config`: CLI/env configuration.
#![warn(missing_docs)]
pub mod aggregator;
pub mod args;
pub mod config;
pub mod model;
pub mod routes;
pub mod upstream;

pub use aggregator::QuoteAggregator;
pub use config::ServerConfig;
pub use routes::{AppState, create_router};
