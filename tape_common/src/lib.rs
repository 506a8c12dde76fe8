//!
//! Common types and utilities shared by the tape server and client.
//!
//! This crate aggregates:
//! - `error`: unified error type `TapeError` used across the workspace.
//! - `result`: handy `Result<T, TapeError>` alias.
//! - `quote`: `Quote` and the JSON bodies of the `/quotes` endpoint.
//! - `tickers`: symbol normalization and the client watchlist.
//! - `net`: HTTP constants and small helpers.
#![warn(missing_docs)]
pub mod error;
pub mod net;
pub mod quote;
pub mod result;
pub mod tickers;

pub use error::TapeError;
pub use quote::{ErrorBody, Quote, QuotesResponse};
pub use result::Result;
pub use tickers::{Symbol, Watchlist};
