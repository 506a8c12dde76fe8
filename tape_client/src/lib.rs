//! Polling client for the market tape quote service.
//!
//! - `endpoint`: normalizes the configured service URL.
//! - `fetcher`: one HTTP poll and lenient response parsing.
//! - `model`: poll status state machine and display snapshot.
//! - `poller`: periodic polling with cancellation and last-write-wins updates.
//! - `tape`: text rendering of a snapshot.
#![warn(missing_docs)]
pub mod args;
pub mod endpoint;
pub mod fetcher;
pub mod model;
pub mod poller;
pub mod tape;

pub use endpoint::QuoteEndpoint;
pub use fetcher::{HttpQuoteSource, QuoteSource};
pub use model::{PollState, PollStatus, QuoteSnapshot};
pub use poller::{PollerHandle, QuotePoller};
