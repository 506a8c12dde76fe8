//! Data model of the polling client.
//!
//! - `poll_state`: status state machine and the snapshot handed to the display layer.
pub mod poll_state;

pub use poll_state::{PollState, PollStatus, QuoteSnapshot};
