//! Poll status state machine with last-known-good retention.
//!
//! Transitions:
//!
//! - `begin`: `loading`; quotes untouched.
//! - `succeed`: `ready`; quotes and timestamp replaced wholesale, error cleared.
//! - `fail`: `error`; only the status and message change.
//!
//! Once live data has been shown it is never cleared by a failure.
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{Display, EnumString};
use tape_common::{Quote, Result, TapeError};

/// Where the poller currently is in its cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    /// Nothing requested yet (or polling disabled).
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last settled request produced quotes.
    Ready,
    /// The last settled request failed.
    Error,
}

/// Status plus the last successfully fetched data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollState {
    status: PollStatus,
    quotes: Vec<Quote>,
    updated_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl PollState {
    /// Current status.
    pub fn status(&self) -> PollStatus {
        self.status
    }

    /// Quotes from the most recent successful poll (possibly older than the status).
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// When the retained quotes were fetched.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// A request has been issued.
    pub fn begin(&mut self) {
        self.status = PollStatus::Loading;
    }

    /// A request produced quotes. An empty list counts as a failure.
    pub fn succeed(&mut self, quotes: Vec<Quote>, at: DateTime<Utc>) {
        if quotes.is_empty() {
            self.fail(TapeError::EmptyQuotes.to_string());
            return;
        }
        self.status = PollStatus::Ready;
        self.quotes = quotes;
        self.updated_at = Some(at);
        self.last_error = None;
    }

    /// A request failed; retained data stays.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = PollStatus::Error;
        self.last_error = Some(message.into());
    }

    /// Apply the outcome of one request.
    pub fn settle(&mut self, outcome: Result<Vec<Quote>>, at: DateTime<Utc>) {
        match outcome {
            Ok(quotes) => self.succeed(quotes, at),
            Err(e) => self.fail(e.to_string()),
        }
    }
}

/// What the display layer sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    /// Request URL being polled; `None` when polling is not configured.
    pub endpoint: Option<String>,
    /// Poll state.
    #[serde(flatten)]
    pub state: PollState,
}

impl QuoteSnapshot {
    /// Fresh `idle` snapshot for `endpoint`.
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            state: PollState::default(),
        }
    }

    /// False when no endpoint is configured and polling is disabled.
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Shorthand for `state.status()`.
    pub fn status(&self) -> PollStatus {
        self.state.status()
    }

    /// Shorthand for `state.quotes()`.
    pub fn quotes(&self) -> &[Quote] {
        self.state.quotes()
    }

    /// Shorthand for `state.last_error()`.
    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error()
    }
}
