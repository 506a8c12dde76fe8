//! Quote payloads exchanged between the tape server and its clients.
//!
//! A `Quote` is only ever built through [`Quote::new`], which refuses any
//! candidate with an empty symbol, a non-positive price or a non-finite number.
//! Partial data is dropped, never defaulted.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price/change snapshot for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Uppercased ticker symbol (e.g. `AAPL`).
    pub symbol: String,
    /// Last traded price, always finite and positive.
    pub price: f64,
    /// Absolute change since the previous close.
    pub change: f64,
    /// Relative change since the previous close, in percent.
    pub change_percent: f64,
}

impl Quote {
    /// Validate the raw fields and build a quote.
    ///
    /// The symbol is trimmed and uppercased. Returns `None` when the symbol is
    /// empty, the price is not a finite positive number, or either change value
    /// is not finite.
    pub fn new(symbol: &str, price: f64, change: f64, change_percent: f64) -> Option<Quote> {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return None;
        }
        if !price.is_finite() || price <= 0.0 {
            return None;
        }
        if !change.is_finite() || !change_percent.is_finite() {
            return None;
        }
        Some(Quote {
            symbol,
            price,
            change,
            change_percent,
        })
    }

    /// Re-check the invariants on a value that did not come through [`Quote::new`],
    /// e.g. one deserialized from the wire.
    pub fn is_valid(&self) -> bool {
        !self.symbol.trim().is_empty()
            && self.price.is_finite()
            && self.price > 0.0
            && self.change.is_finite()
            && self.change_percent.is_finite()
    }
}

/// Body of a successful `/quotes` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotesResponse {
    /// Quotes for every symbol whose upstream lookup succeeded, in request order.
    pub quotes: Vec<Quote>,
    /// Moment the snapshot was assembled.
    pub updated_at: DateTime<Utc>,
}

impl QuotesResponse {
    /// Stamp `quotes` with the current time.
    pub fn now(quotes: Vec<Quote>) -> Self {
        Self {
            quotes,
            updated_at: Utc::now(),
        }
    }
}

/// Body of a request-level error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
    /// Present (and empty) only where callers expect a quotes array regardless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotes: Option<Vec<Quote>>,
}

impl ErrorBody {
    /// Error body without a `quotes` field.
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            quotes: None,
        }
    }

    /// Error body carrying an empty `quotes` array.
    pub fn with_empty_quotes(error: &str) -> Self {
        Self {
            error: error.to_string(),
            quotes: Some(Vec::new()),
        }
    }
}
