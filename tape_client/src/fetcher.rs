//! One poll request against the quote service.
//!
//! Any of the following counts as a failed poll: transport error, non-2xx
//! status, a body that is not JSON, or a body with no usable quotes. Entries
//! that do not form a valid [`Quote`] are skipped individually.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tape_common::{Quote, Result, TapeError, Watchlist};

use crate::endpoint::QuoteEndpoint;

/// Client-side deadline for a single poll request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of quote snapshots for the poller.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Configured service endpoint reported to the display layer.
    fn endpoint(&self) -> &str;

    /// Fetch the current quote set. Never returns an empty `Ok`.
    async fn fetch_quotes(&self) -> Result<Vec<Quote>>;
}

/// [`QuoteSource`] that polls the quote service over HTTP.
pub struct HttpQuoteSource {
    client: reqwest::Client,
    endpoint: String,
    url: Url,
}

impl HttpQuoteSource {
    /// Build a source for `watchlist` on `endpoint`.
    pub fn new(endpoint: &QuoteEndpoint, watchlist: &Watchlist, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.as_str().to_string(),
            url: endpoint.quotes_url(watchlist),
        })
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_quotes(&self) -> Result<Vec<Quote>> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TapeError::ServiceStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        let quotes = parse_quotes_response(&body);
        if quotes.is_empty() {
            return Err(TapeError::EmptyQuotes);
        }
        Ok(quotes)
    }
}

/// Extract the usable quotes from a service response body.
///
/// Numbers may arrive as JSON numbers or numeric strings; anything else makes
/// the entry invalid.
pub fn parse_quotes_response(body: &Value) -> Vec<Quote> {
    let Some(raw) = body.get("quotes").and_then(Value::as_array) else {
        return Vec::new();
    };

    raw.iter()
        .filter_map(|entry| {
            let symbol = entry.get("symbol").and_then(Value::as_str).unwrap_or("");
            Quote::new(
                symbol,
                number(entry, "price"),
                number(entry, "change"),
                number(entry, "changePercent"),
            )
        })
        .collect()
}

fn number(entry: &Value, field: &str) -> f64 {
    match entry.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
