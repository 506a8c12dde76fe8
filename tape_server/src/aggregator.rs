//! Parallel fan-out over the upstream provider.
//!
//! Every requested symbol gets one independent lookup. All lookups run
//! concurrently and the aggregate settles once each of them has either produced
//! a quote or failed. A failed, stalled or invalid lookup contributes nothing;
//! it never fails the whole batch.
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::debug;
use tape_common::{Quote, Symbol};
use tokio::time::timeout;

use crate::upstream::QuoteProvider;

/// Fans a symbol list out to a [`QuoteProvider`] and gathers what succeeds.
pub struct QuoteAggregator {
    provider: Arc<dyn QuoteProvider>,
    upstream_timeout: Duration,
}

impl QuoteAggregator {
    /// Build an aggregator bounding each upstream lookup by `upstream_timeout`.
    pub fn new(provider: Arc<dyn QuoteProvider>, upstream_timeout: Duration) -> Self {
        Self {
            provider,
            upstream_timeout,
        }
    }

    /// Look up every symbol concurrently; quotes come back in request order.
    pub async fn aggregate(&self, symbols: &[Symbol]) -> Vec<Quote> {
        let lookups = symbols.iter().map(|symbol| self.lookup(symbol));
        join_all(lookups).await.into_iter().flatten().collect()
    }

    async fn lookup(&self, symbol: &Symbol) -> Option<Quote> {
        match timeout(self.upstream_timeout, self.provider.fetch_quote(symbol)).await {
            Ok(Ok(quote)) if quote.is_valid() => Some(quote),
            Ok(Ok(_)) => {
                debug!("Dropping {}: provider returned an invalid quote", symbol);
                None
            }
            Ok(Err(e)) => {
                debug!("Dropping {}: {}", symbol, e);
                None
            }
            Err(_) => {
                debug!("Dropping {}: no answer within {:?}", symbol, self.upstream_timeout);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tape_common::tickers::parse_symbols;
    use tape_common::{Result, TapeError};

    /// Scripted provider: fixed prices, a set of failing symbols, a set that never answers.
    #[derive(Default)]
    struct ScriptedProvider {
        prices: HashMap<&'static str, f64>,
        failing: Vec<&'static str>,
        stalled: Vec<&'static str>,
        invalid: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QuoteProvider for ScriptedProvider {
        async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
            self.calls.lock().unwrap().push(symbol.to_string());
            let name = symbol.as_str();
            if self.stalled.contains(&name) {
                std::future::pending::<()>().await;
            }
            if self.invalid.contains(&name) {
                return Ok(Quote {
                    symbol: name.to_string(),
                    price: f64::NAN,
                    change: 0.0,
                    change_percent: 0.0,
                });
            }
            if self.failing.contains(&name) {
                return Err(TapeError::UpstreamStatus {
                    symbol: name.to_string(),
                    status: 502,
                });
            }
            let price = self.prices.get(name).copied().unwrap_or(10.0);
            Ok(Quote::new(name, price, 1.0, 0.5).unwrap())
        }
    }

    fn aggregator(provider: ScriptedProvider) -> (QuoteAggregator, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let aggregator = QuoteAggregator::new(provider.clone(), Duration::from_secs(5));
        (aggregator, provider)
    }

    #[tokio::test]
    async fn keeps_request_order() {
        let (aggregator, _) = aggregator(ScriptedProvider::default());
        let quotes = aggregator.aggregate(&parse_symbols("msft,aapl,spy")).await;
        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MSFT", "AAPL", "SPY"]);
    }

    #[tokio::test]
    async fn failed_and_invalid_symbols_are_omitted() {
        let (aggregator, provider) = aggregator(ScriptedProvider {
            failing: vec!["BAD"],
            invalid: vec!["NAN"],
            ..Default::default()
        });
        let quotes = aggregator.aggregate(&parse_symbols("AAPL,BAD,NAN,MSFT")).await;

        assert_eq!(quotes.len(), 2);
        assert!(quotes.iter().all(Quote::is_valid));
        assert_eq!(provider.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn all_failures_yield_empty_result() {
        let (aggregator, _) = aggregator(ScriptedProvider {
            failing: vec!["A", "B"],
            ..Default::default()
        });
        assert!(aggregator.aggregate(&parse_symbols("a,b")).await.is_empty());
    }

    #[tokio::test]
    async fn one_call_per_distinct_symbol() {
        let (aggregator, provider) = aggregator(ScriptedProvider::default());
        aggregator.aggregate(&parse_symbols("aapl,AAPL, msft")).await;

        let mut calls = provider.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_symbol_times_out_without_blocking_others() {
        let (aggregator, _) = aggregator(ScriptedProvider {
            stalled: vec!["SLOW"],
            ..Default::default()
        });

        let started = tokio::time::Instant::now();
        let quotes = aggregator.aggregate(&parse_symbols("AAPL,SLOW,MSFT")).await;

        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    }
}
