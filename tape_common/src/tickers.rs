//! Ticker symbols, symbol-list normalization and the watchlist.
//!
//! Both sides normalize symbol lists the same way: split on commas, trim,
//! uppercase, drop empties, keep the first occurrence of each symbol and stop
//! after [`MAX_SYMBOLS`] distinct entries.

use std::collections::HashSet;
use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::TapeError;

/// Upper bound on distinct symbols per request.
pub const MAX_SYMBOLS: usize = 25;

/// Watchlist shown by the tape when nothing else is configured.
pub const DEFAULT_WATCHLIST: [&str; 12] = [
    "SPY", "QQQ", "DIA", "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "JPM", "V",
];

/// A normalized ticker symbol: trimmed, ASCII-uppercase, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize `raw`; `None` if nothing is left after trimming.
    pub fn parse(raw: &str) -> Option<Symbol> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Symbol(trimmed.to_ascii_uppercase()))
        }
    }

    /// Symbol text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = TapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::parse(&value).ok_or_else(|| TapeError::ParseWatchlist("empty symbol".to_string()))
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Normalize a comma-separated symbol list.
///
/// Duplicates are dropped keeping the first occurrence, and the result is
/// truncated to the first [`MAX_SYMBOLS`] distinct symbols.
pub fn parse_symbols(raw: &str) -> Vec<Symbol> {
    normalize(raw.split(','))
}

fn normalize<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter_map(Symbol::parse)
        .filter(|symbol| seen.insert(symbol.clone()))
        .take(MAX_SYMBOLS)
        .collect()
}

/// Render symbols as the comma-joined `symbols` query value.
pub fn join_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Trait providing file parsing for watchlists.
pub trait WatchlistParser: Sized {
    /// Parses a watchlist from a buffered reader.
    ///
    /// Symbols may be separated by commas, spaces or new lines. Lines starting
    /// with `#` are comments. Returns an error if the reader fails or nothing
    /// usable is found.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Self, TapeError>;
}

/// Fixed, ordered set of symbols polled by a client.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist {
    symbols: Vec<Symbol>,
}

impl Watchlist {
    /// Build from a comma-separated list. Errors if nothing usable remains.
    pub fn from_csv(raw: &str) -> Result<Self, TapeError> {
        Self::from_symbols(parse_symbols(raw))
    }

    fn from_symbols(symbols: Vec<Symbol>) -> Result<Self, TapeError> {
        if symbols.is_empty() {
            return Err(TapeError::ParseWatchlist(
                "watchlist contains no symbols".to_string(),
            ));
        }
        Ok(Self { symbols })
    }

    /// Symbols in configured order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Value for the `symbols` query parameter.
    pub fn query_value(&self) -> String {
        join_symbols(&self.symbols)
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when there are no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self {
            symbols: normalize(DEFAULT_WATCHLIST),
        }
    }
}

impl WatchlistParser for Watchlist {
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Self, TapeError> {
        let mut raw = Vec::new();

        for line_result in reader.lines() {
            let line = line_result.map_err(TapeError::Io)?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }
            raw.extend(
                trimmed_line
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .map(str::to_string),
            );
        }
        Self::from_symbols(normalize(raw.iter().map(String::as_str)))
    }
}
