//! Text rendering of the market tape.
//!
//! Pure formatting of a [`QuoteSnapshot`]: status label, price precision,
//! signed percent change and direction glyphs. Until live data arrives the
//! watchlist is shown with placeholder values.
use std::fmt;

use tape_common::{Quote, Watchlist};

use crate::model::{PollStatus, QuoteSnapshot};

/// Shown in place of a value that is not known yet.
pub const PLACEHOLDER: &str = "—";

/// Sign of a quote's change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Positive change.
    Up,
    /// Negative change.
    Down,
    /// No change or unknown.
    Flat,
}

impl Direction {
    /// Direction of `change`.
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Direction::Up
        } else if change < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    /// Glyph shown before the change.
    pub fn glyph(self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Flat => "•",
        }
    }
}

/// One rendered tape entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeItem {
    /// Ticker symbol.
    pub symbol: String,
    /// Formatted price.
    pub price: String,
    /// Formatted percent change.
    pub change: String,
    /// Change direction.
    pub direction: Direction,
}

impl fmt::Display for TapeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.symbol,
            self.price,
            self.direction.glyph(),
            self.change
        )
    }
}

/// Connection label for the tape header.
pub fn status_label(snapshot: &QuoteSnapshot) -> &'static str {
    if !snapshot.is_configured() {
        return "not configured";
    }
    match snapshot.status() {
        PollStatus::Ready => "live",
        PollStatus::Error => "offline",
        PollStatus::Idle | PollStatus::Loading => "connecting",
    }
}

/// Price with two decimals, or one from 1000 upwards, thousands grouped.
pub fn format_price(value: f64) -> String {
    let digits = if value >= 1000.0 { 1 } else { 2 };
    let fixed = format!("{:.*}", digits, value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    format!("{}.{}", group_thousands(int_part), frac_part)
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

/// Percent change with one decimal and an explicit sign (`+`, `−` or none).
pub fn format_change_percent(value: f64) -> String {
    let sign = if value > 0.0 {
        "+"
    } else if value < 0.0 {
        "−"
    } else {
        ""
    };
    format!("{}{:.1}%", sign, value.abs())
}

/// Render one quote.
pub fn tape_item(quote: &Quote) -> TapeItem {
    TapeItem {
        symbol: quote.symbol.clone(),
        price: format_price(quote.price),
        change: format_change_percent(quote.change_percent),
        direction: Direction::of(quote.change),
    }
}

/// Items to display: live quotes when there are any, placeholders otherwise.
pub fn tape_items(snapshot: &QuoteSnapshot, watchlist: &Watchlist) -> Vec<TapeItem> {
    if !snapshot.quotes().is_empty() {
        return snapshot.quotes().iter().map(tape_item).collect();
    }
    watchlist
        .symbols()
        .iter()
        .map(|symbol| TapeItem {
            symbol: symbol.to_string(),
            price: PLACEHOLDER.to_string(),
            change: PLACEHOLDER.to_string(),
            direction: Direction::Flat,
        })
        .collect()
}

/// Single-line rendering: `[status] AAPL 190.00 ▲ +0.6%  MSFT ...`.
pub fn render_line(snapshot: &QuoteSnapshot, watchlist: &Watchlist) -> String {
    let items: Vec<String> = tape_items(snapshot, watchlist)
        .iter()
        .map(TapeItem::to_string)
        .collect();
    format!("[{}] {}", status_label(snapshot), items.join("  "))
}
