//! Domain models for the quote service.
//!
//! - `response_cache`: shared TTL cache for rendered `/quotes` responses.

pub mod response_cache;
