//! Feed retrieval: fetch a subscription's RSS/Atom document, reduce it
//! to a [`Channel`], and keep the channel cache warm.
//!
//! - [`parser`] - feed bytes → [`Channel`] via `feed-rs`
//! - [`fetcher`] - HTTP retrieval with timeout, retry, and size limits,
//!   plus the bounded-concurrency refresh of all subscriptions

mod fetcher;
mod parser;

pub use fetcher::{fetch_and_cache, fetch_channel, refresh_all, FetchError, FetchOptions, RefreshOutcome};
pub use parser::{parse_channel, Channel, Item};
