//! Feed subscription manager built around an OPML outline parser.
//!
//! The library side covers four concerns:
//!
//! - [`opml`]: parse OPML documents into an outline tree and extract feed
//!   subscriptions from them
//! - [`feed`]: fetch feeds over HTTP and parse them into channels
//! - [`storage`]: SQLite-backed subscription store and channel cache
//! - [`config`]: optional TOML configuration
//!
//! The `lectern` binary wires these together behind a small CLI.

pub mod config;
pub mod feed;
pub mod opml;
pub mod storage;
pub mod util;
