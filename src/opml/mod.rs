//! OPML subscription-list parsing.
//!
//! A streaming consumer of markup tokens that mirrors the document's
//! `<outline>` nesting as an in-memory tree, preserving every attribute
//! on every entry without first buffering the raw markup.
//!
//! The module is split along its one seam:
//!
//! - [`tokens`] - the [`TokenSource`] capability and its `quick-xml` adapter
//! - [`model`] - the [`Document`] / [`Outline`] tree
//! - [`parser`] - the tree builder itself
//! - [`import`] - extraction of feed subscriptions from a parsed tree
//!
//! # Example
//!
//! ```
//! use lectern::opml;
//!
//! let doc = opml::parse_str(
//!     r#"<opml><body><outline text="a" xmlUrl="https://a.com/rss"/></body></opml>"#,
//! )?;
//! assert_eq!(doc.outlines()[0].attr("text"), Some("a"));
//! # Ok::<(), lectern::opml::OpmlError>(())
//! ```

mod import;
mod model;
mod parser;
mod tokens;

pub use import::{feeds, Feed};
pub use model::{Document, Outline};
pub use parser::{parse_file, parse_str, OpmlError, Parser, DEFAULT_MAX_DEPTH};
pub use tokens::{Token, TokenSource, TokenizeError, XmlTokenSource};
