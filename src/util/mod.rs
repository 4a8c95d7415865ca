//! Shared utilities.
//!
//! Currently just SSRF-focused URL validation, used both when importing
//! OPML subscription lists and when subscribing to a feed directly.

mod url_validator;

pub use url_validator::{validate_url, UrlValidationError};
