//! # Content Negotiation Module
//!
//! Parses `Accept` / `Content-Type` header values into weighted
//! [`MediaRange`]s and ranks a server's supported ranges against a client's
//! requested ranges.
//!
//! ## Ranking
//!
//! A supported range is applicable to a requested range when type and subtype
//! are each equal or either side is `*`. Applicable pairs score:
//!
//! | Criterion                              | Score |
//! |----------------------------------------|-------|
//! | type equal (not via wildcard)          | +100  |
//! | subtype equal (not via wildcard)       | +50   |
//! | each requested parameter also present  | +2    |
//!
//! [`best_match`] picks the highest-scoring supported range, breaking ties on
//! the requested range's quality weight.
//!
//! ```rust
//! use restline::content::{best_match, parse_media_ranges};
//!
//! let supported = parse_media_ranges(Some("application/json, application/xml"));
//! let requested = parse_media_ranges(Some("application/json;q=0.5, application/xml;q=0.9"));
//! assert_eq!(best_match(&supported, &requested).as_deref(), Some("application/xml"));
//! ```

mod media_range;
#[cfg(test)]
mod tests;

pub use media_range::{best_match, parse_media_ranges, MediaRange};

/// `Content-Type` used when nothing else was negotiated.
pub const TEXT_PLAIN: &str = "text/plain; charset=UTF-8";
pub const APPLICATION_JSON: &str = "application/json; charset=UTF-8";
pub const APPLICATION_YAML: &str = "application/yaml";
