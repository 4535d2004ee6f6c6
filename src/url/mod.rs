//! # URL Module
//!
//! Compiles URL templates into matchers that test a concrete request URL and
//! extract named parameter values.
//!
//! Two strategies are available behind [`UrlMatcher`]:
//!
//! - **Template** (`/api/{version}/users/{id}.{format}`): placeholders become
//!   lazy capture groups, a trailing `.{format}` becomes an optional extension,
//!   and a query string is always tolerated.
//! - **Regex**: a caller-supplied expression whose groups are exposed as
//!   `regexGroup0`, `regexGroup1`, ...
//!
//! ## Example
//!
//! ```rust
//! use restline::url::UrlMatcher;
//!
//! let matcher = UrlMatcher::template("/api/{version}/users/{id}").unwrap();
//! let m = matcher.match_url("/api/2/users/1234").unwrap();
//! assert_eq!(m.get("version"), Some("2"));
//! assert_eq!(m.get("id"), Some("1234"));
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    ParamVec, UrlMatch, UrlMatcher, UrlPattern, UrlRegex, FORMAT_PARAMETER, MAX_INLINE_PARAMS,
    REGEX_GROUP_PREFIX,
};
