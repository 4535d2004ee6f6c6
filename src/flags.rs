//! Well-known route flags.
//!
//! Flags are opaque strings attached to a route at declaration time.
//! Processors check them through [`Request::is_flagged`](crate::server::Request::is_flagged)
//! to opt a route out of cross-cutting behavior.

/// Responses for this route must not be cached.
pub const NO_CACHING: &str = "no.caching";
/// Route is public; security processors skip it entirely.
pub const NOT_SECURED: &str = "not.secured";
/// Authentication processors skip this route.
pub const NO_AUTHENTICATION: &str = "no.authentication";
/// Authorization processors skip this route.
pub const NO_AUTHORIZATION: &str = "no.authorization";
