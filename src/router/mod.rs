//! # Router Module
//!
//! The route table maps `(method, URL)` to the handler that serves it.
//!
//! ## Resolution
//!
//! Routes are kept per method in declaration order and the **first** match
//! wins, so `/users/new` declared before `/users/{id}` shadows it. When no
//! route for the method matches:
//!
//! - if a route under another method matches, resolution fails with
//!   `MethodNotAllowed` carrying the methods that do match (for `Allow`);
//! - otherwise it fails with `NotFound`.
//!
//! ## Declaration
//!
//! [`RouteBuilder`] is the declarative surface: template or regex, methods,
//! name, aliases, flags, opaque parameters, formats and serialization.
//! Handlers are plain closures or [`Handler`](crate::dispatcher::Handler)
//! implementations registered explicitly.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use restline::router::{RouteBuilder, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table
//!     .add(
//!         RouteBuilder::new("/users/{id}", |_req, _res| Ok(None))
//!             .method(Method::GET),
//!     )
//!     .unwrap();
//!
//! let action = table.resolve(&Method::GET, "/users/42").unwrap();
//! assert_eq!(action.parameter("id"), Some("42"));
//!
//! let err = table.resolve(&Method::PUT, "/users/42").unwrap_err();
//! assert_eq!(err.status(), 405);
//! ```

mod builder;
mod core;
mod metadata;
#[cfg(test)]
mod tests;

pub use builder::RouteBuilder;
pub use core::{Action, Route, RouteError, RouteTable};
pub use metadata::{RouteMetadata, ServerMetadata, UriMetadata};
