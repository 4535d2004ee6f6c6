//! # Middleware Module
//!
//! Extension points around the handler:
//!
//! - [`Preprocessor`]: runs on the request after routing; an error aborts
//!   the exchange.
//! - [`Postprocessor`]: runs on request and response after the handler.
//!   The same trait backs the finally chain, which also runs on failures.
//! - [`MessageObserver`]: lifecycle notifications, never affects the outcome.
//!
//! Registered processors are shared by every request thread, so any state
//! they keep must be concurrency-safe (atomics, `DashMap`).
//!
//! Built-ins: [`BasicAuthPreprocessor`], [`LoggingObserver`] and
//! [`MetricsObserver`].

mod auth;
mod core;
mod logging;
mod metrics;

pub use auth::{BasicAuthPreprocessor, PASSWORD_ATTACHMENT, USERNAME_ATTACHMENT};
pub use core::{MessageObserver, Postprocessor, Preprocessor};
pub use metrics::MetricsObserver;
pub use logging::LoggingObserver;
