//! # Dispatcher Module
//!
//! The request pipeline: one call per exchange drives a request from arrival
//! to a written response.
//!
//! ## Phases
//!
//! ```text
//! Received -> RouteResolved -> PreProcessed -> Invoked -> PostProcessed
//!          -> Serialized -> (conformance check) -> Written -> Complete
//! ```
//!
//! Any failure before the write jumps to `Failed`. From there the failure is
//! classified into a [`ServiceError`](crate::error::ServiceError), its status
//! and headers are applied, serialization is forced so an error body always
//! exists, the finally chain runs, and the response is written. Post-processors
//! never run after a failure; finally processors always do, exactly once.
//!
//! If the error response itself cannot be written, the pipeline returns
//! [`Disposition::Close`] and the transport must drop the connection.
//!
//! ## Handlers
//!
//! A [`Handler`] receives the request and the response under construction.
//! It may return a body value or set one directly; a body set on the
//! response takes precedence. Handler panics are caught and reported as
//! internal errors.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use restline::config::ServerConfig;
//! use restline::dispatcher::Pipeline;
//! use restline::router::RouteBuilder;
//! use restline::server::Request;
//! use serde_json::json;
//!
//! let pipeline = Pipeline::builder(ServerConfig::default())
//!     .route(
//!         RouteBuilder::new("/api/{v}/widgets/{id}", |req, _res| {
//!             Ok(Some(json!({ "id": req.path_param("id") })))
//!         })
//!         .method(Method::GET),
//!     )
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let response = pipeline.handle(Request::new(Method::GET, "/api/1/widgets/42"));
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.output(), Some(br#"{"id":"42"}"#.as_slice()));
//! ```

pub mod conformance;
mod context;
mod core;
mod handler;

pub use context::{MessageContext, Phase};
pub use core::{Disposition, Pipeline, PipelineBuilder};
pub use handler::{Handler, HandlerResult};
