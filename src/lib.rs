//! # restline
//!
//! **restline** is the request-dispatch core of a REST service: it takes a
//! parsed HTTP request, finds the handler that owns it, negotiates the
//! representation on both sides of the exchange, and drives the request
//! through a fixed sequence of phases until a response has been written.
//!
//! The transport is out of scope. Socket handling and HTTP parsing live in
//! whatever server embeds the pipeline; it hands over a
//! [`server::Request`] and a [`server::ResponseWriter`] per exchange.
//!
//! ## Architecture
//!
//! - **[`url`]** - URL templates (`/users/{id}.{format}`) and raw regex matchers
//! - **[`router`]** - Route declarations and the method-indexed route table
//! - **[`content`]** - Media-range parsing and `Accept` ranking
//! - **[`serialization`]** - Codecs, response wrappers and format negotiation
//! - **[`dispatcher`]** - The request pipeline state machine
//! - **[`middleware`]** - Preprocessors, postprocessors and message observers
//! - **[`query`]** - Paging, sorting and filtering conventions
//! - **[`server`]** - Request/response types and the writer boundary
//! - **[`error`]** - [`ServiceError`] and exception classification
//! - **[`config`]** / **[`logging`]** - Server settings and `tracing` setup
//!
//! ## Request flow
//!
//! ```text
//! Request ─▶ Received ─▶ RouteResolved ─▶ PreProcessed ─▶ Invoked
//!        ─▶ PostProcessed ─▶ Serialized ─▶ Written ─▶ Complete
//!                       └───────▶ Failed ─▶ (error response) ─▶ Complete
//! ```
//!
//! Any failure moves the exchange to `Failed`, where it is classified into a
//! [`ServiceError`], rendered through the negotiated codec, and written. Finally
//! processors run exactly once on both paths.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use restline::dispatcher::Pipeline;
//! use restline::router::RouteBuilder;
//! use restline::server::Request;
//! use restline::ServerConfig;
//! use serde_json::json;
//!
//! let pipeline = Pipeline::builder(ServerConfig::default())
//!     .route(
//!         RouteBuilder::new("/users/{id}.{format}", |req, _res| {
//!             Ok(Some(json!({ "id": req.param("id") })))
//!         })
//!         .method(Method::GET),
//!     )
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let res = pipeline.handle(Request::new(Method::GET, "/users/7"));
//! assert_eq!(res.status(), 200);
//! assert_eq!(res.content_type(), Some("application/json; charset=UTF-8"));
//! ```

pub mod config;
pub mod content;
pub mod dispatcher;
pub mod error;
pub mod flags;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod query;
pub mod router;
pub mod serialization;
pub mod server;
pub mod url;

pub use config::ServerConfig;
pub use dispatcher::{Disposition, Handler, HandlerResult, Pipeline, PipelineBuilder};
pub use error::{ErrorKind, ExceptionMapper, ServiceError};
pub use ids::CorrelationId;
pub use logging::{init_logging, LogConfig};
pub use router::{Route, RouteBuilder, RouteTable};
pub use server::{Request, Response, ResponseWriter};
