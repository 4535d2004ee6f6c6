//! # Server Module
//!
//! Request and response types exchanged with the transport layer, and the
//! [`ResponseWriter`] boundary through which finished responses leave the
//! pipeline.
//!
//! The transport (socket handling, HTTP parsing) is not part of this crate.
//! It builds a [`Request`], passes it to
//! [`Pipeline::process`](crate::dispatcher::Pipeline::process) with a writer
//! for the connection, and closes the connection when told to.

mod request;
mod response;
#[cfg(test)]
mod tests;
mod writer;

pub use request::{parse_query_params, HeaderVec, Request, MAX_INLINE_HEADERS, METHOD_TUNNEL};
pub use response::{Body, Response};
pub use writer::{
    status_reason, BufferedWriter, Http1Writer, ResponseWriter, WrittenResponse,
};
