//! # Serialization Module
//!
//! Pluggable codecs and response wrappers, and the provider that picks one
//! per exchange.
//!
//! A [`ResponseProcessor`] pairs a [`Codec`] (bytes to and from
//! `serde_json::Value`) with a [`ResponseWrapper`] (how a response is
//! shaped before encoding). The [`SerializationProvider`] indexes
//! processors by format name and media type and resolves
//! [`SerializationSettings`] for request bodies and responses.
//!
//! ```rust
//! use restline::serialization::{ResponseProcessor, SerializationProvider};
//!
//! let mut provider = SerializationProvider::new();
//! provider.add(ResponseProcessor::json(), true).unwrap();
//! provider.add(ResponseProcessor::yaml(), false).unwrap();
//! assert_eq!(provider.default_format(), Some("json"));
//! assert!(provider.add(ResponseProcessor::json(), false).is_err());
//! ```

mod codec;
mod provider;
mod wrapper;

pub use codec::{Codec, JsonCodec, YamlCodec};
pub use provider::{ProviderError, ResponseProcessor, SerializationProvider, SerializationSettings};
pub use wrapper::{ErrorResponseWrapper, JsendResponseWrapper, RawResponseWrapper, ResponseWrapper};
