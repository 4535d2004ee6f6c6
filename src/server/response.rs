use http::header::{CONTENT_TYPE, LOCATION};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

use super::HeaderVec;
use crate::error::ServiceError;
use crate::serialization::SerializationSettings;

/// Body assigned by a handler or processor.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// Structured value, run through the wrapper and codec when serialized.
    Value(Value),
    /// Bytes emitted as-is.
    Raw(Vec<u8>),
}

impl Body {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Body::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// The outbound response under construction.
///
/// Defaults to `200`, no body, and serialization enabled.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: HeaderVec,
    body: Body,
    output: Option<Vec<u8>>,
    is_serialized: bool,
    error: Option<ServiceError>,
    serialization: Option<SerializationSettings>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Body::Empty,
            output: None,
            is_serialized: true,
            error: None,
            serialization: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_created(&mut self) {
        self.status = 201;
    }

    pub fn set_no_content(&mut self) {
        self.status = 204;
    }

    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Replace any existing header of the same name (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.add_header(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    pub fn set_content_type(&mut self, value: impl Into<String>) {
        self.set_header(CONTENT_TYPE.as_str(), value);
    }

    pub fn add_location(&mut self, url: impl Into<String>) {
        self.set_header(LOCATION.as_str(), url);
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, value: Value) {
        self.body = Body::Value(value);
    }

    /// Bytes written verbatim; also turns serialization off.
    pub fn set_raw_body(&mut self, bytes: impl Into<Vec<u8>>) {
        self.body = Body::Raw(bytes.into());
        self.is_serialized = false;
    }

    pub fn clear_body(&mut self) {
        self.body = Body::Empty;
        self.output = None;
    }

    /// A body was assigned or serialized output exists.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty() || self.output.as_ref().is_some_and(|o| !o.is_empty())
    }

    #[must_use]
    pub fn is_serialized(&self) -> bool {
        self.is_serialized
    }

    pub fn no_serialization(&mut self) {
        self.is_serialized = false;
    }

    pub fn set_serialized(&mut self, value: bool) {
        self.is_serialized = value;
    }

    #[must_use]
    pub fn error(&self) -> Option<&ServiceError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn set_error(&mut self, error: ServiceError) {
        self.error = Some(error);
    }

    #[must_use]
    pub fn serialization_settings(&self) -> Option<&SerializationSettings> {
        self.serialization.as_ref()
    }

    pub fn set_serialization_settings(&mut self, settings: SerializationSettings) {
        self.serialization = Some(settings);
    }

    #[must_use]
    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn set_output(&mut self, bytes: Vec<u8>) {
        self.output = Some(bytes);
    }

    /// Bytes to put on the wire.
    ///
    /// Serialized output wins. Otherwise raw bytes go out unchanged, a string
    /// value goes out as its text, and any other value as compact JSON.
    #[must_use]
    pub fn wire_body(&self) -> Cow<'_, [u8]> {
        if let Some(output) = &self.output {
            return Cow::Borrowed(output.as_slice());
        }
        match &self.body {
            Body::Empty => Cow::Borrowed(&[]),
            Body::Raw(bytes) => Cow::Borrowed(bytes.as_slice()),
            Body::Value(Value::String(s)) => Cow::Borrowed(s.as_bytes()),
            Body::Value(other) => Cow::Owned(other.to_string().into_bytes()),
        }
    }
}
