use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

use crate::error::ServiceError;
use crate::ids::{CorrelationId, CORRELATION_ID_HEADER};
use crate::router::Route;
use crate::serialization::{SerializationProvider, SerializationSettings};
use crate::url::{ParamVec, UrlMatch, FORMAT_PARAMETER};

/// Maximum number of headers stored inline before spilling to the heap.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage. Names keep their original case; lookups
/// are case-insensitive.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Query parameter or header that lets a `POST` stand in for `PUT` or `DELETE`.
pub const METHOD_TUNNEL: &str = "_method";

/// Parse the query part of a URL into decoded name/value pairs.
///
/// Everything after the first `?` is treated as `application/x-www-form-urlencoded`.
#[must_use]
pub fn parse_query_params(url: &str) -> ParamVec {
    match url.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// An inbound request as seen by routing, processors and handlers.
///
/// One `Request` belongs to exactly one in-flight exchange. It is created by
/// the transport, handed to the pipeline, and dropped once the response has
/// been written.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderVec,
    query_params: ParamVec,
    path_params: ParamVec,
    body: Cursor<Vec<u8>>,
    correlation_id: CorrelationId,
    route: Option<Arc<Route>>,
    attachments: HashMap<String, Value>,
    provider: Option<Arc<SerializationProvider>>,
    serialization: Option<SerializationSettings>,
}

impl Request {
    /// Create a request for `url` (path plus optional query string).
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let url = url.into();
        let query_params = parse_query_params(&url);
        Self {
            method,
            url,
            headers: HeaderVec::new(),
            query_params,
            path_params: ParamVec::new(),
            body: Cursor::new(Vec::new()),
            correlation_id: CorrelationId::new(),
            route: None,
            attachments: HashMap::new(),
            provider: None,
            serialization: None,
        }
    }

    /// Add a header. A valid `X-Correlation-Id` also becomes the correlation id.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Cursor::new(body.into());
        self
    }

    /// Method as received on the wire.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Method used for routing.
    ///
    /// A `POST` carrying `_method=PUT` or `_method=DELETE` (query parameter or
    /// header) is routed as that method. Any other tunnel value on a `POST`
    /// is rejected.
    pub fn effective_method(&self) -> Result<Method, ServiceError> {
        if self.method != Method::POST {
            return Ok(self.method.clone());
        }
        let Some(tunnel) = self
            .query_param(METHOD_TUNNEL)
            .or_else(|| self.header(METHOD_TUNNEL))
        else {
            return Ok(Method::POST);
        };
        if tunnel.eq_ignore_ascii_case("PUT") {
            Ok(Method::PUT)
        } else if tunnel.eq_ignore_ascii_case("DELETE") {
            Ok(Method::DELETE)
        } else if tunnel.eq_ignore_ascii_case("POST") {
            Ok(Method::POST)
        } else {
            Err(ServiceError::bad_request(format!(
                "Method tunnel '{METHOD_TUNNEL}={tunnel}' is not supported. Use PUT or DELETE"
            )))
        }
    }

    /// Full request target including any query string.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(p, _)| p)
    }

    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
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
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name.eq_ignore_ascii_case(CORRELATION_ID_HEADER) {
            self.correlation_id = CorrelationId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
    }

    /// Replace every header called `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.add_header(name, value);
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_params(&self) -> &ParamVec {
        &self.query_params
    }

    /// URL-decoded value extracted from the route template.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    /// Unified lookup: path parameter, then query parameter, then header.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_param(name)
            .or_else(|| self.query_param(name))
            .or_else(|| self.header(name))
    }

    /// Explicit representation format from a `.{format}` suffix or `format` parameter.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.path_param(FORMAT_PARAMETER)
            .or_else(|| self.query_param(FORMAT_PARAMETER))
            .filter(|f| !f.is_empty())
    }

    /// Bind the resolved route and its extracted parameters.
    ///
    /// Values are URL-decoded and also exposed as headers.
    pub fn apply_match(&mut self, route: Arc<Route>, url_match: UrlMatch) {
        for (name, raw) in url_match.into_params() {
            let value = decode(&raw);
            self.headers.push((Arc::clone(&name), value.clone()));
            self.path_params.push((name, value));
        }
        debug!(
            route = route.name().unwrap_or(""),
            params = self.path_params.len(),
            "Route bound to request"
        );
        self.route = Some(route);
    }

    #[must_use]
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    /// True when the resolved route carries `flag`.
    #[must_use]
    pub fn is_flagged(&self, flag: &str) -> bool {
        self.route.as_ref().is_some_and(|r| r.is_flagged(flag))
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.body.get_ref()
    }

    /// Reader over the body. Its position is shared with [`Request::reset_body`].
    pub fn body_reader(&mut self) -> &mut impl Read {
        &mut self.body
    }

    pub fn reset_body(&mut self) {
        self.body.set_position(0);
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.get_ref().is_empty()
    }

    /// Deserialize the body through the codec negotiated on `Content-Type`.
    pub fn body_as<T: DeserializeOwned>(&mut self) -> Result<T, ServiceError> {
        let settings = self.request_serialization()?;
        let value = settings.deserialize(self.body.get_ref())?;
        serde_json::from_value(value).map_err(|e| {
            ServiceError::deserialization(format!("Request body does not match expected shape: {e}"))
                .with_source(e)
        })
    }

    /// Request-direction serialization settings, resolved once and cached.
    pub fn request_serialization(&mut self) -> Result<SerializationSettings, ServiceError> {
        if let Some(settings) = &self.serialization {
            return Ok(settings.clone());
        }
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| ServiceError::internal("No serialization provider bound to request"))?;
        let settings = provider.resolve_request(self)?;
        self.serialization = Some(settings.clone());
        Ok(settings)
    }

    pub(crate) fn bind_provider(&mut self, provider: Arc<SerializationProvider>) {
        self.provider = Some(provider);
    }

    #[must_use]
    pub fn attachment(&self, name: &str) -> Option<&Value> {
        self.attachments.get(name)
    }

    pub fn put_attachment(&mut self, name: impl Into<String>, value: Value) {
        self.attachments.insert(name.into(), value);
    }
}
