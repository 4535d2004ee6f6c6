//! # Error Module
//!
//! [`ServiceError`] is the one failure type the pipeline understands. Every
//! failure raised while handling a request is classified into one before the
//! error response is produced:
//!
//! 1. A `ServiceError` anywhere in the `anyhow` error passes through unchanged.
//! 2. Otherwise the [`ExceptionMapper`] may translate a known error type.
//! 3. Anything else becomes [`ErrorKind::Internal`] carrying the root cause's message.
//!
//! Each kind maps to a status code, and an error may carry extra response
//! headers (`Allow` for 405, `WWW-Authenticate` for 401).

use http::Method;
use std::error::Error as StdError;
use std::fmt;
use tracing::error;

use crate::server::Response;

/// Classification of a request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Conflict,
    UnsupportedMediaType,
    /// The assembled response breaks HTTP body/header rules. Always a bug upstream.
    SpecificationViolation,
    Serialization,
    Deserialization,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::BadRequest | ErrorKind::Deserialization => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::NotAcceptable => 406,
            ErrorKind::Conflict => 409,
            ErrorKind::UnsupportedMediaType => 415,
            ErrorKind::SpecificationViolation | ErrorKind::Serialization | ErrorKind::Internal => {
                500
            }
        }
    }

    /// Stable name used in error envelopes.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::NotAcceptable => "NotAcceptable",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::UnsupportedMediaType => "UnsupportedMediaType",
            ErrorKind::SpecificationViolation => "SpecificationViolation",
            ErrorKind::Serialization => "Serialization",
            ErrorKind::Deserialization => "Deserialization",
            ErrorKind::Internal => "Internal",
        }
    }

    #[must_use]
    pub fn is_server_error(self) -> bool {
        self.status() >= 500
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recognized request failure with an intended status and response headers.
#[derive(Debug)]
pub struct ServiceError {
    kind: ErrorKind,
    message: String,
    id: ulid::Ulid,
    allowed_methods: Vec<Method>,
    headers: Vec<(String, String)>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            id: ulid::Ulid::new(),
            allowed_methods: Vec::new(),
            headers: Vec::new(),
            source: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// 405 carrying the methods that do match. The list is sorted and deduplicated.
    pub fn method_not_allowed(url: &str, mut allowed: Vec<Method>) -> Self {
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allowed.dedup();
        let joined = join_methods(&allowed);
        let mut err = Self::new(
            ErrorKind::MethodNotAllowed,
            format!("{url} (Allowed methods: {joined})"),
        );
        err.allowed_methods = allowed;
        err
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAcceptable, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMediaType, message)
    }

    pub fn specification_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SpecificationViolation, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialization, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Add a header to set on the error response.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Unique id reported in error envelopes so a response can be tied to logs.
    #[must_use]
    pub fn id(&self) -> ulid::Ulid {
        self.id
    }

    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Apply this error's headers to the outgoing response.
    pub fn augment_response(&self, response: &mut Response) {
        if self.kind == ErrorKind::MethodNotAllowed {
            response.set_header(http::header::ALLOW.as_str(), join_methods(&self.allowed_methods));
        }
        for (name, value) in &self.headers {
            response.set_header(name, value.clone());
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for ServiceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn StdError + 'static))
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

type Mapping = Box<dyn Fn(&anyhow::Error) -> Option<ServiceError> + Send + Sync>;

/// Translates application error types into [`ServiceError`]s.
///
/// Mappings are tried in registration order. Each one searches the whole
/// error chain for its type.
#[derive(Default)]
pub struct ExceptionMapper {
    mappings: Vec<Mapping>,
}

impl ExceptionMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping for error type `E`.
    ///
    /// ```rust
    /// use restline::error::{ErrorKind, ExceptionMapper, ServiceError};
    ///
    /// let mut mapper = ExceptionMapper::new();
    /// mapper.map::<std::num::ParseIntError, _>(|e| ServiceError::bad_request(e.to_string()));
    ///
    /// let err = anyhow::Error::new("x".parse::<i32>().unwrap_err());
    /// assert_eq!(mapper.resolve(&err).unwrap().kind(), ErrorKind::BadRequest);
    /// ```
    pub fn map<E, F>(&mut self, f: F) -> &mut Self
    where
        E: StdError + Send + Sync + 'static,
        F: Fn(&E) -> ServiceError + Send + Sync + 'static,
    {
        self.mappings.push(Box::new(move |err: &anyhow::Error| {
            err.chain().find_map(|cause| cause.downcast_ref::<E>()).map(&f)
        }));
        self
    }

    #[must_use]
    pub fn resolve(&self, err: &anyhow::Error) -> Option<ServiceError> {
        self.mappings.iter().find_map(|m| m(err))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl fmt::Debug for ExceptionMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionMapper")
            .field("mappings", &self.mappings.len())
            .finish()
    }
}

/// Reduce any failure to a [`ServiceError`].
///
/// Unrecognized failures are logged with their root cause and become
/// [`ErrorKind::Internal`] with the root cause's message.
#[must_use]
pub fn classify(err: anyhow::Error, mapper: &ExceptionMapper) -> ServiceError {
    let err = match err.downcast::<ServiceError>() {
        Ok(service_error) => return service_error,
        Err(err) => err,
    };
    if let Some(nested) = err.chain().find_map(|c| c.downcast_ref::<ServiceError>()) {
        let mut copy = ServiceError::new(nested.kind, nested.message.clone());
        copy.allowed_methods = nested.allowed_methods.clone();
        copy.headers = nested.headers.clone();
        copy.id = nested.id;
        return copy;
    }
    if let Some(mapped) = mapper.resolve(&err) {
        return mapped;
    }
    let root = err.root_cause().to_string();
    error!(error = %err, root_cause = %root, "Unhandled failure classified as internal error");
    ServiceError::internal(root).with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[derive(Debug)]
    struct Missing(&'static str);

    impl fmt::Display for Missing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "missing {}", self.0)
        }
    }

    impl StdError for Missing {}

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::not_found("x").status(), 404);
        assert_eq!(ServiceError::deserialization("x").status(), 400);
        assert_eq!(ServiceError::specification_violation("x").status(), 500);
        assert_eq!(ServiceError::unsupported_media_type("x").status(), 415);
    }

    #[test]
    fn test_method_not_allowed_sorted_and_augments_allow() {
        let err = ServiceError::method_not_allowed("/a", vec![Method::PUT, Method::GET, Method::GET]);
        assert_eq!(err.allowed_methods(), &[Method::GET, Method::PUT]);
        let mut res = Response::new();
        err.augment_response(&mut res);
        assert_eq!(res.header("allow"), Some("GET,PUT"));
    }

    #[test]
    fn test_extra_headers_applied() {
        let err = ServiceError::unauthorized("nope").with_header("WWW-Authenticate", "Basic realm=\"x\"");
        let mut res = Response::new();
        err.augment_response(&mut res);
        assert_eq!(res.header("www-authenticate"), Some("Basic realm=\"x\""));
    }

    #[test]
    fn test_classify_passes_service_error_through() {
        let err = anyhow::Error::new(ServiceError::conflict("dup"));
        let classified = classify(err, &ExceptionMapper::new());
        assert_eq!(classified.kind(), ErrorKind::Conflict);
        assert_eq!(classified.message(), "dup");
    }

    #[test]
    fn test_classify_finds_service_error_under_context() {
        let err = Err::<(), _>(ServiceError::forbidden("no"))
            .context("while checking")
            .unwrap_err();
        let classified = classify(err, &ExceptionMapper::new());
        assert_eq!(classified.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_classify_uses_mapper() {
        let mut mapper = ExceptionMapper::new();
        mapper.map::<Missing, _>(|e| ServiceError::not_found(e.to_string()));
        let err = anyhow::Error::new(Missing("widget")).context("loading");
        let classified = classify(err, &mapper);
        assert_eq!(classified.kind(), ErrorKind::NotFound);
        assert_eq!(classified.message(), "missing widget");
    }

    #[test]
    fn test_classify_unknown_uses_root_cause() {
        let err = anyhow::Error::new(Missing("disk")).context("outer layer");
        let classified = classify(err, &ExceptionMapper::new());
        assert_eq!(classified.kind(), ErrorKind::Internal);
        assert_eq!(classified.message(), "missing disk");
        assert!(classified.source().is_some());
    }
}
