use http::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::codec::{Codec, JsonCodec, YamlCodec};
use super::wrapper::{ErrorResponseWrapper, JsendResponseWrapper, ResponseWrapper};
use crate::content::{best_match, parse_media_ranges, MediaRange};
use crate::error::ServiceError;
use crate::server::{Request, Response};

/// Errors raised while assembling a [`SerializationProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Two processors claim the same format name.
    DuplicateFormat(String),
    /// The requested default format has no processor.
    UnknownFormat(String),
    /// No processors registered.
    Empty,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::DuplicateFormat(format) => {
                write!(f, "format '{format}' is already registered")
            }
            ProviderError::UnknownFormat(format) => {
                write!(f, "no processor registered for default format '{format}'")
            }
            ProviderError::Empty => write!(f, "no serialization processors registered"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// A codec paired with a response wrapper.
#[derive(Clone)]
pub struct ResponseProcessor {
    codec: Arc<dyn Codec>,
    wrapper: Arc<dyn ResponseWrapper>,
}

impl ResponseProcessor {
    pub fn new(codec: impl Codec + 'static, wrapper: impl ResponseWrapper + 'static) -> Self {
        Self {
            codec: Arc::new(codec),
            wrapper: Arc::new(wrapper),
        }
    }

    /// JSON with bodies passed through and failures enveloped.
    #[must_use]
    pub fn json() -> Self {
        Self::new(JsonCodec::new(), ErrorResponseWrapper)
    }

    /// JSON with every response in a JSend envelope.
    #[must_use]
    pub fn jsend_json() -> Self {
        Self::new(JsonCodec::new(), JsendResponseWrapper)
    }

    #[must_use]
    pub fn yaml() -> Self {
        Self::new(YamlCodec::new(), ErrorResponseWrapper)
    }

    #[must_use]
    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    #[must_use]
    pub fn wrapper(&self) -> &dyn ResponseWrapper {
        self.wrapper.as_ref()
    }

    #[must_use]
    pub fn supported_formats(&self) -> &[String] {
        self.codec.supported_formats()
    }

    #[must_use]
    pub fn supported_media_ranges(&self) -> &[MediaRange] {
        self.codec.supported_media_ranges()
    }

    /// Canonical media type: the codec's first supported range.
    #[must_use]
    pub fn default_media_type(&self) -> Option<String> {
        self.codec
            .supported_media_ranges()
            .first()
            .map(MediaRange::as_media_type)
    }

    /// Wrap then encode. `None` when the wrapper yields nothing to write.
    pub fn serialize(&self, response: &Response) -> Result<Option<Vec<u8>>, ServiceError> {
        let wrapped = self.wrapper.wrap(response);
        if wrapped.is_null() && !self.wrapper.adds_body_content(response) {
            return Ok(None);
        }
        self.codec.serialize(&wrapped).map(Some)
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, ServiceError> {
        self.codec.deserialize(bytes)
    }
}

impl fmt::Debug for ResponseProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseProcessor")
            .field("formats", &self.codec.supported_formats())
            .finish_non_exhaustive()
    }
}

/// Negotiated outcome: the media type to advertise and the processor to use.
#[derive(Debug, Clone)]
pub struct SerializationSettings {
    media_type: String,
    processor: Arc<ResponseProcessor>,
}

impl SerializationSettings {
    #[must_use]
    pub fn new(media_type: impl Into<String>, processor: Arc<ResponseProcessor>) -> Self {
        Self {
            media_type: media_type.into(),
            processor,
        }
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    #[must_use]
    pub fn processor(&self) -> &ResponseProcessor {
        &self.processor
    }

    pub fn serialize(&self, response: &Response) -> Result<Option<Vec<u8>>, ServiceError> {
        self.processor.serialize(response)
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, ServiceError> {
        self.processor.deserialize(bytes)
    }
}

/// Registry of processors keyed by format name and media type.
///
/// Negotiation order for responses: explicit format (URL suffix or `format`
/// parameter), then `Accept`, then the route's default format, then the
/// provider default.
#[derive(Default)]
pub struct SerializationProvider {
    processors: Vec<Arc<ResponseProcessor>>,
    by_format: HashMap<String, Arc<ResponseProcessor>>,
    by_media_type: HashMap<String, Arc<ResponseProcessor>>,
    supported_ranges: Vec<MediaRange>,
    default: Option<Arc<ResponseProcessor>>,
}

impl SerializationProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON (default) and YAML.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut provider = Self::new();
        provider.processors.push(Arc::new(ResponseProcessor::json()));
        provider.processors.push(Arc::new(ResponseProcessor::yaml()));
        provider.reindex();
        provider.default = provider.processors.first().cloned();
        provider
    }

    /// Register a processor. The first one added becomes the default unless
    /// a later one is added with `is_default`.
    pub fn add(
        &mut self,
        processor: ResponseProcessor,
        is_default: bool,
    ) -> Result<&mut Self, ProviderError> {
        if let Some(dup) = processor
            .supported_formats()
            .iter()
            .find(|f| self.by_format.contains_key(f.as_str()))
        {
            return Err(ProviderError::DuplicateFormat(dup.clone()));
        }
        let processor = Arc::new(processor);
        self.processors.push(Arc::clone(&processor));
        self.reindex();
        if is_default || self.default.is_none() {
            self.default = Some(processor);
        }
        Ok(self)
    }

    pub fn set_default_format(&mut self, format: &str) -> Result<(), ProviderError> {
        let processor = self
            .by_format
            .get(format)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownFormat(format.to_string()))?;
        self.default = Some(processor);
        Ok(())
    }

    fn reindex(&mut self) {
        self.by_format.clear();
        self.by_media_type.clear();
        self.supported_ranges.clear();
        for processor in &self.processors {
            for format in processor.supported_formats() {
                self.by_format.insert(format.clone(), Arc::clone(processor));
            }
            for range in processor.supported_media_ranges() {
                self.by_media_type
                    .entry(range.as_media_type())
                    .or_insert_with(|| Arc::clone(processor));
                self.supported_ranges.push(range.clone());
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Every registered format name, in registration order.
    #[must_use]
    pub fn supported_formats(&self) -> Vec<String> {
        self.processors
            .iter()
            .flat_map(|p| p.supported_formats().iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn supported_media_ranges(&self) -> &[MediaRange] {
        &self.supported_ranges
    }

    #[must_use]
    pub fn default_format(&self) -> Option<&str> {
        self.default
            .as_ref()
            .and_then(|p| p.supported_formats().first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn processor_for_format(&self, format: &str) -> Option<&Arc<ResponseProcessor>> {
        self.by_format.get(format)
    }

    fn default_settings(&self) -> Result<SerializationSettings, ServiceError> {
        let processor = self
            .default
            .as_ref()
            .ok_or_else(|| ServiceError::internal("No serialization processors registered"))?;
        Ok(settings_for(processor))
    }

    fn supported_media_types(&self) -> String {
        self.supported_ranges
            .iter()
            .map(MediaRange::as_media_type)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn sorted_formats(&self) -> String {
        let mut formats: Vec<&str> = self.by_format.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats.join(", ")
    }

    /// Codec for reading the request body.
    ///
    /// An explicit format must name a registered codec. Otherwise the
    /// `Content-Type` header is matched against supported ranges; a header
    /// that matches nothing is rejected, an absent one gets the default.
    pub fn resolve_request(&self, request: &Request) -> Result<SerializationSettings, ServiceError> {
        if let Some(format) = request.format() {
            let processor = self.by_format.get(format).ok_or_else(|| {
                ServiceError::not_acceptable(format!(
                    "Requested representation format not supported: {format}. Supported formats: {}",
                    self.sorted_formats()
                ))
            })?;
            return Ok(settings_for(processor));
        }

        let content_type = request.header(CONTENT_TYPE.as_str()).filter(|v| !v.trim().is_empty());
        let ranges = parse_media_ranges(content_type);
        if ranges.is_empty() {
            return self.default_settings();
        }
        match best_match(&self.supported_ranges, &ranges) {
            Some(media_type) => {
                let processor = self.by_media_type.get(&media_type).ok_or_else(|| {
                    ServiceError::internal(format!("No processor indexed for {media_type}"))
                })?;
                Ok(SerializationSettings::new(media_type, Arc::clone(processor)))
            }
            None => Err(ServiceError::unsupported_media_type(format!(
                "{} (Supported Media Types: {})",
                content_type.unwrap_or_default(),
                self.supported_media_types()
            ))),
        }
    }

    /// Codec and media type for writing the response.
    ///
    /// Settings already cached on `response` are returned as-is unless
    /// `force` is set. With `force` set, every negotiation failure falls back
    /// to the default processor. The error path uses this so a failure can
    /// always be rendered.
    pub fn resolve_response(
        &self,
        request: &Request,
        response: &Response,
        force: bool,
    ) -> Result<SerializationSettings, ServiceError> {
        if !force {
            if let Some(cached) = response.serialization_settings() {
                return Ok(cached.clone());
            }
        }
        let mut format = request.format().map(str::to_string);
        if format.is_none() && response.has_error() && request.route().is_none() {
            // Routing never ran, so the suffix was not extracted.
            format = format_from_url(request.path()).map(str::to_string);
        }

        if let Some(format) = format {
            let route_allows = request.route().map_or(true, |r| r.supports_format(&format));
            match self.by_format.get(&format) {
                Some(processor) if route_allows => return Ok(settings_for(processor)),
                _ if !force => {
                    return Err(ServiceError::bad_request(format!(
                        "Requested representation format not supported: {format}. Supported formats: {}",
                        self.sorted_formats()
                    )));
                }
                _ => debug!(format = %format, "Unsupported format ignored on forced resolution"),
            }
        } else {
            let accept = request.header(ACCEPT.as_str()).filter(|v| !v.trim().is_empty());
            let ranges = parse_media_ranges(accept);
            if ranges.is_empty() {
                if let Some(processor) = request
                    .route()
                    .and_then(|r| r.default_format())
                    .and_then(|f| self.by_format.get(f))
                {
                    return Ok(settings_for(processor));
                }
            } else if let Some(media_type) = best_match(&self.supported_ranges, &ranges) {
                if let Some(processor) = self.by_media_type.get(&media_type) {
                    return Ok(SerializationSettings::new(media_type, Arc::clone(processor)));
                }
            } else if !force {
                return Err(ServiceError::not_acceptable(format!(
                    "Supported Media Types: {}",
                    self.supported_media_types()
                )));
            } else {
                warn!(
                    accept = accept.unwrap_or_default(),
                    "No acceptable media type, using default"
                );
            }
        }

        self.default_settings()
    }
}

fn settings_for(processor: &Arc<ResponseProcessor>) -> SerializationSettings {
    let media_type = processor
        .default_media_type()
        .unwrap_or_else(|| crate::content::TEXT_PLAIN.to_string());
    SerializationSettings::new(media_type, Arc::clone(processor))
}

/// Extension of the last path segment, if any.
fn format_from_url(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

impl fmt::Debug for SerializationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationProvider")
            .field("formats", &self.supported_formats())
            .field("default", &self.default_format())
            .finish()
    }
}
