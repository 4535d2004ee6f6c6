use serde_json::Value;

use crate::content::{parse_media_ranges, MediaRange};
use crate::error::ServiceError;

/// A pluggable wire format.
///
/// Codecs convert between bytes and the dynamic `serde_json::Value` model;
/// typed conversion happens on top through `serde`.
pub trait Codec: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ServiceError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ServiceError>;

    /// Format names selectable via `.{format}` or `?format=`.
    fn supported_formats(&self) -> &[String];

    /// Media ranges this codec answers to. The first one is its canonical type.
    fn supported_media_ranges(&self) -> &[MediaRange];
}

fn ranges(header: &str) -> Vec<MediaRange> {
    parse_media_ranges(Some(header))
}

/// JSON via `serde_json`.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    formats: Vec<String>,
    media_ranges: Vec<MediaRange>,
    pretty: bool,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            formats: vec!["json".to_string()],
            media_ranges: ranges(
                "application/json; charset=UTF-8, application/javascript, text/javascript",
            ),
            pretty: false,
        }
    }

    /// Indent output. Meant for development.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Codec for JsonCodec {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ServiceError> {
        let out = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        out.map_err(|e| ServiceError::serialization(format!("JSON serialization failed: {e}")).with_source(e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ServiceError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(bytes).map_err(|e| {
            ServiceError::deserialization(format!("Malformed JSON request body: {e}")).with_source(e)
        })
    }

    fn supported_formats(&self) -> &[String] {
        &self.formats
    }

    fn supported_media_ranges(&self) -> &[MediaRange] {
        &self.media_ranges
    }
}

/// YAML via `serde_yaml`.
#[derive(Debug, Clone)]
pub struct YamlCodec {
    formats: Vec<String>,
    media_ranges: Vec<MediaRange>,
}

impl Default for YamlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl YamlCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            formats: vec!["yaml".to_string(), "yml".to_string()],
            media_ranges: ranges("application/yaml, application/x-yaml, text/yaml"),
        }
    }
}

impl Codec for YamlCodec {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ServiceError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ServiceError::serialization(format!("YAML serialization failed: {e}")).with_source(e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ServiceError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_yaml::from_slice(bytes).map_err(|e| {
            ServiceError::deserialization(format!("Malformed YAML request body: {e}")).with_source(e)
        })
    }

    fn supported_formats(&self) -> &[String] {
        &self.formats
    }

    fn supported_media_ranges(&self) -> &[MediaRange] {
        &self.media_ranges
    }
}
