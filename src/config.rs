//! # Configuration Module
//!
//! [`ServerConfig`] is the one configuration value threaded through pipeline
//! construction. It is read once at startup and never changes afterwards.
//!
//! ## Sources
//!
//! - YAML, from a string or a file. Missing keys take their defaults.
//! - Environment variables, alone or layered over a file.
//!
//! ## Environment Variables
//!
//! | Variable                     | Field               |
//! |------------------------------|---------------------|
//! | `RESTLINE_NAME`              | `name`              |
//! | `RESTLINE_PORT`              | `port`              |
//! | `RESTLINE_BASE_URL`          | `base_url`          |
//! | `RESTLINE_ENFORCE_HTTP_SPEC` | `enforce_http_spec` |
//! | `RESTLINE_DEFAULT_FORMAT`    | `default_format`    |
//! | `RESTLINE_MAX_BODY_BYTES`    | `max_body_bytes`    |
//!
//! Unparseable numeric or boolean values are ignored with a warning.
//!
//! ```rust
//! use restline::config::ServerConfig;
//!
//! let config = ServerConfig::from_yaml_str("name: widgets\nport: 9000\n").unwrap();
//! assert_eq!(config.port, 9000);
//! assert!(config.enforce_http_spec);
//! assert_eq!(config.default_format, "json");
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Default request body limit: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Service name reported in metadata.
    pub name: String,
    pub port: u16,
    /// Prefix for generated URLs, e.g. `https://api.example.com`. Applied to
    /// every route that does not set its own.
    pub base_url: String,
    /// Reject responses that break HTTP/1.1 body and header rules.
    pub enforce_http_spec: bool,
    /// Format used when nothing else was negotiated.
    pub default_format: String,
    /// Larger request bodies are rejected before routing.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "restline".to_string(),
            port: 8081,
            base_url: String::new(),
            enforce_http_spec: true,
            default_format: "json".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("invalid server configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents).with_context(|| format!("in {}", path.display()))
    }

    /// Defaults overridden by `RESTLINE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any `RESTLINE_*` environment variables on top of `self`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = env::var("RESTLINE_NAME") {
            self.name = name;
        }
        if let Some(port) = parsed_var("RESTLINE_PORT") {
            self.port = port;
        }
        if let Ok(base_url) = env::var("RESTLINE_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(enforce) = parsed_var("RESTLINE_ENFORCE_HTTP_SPEC") {
            self.enforce_http_spec = enforce;
        }
        if let Ok(format) = env::var("RESTLINE_DEFAULT_FORMAT") {
            self.default_format = format;
        }
        if let Some(max) = parsed_var("RESTLINE_MAX_BODY_BYTES") {
            self.max_body_bytes = max;
        }
        self
    }
}

fn parsed_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}
