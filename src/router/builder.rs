use http::Method;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::core::{Route, RouteError};
use crate::dispatcher::{Handler, HandlerResult};
use crate::server::{Request, Response};
use crate::url::UrlMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    Template,
    Regex,
}

/// Declarative route definition.
///
/// One builder produces a [`Route`] per method. With no method declared it
/// registers `GET`, `POST`, `PUT` and `DELETE`.
///
/// ```rust
/// use http::Method;
/// use restline::router::{RouteBuilder, RouteTable};
///
/// let mut table = RouteTable::new();
/// table
///     .add(
///         RouteBuilder::new("/api/{v}/widgets/{id}.{format}", |_req, _res| {
///             Ok(Some(serde_json::json!({"ok": true})))
///         })
///         .method(Method::GET)
///         .name("widget"),
///     )
///     .unwrap();
/// assert_eq!(table.named_url("widget", &Method::GET).as_deref(), Some("/api/{v}/widgets/{id}.{format}"));
/// ```
pub struct RouteBuilder {
    pattern: String,
    kind: PatternKind,
    handler: Arc<dyn Handler>,
    methods: Vec<Method>,
    aliases: Vec<String>,
    name: Option<String>,
    flags: HashSet<String>,
    parameters: HashMap<String, Value>,
    should_serialize: bool,
    formats: Vec<String>,
    default_format: Option<String>,
    base_url: String,
}

impl RouteBuilder {
    /// Route matched by a `{placeholder}` template, served by a closure.
    pub fn new<F>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        Self::with_kind(pattern.into(), PatternKind::Template, Arc::new(handler))
    }

    /// Route matched by a raw regex; groups bind as `regexGroup0..n`.
    pub fn regex<F>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        Self::with_kind(pattern.into(), PatternKind::Regex, Arc::new(handler))
    }

    /// Template route served by a [`Handler`] implementation.
    pub fn with_handler(pattern: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::with_kind(pattern.into(), PatternKind::Template, Arc::new(handler))
    }

    /// Share one handler between several declarations.
    pub fn shared(pattern: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self::with_kind(pattern.into(), PatternKind::Template, handler)
    }

    fn with_kind(pattern: String, kind: PatternKind, handler: Arc<dyn Handler>) -> Self {
        Self {
            pattern,
            kind,
            handler,
            methods: Vec::new(),
            aliases: Vec::new(),
            name: None,
            flags: HashSet::new(),
            parameters: HashMap::new(),
            should_serialize: true,
            formats: Vec::new(),
            default_format: None,
            base_url: String::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    #[must_use]
    pub fn methods(self, methods: impl IntoIterator<Item = Method>) -> Self {
        methods.into_iter().fold(self, RouteBuilder::method)
    }

    /// Additional pattern, tried after the primary one. Uses the same pattern kind.
    #[must_use]
    pub fn alias(mut self, pattern: impl Into<String>) -> Self {
        self.aliases.push(pattern.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        if !self.formats.contains(&format) {
            self.formats.push(format);
        }
        self
    }

    #[must_use]
    pub fn default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = Some(format.into());
        self
    }

    /// Emit handler output without running it through a codec.
    #[must_use]
    pub fn no_serialization(mut self) -> Self {
        self.should_serialize = false;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use `base_url` unless one was set explicitly.
    pub(crate) fn default_base_url(mut self, base_url: &str) -> Self {
        if self.base_url.is_empty() {
            self.base_url = base_url.to_string();
        }
        self
    }

    fn compile(&self, pattern: &str) -> Result<UrlMatcher, RouteError> {
        let compiled = match self.kind {
            PatternKind::Template => UrlMatcher::template(pattern),
            PatternKind::Regex => UrlMatcher::regex(pattern),
        };
        compiled.map_err(|source| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
    }

    /// One route per declared method, in declaration order.
    pub fn build(self) -> Result<Vec<Route>, RouteError> {
        let matcher = self.compile(&self.pattern)?;
        let aliases = self
            .aliases
            .iter()
            .map(|a| self.compile(a))
            .collect::<Result<Vec<_>, _>>()?;

        let methods = if self.methods.is_empty() {
            vec![Method::GET, Method::POST, Method::PUT, Method::DELETE]
        } else {
            self.methods.clone()
        };

        Ok(methods
            .into_iter()
            .map(|method| Route {
                matcher: matcher.clone(),
                aliases: aliases.clone(),
                method,
                handler: Arc::clone(&self.handler),
                name: self.name.clone(),
                flags: self.flags.clone(),
                parameters: self.parameters.clone(),
                should_serialize: self.should_serialize,
                formats: self.formats.clone(),
                default_format: self.default_format.clone(),
                base_url: self.base_url.clone(),
            })
            .collect())
    }
}
