use http::Method;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::builder::RouteBuilder;
use super::metadata::{RouteMetadata, UriMetadata};
use crate::dispatcher::{Handler, HandlerResult};
use crate::error::ServiceError;
use crate::server::{Request, Response};
use crate::url::{UrlMatch, UrlMatcher, FORMAT_PARAMETER};

/// Failure while building the route table.
#[derive(Debug)]
pub enum RouteError {
    /// The template or regex did not compile.
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    /// Another route already owns this name for the same method.
    DuplicateName { name: String, method: Method },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern { pattern, source } => {
                write!(f, "Invalid route pattern '{pattern}': {source}")
            }
            RouteError::DuplicateName { name, method } => {
                write!(f, "Duplicate route name '{name}' for method {method}")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidPattern { source, .. } => Some(source),
            RouteError::DuplicateName { .. } => None,
        }
    }
}

/// An immutable binding of method + URL matcher to a handler.
///
/// Created once at startup by [`RouteBuilder`] and shared read-only by every
/// request afterwards.
pub struct Route {
    pub(super) matcher: UrlMatcher,
    pub(super) aliases: Vec<UrlMatcher>,
    pub(super) method: Method,
    pub(super) handler: Arc<dyn Handler>,
    pub(super) name: Option<String>,
    pub(super) flags: HashSet<String>,
    pub(super) parameters: HashMap<String, Value>,
    pub(super) should_serialize: bool,
    pub(super) formats: Vec<String>,
    pub(super) default_format: Option<String>,
    pub(super) base_url: String,
}

impl Route {
    /// Try the primary matcher, then each alias in declaration order.
    #[must_use]
    pub fn match_url(&self, url: &str) -> Option<UrlMatch> {
        self.matcher
            .match_url(url)
            .or_else(|| self.aliases.iter().find_map(|a| a.match_url(url)))
    }

    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.match_url(url).is_some()
    }

    /// Run the handler. Routes declared without serialization turn it off on
    /// the response first.
    pub fn invoke(&self, request: &mut Request, response: &mut Response) -> HandlerResult {
        if !self.should_serialize {
            response.no_serialization();
        }
        self.handler.handle(request, response)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn matcher(&self) -> &UrlMatcher {
        &self.matcher
    }

    /// Declared pattern text of the primary matcher.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    /// Base URL followed by the pattern.
    #[must_use]
    pub fn full_pattern(&self) -> String {
        format!("{}{}", self.base_url, self.matcher.pattern())
    }

    #[must_use]
    pub fn aliases(&self) -> &[UrlMatcher] {
        &self.aliases
    }

    #[must_use]
    pub fn parameter_names(&self) -> Vec<&str> {
        self.matcher
            .parameter_names()
            .iter()
            .map(|n| n.as_ref())
            .collect()
    }

    #[must_use]
    pub fn is_flagged(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    #[must_use]
    pub fn flags(&self) -> &HashSet<String> {
        &self.flags
    }

    /// Opaque value attached at declaration time.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    #[must_use]
    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    #[must_use]
    pub fn should_serialize(&self) -> bool {
        self.should_serialize
    }

    #[must_use]
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// A route without a declared format list accepts every format.
    #[must_use]
    pub fn supports_format(&self, format: &str) -> bool {
        self.formats.is_empty() || self.formats.iter().any(|f| f == format)
    }

    #[must_use]
    pub fn default_format(&self) -> Option<&str> {
        self.default_format.as_deref()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Expand the template with `params`, URL-encoding each value.
    ///
    /// A missing `format` drops the `.{format}` suffix; any other missing
    /// parameter yields `None`. Regex routes cannot be expanded.
    #[must_use]
    pub fn url_for(&self, params: &HashMap<&str, &str>) -> Option<String> {
        let UrlMatcher::Template(_) = &self.matcher else {
            return None;
        };
        let mut template = self.matcher.pattern().to_string();
        if !params.contains_key(FORMAT_PARAMETER) {
            if let Some(stripped) = template.strip_suffix(".{format}") {
                template = stripped.to_string();
            }
        }
        for name in self.matcher.parameter_names() {
            let placeholder = format!("{{{name}}}");
            if !template.contains(&placeholder) {
                continue;
            }
            let value = params.get(name.as_ref())?;
            template = template.replace(&placeholder, &urlencoding::encode(value));
        }
        Some(format!("{}{}", self.base_url, template))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.matcher.pattern())
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("should_serialize", &self.should_serialize)
            .finish_non_exhaustive()
    }
}

/// A resolved route and the parameters extracted for one request.
#[derive(Debug, Clone)]
pub struct Action {
    route: Arc<Route>,
    url_match: UrlMatch,
}

impl Action {
    #[must_use]
    pub fn new(route: Arc<Route>, url_match: UrlMatch) -> Self {
        Self { route, url_match }
    }

    #[must_use]
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    #[must_use]
    pub fn url_match(&self) -> &UrlMatch {
        &self.url_match
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.url_match.get(name)
    }

    #[must_use]
    pub fn into_parts(self) -> (Arc<Route>, UrlMatch) {
        (self.route, self.url_match)
    }
}

/// All routes, indexed by method (first match wins), by name + method, and by
/// raw pattern text.
///
/// Populate it during startup, then share it read-only (the pipeline holds it
/// in an `Arc`).
#[derive(Debug, Default)]
pub struct RouteTable {
    by_method: HashMap<Method, Vec<Arc<Route>>>,
    by_name: HashMap<String, HashMap<Method, Arc<Route>>>,
    by_pattern: Vec<(String, Vec<Arc<Route>>)>,
    pattern_index: HashMap<String, usize>,
    count: usize,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Declaration order within a method is match order.
    pub fn add_route(&mut self, route: Route) -> Result<(), RouteError> {
        if let Some(name) = &route.name {
            if self
                .by_name
                .get(name)
                .is_some_and(|m| m.contains_key(&route.method))
            {
                return Err(RouteError::DuplicateName {
                    name: name.clone(),
                    method: route.method.clone(),
                });
            }
        }

        let route = Arc::new(route);
        debug!(
            method = %route.method,
            pattern = %route.pattern(),
            name = route.name().unwrap_or(""),
            "Route registered"
        );

        self.by_method
            .entry(route.method.clone())
            .or_default()
            .push(Arc::clone(&route));

        let pattern = route.pattern().to_string();
        match self.pattern_index.get(&pattern) {
            Some(&i) => self.by_pattern[i].1.push(Arc::clone(&route)),
            None => {
                self.pattern_index.insert(pattern.clone(), self.by_pattern.len());
                self.by_pattern.push((pattern, vec![Arc::clone(&route)]));
            }
        }

        if let Some(name) = &route.name {
            self.by_name
                .entry(name.clone())
                .or_default()
                .insert(route.method.clone(), Arc::clone(&route));
        }
        self.count += 1;
        Ok(())
    }

    /// Build and register every method declared by `builder`.
    pub fn add(&mut self, builder: RouteBuilder) -> Result<&mut Self, RouteError> {
        for route in builder.build()? {
            self.add_route(route)?;
        }
        Ok(self)
    }

    /// First route for `method` whose matcher accepts `url`.
    #[must_use]
    pub fn action_for(&self, method: &Method, url: &str) -> Option<Action> {
        self.routes_for(method)
            .iter()
            .find_map(|r| r.match_url(url).map(|m| Action::new(Arc::clone(r), m)))
    }

    /// Resolve to an action, or fail with `MethodNotAllowed` / `NotFound`.
    ///
    /// A 405 carries every method registered under any pattern that matches
    /// `url`.
    pub fn resolve(&self, method: &Method, url: &str) -> Result<Action, ServiceError> {
        if let Some(action) = self.action_for(method, url) {
            debug!(
                method = %method,
                url = %url,
                pattern = %action.route().pattern(),
                "Route resolved"
            );
            return Ok(action);
        }

        let allowed = self.matching_methods(url);
        if !allowed.is_empty() {
            return Err(ServiceError::method_not_allowed(url, allowed));
        }
        Err(ServiceError::not_found(format!("Unresolvable URL: {url}")))
    }

    /// Resolve using the request's effective method and full URL.
    pub fn resolve_request(&self, request: &Request) -> Result<Action, ServiceError> {
        let method = request.effective_method()?;
        self.resolve(&method, request.url())
    }

    /// Methods of the routes in the first pattern group that has a route
    /// matching `url`. Aliases are checked per route.
    #[must_use]
    pub fn allowed_methods(&self, url: &str) -> Vec<Method> {
        self.by_pattern
            .iter()
            .map(|(_, routes)| {
                routes
                    .iter()
                    .filter(|r| r.matches(url))
                    .map(|r| r.method.clone())
                    .collect::<Vec<_>>()
            })
            .find(|methods| !methods.is_empty())
            .unwrap_or_default()
    }

    /// Every method with a route matching `url`, sorted and deduplicated.
    #[must_use]
    pub fn matching_methods(&self, url: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .by_pattern
            .iter()
            .flat_map(|(_, routes)| routes.iter())
            .filter(|r| r.matches(url))
            .map(|r| r.method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods.dedup();
        methods
    }

    #[must_use]
    pub fn named_route(&self, name: &str, method: &Method) -> Option<&Arc<Route>> {
        self.by_name.get(name).and_then(|m| m.get(method))
    }

    /// Full pattern (base URL plus template) of a named route.
    #[must_use]
    pub fn named_url(&self, name: &str, method: &Method) -> Option<String> {
        self.named_route(name, method).map(|r| r.full_pattern())
    }

    #[must_use]
    pub fn routes_for(&self, method: &Method) -> &[Arc<Route>] {
        self.by_method
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Routes grouped by pattern, in first-declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.by_pattern.iter().flat_map(|(_, routes)| routes.iter())
    }

    /// Read-only projection for diagnostics and documentation.
    ///
    /// Routes sharing pattern and name collapse into one entry listing all of
    /// their methods.
    #[must_use]
    pub fn metadata(&self) -> Vec<RouteMetadata> {
        let mut out: Vec<RouteMetadata> = Vec::new();
        for (pattern, routes) in &self.by_pattern {
            let mut groups: Vec<RouteMetadata> = Vec::new();
            for route in routes {
                let name = route.name.clone();
                if let Some(existing) = groups.iter_mut().find(|g| g.name == name) {
                    existing.methods.push(route.method.to_string());
                    continue;
                }
                groups.push(RouteMetadata {
                    name,
                    uri: UriMetadata {
                        pattern: pattern.clone(),
                        parameters: route.parameter_names().iter().map(|p| p.to_string()).collect(),
                    },
                    aliases: route.aliases.iter().map(|a| a.pattern().to_string()).collect(),
                    supported_formats: route.formats.clone(),
                    default_format: route.default_format.clone(),
                    methods: vec![route.method.to_string()],
                    is_serialized: route.should_serialize,
                    base_url: route.base_url.clone(),
                });
            }
            out.extend(groups);
        }
        out
    }

    /// Log a one-line summary of the table at startup.
    pub fn log_summary(&self) {
        let summary: Vec<String> = self
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.full_pattern()))
            .collect();
        info!(
            routes_count = self.count,
            patterns = self.by_pattern.len(),
            routes_summary = ?summary,
            "Routing table loaded"
        );
    }
}
