use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Maximum number of extracted parameters stored inline before spilling to the heap.
/// Most REST templates carry four or fewer placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for a single match.
///
/// Names are `Arc<str>` shared with the compiled matcher; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Placeholder name bound by a trailing `.{format}` suffix.
pub const FORMAT_PARAMETER: &str = "format";

/// Prefix used to name positional groups of a raw regex matcher.
pub const REGEX_GROUP_PREFIX: &str = "regexGroup";

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w*?)\}").expect("placeholder regex should be valid"));

/// Characters accepted inside a single placeholder value: RFC 3986 unreserved,
/// sub-delims and pct-encoded, plus `:`, `@` and brackets.
const PARAMETER_MATCH: &str = r"([%\w\-.~!$&'()*+,;=:\[\]@]+?)";

/// Optional `.ext` suffix. The group captures, so the extension binds to `format`.
const FORMAT_MATCH: &str = r"(?:\.([\w%]+?))?";

const FORMAT_SUFFIX: &str = ".{format}";

/// Optional, non-captured query string.
const QUERY_STRING_MATCH: &str = r"(?:\?.*?)?$";

/// Parameter values extracted by one successful match.
///
/// Duplicate names are kept in extraction order; lookups return the last
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMatch {
    params: ParamVec,
}

impl UrlMatch {
    #[must_use]
    pub fn new(params: ParamVec) -> Self {
        Self { params }
    }

    /// Look up a parameter value by name (last write wins).
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[must_use]
    pub fn into_params(self) -> ParamVec {
        self.params
    }
}

/// A URL template such as `/api/{version}/users/{id}.{format}` compiled into
/// an anchored regex.
///
/// The compiled form is stateless and can be shared across threads.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    template: String,
    regex: Regex,
    parameter_names: Vec<Arc<str>>,
}

impl UrlPattern {
    /// Compile a template.
    ///
    /// Literal text is escaped. Each `{name}` becomes a lazy capture over the
    /// path-segment character class. A trailing `.{format}` becomes an optional
    /// extension group, and a query string is always tolerated.
    pub fn new(template: &str) -> Result<Self, regex::Error> {
        let parameter_names: Vec<Arc<str>> = PLACEHOLDER_REGEX
            .captures_iter(template)
            .filter_map(|c| c.get(1))
            .map(|m| Arc::from(m.as_str()))
            .collect();

        let (body, has_format) = match template.strip_suffix(FORMAT_SUFFIX) {
            Some(body) => (body, true),
            None => (template, false),
        };

        let mut pattern = String::with_capacity(template.len() * 2 + 16);
        pattern.push('^');
        let mut last = 0;
        for m in PLACEHOLDER_REGEX.find_iter(body) {
            pattern.push_str(&regex::escape(&body[last..m.start()]));
            pattern.push_str(PARAMETER_MATCH);
            last = m.end();
        }
        pattern.push_str(&regex::escape(&body[last..]));
        if has_format {
            pattern.push_str(FORMAT_MATCH);
        }
        pattern.push_str(QUERY_STRING_MATCH);

        Ok(Self {
            template: template.to_string(),
            regex: Regex::new(&pattern)?,
            parameter_names,
        })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The generated regex source, useful when debugging a template.
    #[must_use]
    pub fn compiled(&self) -> &str {
        self.regex.as_str()
    }

    #[must_use]
    pub fn parameter_names(&self) -> &[Arc<str>] {
        &self.parameter_names
    }

    #[must_use]
    pub fn match_url(&self, url: &str) -> Option<UrlMatch> {
        let caps = self.regex.captures(url)?;
        let mut params = ParamVec::new();
        for (i, name) in self.parameter_names.iter().enumerate() {
            // Groups that did not participate (e.g. an absent extension) are skipped.
            if let Some(value) = caps.get(i + 1) {
                params.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        Some(UrlMatch::new(params))
    }
}

/// A caller-supplied regex used as-is.
///
/// Captured groups are exposed as `regexGroup0`, `regexGroup1`, ... by position.
#[derive(Debug, Clone)]
pub struct UrlRegex {
    source: String,
    regex: Regex,
    group_names: Vec<Arc<str>>,
}

impl UrlRegex {
    /// Compile `source` with whole-input match semantics.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        let group_names = (0..regex.captures_len().saturating_sub(1))
            .map(|i| Arc::from(format!("{REGEX_GROUP_PREFIX}{i}")))
            .collect();
        Ok(Self {
            source: source.to_string(),
            regex,
            group_names,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn match_url(&self, url: &str) -> Option<UrlMatch> {
        let caps = self.regex.captures(url)?;
        let mut params = ParamVec::new();
        for (i, name) in self.group_names.iter().enumerate() {
            if let Some(value) = caps.get(i + 1) {
                params.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        Some(UrlMatch::new(params))
    }
}

/// Matching strategy for a route.
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    Template(UrlPattern),
    Regex(UrlRegex),
}

impl UrlMatcher {
    pub fn template(template: &str) -> Result<Self, regex::Error> {
        UrlPattern::new(template).map(UrlMatcher::Template)
    }

    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        UrlRegex::new(source).map(UrlMatcher::Regex)
    }

    /// Attempt a match. No match is `None`, never an error.
    #[must_use]
    pub fn match_url(&self, url: &str) -> Option<UrlMatch> {
        match self {
            UrlMatcher::Template(p) => p.match_url(url),
            UrlMatcher::Regex(r) => r.match_url(url),
        }
    }

    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.match_url(url).is_some()
    }

    /// Placeholder names in declaration order. Raw regex matchers report
    /// their positional group names.
    #[must_use]
    pub fn parameter_names(&self) -> &[Arc<str>] {
        match self {
            UrlMatcher::Template(p) => p.parameter_names(),
            UrlMatcher::Regex(r) => &r.group_names,
        }
    }

    /// The declared pattern text (template or regex source).
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            UrlMatcher::Template(p) => p.template(),
            UrlMatcher::Regex(r) => r.source(),
        }
    }
}

impl fmt::Display for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}
