use serde::Serialize;

/// Pattern and placeholder names of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UriMetadata {
    pub pattern: String,
    pub parameters: Vec<String>,
}

/// Read-only description of one declared route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub uri: UriMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub supported_formats: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
    pub methods: Vec<String>,
    pub is_serialized: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_url: String,
}

/// Server-level description: identity, formats, and every route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMetadata {
    pub name: String,
    pub port: u16,
    pub supported_formats: Vec<String>,
    pub default_format: String,
    pub routes: Vec<RouteMetadata>,
}
