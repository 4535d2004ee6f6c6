use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ServiceError;
use crate::server::Request;

pub const FILTER_PARAMETER: &str = "filter";

static FILTER_COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?):(.*?):(.+?)$").expect("filter regex should be valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    StartsWith,
    In,
    Contains,
}

impl FilterOperator {
    /// Empty means contains; anything unrecognized means equals.
    #[must_use]
    pub fn parse(op: &str) -> Self {
        match op.trim().to_lowercase().as_str() {
            "" => FilterOperator::Contains,
            "=" => FilterOperator::Equals,
            "!=" => FilterOperator::NotEquals,
            "<" => FilterOperator::LessThan,
            "<=" => FilterOperator::LessThanOrEqual,
            ">" => FilterOperator::GreaterThan,
            ">=" => FilterOperator::GreaterThanOrEqual,
            "*" => FilterOperator::StartsWith,
            "in" => FilterOperator::In,
            _ => FilterOperator::Equals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Single(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterComponent {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Requested filters from `filter=name::wid|count:>=:3|color:in:red,blue`.
///
/// Each `|`-separated part is `field:operator:value`. Parts that do not
/// have that shape are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    components: Vec<FilterComponent>,
}

impl QueryFilter {
    /// Parse the `filter` parameter. With a non-empty `allowed` list every
    /// field must appear in it.
    pub fn parse(request: &Request, allowed: &[&str]) -> Result<Self, ServiceError> {
        let Some(raw) = request.param(FILTER_PARAMETER).filter(|v| !v.trim().is_empty()) else {
            return Ok(Self::default());
        };

        let mut components = Vec::new();
        for part in raw.split('|') {
            let Some(caps) = FILTER_COMPONENT.captures(part) else {
                continue;
            };
            let field = &caps[1];
            if !allowed.is_empty() && !allowed.contains(&field) {
                return Err(ServiceError::bad_request(format!(
                    "{field} is not a supported filter. Supported filter names are: {}",
                    allowed.join(", ")
                )));
            }
            let operator = FilterOperator::parse(&caps[2]);
            let raw_value = &caps[3];
            let value = if operator == FilterOperator::In {
                FilterValue::List(raw_value.split(',').map(|v| v.trim().to_string()).collect())
            } else {
                FilterValue::Single(raw_value.to_string())
            };
            components.push(FilterComponent {
                field: field.to_string(),
                operator,
                value,
            });
        }
        Ok(Self { components })
    }

    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.components.is_empty()
    }

    #[must_use]
    pub fn components(&self) -> &[FilterComponent] {
        &self.components
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FilterComponent> {
        self.components.iter().find(|c| c.field == field)
    }
}
