use crate::error::ServiceError;
use crate::server::Request;

pub const SORT_PARAMETER: &str = "sort";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderComponent {
    pub field: String,
    pub direction: SortDirection,
}

/// Requested sort order from `sort=name|-created`.
///
/// A leading `-` sorts that field descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOrder {
    components: Vec<OrderComponent>,
}

impl QueryOrder {
    /// Parse the `sort` parameter. With a non-empty `allowed` list every
    /// field must appear in it.
    pub fn parse(request: &Request, allowed: &[&str]) -> Result<Self, ServiceError> {
        let Some(raw) = request.param(SORT_PARAMETER).filter(|v| !v.trim().is_empty()) else {
            return Ok(Self::default());
        };

        let mut components = Vec::new();
        for part in raw.split('|').map(str::trim).filter(|s| !s.is_empty()) {
            let (field, direction) = match part.strip_prefix('-') {
                Some(field) => (field, SortDirection::Descending),
                None => (part, SortDirection::Ascending),
            };
            if !allowed.is_empty() && !allowed.contains(&field) {
                return Err(ServiceError::bad_request(format!(
                    "{part} is not a supported sort field. Supported sort fields are: {}",
                    allowed.join(", ")
                )));
            }
            components.push(OrderComponent {
                field: field.to_string(),
                direction,
            });
        }
        Ok(Self { components })
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        !self.components.is_empty()
    }

    #[must_use]
    pub fn components(&self) -> &[OrderComponent] {
        &self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderComponent> {
        self.components.iter()
    }
}
