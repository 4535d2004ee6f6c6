use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::ServiceError;
use crate::server::Request;

pub const LIMIT_PARAMETER: &str = "limit";
pub const OFFSET_PARAMETER: &str = "offset";
pub const RANGE_HEADER: &str = "Range";

static ITEMS_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^items=(\d+)-(\d+)$").expect("items range regex should be valid"));

/// A page of a collection: `limit` items starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    offset: u64,
    limit: u64,
}

impl QueryRange {
    /// Read `limit`/`offset` parameters, falling back to a
    /// `Range: items=start-end` header, then to `0` and `default_limit`.
    ///
    /// A `limit` without `offset` starts at zero. Non-numeric values, a
    /// negative offset, a zero limit, or a range whose end precedes its start
    /// are rejected.
    pub fn parse(request: &Request, default_limit: u64) -> Result<Self, ServiceError> {
        let limit = request.param(LIMIT_PARAMETER).filter(|v| !v.trim().is_empty());
        let offset = request.param(OFFSET_PARAMETER).filter(|v| !v.trim().is_empty());

        if limit.is_some() || offset.is_some() {
            let invalid = || {
                ServiceError::bad_request(format!(
                    "Invalid 'limit' and 'offset' parameters: limit={} offset={}",
                    limit.unwrap_or("null"),
                    offset.unwrap_or("null")
                ))
            };
            let parsed_limit = match limit {
                Some(v) => v.trim().parse::<i64>().map_err(|_| invalid())?,
                None => i64::try_from(default_limit).unwrap_or(i64::MAX),
            };
            let parsed_offset = match offset {
                Some(v) => v.trim().parse::<i64>().map_err(|_| invalid())?,
                None => 0,
            };
            if parsed_offset < 0 || parsed_limit <= 0 {
                return Err(invalid());
            }
            return Ok(Self {
                offset: parsed_offset as u64,
                limit: parsed_limit as u64,
            });
        }

        if let Some(header) = request.header(RANGE_HEADER).filter(|v| !v.trim().is_empty()) {
            return Self::from_range_header(header);
        }

        Ok(Self {
            offset: 0,
            limit: default_limit,
        })
    }

    fn from_range_header(header: &str) -> Result<Self, ServiceError> {
        let caps = ITEMS_RANGE.captures(header.trim()).ok_or_else(|| {
            ServiceError::bad_request(format!(
                "Unparseable 'Range' header.  Expecting items=[start]-[end] was: {header}"
            ))
        })?;
        let invalid = || {
            ServiceError::bad_request(format!(
                "Invalid 'Range' header.  Expecting 'items=[start]-[end]'  was: {header}"
            ))
        };
        let start: u64 = caps[1].parse().map_err(|_| invalid())?;
        let end: u64 = caps[2].parse().map_err(|_| invalid())?;
        let limit = end
            .checked_sub(start)
            .and_then(|span| span.checked_add(1))
            .ok_or_else(invalid)?;
        Ok(Self {
            offset: start,
            limit,
        })
    }

    #[must_use]
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Index of the last item in the page.
    #[must_use]
    pub fn end(&self) -> u64 {
        match self.limit {
            0 => self.offset.saturating_sub(1),
            limit => self.offset.saturating_add(limit - 1),
        }
    }

    /// `Content-Range` value for a collection of `total` items, clamped to
    /// the collection. An empty or out-of-range page renders `items */total`.
    #[must_use]
    pub fn as_content_range(&self, total: u64) -> String {
        if total == 0 || self.offset >= total {
            return format!("items */{total}");
        }
        let end = self.end().min(total - 1);
        format!("items {}-{}/{}", self.offset, end, total)
    }

    /// The page covers the whole of a `total`-item collection.
    #[must_use]
    pub fn spans(&self, total: u64) -> bool {
        self.offset == 0 && self.limit >= total
    }
}

impl fmt::Display for QueryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "items={}-{}", self.offset, self.end())
    }
}
