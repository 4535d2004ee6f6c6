//! # Query Module
//!
//! Helpers that read collection-query conventions off a request:
//!
//! - [`QueryRange`]: paging via `limit`/`offset` or `Range: items=0-24`
//! - [`QueryOrder`]: `sort=name|-created`
//! - [`QueryFilter`]: `filter=name::wid|count:>=:3`
//!
//! Values are looked up with [`Request::param`](crate::server::Request::param),
//! so they may come from the path, the query string, or a header. Malformed
//! input and fields outside the allowed list fail with `BadRequest`.
//!
//! ```rust
//! use http::Method;
//! use restline::query::QueryRange;
//! use restline::server::Request;
//!
//! let req = Request::new(Method::GET, "/widgets?limit=10&offset=20");
//! let range = QueryRange::parse(&req, 25).unwrap();
//! assert_eq!(range.as_content_range(100), "items 20-29/100");
//! ```

mod filter;
mod order;
mod range;
#[cfg(test)]
mod tests;

pub use filter::{FilterComponent, FilterOperator, FilterValue, QueryFilter, FILTER_PARAMETER};
pub use order::{OrderComponent, QueryOrder, SortDirection, SORT_PARAMETER};
pub use range::{QueryRange, LIMIT_PARAMETER, OFFSET_PARAMETER, RANGE_HEADER};
