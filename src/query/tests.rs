use http::Method;

use super::*;
use crate::server::Request;

fn get(url: &str) -> Request {
    Request::new(Method::GET, url)
}

#[test]
fn test_range_defaults() {
    let range = QueryRange::parse(&get("/w"), 25).unwrap();
    assert_eq!((range.offset(), range.limit()), (0, 25));
}

#[test]
fn test_range_limit_only_starts_at_zero() {
    let range = QueryRange::parse(&get("/w?limit=5"), 25).unwrap();
    assert_eq!((range.offset(), range.limit()), (0, 5));
    assert_eq!(range.end(), 4);
}

#[test]
fn test_range_rejects_bad_parameters() {
    for url in ["/w?limit=0", "/w?offset=-1", "/w?limit=abc"] {
        let err = QueryRange::parse(&get(url), 25).unwrap_err();
        assert_eq!(err.status(), 400, "{url}");
        assert!(err.message().starts_with("Invalid 'limit' and 'offset' parameters"));
    }
}

#[test]
fn test_range_header() {
    let req = get("/w").with_header("Range", "items=10-19");
    let range = QueryRange::parse(&req, 25).unwrap();
    assert_eq!((range.offset(), range.limit()), (10, 10));
    assert_eq!(range.to_string(), "items=10-19");

    let bad = get("/w").with_header("Range", "bytes=0-10");
    let err = QueryRange::parse(&bad, 25).unwrap_err();
    assert_eq!(
        err.message(),
        "Unparseable 'Range' header.  Expecting items=[start]-[end] was: bytes=0-10"
    );

    let backwards = get("/w").with_header("Range", "items=9-3");
    assert_eq!(QueryRange::parse(&backwards, 25).unwrap_err().status(), 400);
}

#[test]
fn test_range_header_at_integer_limits() {
    let whole = get("/w").with_header("Range", "items=0-18446744073709551615");
    let err = QueryRange::parse(&whole, 25).unwrap_err();
    assert_eq!(err.status(), 400);
    assert!(err.message().starts_with("Invalid 'Range' header"));

    let tail = get("/w").with_header("Range", "items=1-18446744073709551615");
    let range = QueryRange::parse(&tail, 25).unwrap();
    assert_eq!(range.end(), u64::MAX);
    assert_eq!(range.as_content_range(10), "items 1-9/10");

    let wide = get("/w").with_header("Range", "items=0-99999999999999999999");
    assert_eq!(QueryRange::parse(&wide, 25).unwrap_err().status(), 400);
}

#[test]
fn test_huge_offset_and_limit_do_not_overflow() {
    let range = QueryRange::parse(&get(&format!("/w?offset={}&limit={}", i64::MAX, i64::MAX)), 25)
        .unwrap();
    assert_eq!(range.as_content_range(10), "items */10");
    assert_eq!(QueryRange::new(5, u64::MAX).as_content_range(10), "items 5-9/10");
}

#[test]
fn test_parameters_win_over_range_header() {
    let req = get("/w?offset=3").with_header("Range", "items=10-19");
    let range = QueryRange::parse(&req, 25).unwrap();
    assert_eq!((range.offset(), range.limit()), (3, 25));
}

#[test]
fn test_content_range_clamps() {
    let range = QueryRange::new(20, 10);
    assert_eq!(range.as_content_range(25), "items 20-24/25");
    assert_eq!(range.as_content_range(0), "items */0");
    assert_eq!(range.as_content_range(15), "items */15");
    assert!(QueryRange::new(0, 50).spans(40));
}

#[test]
fn test_order_parse() {
    let order = QueryOrder::parse(&get("/w?sort=name|-created"), &[]).unwrap();
    let parts: Vec<(&str, SortDirection)> = order
        .iter()
        .map(|c| (c.field.as_str(), c.direction))
        .collect();
    assert_eq!(
        parts,
        vec![("name", SortDirection::Ascending), ("created", SortDirection::Descending)]
    );
    assert!(!QueryOrder::parse(&get("/w"), &[]).unwrap().is_sorted());
}

#[test]
fn test_order_rejects_unknown_field() {
    let err = QueryOrder::parse(&get("/w?sort=name|-secret"), &["name", "created"]).unwrap_err();
    assert_eq!(
        err.message(),
        "-secret is not a supported sort field. Supported sort fields are: name, created"
    );
}

#[test]
fn test_filter_operators() {
    let req = get("/w?filter=name::wid%7Ccount:%3E%3D:3%7Ccolor:in:red,blue%7Ckind:=:gear%7Cjunk");
    let filter = QueryFilter::parse(&req, &[]).unwrap();
    assert_eq!(filter.components().len(), 4);
    assert_eq!(filter.get("name").unwrap().operator, FilterOperator::Contains);
    assert_eq!(filter.get("count").unwrap().operator, FilterOperator::GreaterThanOrEqual);
    assert_eq!(
        filter.get("color").unwrap().value,
        FilterValue::List(vec!["red".to_string(), "blue".to_string()])
    );
    assert_eq!(
        filter.get("kind").unwrap().value,
        FilterValue::Single("gear".to_string())
    );
}

#[test]
fn test_filter_operator_fallbacks() {
    assert_eq!(FilterOperator::parse("*"), FilterOperator::StartsWith);
    assert_eq!(FilterOperator::parse("IN"), FilterOperator::In);
    assert_eq!(FilterOperator::parse("~"), FilterOperator::Equals);
}

#[test]
fn test_filter_rejects_unknown_field() {
    let err = QueryFilter::parse(&get("/w?filter=secret:=:1"), &["name"]).unwrap_err();
    assert_eq!(
        err.message(),
        "secret is not a supported filter. Supported filter names are: name"
    );
}
