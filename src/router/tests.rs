use http::Method;
use serde_json::json;
use std::collections::HashMap;

use super::{RouteBuilder, RouteError, RouteTable};
use crate::error::ErrorKind;
use crate::server::{Request, Response};

fn ok(_req: &mut Request, _res: &mut Response) -> crate::dispatcher::HandlerResult {
    Ok(None)
}

fn table(builders: Vec<RouteBuilder>) -> RouteTable {
    let mut table = RouteTable::new();
    for b in builders {
        table.add(b).unwrap();
    }
    table
}

#[test]
fn test_root_path() {
    let t = table(vec![RouteBuilder::new("/", ok).method(Method::GET)]);
    assert!(t.resolve(&Method::GET, "/").is_ok());
    assert_eq!(t.resolve(&Method::GET, "/x").unwrap_err().status(), 404);
}

#[test]
fn test_parameterized_path() {
    let t = table(vec![RouteBuilder::new("/items/{id}", ok).method(Method::GET)]);
    let action = t.resolve(&Method::GET, "/items/123").unwrap();
    assert_eq!(action.parameter("id"), Some("123"));
    assert_eq!(action.route().parameter_names(), vec!["id"]);
}

#[test]
fn test_first_declared_route_wins() {
    let t = table(vec![
        RouteBuilder::new("/users/new", ok).method(Method::GET).name("new"),
        RouteBuilder::new("/users/{id}", ok).method(Method::GET).name("show"),
    ]);
    let action = t.resolve(&Method::GET, "/users/new").unwrap();
    assert_eq!(action.route().name(), Some("new"));
    let action = t.resolve(&Method::GET, "/users/7").unwrap();
    assert_eq!(action.route().name(), Some("show"));
}

#[test]
fn test_method_not_allowed_lists_matching_methods() {
    let t = table(vec![
        RouteBuilder::new("/users/{id}", ok).methods([Method::GET, Method::DELETE]),
        RouteBuilder::new("/users/{name}", ok).method(Method::PATCH),
    ]);
    let err = t.resolve(&Method::PUT, "/users/42").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);
    assert_eq!(
        err.allowed_methods(),
        &[Method::DELETE, Method::GET, Method::PATCH]
    );
    assert_eq!(t.allowed_methods("/users/42"), vec![Method::GET, Method::DELETE]);
}

#[test]
fn test_unresolvable_url_message() {
    let t = table(vec![RouteBuilder::new("/a", ok)]);
    let err = t.resolve(&Method::GET, "/b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Unresolvable URL: /b");
}

#[test]
fn test_builder_defaults_to_crud_methods() {
    let t = table(vec![RouteBuilder::new("/things", ok)]);
    assert_eq!(t.len(), 4);
    for m in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
        assert!(t.resolve(&m, "/things").is_ok(), "{m}");
    }
    assert_eq!(t.resolve(&Method::PATCH, "/things").unwrap_err().status(), 405);
}

#[test]
fn test_aliases_tried_after_primary() {
    let t = table(vec![RouteBuilder::new("/people/{id}", ok)
        .method(Method::GET)
        .alias("/persons/{id}")]);
    let action = t.resolve(&Method::GET, "/persons/9").unwrap();
    assert_eq!(action.parameter("id"), Some("9"));
}

#[test]
fn test_alias_only_allows_routes_that_declare_it() {
    let t = table(vec![
        RouteBuilder::new("/a", ok).method(Method::GET).alias("/b"),
        RouteBuilder::new("/a", ok).method(Method::POST),
    ]);
    let err = t.resolve(&Method::POST, "/b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);
    assert_eq!(err.allowed_methods(), &[Method::GET]);
    assert_eq!(t.allowed_methods("/b"), vec![Method::GET]);
    assert_eq!(t.matching_methods("/a"), vec![Method::GET, Method::POST]);
}

#[test]
fn test_regex_route_binds_groups() {
    let t = table(vec![RouteBuilder::regex(r"^/files/(\w+)/(\d+)$", ok).method(Method::GET)]);
    let action = t.resolve(&Method::GET, "/files/report/3").unwrap();
    assert_eq!(action.parameter("regexGroup0"), Some("report"));
    assert_eq!(action.parameter("regexGroup1"), Some("3"));
}

#[test]
fn test_invalid_pattern_is_reported() {
    let mut t = RouteTable::new();
    let err = t
        .add(RouteBuilder::regex("/broken/(", ok).method(Method::GET))
        .unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
    assert!(t.is_empty());
}

#[test]
fn test_duplicate_name_per_method_rejected() {
    let mut t = RouteTable::new();
    t.add(RouteBuilder::new("/a", ok).method(Method::GET).name("thing"))
        .unwrap();
    t.add(RouteBuilder::new("/b", ok).method(Method::POST).name("thing"))
        .unwrap();
    let err = t
        .add(RouteBuilder::new("/c", ok).method(Method::GET).name("thing"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Duplicate route name 'thing' for method GET");
    assert_eq!(
        t.named_url("thing", &Method::POST).as_deref(),
        Some("/b")
    );
}

#[test]
fn test_route_attributes() {
    let t = table(vec![RouteBuilder::new("/orders/{id}.{format}", ok)
        .method(Method::GET)
        .flag(crate::flags::NO_CACHING)
        .parameter("cacheSeconds", 30)
        .format("json")
        .default_format("json")
        .base_url("/v1")]);
    let route = t.named_route("missing", &Method::GET);
    assert!(route.is_none());
    let route = &t.routes_for(&Method::GET)[0];
    assert!(route.is_flagged(crate::flags::NO_CACHING));
    assert_eq!(route.parameter("cacheSeconds"), Some(&json!(30)));
    assert!(route.supports_format("json"));
    assert!(!route.supports_format("yaml"));
    assert_eq!(route.default_format(), Some("json"));
    assert_eq!(route.full_pattern(), "/v1/orders/{id}.{format}");
}

#[test]
fn test_url_for_expands_and_encodes() {
    let t = table(vec![RouteBuilder::new("/users/{id}.{format}", ok)
        .method(Method::GET)
        .name("user")]);
    let route = t.named_route("user", &Method::GET).unwrap();

    let mut params = HashMap::new();
    params.insert("id", "a b");
    assert_eq!(route.url_for(&params).as_deref(), Some("/users/a%20b"));

    params.insert("format", "json");
    assert_eq!(route.url_for(&params).as_deref(), Some("/users/a%20b.json"));

    assert_eq!(route.url_for(&HashMap::new()), None);
}

#[test]
fn test_metadata_groups_methods() {
    let t = table(vec![
        RouteBuilder::new("/widgets/{id}", ok)
            .methods([Method::GET, Method::PUT])
            .name("widget"),
        RouteBuilder::new("/raw", ok).method(Method::GET).no_serialization(),
    ]);
    let meta = t.metadata();
    assert_eq!(meta.len(), 2);
    assert_eq!(meta[0].name.as_deref(), Some("widget"));
    assert_eq!(meta[0].methods, vec!["GET", "PUT"]);
    assert_eq!(meta[0].uri.parameters, vec!["id"]);
    assert!(!meta[1].is_serialized);

    let rendered = serde_json::to_value(&meta[0]).unwrap();
    assert_eq!(rendered["uri"]["pattern"], json!("/widgets/{id}"));
    assert_eq!(rendered["isSerialized"], json!(true));
}

#[test]
fn test_resolve_request_honors_method_tunnel() {
    let t = table(vec![RouteBuilder::new("/users/{id}", ok).method(Method::DELETE)]);
    let req = Request::new(Method::POST, "/users/1?_method=delete");
    let action = t.resolve_request(&req).unwrap();
    assert_eq!(action.route().method(), &Method::DELETE);
}
