use http::Method;
use serde_json::json;
use std::io::Read;
use std::sync::Arc;

use super::*;
use crate::error::ServiceError;
use crate::ids::CORRELATION_ID_HEADER;
use crate::router::{RouteBuilder, RouteTable};

#[test]
fn test_query_params_are_decoded() {
    let req = Request::new(Method::GET, "/search?q=a%20b&tag=x&tag=y");
    assert_eq!(req.path(), "/search");
    assert_eq!(req.query_param("q"), Some("a b"));
    assert_eq!(req.query_param("tag"), Some("y"));
    assert_eq!(req.query_params().len(), 3);
}

#[test]
fn test_headers_case_insensitive() {
    let mut req = Request::new(Method::GET, "/").with_header("Accept", "application/json");
    assert_eq!(req.header("accept"), Some("application/json"));
    req.set_header("ACCEPT", "text/plain");
    assert_eq!(req.header("Accept"), Some("text/plain"));
    assert_eq!(req.headers().len(), 1);
}

#[test]
fn test_correlation_id_from_header() {
    let id = ulid::Ulid::new();
    let req = Request::new(Method::GET, "/").with_header(CORRELATION_ID_HEADER, id.to_string());
    assert_eq!(req.correlation_id().0, id);

    let garbage = Request::new(Method::GET, "/").with_header(CORRELATION_ID_HEADER, "nope");
    assert_ne!(garbage.correlation_id().to_string(), "nope");
}

#[test]
fn test_method_tunnel() {
    let put = Request::new(Method::POST, "/x?_method=PUT");
    assert_eq!(put.effective_method().unwrap(), Method::PUT);

    let header = Request::new(Method::POST, "/x").with_header(METHOD_TUNNEL, "delete");
    assert_eq!(header.effective_method().unwrap(), Method::DELETE);

    let get = Request::new(Method::GET, "/x?_method=PUT");
    assert_eq!(get.effective_method().unwrap(), Method::GET);

    let bad = Request::new(Method::POST, "/x?_method=PATCH");
    assert_eq!(bad.effective_method().unwrap_err().status(), 400);
}

#[test]
fn test_apply_match_exposes_params() {
    let mut table = RouteTable::new();
    table
        .add(RouteBuilder::new("/files/{name}", |_req, _res| Ok(None)).method(Method::GET))
        .unwrap();
    let mut req = Request::new(Method::GET, "/files/my%20doc?name=query");
    let (route, url_match) = table.resolve_request(&req).unwrap().into_parts();
    req.apply_match(route, url_match);

    assert_eq!(req.path_param("name"), Some("my doc"));
    assert_eq!(req.param("name"), Some("my doc"));
    assert_eq!(req.header("name"), Some("my doc"));
    assert!(req.route().is_some());
}

#[test]
fn test_param_falls_back_to_query_then_header() {
    let req = Request::new(Method::GET, "/x?limit=5").with_header("offset", "10");
    assert_eq!(req.param("limit"), Some("5"));
    assert_eq!(req.param("offset"), Some("10"));
    assert_eq!(req.param("missing"), None);
}

#[test]
fn test_body_reader_and_reset() {
    let mut req = Request::new(Method::POST, "/").with_body("hello");
    let mut first = String::new();
    req.body_reader().read_to_string(&mut first).unwrap();
    assert_eq!(first, "hello");

    req.reset_body();
    let mut again = String::new();
    req.body_reader().read_to_string(&mut again).unwrap();
    assert_eq!(again, "hello");
}

#[test]
fn test_body_as_requires_provider() {
    let mut req = Request::new(Method::POST, "/").with_body("{}");
    let err = req.body_as::<serde_json::Value>().unwrap_err();
    assert_eq!(err.status(), 500);
}

#[test]
fn test_body_as_uses_content_type() {
    let mut req = Request::new(Method::POST, "/")
        .with_header("Content-Type", "application/yaml")
        .with_body("name: gear\ncount: 3\n");
    req.bind_provider(Arc::new(crate::serialization::SerializationProvider::with_defaults()));
    let value: serde_json::Value = req.body_as().unwrap();
    assert_eq!(value, json!({"name": "gear", "count": 3}));
}

#[test]
fn test_attachments() {
    let mut req = Request::new(Method::GET, "/");
    req.put_attachment("user", json!("ann"));
    assert_eq!(req.attachment("user"), Some(&json!("ann")));
}

#[test]
fn test_response_defaults() {
    let res = Response::new();
    assert_eq!(res.status(), 200);
    assert!(res.is_serialized());
    assert!(!res.has_body());
    assert!(!res.has_error());
}

#[test]
fn test_raw_body_disables_serialization() {
    let mut res = Response::new();
    res.set_raw_body(b"plain".to_vec());
    assert!(!res.is_serialized());
    assert_eq!(res.wire_body().as_ref(), b"plain");
}

#[test]
fn test_wire_body_prefers_output() {
    let mut res = Response::new();
    res.set_body(json!({"a": 1}));
    assert_eq!(res.wire_body().as_ref(), br#"{"a":1}"#);
    res.set_output(b"serialized".to_vec());
    assert_eq!(res.wire_body().as_ref(), b"serialized");
    res.clear_body();
    assert!(!res.has_body());
}

#[test]
fn test_response_headers_replace() {
    let mut res = Response::new();
    res.add_header("Vary", "Accept");
    res.add_header("Vary", "Origin");
    res.set_header("vary", "*");
    assert_eq!(res.headers().len(), 1);
    res.set_content_type("text/plain");
    assert_eq!(res.content_type(), Some("text/plain"));
    res.remove_header("Content-Type");
    assert!(!res.has_header("content-type"));
    res.add_location("/users/1");
    assert_eq!(res.header("Location"), Some("/users/1"));
}

#[test]
fn test_error_augments_response() {
    let mut res = Response::new();
    let err = ServiceError::method_not_allowed("/x", vec![Method::GET, Method::DELETE]);
    err.augment_response(&mut res);
    assert_eq!(res.header("Allow"), Some("DELETE, GET"));
}

#[test]
fn test_http1_writer_frames_response() {
    let req = Request::new(Method::GET, "/");
    let mut res = Response::new();
    res.set_content_type("text/plain");
    res.set_raw_body(b"hi".to_vec());

    let mut writer = Http1Writer::new(Vec::new());
    writer.write(&req, &res).unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Type: text/plain\r\n"));
    assert!(text.contains("Content-Length: 2\r\n"));
    assert!(text.ends_with("\r\n\r\nhi"));
}

#[test]
fn test_http1_writer_omits_body_for_204() {
    let req = Request::new(Method::DELETE, "/");
    let mut res = Response::new();
    res.set_no_content();
    res.set_raw_body(b"ignored".to_vec());

    let mut writer = Http1Writer::new(Vec::new());
    writer.write(&req, &res).unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(text, "HTTP/1.1 204 No Content\r\n\r\n");
}

#[test]
fn test_buffered_writer() {
    let req = Request::new(Method::GET, "/");
    let mut res = Response::new();
    res.set_body(json!({"ok": true}));

    let mut writer = BufferedWriter::new();
    writer.write(&req, &res).unwrap();
    let last = writer.last().unwrap();
    assert_eq!(last.status, 200);
    assert_eq!(last.json().unwrap(), json!({"ok": true}));
    assert_eq!(writer.take().len(), 1);
    assert!(writer.responses().is_empty());

    let mut failing = BufferedWriter::failing();
    assert!(failing.write(&req, &res).is_err());
}

#[test]
fn test_status_reason() {
    assert_eq!(status_reason(404), "Not Found");
    assert_eq!(status_reason(799), "Unknown");
}
