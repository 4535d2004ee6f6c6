use super::{UrlMatcher, UrlPattern, UrlRegex};

#[test]
fn test_literal_template() {
    let m = UrlMatcher::template("/health").unwrap();
    assert!(m.matches("/health"));
    assert!(!m.matches("/health/x"));
    assert!(!m.matches("/healthz"));
    assert!(m.parameter_names().is_empty());
}

#[test]
fn test_extracts_named_parameters() {
    let m = UrlMatcher::template("/api/{version}/users/{id}").unwrap();
    let found = m.match_url("/api/2/users/1234").unwrap();
    assert_eq!(found.get("version"), Some("2"));
    assert_eq!(found.get("id"), Some("1234"));
    assert_eq!(found.len(), 2);
}

#[test]
fn test_parameter_names_in_declaration_order() {
    let p = UrlPattern::new("/{b}/x/{a}/{c}").unwrap();
    let names: Vec<&str> = p.parameter_names().iter().map(|n| n.as_ref()).collect();
    assert_eq!(names, vec!["b", "a", "c"]);
}

#[test]
fn test_format_suffix_is_optional() {
    let m = UrlMatcher::template("/search.{format}").unwrap();
    assert!(m.matches("/search"));
    let found = m.match_url("/search.json").unwrap();
    assert_eq!(found.get("format"), Some("json"));
    let bare = m.match_url("/search").unwrap();
    assert_eq!(bare.get("format"), None);
    assert!(bare.is_empty());
}

#[test]
fn test_format_with_other_parameters() {
    let m = UrlMatcher::template("/users/{id}.{format}").unwrap();
    let found = m.match_url("/users/1.2.xml").unwrap();
    assert_eq!(found.get("id"), Some("1.2"));
    assert_eq!(found.get("format"), Some("xml"));
}

#[test]
fn test_query_string_tolerated() {
    let m = UrlMatcher::template("/users/{id}").unwrap();
    let found = m.match_url("/users/7?expand=true&x=1").unwrap();
    assert_eq!(found.get("id"), Some("7"));
    assert_eq!(found.get("expand"), None);
}

#[test]
fn test_placeholder_does_not_cross_segments() {
    let m = UrlMatcher::template("/users/{id}").unwrap();
    assert!(!m.matches("/users/1/posts"));
    assert!(!m.matches("/users/"));
}

#[test]
fn test_sub_delims_and_pct_encoding_accepted() {
    let m = UrlMatcher::template("/tags/{tag}").unwrap();
    let found = m.match_url("/tags/a%20b:c@d;e=f").unwrap();
    assert_eq!(found.get("tag"), Some("a%20b:c@d;e=f"));
}

#[test]
fn test_literal_text_is_escaped() {
    let m = UrlMatcher::template("/v1.0/items").unwrap();
    assert!(m.matches("/v1.0/items"));
    assert!(!m.matches("/v1x0/items"));
}

#[test]
fn test_duplicate_names_last_write_wins() {
    let m = UrlMatcher::template("/org/{id}/user/{id}").unwrap();
    let found = m.match_url("/org/1/user/2").unwrap();
    assert_eq!(found.get("id"), Some("2"));
    assert_eq!(found.len(), 2);
}

#[test]
fn test_regex_groups_named_by_position() {
    let r = UrlRegex::new(r"/files/(\w+)/(\d+)").unwrap();
    let found = r.match_url("/files/docs/42").unwrap();
    assert_eq!(found.get("regexGroup0"), Some("docs"));
    assert_eq!(found.get("regexGroup1"), Some("42"));
}

#[test]
fn test_regex_requires_full_match() {
    let m = UrlMatcher::regex(r"/files/\d+").unwrap();
    assert!(m.matches("/files/12"));
    assert!(!m.matches("/files/12/extra"));
    assert!(!m.matches("/prefix/files/12"));
}

#[test]
fn test_regex_skips_unmatched_groups() {
    let m = UrlMatcher::regex(r"/a(/b)?(/c)").unwrap();
    let found = m.match_url("/a/c").unwrap();
    assert_eq!(found.get("regexGroup0"), None);
    assert_eq!(found.get("regexGroup1"), Some("/c"));
}

#[test]
fn test_invalid_regex_is_error() {
    assert!(UrlMatcher::regex("(unclosed").is_err());
}

#[test]
fn test_pattern_text_preserved() {
    let m = UrlMatcher::template("/a/{b}.{format}").unwrap();
    assert_eq!(m.pattern(), "/a/{b}.{format}");
    assert_eq!(m.to_string(), "/a/{b}.{format}");
}
