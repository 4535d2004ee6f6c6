use super::{best_match, parse_media_ranges, MediaRange};

fn range(s: &str) -> MediaRange {
    MediaRange::parse(s).unwrap()
}

#[test]
fn test_parse_absent_header() {
    assert!(parse_media_ranges(None).is_empty());
    assert!(parse_media_ranges(Some("   ")).is_empty());
}

#[test]
fn test_parse_preserves_order_and_quality() {
    let ranges = parse_media_ranges(Some("text/html, application/json;q=0.5 , */*; q=0.1"));
    assert_eq!(ranges.len(), 3);
    assert_eq!(ranges[0].media_type(), "text");
    assert_eq!(ranges[0].subtype(), "html");
    assert_eq!(ranges[0].qvalue(), 1.0);
    assert_eq!(ranges[1].qvalue(), 0.5);
    assert_eq!(ranges[2].media_type(), "*");
    assert_eq!(ranges[2].qvalue(), 0.1);
}

#[test]
fn test_quality_name_is_case_insensitive() {
    assert_eq!(range("text/plain; Q=0.3").qvalue(), 0.3);
}

#[test]
fn test_unparsable_quality_defaults_to_one() {
    assert_eq!(range("text/plain;q=abc").qvalue(), 1.0);
    assert_eq!(range("text/plain;q=-1").qvalue(), 1.0);
    assert_eq!(range("text/plain;q=1e-2").qvalue(), 1.0);
    assert_eq!(range("text/plain;q=.2").qvalue(), 0.2);
}

#[test]
fn test_parameters_collected_without_quality() {
    let r = range("application/json; charset=UTF-8; level=1; q=0.7");
    assert_eq!(r.parameter("charset"), Some("UTF-8"));
    assert_eq!(r.parameter("level"), Some("1"));
    assert!(!r.has_parameter("q"));
    assert_eq!(r.as_media_type(), "application/json; charset=UTF-8; level=1");
}

#[test]
fn test_value_less_parameter() {
    let r = range("text/plain; flowed");
    assert!(r.has_parameter("flowed"));
    assert_eq!(r.parameter("flowed"), None);
    assert_eq!(r.as_media_type(), "text/plain; flowed");
}

#[test]
fn test_malformed_segments_dropped() {
    let ranges = parse_media_ranges(Some("garbage, text/plain"));
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].as_media_type(), "text/plain");
}

#[test]
fn test_bare_star_is_full_wildcard() {
    let r = range("*; q=.2");
    assert_eq!(r.media_type(), "*");
    assert_eq!(r.subtype(), "*");
}

#[test]
fn test_equality_is_exact() {
    assert_eq!(range("text/plain; a=1"), range("text/plain;a=1"));
    assert_ne!(range("text/plain"), range("text/plain;q=0.5"));
    assert_ne!(range("text/plain"), range("Text/plain"));
    assert_ne!(range("text/plain; a=1"), range("text/plain; a=2"));
}

#[test]
fn test_rank_is_monotonic_in_specificity() {
    let json = range("application/json");
    let exact = json.rank(&range("application/json")).unwrap();
    let any = json.rank(&range("*/*")).unwrap();
    assert!(exact > any);
    assert_eq!(exact, 150);
    assert_eq!(any, 0);
    assert_eq!(range("application/*").rank(&json), Some(100));
    assert_eq!(json.rank(&range("text/*")), None);
}

#[test]
fn test_wildcard_applicability_is_symmetric() {
    let json = range("application/json");
    let wildcard = range("application/*");
    assert!(json.is_applicable(&wildcard));
    assert!(wildcard.is_applicable(&json));
}

#[test]
fn test_rank_rewards_parameter_overlap() {
    let supported = range("application/json; charset=UTF-8");
    assert_eq!(supported.rank(&range("application/json; charset=UTF-8")), Some(152));
    assert_eq!(supported.rank(&range("application/json; charset=latin1")), Some(150));
}

#[test]
fn test_best_match_prefers_higher_quality_on_tie() {
    let supported = parse_media_ranges(Some("application/json, application/xml"));
    let requested = parse_media_ranges(Some("application/json;q=0.5, application/xml;q=0.9"));
    assert_eq!(
        best_match(&supported, &requested).as_deref(),
        Some("application/xml")
    );
}

#[test]
fn test_qualities_under_a_tenth_apart_tie() {
    let supported = parse_media_ranges(Some("application/json, application/yaml"));
    let close = parse_media_ranges(Some("application/json;q=0.89, application/yaml;q=0.91"));
    assert_eq!(best_match(&supported, &close).as_deref(), Some("application/json"));

    let apart = parse_media_ranges(Some("application/json;q=0.8, application/yaml;q=0.9"));
    assert_eq!(best_match(&supported, &apart).as_deref(), Some("application/yaml"));
}

#[test]
fn test_best_match_prefers_rank_over_quality() {
    let supported = parse_media_ranges(Some("application/json, text/html"));
    let requested = parse_media_ranges(Some("*/*;q=1.0, application/json;q=0.2"));
    assert_eq!(
        best_match(&supported, &requested).as_deref(),
        Some("application/json")
    );
}

#[test]
fn test_best_match_keeps_server_order_on_full_tie() {
    let supported = parse_media_ranges(Some("application/json, application/yaml"));
    let requested = parse_media_ranges(Some("*/*"));
    assert_eq!(
        best_match(&supported, &requested).as_deref(),
        Some("application/json")
    );
}

#[test]
fn test_best_match_none_when_nothing_applies() {
    let supported = parse_media_ranges(Some("application/json"));
    let requested = parse_media_ranges(Some("image/png"));
    assert_eq!(best_match(&supported, &requested), None);
    assert_eq!(best_match(&supported, &[]), None);
}

#[test]
fn test_best_match_renders_supported_parameters() {
    let supported = parse_media_ranges(Some("application/json; charset=UTF-8"));
    let requested = parse_media_ranges(Some("application/json"));
    assert_eq!(
        best_match(&supported, &requested).as_deref(),
        Some("application/json; charset=UTF-8")
    );
}
