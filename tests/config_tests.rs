use restline::config::{ServerConfig, DEFAULT_MAX_BODY_BYTES};
use restline::logging::{LogConfig, LogFormat};

use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = ServerConfig::default();
    assert_eq!(config.name, "restline");
    assert_eq!(config.port, 8081);
    assert!(config.enforce_http_spec);
    assert_eq!(config.default_format, "json");
    assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let config = ServerConfig::from_yaml_str("port: 9000\ndefault_format: yaml\n").unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(config.default_format, "yaml");
    assert_eq!(config.name, "restline");
    assert!(config.enforce_http_spec);
}

#[test]
fn test_empty_yaml_is_default() {
    assert_eq!(ServerConfig::from_yaml_str("  \n").unwrap(), ServerConfig::default());
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "name: widgets").unwrap();
    writeln!(file, "base_url: /api").unwrap();
    writeln!(file, "enforce_http_spec: false").unwrap();
    file.flush().unwrap();

    let config = ServerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.name, "widgets");
    assert_eq!(config.base_url, "/api");
    assert!(!config.enforce_http_spec);
}

#[test]
fn test_bad_file_reports_path() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port: not-a-number").unwrap();
    file.flush().unwrap();

    let err = ServerConfig::from_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains(&file.path().display().to_string()));

    let missing = ServerConfig::from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(missing.to_string().contains("failed to read config file"));
}

#[test]
fn test_env_overrides() {
    std::env::set_var("RESTLINE_PORT", "7070");
    std::env::set_var("RESTLINE_MAX_BODY_BYTES", "lots");
    let config = ServerConfig::default().with_env_overrides();
    std::env::remove_var("RESTLINE_PORT");
    std::env::remove_var("RESTLINE_MAX_BODY_BYTES");

    assert_eq!(config.port, 7070);
    // Unparseable values are ignored.
    assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
}

#[test]
fn test_log_config_shapes() {
    assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
    assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    let dev = LogConfig::development();
    assert_eq!(dev.format, LogFormat::Pretty);
}
