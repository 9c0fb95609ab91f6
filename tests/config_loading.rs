//! Tests for loading configuration from disk
//!
//! Each phase (read, parse, validate) reports the file path and keeps the
//! underlying error as its source.

use neurowrite::cli::generate_config_template;
use neurowrite::config::Config;
use neurowrite::error::AppError;
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_template_loads_from_file() {
    let file = write_config(generate_config_template());
    let config = Config::from_file(file.path()).expect("template should load");

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.request_timeout_seconds, 60);
    assert_eq!(config.model.stream_buffer(), 16);
    assert_eq!(config.observability.log_level, "info");
}

#[test]
fn test_missing_file_keeps_io_source() {
    let err = Config::from_file("/nonexistent/neurowrite/config.toml")
        .expect_err("missing file must fail");

    assert!(matches!(err, AppError::ConfigFileRead { .. }));
    assert!(err.to_string().contains("/nonexistent/neurowrite/config.toml"));
    let source = err.source().expect("io error source");
    assert!(source.is::<std::io::Error>());
}

#[test]
fn test_invalid_toml_keeps_parse_source() {
    let file = write_config("[server\nhost = ");
    let err = Config::from_file(file.path()).expect_err("broken TOML must fail");

    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    let source = err.source().expect("toml error source");
    assert!(source.is::<toml::de::Error>());
}

#[test]
fn test_missing_model_section_is_parse_error() {
    let file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 8001
"#,
    );
    let err = Config::from_file(file.path()).expect_err("model section is required");
    assert!(err.to_string().contains("model"), "got: {}", err);
}

#[test]
fn test_validation_failure_names_file_and_reason() {
    let file = write_config(
        &generate_config_template().replace("stream_buffer = 16", "stream_buffer = 0"),
    );
    let err = Config::from_file(file.path()).expect_err("zero buffer must fail");

    let AppError::ConfigValidationFailed { path, reason } = &err else {
        panic!("expected validation failure, got {:?}", err);
    };
    assert_eq!(path, &file.path().display().to_string());
    assert!(reason.contains("stream_buffer"), "got: {}", reason);
}

#[test]
fn test_api_key_debug_is_redacted() {
    let key = neurowrite::config::ApiKey::new("super-secret-value");
    assert!(!format!("{:?}", key).contains("super-secret-value"));
    assert!(!format!("{}", key).contains("super-secret-value"));
    assert_eq!(key.expose(), "super-secret-value");
}

#[test]
fn test_hostname_is_rejected_instead_of_widening_bind() {
    let file = write_config(&generate_config_template().replace(
        "host = \"0.0.0.0\"",
        "host = \"localhost\"",
    ));
    let err = Config::from_file(file.path()).expect_err("hostname must fail");

    let AppError::ConfigValidationFailed { reason, .. } = &err else {
        panic!("expected validation failure, got {:?}", err);
    };
    assert!(reason.contains("server.host"), "got: {}", reason);
}
