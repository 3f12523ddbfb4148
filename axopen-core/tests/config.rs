use std::io::Write;

use axopen_core::{ApiConfig, ApiWrapper, ConfigError, DEFAULT_BODY_LIMIT};
use serial_test::serial;

const YAML: &str = r#"
title: Petstore
version: 1.0.0
description: Sample store
base_url: /api
servers:
  - url: https://petstore.example.com
    description: Production
tags:
  - name: pets
    description: Everything about pets
license:
  name: MIT
"#;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn clear_env() {
    for key in [
        "AXOPEN_TITLE",
        "AXOPEN_VERSION",
        "AXOPEN_BASE_URL",
        "AXOPEN_BODY_LIMIT",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn parses_yaml() {
    let config = ApiConfig::from_yaml_str(YAML).unwrap();
    assert_eq!(config.title, "Petstore");
    assert_eq!(config.version, "1.0.0");
    assert_eq!(config.openapi, "3.1.0");
    assert_eq!(config.base_url.as_deref(), Some("/api"));
    assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
    assert_eq!(config.servers[0].url, "https://petstore.example.com");
    assert_eq!(config.tags[0].name, "pets");
    assert_eq!(config.license.unwrap().name, "MIT");
}

#[test]
fn title_and_version_are_required() {
    let err = ApiConfig::from_yaml_str("version: 1.0.0").unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref key) if key == "title"));

    let err = ApiConfig::from_yaml_str("title: x").unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref key) if key == "version"));
}

#[test]
fn malformed_yaml_is_a_load_error() {
    let err = ApiConfig::from_yaml_str("title: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
    assert!(err.to_string().starts_with("Config load error"));
}

#[test]
#[serial]
fn loads_from_file() {
    clear_env();
    let file = write_config(YAML);
    let config = ApiConfig::load(file.path()).unwrap();
    assert_eq!(config.title, "Petstore");
    assert_eq!(config.description.as_deref(), Some("Sample store"));
}

#[test]
#[serial]
fn missing_file_is_a_load_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let err = ApiConfig::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    std::env::set_var("AXOPEN_TITLE", "From env");
    std::env::set_var("AXOPEN_BODY_LIMIT", "4096");
    let file = write_config(YAML);

    let config = ApiConfig::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.title, "From env");
    assert_eq!(config.version, "1.0.0");
    assert_eq!(config.body_limit, 4096);
}

#[test]
#[serial]
fn bad_env_body_limit_is_rejected() {
    clear_env();
    std::env::set_var("AXOPEN_BODY_LIMIT", "plenty");
    let file = write_config(YAML);

    let err = ApiConfig::load(file.path()).unwrap_err();
    clear_env();

    assert!(matches!(err, ConfigError::TypeMismatch { .. }));
}

#[test]
fn wrapper_takes_metadata_from_config() {
    let config = ApiConfig::from_yaml_str(YAML).unwrap();
    let api: ApiWrapper = ApiWrapper::from_config(config);

    let doc = api.spec();
    assert_eq!(doc.info.title, "Petstore");
    assert_eq!(doc.info.description.as_deref(), Some("Sample store"));
    assert!(doc.has_tag("pets"));
    // Declared servers take precedence over the base URL.
    assert_eq!(doc.servers.len(), 1);
    assert_eq!(doc.servers[0].url, "https://petstore.example.com");
}

#[test]
fn builder_matches_yaml() {
    let config = ApiConfig::new("Petstore", "1.0.0")
        .with_description("Sample store")
        .with_base_url("/api")
        .with_body_limit(1024);
    assert_eq!(config.title, "Petstore");
    assert_eq!(config.base_url.as_deref(), Some("/api"));
    assert_eq!(config.body_limit, 1024);
}
