// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Helpline configuration system.

use helpline_config::diagnostic::ConfigError;
use helpline_config::model::HelplineConfig;
use helpline_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_helpline_config() {
    let toml = r#"
[server]
base_url = "https://support.example.com"
api_prefix = "/api/v2"
request_timeout_secs = 15

[stream]
connect_timeout_secs = 3
inactivity_timeout_secs = 45

[auth]
token_path = "/tmp/helpline-token"

[log]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.base_url, "https://support.example.com");
    assert_eq!(config.server.api_prefix, "/api/v2");
    assert_eq!(config.server.request_timeout_secs, 15);
    assert_eq!(config.stream.connect_timeout_secs, 3);
    assert_eq!(config.stream.inactivity_timeout().as_secs(), 45);
    assert_eq!(config.auth.token_path, "/tmp/helpline-token");
    assert_eq!(config.log.level, "debug");
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.base_url, "http://localhost:8000");
    assert_eq!(config.server.api_prefix, "/api");
    assert_eq!(config.server.request_timeout_secs, 30);
    assert_eq!(config.stream.connect_timeout_secs, 10);
    assert_eq!(config.stream.inactivity_timeout_secs, 120);
    assert!(!config.auth.token_path.is_empty());
    assert_eq!(config.log.level, "info");
}

/// Unknown field in [server] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_in_server_suggests_correction() {
    let toml = r#"
[server]
base_ulr = "http://localhost:9000"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion, .. }
                if key == "base_ulr" && suggestion.as_deref() == Some("base_url")
        )
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

/// Unknown top-level sections are rejected too.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telemetry]
enabled = true
"#;
    let err = load_config_from_str(toml).expect_err("should reject unknown section");
    assert!(err.to_string().contains("telemetry"), "got: {err}");
}

/// Wrong value types are reported as InvalidType.
#[test]
fn wrong_type_reports_invalid_type() {
    let toml = r#"
[stream]
inactivity_timeout_secs = "soon"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string timeout");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("inactivity_timeout_secs"))),
        "got: {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[server]
base_url = "ws://localhost:8000"
"#;
    let errors = load_and_validate_str(toml).expect_err("ws scheme is not a REST origin");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("base_url"))));
}

/// Environment variables override file values via the explicit section mapping.
#[test]
fn env_var_overrides_file_value() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[server]
base_url = "http://from-file:8000"
"#,
        )?;
        jail.set_env("HELPLINE_SERVER_BASE_URL", "http://from-env:8000");
        jail.set_env("HELPLINE_STREAM_INACTIVITY_TIMEOUT_SECS", "7");

        let config = load_config_from_path(std::path::Path::new("custom.toml"))
            .expect("config should load");
        assert_eq!(config.server.base_url, "http://from-env:8000");
        assert_eq!(config.stream.inactivity_timeout_secs, 7);
        Ok(())
    });
}

/// A single env override passes the full load-and-validate path.
#[test]
fn env_log_level_passes_validation() {
    figment::Jail::expect_with(|jail| {
        let dir = jail.directory().display().to_string();
        jail.set_env("XDG_CONFIG_HOME", dir);
        jail.set_env("HELPLINE_LOG_LEVEL", "debug");

        let config = match helpline_config::load_and_validate() {
            Ok(config) => config,
            Err(errors) => panic!("env override rejected: {errors:?}"),
        };
        assert_eq!(config.log.level, "debug");
        Ok(())
    });
}

/// Defaults survive a serialize / deserialize pass (used by `helpline config`).
#[test]
fn default_config_serializes_to_loadable_toml() {
    let rendered = toml::to_string(&HelplineConfig::default()).expect("serialize");
    let config = load_and_validate_str(&rendered).expect("rendered defaults should load");
    assert_eq!(config.server.base_url, "http://localhost:8000");
}
