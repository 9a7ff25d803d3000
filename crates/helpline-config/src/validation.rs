// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes and non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::HelplineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HelplineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    match url::Url::parse(config.server.base_url.trim()) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "server.base_url must use http or https, got `{}`",
                        url.scheme()
                    ),
                });
            }
            if url.host_str().is_none() {
                errors.push(ConfigError::Validation {
                    message: "server.base_url must include a host".to_string(),
                });
            }
        }
        Err(e) => errors.push(ConfigError::Validation {
            message: format!(
                "server.base_url `{}` is not a valid URL: {e}",
                config.server.base_url
            ),
        }),
    }

    if !config.server.api_prefix.is_empty() && !config.server.api_prefix.starts_with('/') {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.api_prefix must start with `/`, got `{}`",
                config.server.api_prefix
            ),
        });
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "server.request_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.stream.connect_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "stream.connect_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.stream.inactivity_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "stream.inactivity_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.auth.token_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "auth.token_path must not be empty".to_string(),
        });
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
