// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Helpline chat client.
//!
//! Settings come from `helpline.toml` files (working directory, then the XDG
//! user directory, then `/etc/helpline`) with `HELPLINE_*` environment
//! overrides on top. Unknown keys are rejected and reported through miette.
//!
//! # Usage
//!
//! ```no_run
//! use helpline_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Backend: {}", config.server.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::HelplineConfig;

/// Load from the standard search path and run [`validation::validate_config`].
pub fn load_and_validate() -> Result<HelplineConfig, Vec<ConfigError>> {
    checked(loader::load_config(), search_path_sources)
}

/// Same as [`load_and_validate`] but reads a single explicit file.
pub fn load_and_validate_path(path: &Path) -> Result<HelplineConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Validate an in-memory TOML document, mostly for tests.
pub fn load_and_validate_str(toml_content: &str) -> Result<HelplineConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

// Sources are only read back when extraction failed, to attach spans.
fn checked(
    loaded: Result<HelplineConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<HelplineConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    Some((path.display().to_string(), content))
}

fn search_path_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG.into());

    [Some(local), loader::user_config_path(), Some(loader::SYSTEM_CONFIG.into())]
        .into_iter()
        .flatten()
        .filter_map(|path| read_source(&path))
        .collect()
}
