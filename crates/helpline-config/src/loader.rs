// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./helpline.toml` > `~/.config/helpline/helpline.toml` >
//! `/etc/helpline/helpline.toml` with environment variable overrides via `HELPLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HelplineConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/helpline/helpline.toml";
pub(crate) const LOCAL_CONFIG: &str = "helpline.toml";

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("helpline").join("helpline.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/helpline/helpline.toml` (system-wide)
/// 3. `~/.config/helpline/helpline.toml` (user XDG config)
/// 4. `./helpline.toml` (local directory)
/// 5. `HELPLINE_*` environment variables
pub fn load_config() -> Result<HelplineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HelplineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelplineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HelplineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelplineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HelplineConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `HELPLINE_SERVER_BASE_URL` must map to `server.base_url`,
/// not `server.base.url`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("HELPLINE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var name to its dotted config path.
///
/// figment hands the name over in its original case (`SERVER_BASE_URL`).
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ["server", "stream", "auth", "log"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
