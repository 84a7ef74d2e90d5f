// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./charla.toml` > `~/.config/charla/charla.toml`
//! > `/etc/charla/charla.toml` with environment variable overrides via the
//! `CHARLA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CharlaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/charla/charla.toml` (system-wide)
/// 3. `~/.config/charla/charla.toml` (user XDG config)
/// 4. `./charla.toml` (local directory)
/// 5. `CHARLA_*` environment variables
pub fn load_config() -> Result<CharlaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CharlaConfig::default()))
        .merge(Toml::file("/etc/charla/charla.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("charla/charla.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("charla.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit inline configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CharlaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CharlaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CharlaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CharlaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CHARLA_SESSION_IDLE_TIMEOUT_SECS` must
/// map to `session.idle_timeout_secs`, not `session.idle.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("CHARLA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("session_", "session.", 1)
            .replacen("engine_", "engine.", 1)
            .replacen("scheduling_", "scheduling.", 1);
        mapped.into()
    })
}
