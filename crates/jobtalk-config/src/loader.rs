// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order: compiled defaults, then `~/.config/jobtalk/jobtalk.toml`,
//! then `./jobtalk.toml`, then `JOBTALK_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::JobtalkConfig;

/// Load configuration from the standard file hierarchy with env overrides.
pub fn load_config() -> Result<JobtalkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JobtalkConfig::default()))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("jobtalk/jobtalk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("jobtalk.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
///
/// Used for testing and for hosts that manage their own config source.
pub fn load_config_from_str(toml_content: &str) -> Result<JobtalkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JobtalkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<JobtalkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JobtalkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `JOBTALK_CHAT_ECHO_WINDOW_SECS` must map to
/// `chat.echo_window_secs`, not `chat.echo.window.secs`.
fn env_provider() -> Env {
    Env::prefixed("JOBTALK_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("rest_", "rest.", 1)
            .replacen("hub_", "hub.", 1)
            .replacen("chat_", "chat.", 1);
        mapped.into()
    })
}
