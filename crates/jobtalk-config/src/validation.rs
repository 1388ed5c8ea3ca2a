// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL schemes and a non-empty backoff schedule.

use jobtalk_core::JobtalkError;

use crate::model::JobtalkConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects all violations rather than failing fast.
pub fn validate_config(config: &JobtalkConfig) -> Result<(), Vec<JobtalkError>> {
    let mut errors = Vec::new();

    if config.rest.base_url.trim().is_empty() {
        errors.push(JobtalkError::Config(
            "rest.base_url must not be empty".to_string(),
        ));
    } else if !has_scheme(&config.rest.base_url, &["http://", "https://"]) {
        errors.push(JobtalkError::Config(format!(
            "rest.base_url `{}` must start with http:// or https://",
            config.rest.base_url
        )));
    }

    if config.rest.health_url.trim().is_empty() {
        errors.push(JobtalkError::Config(
            "rest.health_url must not be empty".to_string(),
        ));
    }

    if config.rest.timeout_secs == 0 {
        errors.push(JobtalkError::Config(
            "rest.timeout_secs must be at least 1".to_string(),
        ));
    }

    if !has_scheme(&config.hub.url, &["ws://", "wss://"]) {
        errors.push(JobtalkError::Config(format!(
            "hub.url `{}` must start with ws:// or wss://",
            config.hub.url
        )));
    }

    if config.hub.invoke_timeout_secs == 0 {
        errors.push(JobtalkError::Config(
            "hub.invoke_timeout_secs must be at least 1".to_string(),
        ));
    }

    if config.chat.reconnect_backoff_secs.is_empty() {
        errors.push(JobtalkError::Config(
            "chat.reconnect_backoff_secs must contain at least one delay".to_string(),
        ));
    }

    if config.chat.echo_window_secs == 0 {
        errors.push(JobtalkError::Config(
            "chat.echo_window_secs must be at least 1".to_string(),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes.iter().any(|s| url.trim().starts_with(s))
}
