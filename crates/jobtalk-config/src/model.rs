// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Jobtalk chat core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Jobtalk configuration.
///
/// Loaded from a TOML file with environment variable overrides. All sections
/// are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobtalkConfig {
    /// Job-board REST backend settings.
    #[serde(default)]
    pub rest: RestConfig,

    /// Realtime hub settings.
    #[serde(default)]
    pub hub: HubConfig,

    /// Chat session behavior settings.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// REST backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RestConfig {
    /// Base URL of the backend API, including the `/api` prefix.
    #[serde(default = "default_rest_base_url")]
    pub base_url: String,

    /// URL of the reachability probe endpoint.
    #[serde(default = "default_health_url")]
    pub health_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_rest_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_rest_base_url(),
            health_url: default_health_url(),
            timeout_secs: default_rest_timeout_secs(),
        }
    }
}

/// Realtime hub configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    /// WebSocket URL of the chat hub.
    #[serde(default = "default_hub_url")]
    pub url: String,

    /// Maximum time to wait for the hub handshake response, in seconds.
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,

    /// Maximum time to wait for an invocation completion, in seconds.
    #[serde(default = "default_invoke_timeout_secs")]
    pub invoke_timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: default_hub_url(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
            invoke_timeout_secs: default_invoke_timeout_secs(),
        }
    }
}

/// Chat session behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Reconnect delays in seconds, applied in order after each drop. The
    /// last entry repeats as the cap.
    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: Vec<u64>,

    /// Recency window in seconds within which a realtime echo may claim a
    /// matching PENDING message.
    #[serde(default = "default_echo_window_secs")]
    pub echo_window_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff_secs: default_reconnect_backoff_secs(),
            echo_window_secs: default_echo_window_secs(),
        }
    }
}

fn default_rest_base_url() -> String {
    "http://localhost:5109/api".to_string()
}

fn default_health_url() -> String {
    "http://localhost:5109/healthcheck".to_string()
}

fn default_rest_timeout_secs() -> u64 {
    10
}

fn default_hub_url() -> String {
    "ws://localhost:5109/chatHub".to_string()
}

fn default_handshake_timeout_secs() -> u64 {
    15
}

fn default_invoke_timeout_secs() -> u64 {
    10
}

fn default_reconnect_backoff_secs() -> Vec<u64> {
    vec![0, 2, 10, 30]
}

fn default_echo_window_secs() -> u64 {
    60
}
