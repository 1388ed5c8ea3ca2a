// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Jobtalk configuration system.

use jobtalk_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_jobtalk_config() {
    let toml = r#"
[rest]
base_url = "https://api.example.edu/api"
health_url = "https://api.example.edu/healthcheck"
timeout_secs = 5

[hub]
url = "wss://api.example.edu/chatHub"
handshake_timeout_secs = 8
invoke_timeout_secs = 4

[chat]
reconnect_backoff_secs = [0, 1, 5]
echo_window_secs = 30
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.rest.base_url, "https://api.example.edu/api");
    assert_eq!(config.rest.timeout_secs, 5);
    assert_eq!(config.hub.url, "wss://api.example.edu/chatHub");
    assert_eq!(config.hub.invoke_timeout_secs, 4);
    assert_eq!(config.chat.reconnect_backoff_secs, vec![0, 1, 5]);
    assert_eq!(config.chat.echo_window_secs, 30);
}

/// Empty input yields the compiled defaults.
#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");
    assert_eq!(config.chat.reconnect_backoff_secs, vec![0, 2, 10, 30]);
    assert_eq!(config.chat.echo_window_secs, 60);
    assert_eq!(config.rest.timeout_secs, 10);
    assert!(config.hub.url.starts_with("ws://"));
}

/// Partial sections keep defaults for unspecified keys.
#[test]
fn partial_section_keeps_defaults() {
    let toml = r#"
[hub]
url = "wss://chat.example.edu/chatHub"
"#;
    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.hub.url, "wss://chat.example.edu/chatHub");
    assert_eq!(config.hub.handshake_timeout_secs, 15);
    assert_eq!(config.rest.timeout_secs, 10);
}

/// Unknown keys are rejected at load time.
#[test]
fn unknown_field_is_rejected() {
    let toml = r#"
[chat]
echo_windw_secs = 30
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Validation failures surface as config errors.
#[test]
fn invalid_values_fail_validation() {
    let toml = r#"
[hub]
url = "http://not-a-websocket"

[chat]
reconnect_backoff_secs = []
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 2);
}
