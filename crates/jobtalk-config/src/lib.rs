// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Jobtalk chat core.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), file hierarchy lookup, and environment variable
//! overrides via the `JOBTALK_` prefix.
//!
//! # Usage
//!
//! ```no_run
//! let config = jobtalk_config::load_and_validate().expect("config errors");
//! println!("hub url: {}", config.hub.url);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{ChatConfig, HubConfig, JobtalkConfig, RestConfig};
pub use validation::validate_config;

use jobtalk_core::JobtalkError;

/// Load configuration from the file hierarchy and validate it.
pub fn load_and_validate() -> Result<JobtalkConfig, Vec<JobtalkError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![JobtalkError::Config(err.to_string())]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and hosts that manage their own config source.
pub fn load_and_validate_str(toml_content: &str) -> Result<JobtalkConfig, Vec<JobtalkError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![JobtalkError::Config(err.to_string())]),
    }
}
