//! Parley configuration system.
//!
//! Provides TOML-based configuration with full validation. All config
//! sections use sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use parley_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ParleyConfig, API_KEY_ENV, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use parley_common::ConfigError;

/// Convenience function to load config from the platform default path.
///
/// Loads `config.toml` from the OS config directory, creates a default
/// if none exists, applies environment overrides, and validates the result.
pub fn load_config() -> Result<ParleyConfig, ConfigError> {
    let mut config = toml_loader::load_default()?;
    config.apply_env_overrides();
    validation::validate(&config)?;
    Ok(config)
}

/// Like [`load_config`] but from an explicit file.
pub fn load_config_from(path: &Path) -> Result<ParleyConfig, ConfigError> {
    let mut config = toml_loader::load_from_path(path)?;
    config.apply_env_overrides();
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
///
/// The API key is blanked; this output is meant for diagnostics.
pub fn config_to_json(config: &ParleyConfig) -> String {
    let mut redacted = config.clone();
    if !redacted.endpoint.api_key.is_empty() {
        redacted.endpoint.api_key = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
