//! Configuration schema types for Parley.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the widget's shipped defaults.

mod endpoint;
mod messages;
mod persistence;
mod retry;
mod system;
mod voice;

pub use endpoint::*;
pub use messages::*;
pub use persistence::*;
pub use retry::*;
pub use system::*;
pub use voice::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Environment variable that overrides `endpoint.api_key`.
pub const API_KEY_ENV: &str = "PARLEY_API_KEY";

/// Root configuration for the chat engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ParleyConfig {
    pub endpoint: EndpointConfig,
    pub retry: RetryConfig,
    pub persistence: PersistenceConfig,
    pub voice: VoiceConfig,
    pub messages: MessagesConfig,
    pub logging: LoggingConfig,
}

impl ParleyConfig {
    /// Replace the API key from `PARLEY_API_KEY` when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.endpoint.api_key = key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_behavior() {
        let config = ParleyConfig::default();
        assert_eq!(config.endpoint.history_len, 10);
        assert_eq!(config.endpoint.language, "en");
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.persistence.max_messages, 30);
        assert_eq!(config.voice.dedup_window_ms, 1000);
        assert!(config.persistence.enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ParleyConfig = toml::from_str(
            r#"
[retry]
max_retries = 2
"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.persistence.storage_key, "parley-chat-messages");
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = ParleyConfig::default();
        config.endpoint.api_key = "sk-very-secret".into();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn log_level_parses_uppercase() {
        let config: LoggingConfig = toml::from_str(r#"level = "DEBUG""#).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.level.as_directive(), "debug");
        assert_eq!(LogLevel::Warning.as_directive(), "warn");
    }
}
