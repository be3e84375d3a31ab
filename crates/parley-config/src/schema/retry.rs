use serde::{Deserialize, Serialize};

/// Automatic retry for network-class failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (valid range: 0-5).
    pub max_retries: u32,
    /// Fixed delay before each retry in milliseconds (valid range: 0-60000).
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay_ms: 1000,
        }
    }
}
