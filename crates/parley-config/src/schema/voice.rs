//! Real-time voice channel configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Endpoint returning `{ "token": "..." }` for the voice provider.
    /// Empty disables token fetching; callers then pass a token directly.
    pub token_url: String,
    /// Content-equal transcript entries closer than this are one event
    /// (valid range: 0-10000).
    pub dedup_window_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            token_url: String::new(),
            dedup_window_ms: 1000,
        }
    }
}
