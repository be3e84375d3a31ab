//! Local transcript persistence configuration.

use serde::{Deserialize, Serialize};

/// Where the recent transcript is cached between launches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    /// Key the serialized transcript is stored under.
    pub storage_key: String,
    /// Most recent messages kept on every write (valid range: 1-500).
    pub max_messages: u32,
    /// Storage directory override. Empty means the platform data dir.
    pub directory: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage_key: "parley-chat-messages".into(),
            max_messages: 30,
            directory: String::new(),
        }
    }
}
