//! Streaming endpoint configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where and how the text transport posts chat turns.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Full URL of the streaming chat function.
    pub url: String,
    /// Bearer credential sent with every request.
    pub api_key: String,
    /// Language hint forwarded in the request body.
    pub language: String,
    /// Number of prior `{role, content}` pairs sent as history (valid range: 0-50).
    pub history_len: u32,
    /// Connect timeout in seconds (valid range: 1-60).
    pub connect_timeout_secs: u32,
    /// Whole-request timeout in seconds (valid range: 5-600).
    pub request_timeout_secs: u32,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("language", &self.language)
            .field("history_len", &self.history_len)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321/functions/v1/chat".into(),
            api_key: String::new(),
            language: "en".into(),
            history_len: 10,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}
