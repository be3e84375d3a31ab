//! User-visible canned texts.

use serde::{Deserialize, Serialize};

/// Greeting and canonical error strings written into the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub greeting: String,
    pub rate_limit: String,
    pub payment_required: String,
    pub network_error: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi! How can I help you today?".into(),
            rate_limit: "We're receiving a lot of messages right now. Please wait a moment and try again."
                .into(),
            payment_required: "The assistant is temporarily unavailable. Please contact us directly."
                .into(),
            network_error: "Connection problem. Please check your network and try again.".into(),
        }
    }
}
