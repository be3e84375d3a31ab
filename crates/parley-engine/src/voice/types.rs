use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_common::new_id;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStatus {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Everything a provider reports after `connect`.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceProviderEvent {
    Status(VoiceStatus),
    Speaking(bool),
    /// One recognized or spoken utterance.
    Transcript { role: Role, message: String },
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    #[error("voice connect failed: {0}")]
    Connect(String),
    #[error("voice end failed: {0}")]
    End(String),
    #[error("voice token missing from response")]
    MissingToken,
    #[error("voice token request failed: {0}")]
    Token(String),
}

/// A transcript line from the voice channel, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceTranscriptEntry {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl VoiceTranscriptEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Capability set of an external real-time voice provider.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    async fn connect(&self, token: &str) -> Result<(), VoiceError>;

    async fn end_session(&self) -> Result<(), VoiceError>;

    fn status(&self) -> VoiceStatus;

    fn is_speaking(&self) -> bool;

    /// Events emitted from now on. Subscribe before `connect` to see the
    /// first status change.
    fn subscribe(&self) -> broadcast::Receiver<VoiceProviderEvent>;
}
