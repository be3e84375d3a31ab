//! Conversational session engine for the Parley support widget.
//!
//! Runs one conversation over two transports and keeps a single transcript:
//! - Streaming text turns (newline-delimited `data:` frames over HTTP POST)
//! - Real-time voice sessions through an external provider
//! - Supersede-on-send cancellation with a bounded retry policy
//! - Duplicate-free merging of voice transcripts
//! - Best-effort local persistence of recent messages

pub mod controller;
pub mod persistence;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod store;
pub mod streaming;
pub mod transport;
pub mod voice;

use std::fmt;

pub use controller::{RequestHandle, RequestSlot, RetryPolicy};
pub use persistence::{
    FileStore, KeyValueStore, MemoryStore, PersistenceGateway, PersistenceWriter,
};
pub use reconcile::Reconciler;
pub use session::{ChatSession, SessionSettings, TurnOutcome};
pub use state::{SessionEvent, SessionState};
pub use store::{ConversationStore, Finalize, Message};
pub use streaming::{parse_frame, Frame, LineStream, ProtocolCode};
pub use transport::{ChatRequest, ChatTransport, HistoryEntry, HttpTransport, TransportError};
pub use voice::{
    VoiceError, VoiceProvider, VoiceProviderEvent, VoiceSessionAdapter, VoiceStatus,
    VoiceTranscriptEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a text turn ended without an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("Rate limited")]
    RateLimit,
    #[error("Payment required")]
    PaymentRequired,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Cancelled")]
    Cancelled,
}

impl TurnError {
    /// Only network-class failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TurnError::Network(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a voice session is active")]
    VoiceActive,
    #[error("invalid state transition: {event} while {from}")]
    InvalidTransition {
        from: SessionState,
        event: SessionEvent,
    },
    #[error("message not found: {0}")]
    MessageNotFound(String),
    #[error("message {0} is not a failed reply")]
    NotRetryable(String),
    #[error(transparent)]
    Voice(#[from] VoiceError),
    #[error("http client error: {0}")]
    Http(String),
}

impl From<EngineError> for parley_common::ParleyError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Voice(e) => parley_common::ParleyError::Voice(e.to_string()),
            other => parley_common::ParleyError::Engine(other.to_string()),
        }
    }
}
