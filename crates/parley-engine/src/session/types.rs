//! Session settings, turn outcomes and lock-protected internals.

use std::time::Duration;

use parley_config::schema::MessagesConfig;
use parley_config::ParleyConfig;

use crate::controller::{RequestSlot, RetryPolicy};
use crate::state::SessionState;
use crate::store::ConversationStore;
use crate::TurnError;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub language: String,
    /// Prior messages sent with each turn.
    pub history_len: usize,
    pub retry: RetryPolicy,
    pub dedup_window: Duration,
    pub messages: MessagesConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language: "en".into(),
            history_len: 10,
            retry: RetryPolicy::default(),
            dedup_window: Duration::from_millis(1000),
            messages: MessagesConfig::default(),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self {
            language: config.endpoint.language.clone(),
            history_len: config.endpoint.history_len as usize,
            retry: RetryPolicy::from(&config.retry),
            dedup_window: Duration::from_millis(config.voice.dedup_window_ms),
            messages: config.messages.clone(),
        }
    }

    /// Canned transcript text for a terminal failure.
    pub fn error_text(&self, error: &TurnError) -> &str {
        match error {
            TurnError::RateLimit => &self.messages.rate_limit,
            TurnError::PaymentRequired => &self.messages.payment_required,
            TurnError::Network(_) | TurnError::Cancelled => &self.messages.network_error,
        }
    }
}

/// How a `send` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed {
        assistant_id: String,
        content: String,
        attempts: u32,
    },
    Failed {
        assistant_id: String,
        error: TurnError,
        attempts: u32,
    },
    /// Superseded or cancelled; nothing was written after that point.
    Cancelled { attempts: u32 },
}

/// The text turn that currently owns the request slot.
#[derive(Debug)]
pub(super) struct ActiveTurn {
    pub(super) turn_id: String,
    pub(super) user_id: String,
    pub(super) assistant_id: String,
    /// Zero for the first attempt.
    pub(super) attempt: u32,
    /// Text streamed in by the current attempt.
    pub(super) received: String,
}

#[derive(Debug, Default)]
pub(super) struct SessionInner {
    pub(super) store: ConversationStore,
    pub(super) slot: RequestSlot,
    pub(super) state: SessionState,
    pub(super) active_turn: Option<ActiveTurn>,
}
