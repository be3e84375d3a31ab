//! Session state machine with validated transitions.
//!
//! Text turns: Idle -> Sending -> StreamingResponse -> Idle, with
//! Sending/StreamingResponse -> Error -> Sending (auto retry) or Idle.
//! Voice: Idle -> VoiceConnecting -> VoiceActive -> Idle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Sending,
    StreamingResponse,
    Error,
    VoiceConnecting,
    VoiceActive,
}

impl SessionState {
    pub fn is_voice(self) -> bool {
        matches!(self, SessionState::VoiceConnecting | SessionState::VoiceActive)
    }

    /// A text request is between send and its terminal outcome.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            SessionState::Sending | SessionState::StreamingResponse | SessionState::Error
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Sending => "sending",
            SessionState::StreamingResponse => "streaming",
            SessionState::Error => "error",
            SessionState::VoiceConnecting => "voice-connecting",
            SessionState::VoiceActive => "voice-active",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Send,
    /// Response headers arrived.
    FirstByte,
    StreamEnd,
    /// An attempt failed with a classified error.
    Failure,
    AutoRetry,
    /// The failure is final and has been shown.
    Resolve,
    Cancel,
    StartVoice,
    VoiceConnected,
    EndVoice,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionEvent::Send => "send",
            SessionEvent::FirstByte => "first-byte",
            SessionEvent::StreamEnd => "stream-end",
            SessionEvent::Failure => "failure",
            SessionEvent::AutoRetry => "auto-retry",
            SessionEvent::Resolve => "resolve",
            SessionEvent::Cancel => "cancel",
            SessionEvent::StartVoice => "start-voice",
            SessionEvent::VoiceConnected => "voice-connected",
            SessionEvent::EndVoice => "end-voice",
        };
        f.write_str(name)
    }
}

/// Next state for `event` in `from`, or an error when the event is not
/// allowed there.
///
/// A send in any text state supersedes the running request. Starting voice
/// from a text state cancels the text request first.
pub fn transition(from: SessionState, event: SessionEvent) -> Result<SessionState, EngineError> {
    use SessionEvent as E;
    use SessionState as S;

    let next = match (from, event) {
        (S::Idle | S::Sending | S::StreamingResponse | S::Error, E::Send) => S::Sending,
        (S::Sending, E::FirstByte) => S::StreamingResponse,
        (S::StreamingResponse, E::StreamEnd) => S::Idle,
        (S::Sending | S::StreamingResponse, E::Failure) => S::Error,
        (S::Error, E::AutoRetry) => S::Sending,
        (S::Error, E::Resolve) => S::Idle,
        (S::Sending | S::StreamingResponse | S::Error, E::Cancel) => S::Idle,
        (S::Idle | S::Sending | S::StreamingResponse | S::Error, E::StartVoice) => {
            S::VoiceConnecting
        }
        (S::VoiceConnecting, E::VoiceConnected) => S::VoiceActive,
        (S::VoiceConnecting | S::VoiceActive, E::EndVoice) => S::Idle,
        _ => return Err(EngineError::InvalidTransition { from, event }),
    };
    Ok(next)
}
