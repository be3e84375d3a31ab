//! Real-time voice channel.
//!
//! The provider itself is external; this module defines the capability set
//! the engine consumes and the adapter that routes its events into the
//! session.

mod adapter;
mod types;

pub use adapter::VoiceSessionAdapter;
pub use types::{VoiceError, VoiceProvider, VoiceProviderEvent, VoiceStatus, VoiceTranscriptEntry};
