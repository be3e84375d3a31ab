//! The conversation session.
//!
//! `ChatSession` owns the transcript, the session state and the single
//! request slot. Text turns run through `send`; the voice adapter drives
//! the voice hooks. Every transcript mutation is published on the event bus
//! and written through the persistence gateway.

mod chat;
mod manager;
mod types;


pub use manager::ChatSession;
pub use types::{SessionSettings, TurnOutcome};
