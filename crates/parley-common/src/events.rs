use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Transcript and session notifications for whatever renders the widget.
///
/// Tagged so a webview bridge can forward them as JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    MessageAppended { id: String, role: String },
    MessagePatched { id: String, delta: String },
    MessageFinalized { id: String, is_error: bool },
    MessageRemoved { id: String },
    TranscriptReset,
    StateChanged { state: String },
    VoiceSpeaking(bool),
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
