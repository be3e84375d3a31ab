//! Routes a voice provider's events into the chat session.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::session::ChatSession;
use crate::EngineError;

use super::types::{VoiceProvider, VoiceProviderEvent, VoiceStatus, VoiceTranscriptEntry};

/// Owns the provider connection for one session.
pub struct VoiceSessionAdapter {
    provider: Arc<dyn VoiceProvider>,
    session: Arc<ChatSession>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceSessionAdapter {
    pub fn new(provider: Arc<dyn VoiceProvider>, session: Arc<ChatSession>) -> Self {
        Self {
            provider,
            session,
            pump: Mutex::new(None),
        }
    }

    pub fn status(&self) -> VoiceStatus {
        self.provider.status()
    }

    pub fn is_speaking(&self) -> bool {
        self.provider.is_speaking()
    }

    /// Connect and start forwarding events.
    ///
    /// Any text request is cancelled first. On failure the session is back
    /// in text mode before the error is returned.
    pub async fn start(&self, token: &str) -> Result<(), EngineError> {
        self.session.begin_voice()?;
        let events = self.provider.subscribe();

        if let Err(e) = self.provider.connect(token).await {
            warn!(error = %e, "Voice connect failed");
            self.session.voice_ended();
            return Err(e.into());
        }

        info!(session = %self.session.id().as_str(), "Voice session connected");
        self.session.voice_connected();

        let pump = tokio::spawn(forward_events(events, Arc::clone(&self.session)));
        if let Some(old) = self.lock_pump().replace(pump) {
            old.abort();
        }
        Ok(())
    }

    /// End the provider session and return to text mode.
    pub async fn stop(&self) -> Result<(), EngineError> {
        if let Some(pump) = self.lock_pump().take() {
            pump.abort();
        }
        let result = self.provider.end_session().await;
        self.session.voice_ended();
        info!(session = %self.session.id().as_str(), "Voice session ended");
        result.map_err(EngineError::from)
    }

    fn lock_pump(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pump.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for VoiceSessionAdapter {
    fn drop(&mut self) {
        if let Some(pump) = self.lock_pump().take() {
            pump.abort();
        }
    }
}

/// Forward provider events until the provider disconnects or errors.
async fn forward_events(
    mut events: broadcast::Receiver<VoiceProviderEvent>,
    session: Arc<ChatSession>,
) {
    loop {
        match events.recv().await {
            Ok(VoiceProviderEvent::Transcript { role, message }) => {
                let entry = VoiceTranscriptEntry::new(role, message);
                let added = session.merge_voice(std::slice::from_ref(&entry));
                debug!(role = %role, added, "Voice transcript");
            }
            Ok(VoiceProviderEvent::Speaking(speaking)) => session.set_speaking(speaking),
            Ok(VoiceProviderEvent::Status(VoiceStatus::Disconnected)) => {
                info!("Voice provider disconnected");
                session.voice_ended();
                return;
            }
            Ok(VoiceProviderEvent::Status(status)) => debug!(?status, "Voice status"),
            Ok(VoiceProviderEvent::Error(message)) => {
                warn!(error = %message, "Voice provider error");
                session.voice_ended();
                return;
            }
            Err(RecvError::Lagged(n)) => {
                warn!(skipped = n, "Voice event receiver lagged");
            }
            Err(RecvError::Closed) => {
                session.voice_ended();
                return;
            }
        }
    }
}
