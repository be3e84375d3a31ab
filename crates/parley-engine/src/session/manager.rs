//! ChatSession struct, transcript bookkeeping and the voice hooks.

use std::sync::{Arc, Mutex, MutexGuard};

use parley_common::{Event, EventBus, SessionId};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::controller::RequestHandle;
use crate::persistence::{PersistenceGateway, PersistenceWriter};
use crate::reconcile::Reconciler;
use crate::state::{transition, SessionEvent, SessionState};
use crate::store::{ConversationStore, Finalize, Message};
use crate::transport::ChatTransport;
use crate::voice::VoiceTranscriptEntry;
use crate::{EngineError, Role};

use super::types::{SessionInner, SessionSettings};

/// One conversation shared by the text and voice channels.
pub struct ChatSession {
    pub(super) id: SessionId,
    pub(super) inner: Mutex<SessionInner>,
    pub(super) transport: Arc<dyn ChatTransport>,
    pub(super) persistence: Option<PersistenceWriter>,
    pub(super) reconciler: Reconciler,
    pub(super) events: EventBus,
    pub(super) settings: SessionSettings,
}

impl ChatSession {
    /// Fresh session whose transcript holds only the greeting.
    pub fn new(transport: Arc<dyn ChatTransport>, settings: SessionSettings) -> Self {
        let mut store = ConversationStore::new();
        store.reset(&settings.messages.greeting);

        Self {
            id: SessionId::new(),
            inner: Mutex::new(SessionInner {
                store,
                ..SessionInner::default()
            }),
            transport,
            persistence: None,
            reconciler: Reconciler::new(settings.dedup_window),
            events: EventBus::default(),
            settings,
        }
    }

    /// Attach storage and restore whatever it holds. An empty or unreadable
    /// store keeps the greeting.
    ///
    /// Later saves run on a background writer, so this must be called from
    /// within a Tokio runtime.
    pub fn with_persistence(mut self, gateway: PersistenceGateway) -> Self {
        let restored = gateway.load();
        if !restored.is_empty() {
            info!(session = %self.id.as_str(), count = restored.len(), "Restored transcript");
            self.lock().store = ConversationStore::from_messages(restored);
        }
        self.persistence = Some(PersistenceWriter::spawn(gateway));
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Snapshot of the transcript.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().store.messages().to_vec()
    }

    pub fn message(&self, id: &str) -> Option<Message> {
        self.lock().store.get(id).cloned()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_request_active(&self) -> bool {
        self.lock().slot.is_active()
    }

    /// Cancel the in-flight text request. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        let was_active = inner.slot.cancel();
        self.discard_turn(&mut inner);
        if inner.state.is_busy() {
            self.apply(&mut inner, SessionEvent::Cancel);
        }
        if was_active {
            info!(session = %self.id.as_str(), "Text request cancelled");
        }
        was_active
    }

    /// Abort any text request and start over from the greeting.
    pub fn new_chat(&self) {
        let mut inner = self.lock();
        inner.slot.cancel();
        inner.active_turn = None;
        if inner.state.is_busy() {
            self.apply(&mut inner, SessionEvent::Cancel);
        }
        inner.store.reset(&self.settings.messages.greeting);
        self.events.publish(Event::TranscriptReset);
        self.persist(&inner);
        info!(session = %self.id.as_str(), "New chat");
    }

    /// Move to `VoiceConnecting`, cancelling any text request first.
    pub fn begin_voice(&self) -> Result<(), EngineError> {
        let mut inner = self.lock();
        transition(inner.state, SessionEvent::StartVoice)?;
        if inner.slot.cancel() {
            debug!(session = %self.id.as_str(), "Text request cancelled for voice");
        }
        self.discard_turn(&mut inner);
        self.apply(&mut inner, SessionEvent::StartVoice);
        Ok(())
    }

    pub fn voice_connected(&self) {
        let mut inner = self.lock();
        if inner.state == SessionState::VoiceConnecting {
            self.apply(&mut inner, SessionEvent::VoiceConnected);
        }
    }

    /// Back to text mode. Harmless when voice is not running.
    pub fn voice_ended(&self) {
        let mut inner = self.lock();
        if inner.state.is_voice() {
            self.apply(&mut inner, SessionEvent::EndVoice);
            self.events.publish(Event::VoiceSpeaking(false));
        }
    }

    /// Merge voice transcript entries. Returns how many were new.
    pub fn merge_voice(&self, entries: &[VoiceTranscriptEntry]) -> usize {
        let mut inner = self.lock();
        let appended = self.reconciler.merge(&mut inner.store, entries);
        if appended.is_empty() {
            return 0;
        }
        for id in &appended {
            let role = inner.store.get(id).map(|m| m.role).unwrap_or(Role::User);
            self.events.publish(Event::MessageAppended {
                id: id.clone(),
                role: role.to_string(),
            });
        }
        self.persist(&inner);
        appended.len()
    }

    pub fn set_speaking(&self, speaking: bool) {
        self.events.publish(Event::VoiceSpeaking(speaking));
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` only while `handle` still owns the request slot. The check
    /// and the write happen under one lock, so a superseded request can
    /// never slip a mutation in.
    pub(super) fn if_current<R>(
        &self,
        handle: &RequestHandle,
        f: impl FnOnce(&mut SessionInner) -> R,
    ) -> Option<R> {
        let mut inner = self.lock();
        if !inner.slot.is_current(handle) {
            return None;
        }
        Some(f(&mut *inner))
    }

    pub(super) fn apply(&self, inner: &mut SessionInner, event: SessionEvent) {
        match transition(inner.state, event) {
            Ok(next) => {
                if next != inner.state {
                    debug!(from = %inner.state, to = %next, %event, "Session state");
                    inner.state = next;
                    self.events.publish(Event::StateChanged {
                        state: next.to_string(),
                    });
                }
            }
            Err(e) => warn!(error = %e, "Ignoring session event"),
        }
    }

    /// Settle the turn that is losing the request slot.
    ///
    /// A first attempt with nothing streamed yet disappears entirely. Any
    /// other turn keeps what it has and is finalized.
    pub(super) fn discard_turn(&self, inner: &mut SessionInner) {
        let Some(turn) = inner.active_turn.take() else {
            return;
        };

        let empty = inner
            .store
            .get(&turn.assistant_id)
            .map_or(true, |m| m.content.is_empty());

        if turn.attempt == 0 && empty {
            debug!(turn = %turn.turn_id, "Removing unanswered turn");
            for id in [&turn.user_id, &turn.assistant_id] {
                if inner.store.remove(id) {
                    self.events.publish(Event::MessageRemoved { id: id.clone() });
                }
            }
        } else if inner.store.finalize(&turn.assistant_id, Finalize::success()) {
            debug!(turn = %turn.turn_id, "Keeping partial reply");
            self.events.publish(Event::MessageFinalized {
                id: turn.assistant_id.clone(),
                is_error: false,
            });
        }
        self.persist(inner);
    }

    /// Hand a snapshot to the writer. Storage is never touched under the lock.
    pub(super) fn persist(&self, inner: &SessionInner) {
        if let Some(writer) = &self.persistence {
            writer.submit(inner.store.recent(writer.max_messages()));
        }
    }
}
