//! Text turns: send, stream, retry.

use parley_common::{new_turn_id, Event};
use tracing::{debug, info, warn};

use crate::controller::{classify_protocol, classify_transport, RequestHandle};
use crate::state::SessionEvent;
use crate::store::Finalize;
use crate::streaming::{parse_frame, Frame, LineStream};
use crate::transport::ChatRequest;
use crate::{EngineError, Role, TurnError};

use super::manager::ChatSession;
use super::types::{ActiveTurn, SessionInner, TurnOutcome};

impl ChatSession {
    /// Send a user message and stream the reply into the transcript.
    ///
    /// Any request still in flight is superseded first. The returned future
    /// resolves once the turn reaches a terminal outcome; dropping it
    /// leaves the turn to be settled by the next send or cancel.
    pub async fn send(&self, content: &str) -> Result<TurnOutcome, EngineError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let (handle, request) = {
            let mut inner = self.lock();
            if inner.state.is_voice() {
                return Err(EngineError::VoiceActive);
            }

            let handle = inner.slot.supersede();
            self.discard_turn(&mut inner);
            self.apply(&mut inner, SessionEvent::Send);

            let history = inner.store.history(self.settings.history_len);
            let (user_id, assistant_id) = inner.store.append_turn(content);
            self.events.publish(Event::MessageAppended {
                id: user_id.clone(),
                role: Role::User.to_string(),
            });
            self.events.publish(Event::MessageAppended {
                id: assistant_id.clone(),
                role: Role::Assistant.to_string(),
            });

            let turn_id = new_turn_id();
            info!(
                session = %self.id.as_str(),
                turn = %turn_id,
                history = history.len(),
                "Text turn started"
            );
            inner.active_turn = Some(ActiveTurn {
                turn_id,
                user_id,
                assistant_id,
                attempt: 0,
                received: String::new(),
            });
            self.persist(&inner);

            let request = ChatRequest {
                message: content.to_string(),
                language: self.settings.language.clone(),
                conversation_history: history,
            };
            (handle, request)
        };

        Ok(self.run_turn(&handle, &request).await)
    }

    /// Resend the user message behind a failed reply as a fresh turn.
    ///
    /// The failed reply and the user message it answered are removed first.
    pub async fn retry(&self, error_message_id: &str) -> Result<TurnOutcome, EngineError> {
        let content = {
            let mut inner = self.lock();
            if inner.state.is_voice() {
                return Err(EngineError::VoiceActive);
            }

            let messages = inner.store.messages();
            let index = messages
                .iter()
                .position(|m| m.id == error_message_id)
                .ok_or_else(|| EngineError::MessageNotFound(error_message_id.to_string()))?;
            if !messages[index].is_error {
                return Err(EngineError::NotRetryable(error_message_id.to_string()));
            }
            let user = messages[..index]
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| (m.id.clone(), m.content.clone()));

            let Some((user_id, content)) = user else {
                return Err(EngineError::NotRetryable(error_message_id.to_string()));
            };
            for id in [error_message_id, user_id.as_str()] {
                if inner.store.remove(id) {
                    self.events.publish(Event::MessageRemoved { id: id.to_string() });
                }
            }
            self.persist(&inner);
            content
        };

        debug!(session = %self.id.as_str(), "Retrying failed turn");
        self.send(&content).await
    }

    async fn run_turn(&self, handle: &RequestHandle, request: &ChatRequest) -> TurnOutcome {
        let mut retries = 0u32;
        loop {
            let attempts = retries + 1;
            let error = match self.run_attempt(handle, request).await {
                Ok(()) => return self.complete_turn(handle, attempts),
                Err(TurnError::Cancelled) => return TurnOutcome::Cancelled { attempts },
                Err(error) => error,
            };

            if !self.record_failure(handle, &error) {
                return TurnOutcome::Cancelled { attempts };
            }

            if !self.settings.retry.should_retry(&error, retries) {
                return self.fail_turn(handle, error, attempts);
            }

            warn!(error = %error, attempt = attempts, "Text turn failed, retrying");
            tokio::select! {
                biased;
                _ = handle.token().cancelled() => return TurnOutcome::Cancelled { attempts },
                _ = tokio::time::sleep(self.settings.retry.delay) => {}
            }

            retries += 1;
            if !self.prepare_retry(handle) {
                return TurnOutcome::Cancelled { attempts };
            }
        }
    }

    /// One request/stream cycle. Every suspension point races the
    /// cancellation token, and every write goes through `if_current`.
    async fn run_attempt(
        &self,
        handle: &RequestHandle,
        request: &ChatRequest,
    ) -> Result<(), TurnError> {
        let token = handle.token().clone();

        let body = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(TurnError::Cancelled),
            opened = self.transport.open(request) => opened.map_err(|e| classify_transport(&e))?,
        };

        self.if_current(handle, |inner| self.apply(inner, SessionEvent::FirstByte))
            .ok_or(TurnError::Cancelled)?;

        let mut lines = LineStream::new(body);
        loop {
            let line = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(TurnError::Cancelled),
                next = lines.next_line() => next.map_err(|e| classify_transport(&e))?,
            };
            let Some(line) = line else {
                debug!("Stream ended without terminal frame");
                return Ok(());
            };

            match parse_frame(&line) {
                Frame::Ignore => {}
                Frame::Terminal => return Ok(()),
                Frame::Delta(text) => {
                    self.if_current(handle, |inner| self.apply_delta(inner, &text))
                        .ok_or(TurnError::Cancelled)?;
                }
                Frame::ProtocolError(code) => return Err(classify_protocol(&code)),
            }
        }
    }

    fn apply_delta(&self, inner: &mut SessionInner, text: &str) {
        let Some(turn) = inner.active_turn.as_mut() else {
            return;
        };
        turn.received.push_str(text);
        let id = turn.assistant_id.clone();
        if inner.store.patch_content(&id, text) {
            self.events.publish(Event::MessagePatched {
                id,
                delta: text.to_string(),
            });
            self.persist(inner);
        }
    }

    fn record_failure(&self, handle: &RequestHandle, error: &TurnError) -> bool {
        self.if_current(handle, |inner| {
            debug!(error = %error, "Attempt failed");
            self.apply(inner, SessionEvent::Failure);
        })
        .is_some()
    }

    /// Ready the transcript for another attempt. A placeholder that already
    /// holds partial text is replaced so the retry starts from empty.
    fn prepare_retry(&self, handle: &RequestHandle) -> bool {
        self.if_current(handle, |inner| {
            self.apply(inner, SessionEvent::AutoRetry);
            let Some(turn) = inner.active_turn.as_mut() else {
                return;
            };
            turn.attempt += 1;
            if turn.received.is_empty() {
                return;
            }

            turn.received.clear();
            let fresh = inner.store.append_placeholder();
            let stale = std::mem::replace(&mut turn.assistant_id, fresh.clone());
            if inner.store.remove(&stale) {
                self.events.publish(Event::MessageRemoved { id: stale });
            }
            self.events.publish(Event::MessageAppended {
                id: fresh,
                role: Role::Assistant.to_string(),
            });
            self.persist(inner);
        })
        .is_some()
    }

    fn complete_turn(&self, handle: &RequestHandle, attempts: u32) -> TurnOutcome {
        let finished = self.if_current(handle, |inner| {
            let turn = inner.active_turn.take()?;
            inner.store.finalize(&turn.assistant_id, Finalize::success());
            self.events.publish(Event::MessageFinalized {
                id: turn.assistant_id.clone(),
                is_error: false,
            });
            self.apply(inner, SessionEvent::StreamEnd);
            inner.slot.release(handle);
            self.persist(inner);
            info!(turn = %turn.turn_id, attempts, chars = turn.received.len(), "Text turn completed");
            Some(TurnOutcome::Completed {
                assistant_id: turn.assistant_id,
                content: turn.received,
                attempts,
            })
        });
        finished.flatten().unwrap_or(TurnOutcome::Cancelled { attempts })
    }

    fn fail_turn(&self, handle: &RequestHandle, error: TurnError, attempts: u32) -> TurnOutcome {
        let failed = self.if_current(handle, |inner| {
            let turn = inner.active_turn.take()?;
            let text = self.settings.error_text(&error);
            inner.store.finalize(&turn.assistant_id, Finalize::error(text));
            self.events.publish(Event::MessageFinalized {
                id: turn.assistant_id.clone(),
                is_error: true,
            });
            self.apply(inner, SessionEvent::Resolve);
            inner.slot.release(handle);
            self.persist(inner);
            warn!(turn = %turn.turn_id, error = %error, attempts, "Text turn failed");
            Some(turn.assistant_id)
        });

        match failed.flatten() {
            Some(assistant_id) => TurnOutcome::Failed {
                assistant_id,
                error,
                attempts,
            },
            None => TurnOutcome::Cancelled { attempts },
        }
    }
}
