//! The ordered transcript.
//!
//! Messages are only ever appended at the tail, grown while streaming, and
//! frozen once finalized. Ids are unique for the lifetime of the store.

use chrono::{DateTime, Utc};
use parley_common::new_id;
use serde::{Deserialize, Serialize};

use crate::transport::HistoryEntry;
use crate::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Content may still grow.
    #[serde(default)]
    pub is_streaming: bool,
    /// Content is a canned failure text.
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            is_streaming: false,
            is_error: false,
        }
    }

    /// Empty assistant message that a stream will fill.
    pub fn placeholder() -> Self {
        Self {
            is_streaming: true,
            ..Self::new(Role::Assistant, "")
        }
    }
}

/// How a streaming message is closed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Finalize {
    /// Replaces the accumulated content when set.
    pub content: Option<String>,
    pub is_error: bool,
}

impl Finalize {
    /// Keep whatever streamed in.
    pub fn success() -> Self {
        Self::default()
    }

    /// Swap the content for a canned failure text.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a user message and its streaming assistant placeholder.
    /// Returns `(user_id, assistant_id)`.
    pub fn append_turn(&mut self, content: &str) -> (String, String) {
        let user = Message::new(Role::User, content);
        let user_id = user.id.clone();
        self.messages.push(user);
        (user_id, self.append_placeholder())
    }

    /// Append a lone streaming assistant placeholder.
    pub fn append_placeholder(&mut self) -> String {
        let placeholder = Message::placeholder();
        let id = placeholder.id.clone();
        self.messages.push(placeholder);
        id
    }

    /// Append a finished message as-is.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append `delta` to a streaming message. Returns false (and changes
    /// nothing) when the id is unknown or the message is already final.
    pub fn patch_content(&mut self, id: &str, delta: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.is_streaming => {
                message.content.push_str(delta);
                true
            }
            _ => false,
        }
    }

    /// Close a streaming message. A message that is already final is left
    /// untouched.
    pub fn finalize(&mut self, id: &str, finalize: Finalize) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.is_streaming => {
                if let Some(content) = finalize.content {
                    message.content = content;
                }
                message.is_streaming = false;
                message.is_error = finalize.is_error;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Drop everything and start over with a single greeting.
    pub fn reset(&mut self, greeting: &str) {
        self.messages.clear();
        self.messages.push(Message::new(Role::Assistant, greeting));
    }

    /// The last `n` messages regardless of state.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// The last `n` settled messages as request context. Failed replies,
    /// in-progress replies and empty messages are left out.
    pub fn history(&self, n: usize) -> Vec<HistoryEntry> {
        let settled: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| !m.is_error && !m.is_streaming && !m.content.is_empty())
            .collect();
        let start = settled.len().saturating_sub(n);
        settled[start..]
            .iter()
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}
