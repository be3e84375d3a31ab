//! Merging voice transcripts into the text transcript.
//!
//! Providers replay their whole transcript on every update, so the same
//! utterance arrives many times. An entry is dropped when the store already
//! holds the same id, or the same content within the dedup window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::store::{ConversationStore, Message};
use crate::voice::VoiceTranscriptEntry;

#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    window: Duration,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl Reconciler {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// True when `entry` is already represented in `existing`. Both ends of
    /// the window are inclusive.
    pub fn is_duplicate(&self, existing: &[Message], entry: &VoiceTranscriptEntry) -> bool {
        existing.iter().any(|m| {
            m.id == entry.id
                || (m.content == entry.content && self.within_window(m.created_at, entry.timestamp))
        })
    }

    /// Append every new entry in order and return the ids appended.
    pub fn merge(&self, store: &mut ConversationStore, entries: &[VoiceTranscriptEntry]) -> Vec<String> {
        let mut appended = Vec::new();
        for entry in entries {
            if self.is_duplicate(store.messages(), entry) {
                trace!(id = %entry.id, "Skipping duplicate voice entry");
                continue;
            }
            store.push(Message {
                id: entry.id.clone(),
                role: entry.role,
                content: entry.content.clone(),
                created_at: entry.timestamp,
                is_streaming: false,
                is_error: false,
            });
            appended.push(entry.id.clone());
        }
        appended
    }

    fn within_window(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        let delta_ms = (a - b).num_milliseconds().unsigned_abs();
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        delta_ms <= window_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use chrono::TimeDelta;

    fn entry(id: &str, content: &str, timestamp: DateTime<Utc>) -> VoiceTranscriptEntry {
        VoiceTranscriptEntry {
            id: id.into(),
            role: Role::User,
            content: content.into(),
            timestamp,
        }
    }

    #[test]
    fn replayed_transcript_is_merged_once() {
        let reconciler = Reconciler::default();
        let mut store = ConversationStore::new();
        let t0 = Utc::now();
        let batch = vec![
            entry("v1", "Hello", t0),
            entry("v2", "How can I help?", t0 + TimeDelta::milliseconds(1500)),
        ];

        assert_eq!(reconciler.merge(&mut store, &batch), vec!["v1", "v2"]);
        assert!(reconciler.merge(&mut store, &batch).is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn same_content_inside_window_is_duplicate() {
        let reconciler = Reconciler::default();
        let mut store = ConversationStore::new();
        let t0 = Utc::now();
        reconciler.merge(&mut store, &[entry("a", "Yes", t0)]);

        let echo = entry("b", "Yes", t0 + TimeDelta::milliseconds(400));
        assert!(reconciler.is_duplicate(store.messages(), &echo));

        let edge = entry("c", "Yes", t0 + TimeDelta::milliseconds(1000));
        assert!(reconciler.is_duplicate(store.messages(), &edge));

        let earlier = entry("d", "Yes", t0 - TimeDelta::milliseconds(1000));
        assert!(reconciler.is_duplicate(store.messages(), &earlier));
    }

    #[test]
    fn same_content_outside_window_is_new() {
        let reconciler = Reconciler::default();
        let mut store = ConversationStore::new();
        let t0 = Utc::now();
        reconciler.merge(&mut store, &[entry("a", "Yes", t0)]);

        let later = entry("b", "Yes", t0 + TimeDelta::milliseconds(1001));
        assert_eq!(reconciler.merge(&mut store, &[later]), vec!["b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn matching_id_is_duplicate_even_with_new_content() {
        let reconciler = Reconciler::default();
        let mut store = ConversationStore::new();
        let t0 = Utc::now();
        reconciler.merge(&mut store, &[entry("a", "Hel", t0)]);

        let revised = entry("a", "Hello", t0 + TimeDelta::seconds(5));
        assert!(reconciler.merge(&mut store, &[revised]).is_empty());
    }

    #[test]
    fn duplicates_within_one_batch_collapse() {
        let reconciler = Reconciler::new(Duration::from_millis(500));
        let mut store = ConversationStore::new();
        let t0 = Utc::now();
        let batch = vec![
            entry("a", "Thanks", t0),
            entry("b", "Thanks", t0 + TimeDelta::milliseconds(200)),
            entry("c", "Bye", t0 + TimeDelta::milliseconds(300)),
        ];

        assert_eq!(reconciler.merge(&mut store, &batch), vec!["a", "c"]);
        let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Thanks", "Bye"]);
    }

    #[test]
    fn merged_message_keeps_entry_timestamp_and_role() {
        let reconciler = Reconciler::default();
        let mut store = ConversationStore::new();
        let t0 = Utc::now() - TimeDelta::minutes(3);
        let mut reply = entry("r", "Sure", t0);
        reply.role = Role::Assistant;
        reconciler.merge(&mut store, &[reply]);

        let message = store.get("r").unwrap();
        assert_eq!(message.created_at, t0);
        assert_eq!(message.role, Role::Assistant);
        assert!(!message.is_streaming);
    }
}
