use tokio::sync::watch;
use tracing::{debug, warn};

use crate::store::Message;

use super::PersistenceGateway;

/// Background saver sitting between a session and its gateway.
///
/// `submit` only swaps in the latest snapshot; a spawned task writes it on
/// the blocking pool. Snapshots submitted while a write is running collapse
/// into the newest one, so a burst of stream deltas costs at most one
/// extra write.
#[derive(Debug)]
pub struct PersistenceWriter {
    tx: watch::Sender<Vec<Message>>,
    max_messages: usize,
}

impl PersistenceWriter {
    /// Start the writer task. Must be called from within a Tokio runtime.
    pub fn spawn(gateway: PersistenceGateway) -> Self {
        let (tx, mut rx) = watch::channel(Vec::new());
        let max_messages = gateway.max_messages();

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                let gateway = gateway.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || gateway.save(&snapshot)).await {
                    warn!(error = %e, "Transcript write task failed");
                }
            }
            debug!("Persistence writer stopped");
        });

        Self { tx, max_messages }
    }

    /// How many trailing messages a snapshot needs to carry.
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Queue `messages` for saving. Never waits on storage.
    pub fn submit(&self, messages: &[Message]) {
        self.tx.send_replace(messages.to_vec());
    }
}
