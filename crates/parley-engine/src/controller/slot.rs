use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Ticket for one text request.
///
/// The generation identifies which request owns the slot; the token fires
/// when that request is superseded or cancelled.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    generation: u64,
    token: CancellationToken,
}

impl RequestHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Holds at most one active request.
#[derive(Debug, Default)]
pub struct RequestSlot {
    active: Option<(u64, CancellationToken)>,
    next_generation: u64,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is in flight and install a fresh request.
    pub fn supersede(&mut self) -> RequestHandle {
        if let Some((generation, token)) = self.active.take() {
            debug!(generation, "Superseding active request");
            token.cancel();
        }

        self.next_generation += 1;
        let token = CancellationToken::new();
        self.active = Some((self.next_generation, token.clone()));
        RequestHandle {
            generation: self.next_generation,
            token,
        }
    }

    /// Cancel the active request, if any. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some((generation, token)) => {
                debug!(generation, "Cancelling active request");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Clear the slot when `handle` finished on its own. A stale handle
    /// leaves the newer request in place.
    pub fn release(&mut self, handle: &RequestHandle) {
        if self.is_current(handle) {
            self.active = None;
        }
    }

    /// True while `handle` owns the slot and has not been cancelled.
    pub fn is_current(&self, handle: &RequestHandle) -> bool {
        match &self.active {
            Some((generation, _)) => *generation == handle.generation && !handle.is_cancelled(),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supersede_cancels_previous_request() {
        let mut slot = RequestSlot::new();
        let first = slot.supersede();
        assert!(slot.is_current(&first));

        let second = slot.supersede();
        assert!(first.is_cancelled());
        assert!(!slot.is_current(&first));
        assert!(slot.is_current(&second));
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn cancel_empties_the_slot() {
        let mut slot = RequestSlot::new();
        assert!(!slot.cancel());

        let handle = slot.supersede();
        assert!(slot.cancel());
        assert!(handle.is_cancelled());
        assert!(!slot.is_active());
        assert!(!slot.is_current(&handle));
    }

    #[test]
    fn stale_release_keeps_newer_request() {
        let mut slot = RequestSlot::new();
        let old = slot.supersede();
        let new = slot.supersede();

        slot.release(&old);
        assert!(slot.is_active());
        assert!(slot.is_current(&new));

        slot.release(&new);
        assert!(!slot.is_active());
        assert!(!new.is_cancelled());
    }
}
