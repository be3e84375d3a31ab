//! Request lifecycle: one active text request at a time, bounded retries.
//!
//! `RequestSlot` owns the cancellation token of the in-flight request and
//! hands out generation-tagged handles. A handle that is no longer current
//! must not write to the transcript.

mod policy;
mod slot;

pub use policy::{classify_protocol, classify_transport, RetryPolicy};
pub use slot::{RequestHandle, RequestSlot};
