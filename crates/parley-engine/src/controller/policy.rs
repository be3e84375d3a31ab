use std::time::Duration;

use parley_config::schema::RetryConfig;

use crate::streaming::ProtocolCode;
use crate::transport::TransportError;
use crate::TurnError;

/// How many times a network-class failure is retried, and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(1000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// Whether a failed attempt gets another try, given how many retries
    /// have already been spent on this turn.
    pub fn should_retry(&self, error: &TurnError, retries_so_far: u32) -> bool {
        error.is_retryable() && retries_so_far < self.max_retries
    }
}

/// Map a transport failure to the turn error the user sees.
pub fn classify_transport(error: &TransportError) -> TurnError {
    match error {
        TransportError::Status { status: 429, .. } => TurnError::RateLimit,
        TransportError::Status { status: 402, .. } => TurnError::PaymentRequired,
        other => TurnError::Network(other.to_string()),
    }
}

/// Map an in-band error frame. Unknown codes are treated like a dropped
/// connection so they stay retryable.
pub fn classify_protocol(code: &ProtocolCode) -> TurnError {
    match code {
        ProtocolCode::RateLimit => TurnError::RateLimit,
        ProtocolCode::PaymentRequired => TurnError::PaymentRequired,
        ProtocolCode::Other(code) => TurnError::Network(format!("server error: {code}")),
    }
}
