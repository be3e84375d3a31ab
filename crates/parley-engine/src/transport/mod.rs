//! Text transport: the request shape and the seam the HTTP client sits behind.

mod http;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use serde::Serialize;

use crate::Role;

pub use http::HttpTransport;

/// A response body as it arrives off the wire.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// JSON body of a streaming chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub language: String,
    pub conversation_history: Vec<HistoryEntry>,
}

/// One prior turn sent as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The request never got a response.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The body broke off mid-stream.
    #[error("body read failed: {0}")]
    Body(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Start a streaming turn.
    ///
    /// Resolves once response headers are in. A non-2xx status is returned
    /// as [`TransportError::Status`] rather than as a body.
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_camel_case_history() {
        let request = ChatRequest {
            message: "Where is my order?".into(),
            language: "en".into(),
            conversation_history: vec![HistoryEntry {
                role: Role::Assistant,
                content: "Hi!".into(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "Where is my order?",
                "language": "en",
                "conversationHistory": [{"role": "assistant", "content": "Hi!"}]
            })
        );
    }

    #[test]
    fn status_error_display() {
        let err = TransportError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
    }
}
