//! HTTP contract tests for the streaming transport.
//!
//! These run the real reqwest client against a local mock server and check
//! the request shape, status mapping and end-to-end streaming.

use std::sync::Arc;
use std::time::Duration;

use parley_config::schema::EndpointConfig;
use parley_engine::{
    ChatRequest, ChatSession, ChatTransport, HistoryEntry, HttpTransport, RetryPolicy, Role,
    SessionSettings, TransportError, TurnError, TurnOutcome, VoiceError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_HELLO: &str = concat!(
    ": ping\n\n",
    "data: {\"delta\":\"Hel\"}\n\n",
    "data: {\"delta\":\"lo\"}\n\n",
    "data: [DONE]\n\n",
);

fn endpoint(server: &MockServer) -> EndpointConfig {
    EndpointConfig {
        url: format!("{}/functions/v1/chat", server.uri()),
        api_key: "test-key".into(),
        ..EndpointConfig::default()
    }
}

fn session(server: &MockServer) -> ChatSession {
    let transport = HttpTransport::new(&endpoint(server)).unwrap();
    ChatSession::new(
        Arc::new(transport),
        SessionSettings {
            retry: RetryPolicy {
                max_retries: 1,
                delay: Duration::from_millis(10),
            },
            ..SessionSettings::default()
        },
    )
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

#[tokio::test]
async fn request_carries_headers_and_camel_case_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/chat"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("accept", "text/event-stream"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "message": "Where is my order?",
            "language": "en",
            "conversationHistory": [{"role": "assistant", "content": "Hi!"}]
        })))
        .respond_with(sse(SSE_HELLO))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&endpoint(&server)).unwrap();
    let request = ChatRequest {
        message: "Where is my order?".into(),
        language: "en".into(),
        conversation_history: vec![HistoryEntry {
            role: Role::Assistant,
            content: "Hi!".into(),
        }],
    };
    assert!(transport.open(&request).await.is_ok());
}

#[tokio::test]
async fn streamed_reply_lands_in_transcript() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/chat"))
        .and(body_partial_json(json!({"message": "hi"})))
        .respond_with(sse(SSE_HELLO))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let outcome = session.send("hi").await.unwrap();
    assert!(matches!(
        outcome,
        TurnOutcome::Completed { ref content, attempts: 1, .. } if content == "Hello"
    ));
    let last = session.messages().pop().unwrap();
    assert_eq!(last.content, "Hello");
    assert!(!last.is_streaming);
}

#[tokio::test]
async fn status_429_maps_to_rate_limit_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let outcome = session.send("hi").await.unwrap();
    assert!(matches!(
        outcome,
        TurnOutcome::Failed {
            error: TurnError::RateLimit,
            attempts: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn status_402_maps_to_payment_required() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let outcome = session.send("hi").await.unwrap();
    assert!(matches!(
        outcome,
        TurnOutcome::Failed {
            error: TurnError::PaymentRequired,
            ..
        }
    ));
}

#[tokio::test]
async fn server_error_is_retried_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    let session = session(&server);
    let outcome = session.send("hi").await.unwrap();
    assert!(matches!(
        outcome,
        TurnOutcome::Failed {
            error: TurnError::Network(_),
            attempts: 2,
            ..
        }
    ));
    let last = session.messages().pop().unwrap();
    assert!(last.is_error);
    assert_eq!(last.content, session.settings().messages.network_error);
}

#[tokio::test]
async fn status_error_body_is_truncated() {
    let server = MockServer::start().await;
    let long_body = "x".repeat(1000);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string(long_body))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&endpoint(&server)).unwrap();
    let request = ChatRequest {
        message: "hi".into(),
        language: "en".into(),
        conversation_history: Vec::new(),
    };
    match transport.open(&request).await {
        Err(TransportError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body.len(), 200);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a status error"),
    }
}

#[tokio::test]
async fn voice_token_is_fetched_with_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/functions/v1/voice-token"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "conv-123"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&endpoint(&server)).unwrap();
    let token = transport
        .fetch_voice_token(&format!("{}/functions/v1/voice-token", server.uri()))
        .await
        .unwrap();
    assert_eq!(token, "conv-123");
}

#[tokio::test]
async fn voice_token_missing_from_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&endpoint(&server)).unwrap();
    let err = transport
        .fetch_voice_token(&format!("{}/token", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err, VoiceError::MissingToken);
}
