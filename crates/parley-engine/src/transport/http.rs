//! reqwest-backed transport for the streaming chat function.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use parley_config::schema::EndpointConfig;
use tracing::debug;

use crate::voice::VoiceError;
use crate::EngineError;

use super::{ByteStream, ChatRequest, ChatTransport, TransportError};

/// Longest slice of an error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 200;

/// Posts chat turns and hands back the raw event-stream body.
pub struct HttpTransport {
    url: String,
    api_key: String,
    http: reqwest::Client,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &EndpointConfig) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(u64::from(config.connect_timeout_secs)))
            .timeout(Duration::from_secs(u64::from(config.request_timeout_secs)))
            .build()
            .map_err(|e| EngineError::Http(e.to_string()))?;

        Ok(Self {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    /// Fetch a conversation token for the voice provider.
    ///
    /// The token endpoint answers `{ "token": "..." }`.
    pub async fn fetch_voice_token(&self, token_url: &str) -> Result<String, VoiceError> {
        let response = self
            .http
            .get(token_url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| VoiceError::Token(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoiceError::Token(format!("HTTP {status}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VoiceError::Token(e.to_string()))?;

        json.get("token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or(VoiceError::MissingToken)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        debug!(
            url = %self.url,
            history = request.conversation_history.len(),
            "Chat stream request"
        );

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = text.chars().take(ERROR_BODY_LIMIT).collect::<String>();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Body(e.to_string())));
        Ok(Box::pin(body))
    }
}
