//! Classification of a single event-stream line.

use serde_json::Value;
use tracing::trace;

/// Prefix of every payload-carrying line.
pub const DATA_PREFIX: &str = "data:";
/// Payload marking normal end of stream.
pub const DONE_SENTINEL: &str = "[DONE]";
/// In-band code the server uses when the caller is being throttled.
pub const RATE_LIMIT_CODE: &str = "rate_limit";
/// In-band code the server uses when the workspace is out of credits.
pub const PAYMENT_REQUIRED_CODE: &str = "payment_required";

/// Error code carried inside an otherwise successful stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolCode {
    RateLimit,
    PaymentRequired,
    Other(String),
}

impl ProtocolCode {
    pub fn from_code(code: &str) -> Self {
        sentinel(code).unwrap_or_else(|| ProtocolCode::Other(code.to_string()))
    }
}

/// What one line means to the turn being streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Blank line, comment/heartbeat, unknown field, or unusable payload.
    Ignore,
    /// `data: [DONE]`.
    Terminal,
    /// Text to append to the in-progress reply.
    Delta(String),
    /// Server-signalled failure.
    ProtocolError(ProtocolCode),
}

/// Classify one complete line (without its trailing newline).
pub fn parse_frame(line: &str) -> Frame {
    if line.trim().is_empty() || line.starts_with(':') {
        return Frame::Ignore;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignore;
    };

    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Frame::Terminal;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => classify_payload(&value),
        Err(e) => match sentinel(payload) {
            Some(code) => Frame::ProtocolError(code),
            None => {
                trace!(error = %e, "Dropping unparsable frame");
                Frame::Ignore
            }
        },
    }
}

fn classify_payload(value: &Value) -> Frame {
    match value {
        Value::String(s) => match sentinel(s) {
            Some(code) => Frame::ProtocolError(code),
            None => Frame::Ignore,
        },
        Value::Object(obj) => {
            if let Some(code) = obj.get("error").and_then(error_code) {
                return Frame::ProtocolError(ProtocolCode::from_code(&code));
            }
            let text = obj
                .get("delta")
                .and_then(Value::as_str)
                .or_else(|| value.pointer("/choices/0/delta/content").and_then(Value::as_str));
            match text {
                Some(t) if !t.is_empty() => Frame::Delta(t.to_string()),
                _ => Frame::Ignore,
            }
        }
        _ => Frame::Ignore,
    }
}

fn error_code(error: &Value) -> Option<String> {
    match error {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("code")
            .or_else(|| obj.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(error.to_string())),
        other => Some(other.to_string()),
    }
}

/// Recognize the two error sentinels, tolerating case and stray quotes.
fn sentinel(raw: &str) -> Option<ProtocolCode> {
    let code = raw.trim().trim_matches('"').to_ascii_lowercase();
    match code.as_str() {
        RATE_LIMIT_CODE | "rate_limited" | "rate_limit_exceeded" => Some(ProtocolCode::RateLimit),
        PAYMENT_REQUIRED_CODE => Some(ProtocolCode::PaymentRequired),
        _ => None,
    }
}
