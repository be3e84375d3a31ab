//! Per-section validation: endpoint, retry, persistence, voice, messages.

use crate::schema::ParleyConfig;

use super::helpers::{validate_non_empty, validate_range, validate_range_u64};

/// Validate endpoint constraints.
pub(crate) fn validate_endpoint(errors: &mut Vec<String>, config: &ParleyConfig) {
    let endpoint = &config.endpoint;
    if !(endpoint.url.starts_with("http://") || endpoint.url.starts_with("https://")) {
        errors.push(format!(
            "endpoint.url = {:?} must be an http(s) URL",
            endpoint.url
        ));
    }
    validate_non_empty(errors, "endpoint.language", &endpoint.language);
    validate_range(errors, "endpoint.history_len", endpoint.history_len, 0, 50);
    validate_range(
        errors,
        "endpoint.connect_timeout_secs",
        endpoint.connect_timeout_secs,
        1,
        60,
    );
    validate_range(
        errors,
        "endpoint.request_timeout_secs",
        endpoint.request_timeout_secs,
        5,
        600,
    );
}

/// Validate retry constraints.
pub(crate) fn validate_retry(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_range(errors, "retry.max_retries", config.retry.max_retries, 0, 5);
    validate_range_u64(errors, "retry.delay_ms", config.retry.delay_ms, 0, 60_000);
}

/// Validate persistence constraints.
pub(crate) fn validate_persistence(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_non_empty(
        errors,
        "persistence.storage_key",
        &config.persistence.storage_key,
    );
    validate_range(
        errors,
        "persistence.max_messages",
        config.persistence.max_messages,
        1,
        500,
    );
}

/// Validate voice constraints.
pub(crate) fn validate_voice(errors: &mut Vec<String>, config: &ParleyConfig) {
    let token_url = &config.voice.token_url;
    if !token_url.is_empty()
        && !(token_url.starts_with("http://") || token_url.starts_with("https://"))
    {
        errors.push(format!("voice.token_url = {token_url:?} must be an http(s) URL"));
    }
    validate_range_u64(
        errors,
        "voice.dedup_window_ms",
        config.voice.dedup_window_ms,
        0,
        10_000,
    );
}

/// Validate canned message texts.
pub(crate) fn validate_messages(errors: &mut Vec<String>, config: &ParleyConfig) {
    let messages = &config.messages;
    validate_non_empty(errors, "messages.greeting", &messages.greeting);
    validate_non_empty(errors, "messages.rate_limit", &messages.rate_limit);
    validate_non_empty(errors, "messages.payment_required", &messages.payment_required);
    validate_non_empty(errors, "messages.network_error", &messages.network_error);
}
