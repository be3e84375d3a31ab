//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Parley Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[endpoint]
# url = "http://localhost:54321/functions/v1/chat"
# api_key = ""               # or set PARLEY_API_KEY
# language = "en"
# history_len = 10           # 0-50
# connect_timeout_secs = 10  # 1-60
# request_timeout_secs = 120 # 5-600

[retry]
# max_retries = 1            # 0-5, network failures only
# delay_ms = 1000            # 0-60000

[persistence]
# enabled = true
# storage_key = "parley-chat-messages"
# max_messages = 30          # 1-500
# directory = ""             # empty = platform data dir

[voice]
# token_url = ""
# dedup_window_ms = 1000     # 0-10000

[messages]
# greeting = "Hi! How can I help you today?"
# rate_limit = "We're receiving a lot of messages right now. Please wait a moment and try again."
# payment_required = "The assistant is temporarily unavailable. Please contact us directly."
# network_error = "Connection problem. Please check your network and try again."

[logging]
# level = "INFO"             # TRACE, DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
