//! Newline-delimited event-frame streaming.
//!
//! The chat endpoint answers with `text/event-stream`-style lines: comments
//! start with `:`, payloads with `data:`, and `data: [DONE]` ends the turn.
//! [`LineStream`] reassembles lines across arbitrary chunk boundaries and
//! [`parse_frame`] classifies each complete line.

mod frame;
mod reader;

pub use frame::{
    parse_frame, Frame, ProtocolCode, DATA_PREFIX, DONE_SENTINEL, PAYMENT_REQUIRED_CODE,
    RATE_LIMIT_CODE,
};
pub use reader::LineStream;
