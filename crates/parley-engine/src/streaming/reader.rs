//! Incremental line reassembly over a chunked response body.

use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;

use crate::transport::{ByteStream, TransportError};

type IoBody = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Async line iterator over a transport body.
///
/// Lines are split on raw `\n` bytes before decoding, so a multi-byte
/// UTF-8 character split across two chunks decodes correctly. Invalid
/// UTF-8 is replaced rather than treated as fatal.
pub struct LineStream {
    reader: BufReader<StreamReader<IoBody, Bytes>>,
    buf: Vec<u8>,
}

impl LineStream {
    pub fn new(body: ByteStream) -> Self {
        let body: IoBody = Box::pin(body.map(|chunk| chunk.map_err(io::Error::other)));
        Self {
            reader: BufReader::new(StreamReader::new(body)),
            buf: Vec::new(),
        }
    }

    /// Next complete line, or `Ok(None)` once the body and its trailing
    /// remainder are used up.
    pub async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(into_transport)?;
        if read == 0 {
            return Ok(None);
        }

        let line = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }
}

/// Recover the transport error a body chunk carried through the io layer.
fn into_transport(e: io::Error) -> TransportError {
    match e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<TransportError>())
    {
        Some(inner) => inner.clone(),
        None => TransportError::Body(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    const BODY: &str = concat!(
        ": keep-alive\n",
        "data: {\"delta\":\"Grüß \"}\n",
        "data: {\"delta\":\"dich 👋\"}\r\n",
        "\n",
        "data: [DONE]\n",
    );

    fn body(chunks: &[&[u8]]) -> ByteStream {
        let chunks: Vec<Result<Bytes, TransportError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Box::pin(stream::iter(chunks))
    }

    async fn collect(chunks: &[&[u8]]) -> Vec<String> {
        let mut lines = LineStream::new(body(chunks));
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn single_chunk_splits_on_newlines() {
        let lines = collect(&[BODY.as_bytes()]).await;
        assert_eq!(
            lines,
            vec![
                ": keep-alive",
                "data: {\"delta\":\"Grüß \"}",
                "data: {\"delta\":\"dich 👋\"}",
                "",
                "data: [DONE]",
            ]
        );
    }

    #[tokio::test]
    async fn every_split_point_yields_identical_lines() {
        let bytes = BODY.as_bytes();
        let expected = collect(&[bytes]).await;

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(collect(&[a, b]).await, expected, "split at {split}");
        }
    }

    #[tokio::test]
    async fn byte_at_a_time_reassembles_multibyte_chars() {
        let chunks: Vec<&[u8]> = BODY.as_bytes().chunks(1).collect();
        let lines = collect(&chunks).await;
        assert_eq!(lines[1], "data: {\"delta\":\"Grüß \"}");
        assert_eq!(lines[2], "data: {\"delta\":\"dich 👋\"}");
    }

    #[tokio::test]
    async fn partial_line_is_held_until_newline() {
        let lines = collect(&[b"data: {\"del", b"ta\":\"x\"}\n"]).await;
        assert_eq!(lines, vec!["data: {\"delta\":\"x\"}"]);
    }

    #[tokio::test]
    async fn unterminated_tail_is_flushed_at_end() {
        let mut lines = LineStream::new(body(&[b"data: {\"delta\":\"a\"}\ndata: ", b"[DONE]"]));

        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("data: {\"delta\":\"a\"}")
        );
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("data: [DONE]"));
        assert_eq!(lines.next_line().await.unwrap(), None);
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_fatal() {
        let lines = collect(&[b"data: \xff\xfe\n"]).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("data: "));
        assert!(lines[0].contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn body_errors_keep_their_transport_kind() {
        let chunks = vec![
            Ok(Bytes::from_static(b"data: {\"delta\":\"a\"}\n")),
            Err(TransportError::Body("connection reset".into())),
        ];
        let mut lines = LineStream::new(Box::pin(stream::iter(chunks)));

        assert!(lines.next_line().await.unwrap().is_some());
        let err = lines.next_line().await.unwrap_err();
        assert_eq!(err, TransportError::Body("connection reset".into()));
    }
}
