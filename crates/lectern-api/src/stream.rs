//! Chat stream events and the line decoder
//!
//! The server answers `POST /chat` with newline-delimited records. Lines that
//! start with [`EVENT_PREFIX`] carry a JSON payload tagged by `type`; every
//! other line is noise and is dropped.

use async_stream::stream;
use futures::StreamExt;
use serde::Deserialize;
use std::fmt::Display;
use std::pin::Pin;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

/// Literal prefix identifying a line that carries an event payload
pub const EVENT_PREFIX: &str = "data: ";

/// Events decoded from the chat stream, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Continuation token for the next turn
    Checkpoint { id: String },
    /// Assistant text fragment
    Content { text: String },
    /// The server started a tool call; `action` is a human-readable status
    ToolStart { action: String },
    /// The turn finished
    End,
    /// The server or the transport failed
    Error { message: String },
}

impl StreamEvent {
    /// Check if this event finishes the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End | StreamEvent::Error { .. })
    }

    /// Short name of the event kind, as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Checkpoint { .. } => "checkpoint",
            StreamEvent::Content { .. } => "content",
            StreamEvent::ToolStart { .. } => "tool_start",
            StreamEvent::End => "end",
            StreamEvent::Error { .. } => "error",
        }
    }
}

/// A stream of decoded chat events
pub type ChatEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Payload of a `data: ` line before it is mapped to a [`StreamEvent`]
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    checkpoint_id: Option<String>,
    content: Option<String>,
    action: Option<String>,
    message: Option<String>,
}

/// Parse one complete line of the chat stream.
///
/// Returns `None` for lines without the event prefix, for payloads that are
/// not valid JSON, and for unknown event types. None of these stop decoding.
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(EVENT_PREFIX)?;

    let raw: RawEvent = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Skipping malformed stream record {:?}: {}", line, e);
            return None;
        }
    };

    match raw.event_type.as_str() {
        "checkpoint" => Some(StreamEvent::Checkpoint {
            id: raw.checkpoint_id.unwrap_or_default(),
        }),
        "content" => Some(StreamEvent::Content {
            text: raw.content.unwrap_or_default(),
        }),
        "tool_start" => Some(StreamEvent::ToolStart {
            action: raw.action.unwrap_or_default(),
        }),
        "end" => Some(StreamEvent::End),
        "error" => Some(StreamEvent::Error {
            message: raw.message.unwrap_or_default(),
        }),
        other => {
            tracing::warn!("Unknown event type: {}", other);
            None
        }
    }
}

/// Incremental decoder from raw body chunks to events.
///
/// Bytes are held until a newline arrives, so a line (or a multi-byte
/// character) split across chunks is reassembled before it is parsed. The
/// newline byte never occurs inside a UTF-8 sequence, which makes splitting
/// on raw bytes safe.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline
    scanned: usize,
}

impl EventDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk and return every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(pos) = self.buffer[from..].iter().position(|&b| b == b'\n') {
            let end = from + pos;
            if let Some(event) = decode_line(&self.buffer[start..end]) {
                events.push(event);
            }
            start = end + 1;
            from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        events
    }

    /// Flush the trailing unterminated line once the transport has closed
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if rest.is_empty() {
            return vec![];
        }
        decode_line(&rest).into_iter().collect()
    }

    /// Whether bytes of an incomplete line are waiting for more input
    pub fn has_partial_line(&self) -> bool {
        !self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> Option<StreamEvent> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    parse_line(&String::from_utf8_lossy(bytes))
}

/// Decode a body of byte chunks into a lazy stream of events.
///
/// The stream ends after `End` or when the body closes. A transport error
/// yields one `Error` event and ends the stream. Cancelling `cancel` ends the
/// stream without yielding anything further.
pub fn decode_stream<S, B, E>(body: S, cancel: CancellationToken) -> ChatEventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(stream! {
        let mut body = Box::pin(body);
        let mut decoder = EventDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Chat stream aborted");
                    return;
                }
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    for event in decoder.push(chunk.as_ref()) {
                        let end = event == StreamEvent::End;
                        yield event;
                        if end || cancel.is_cancelled() {
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("Chat stream transport error: {}", e);
                    yield StreamEvent::Error { message: e.to_string() };
                    return;
                }
                None => break,
            }
        }

        for event in decoder.finish() {
            yield event;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut decoder = EventDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.push(chunk));
        }
        events.extend(decoder.finish());
        events
    }

    fn body(chunks: Vec<&'static str>) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> {
        futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(c.as_bytes().to_vec()))
                .collect::<Vec<_>>(),
        )
    }

    const SAMPLE: &str = concat!(
        "data: {\"type\": \"checkpoint\", \"checkpoint_id\": \"abc\"}\n\n",
        ": keep-alive\n",
        "data: {\"type\": \"tool_start\", \"action\": \"Searching document...\"}\n\n",
        "data: {\"type\": \"content\", \"content\": \"Caf\u{e9} \u{2014} \u{65e5}\u{672c}\"}\n\n",
        "data: {\"type\": \"content\", \"content\": \"line\\nbreak\"}\n\n",
        "data: {\"type\": \"end\"}\n\n",
    );

    #[test]
    fn test_parse_each_event_kind() {
        assert_eq!(
            parse_line(r#"data: {"type": "checkpoint", "checkpoint_id": "abc"}"#),
            Some(StreamEvent::Checkpoint { id: "abc".into() })
        );
        assert_eq!(
            parse_line(r#"data: {"type": "content", "content": "Hel"}"#),
            Some(StreamEvent::Content { text: "Hel".into() })
        );
        assert_eq!(
            parse_line(r#"data: {"type": "tool_start", "action": "Searching document..."}"#),
            Some(StreamEvent::ToolStart {
                action: "Searching document...".into()
            })
        );
        assert_eq!(parse_line(r#"data: {"type": "end"}"#), Some(StreamEvent::End));
        assert_eq!(
            parse_line(r#"data: {"type": "error", "message": "boom"}"#),
            Some(StreamEvent::Error {
                message: "boom".into()
            })
        );
    }

    #[test]
    fn test_non_event_lines_are_noise() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line(": comment"), None);
        assert_eq!(parse_line("event: message"), None);
        // Prefix must match literally, including the space
        assert_eq!(parse_line(r#"data:{"type": "end"}"#), None);
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        assert_eq!(parse_line(r#"data: {"type": "heartbeat"}"#), None);
    }

    #[test]
    fn test_missing_fields_decode_as_empty() {
        assert_eq!(
            parse_line(r#"data: {"type": "content"}"#),
            Some(StreamEvent::Content { text: String::new() })
        );
    }

    #[test]
    fn test_malformed_line_does_not_stop_decoding() {
        let events = decode_all(&[concat!(
            "data: {\"type\": \"content\", \"content\": \"a\"}\n",
            "data: {not valid json}\n",
            "data: {\"type\": \"content\", \"content\": \"b\"}\n",
            "data: {\"type\": \"end\"}\n",
        )
        .as_bytes()]);
        assert_eq!(
            events,
            vec![
                StreamEvent::Content { text: "a".into() },
                StreamEvent::Content { text: "b".into() },
                StreamEvent::End,
            ]
        );
    }

    #[test]
    fn test_decoding_is_chunk_boundary_invariant() {
        let bytes = SAMPLE.as_bytes();
        let whole = decode_all(&[bytes]);
        assert_eq!(whole.len(), 5);

        // Every two-way split, including splits inside multi-byte characters
        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_all(&[a, b]), whole, "split at byte {}", split);
        }

        // One byte at a time
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&singles), whole);

        // Uneven chunk sizes
        let mut chunks = Vec::new();
        let mut rest = bytes;
        let mut size = 1;
        while !rest.is_empty() {
            let n = size.min(rest.len());
            let (head, tail) = rest.split_at(n);
            chunks.push(head);
            rest = tail;
            size = size % 7 + 3;
        }
        assert_eq!(decode_all(&chunks), whole);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let line = "data: {\"type\": \"content\", \"content\": \"\u{65e5}\"}\n";
        let bytes = line.as_bytes();
        let idx = line.find('\u{65e5}').unwrap() + 1;
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(&bytes[..idx]).is_empty());
        assert!(decoder.has_partial_line());
        assert_eq!(
            decoder.push(&bytes[idx..]),
            vec![StreamEvent::Content {
                text: "\u{65e5}".into()
            }]
        );
        assert!(!decoder.has_partial_line());
    }

    #[test]
    fn test_long_line_in_small_chunks_scans_only_new_bytes() {
        let text = "x".repeat(20_000);
        let line = format!("data: {}\n", serde_json::json!({"type": "content", "content": &text}));
        let bytes = line.as_bytes();
        let (body, newline) = bytes.split_at(bytes.len() - 1);

        let mut decoder = EventDecoder::new();
        for chunk in body.chunks(3) {
            assert!(decoder.push(chunk).is_empty());
            assert_eq!(decoder.scanned, decoder.buffer.len());
        }
        assert_eq!(decoder.push(newline), vec![StreamEvent::Content { text }]);
        assert_eq!(decoder.scanned, 0);
        assert!(!decoder.has_partial_line());
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = decode_all(&[b"data: {\"type\": \"end\"}\r\n"]);
        assert_eq!(events, vec![StreamEvent::End]);
    }

    #[test]
    fn test_trailing_line_flushed_on_finish() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(b"data: {\"type\": \"end\"}").is_empty());
        assert_eq!(decoder.finish(), vec![StreamEvent::End]);
        assert!(decoder.finish().is_empty());
    }

    #[tokio::test]
    async fn test_stream_stops_after_end() {
        let events: Vec<_> = decode_stream(
            body(vec![
                "data: {\"type\": \"content\", \"content\": \"hi\"}\n",
                "data: {\"type\": \"end\"}\ndata: {\"type\": \"content\", \"content\": \"late\"}\n",
            ]),
            CancellationToken::new(),
        )
        .collect()
        .await;
        assert_eq!(
            events,
            vec![StreamEvent::Content { text: "hi".into() }, StreamEvent::End]
        );
    }

    #[tokio::test]
    async fn test_stream_ends_when_body_closes_without_end() {
        let events: Vec<_> = decode_stream(
            body(vec!["data: {\"type\": \"content\", \"content\": \"partial\"}"]),
            CancellationToken::new(),
        )
        .collect()
        .await;
        assert_eq!(
            events,
            vec![StreamEvent::Content {
                text: "partial".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_transport_error_becomes_error_event() {
        let chunks = futures::stream::iter(vec![
            Ok(b"data: {\"type\": \"content\", \"content\": \"a\"}\n".to_vec()),
            Err(std::io::Error::other("connection reset")),
            Ok(b"data: {\"type\": \"content\", \"content\": \"b\"}\n".to_vec()),
        ]);
        let events: Vec<_> = decode_stream(chunks, CancellationToken::new())
            .collect()
            .await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Content { text: "a".into() },
                StreamEvent::Error {
                    message: "connection reset".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_ends_stream_silently() {
        let cancel = CancellationToken::new();
        let chunks = body(vec!["data: {\"type\": \"content\", \"content\": \"a\"}\n"])
            .chain(futures::stream::pending());
        let mut events = decode_stream(chunks, cancel.clone());

        assert_eq!(
            events.next().await,
            Some(StreamEvent::Content { text: "a".into() })
        );
        cancel.cancel();
        assert_eq!(events.next().await, None);
    }
}
