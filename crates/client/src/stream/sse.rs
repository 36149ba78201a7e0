//! Server-sent events transport.
//!
//! Reads a `text/event-stream` response incrementally and yields the `data`
//! payload of each message. Like a browser event source, a dropped connection
//! is re-opened after the current retry delay with `Last-Event-ID` set, while
//! a rejected handshake (non-success status or wrong content type) ends the
//! stream for good.

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tracing::{debug, trace};

use super::ChannelError;

const EVENT_STREAM: &str = "text/event-stream";
const LAST_EVENT_ID: &str = "Last-Event-ID";

/// Largest unterminated block kept while waiting for its blank line.
pub const MAX_BLOCK_BYTES: usize = 1 << 20;

/// One dispatched block of an event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field. `None` means the default `message` type.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`, if any were present.
    pub data: Option<String>,
    /// `id:` field.
    pub id: Option<String>,
    /// `retry:` field.
    pub retry: Option<Duration>,
}

impl SseFrame {
    /// Whether this frame is delivered to message handlers.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.data.is_some() && self.event.as_deref().is_none_or(|e| e == "message")
    }
}

/// Append a chunk to the buffer, folding `\r\n` and lone `\r` into `\n`.
///
/// A trailing `\r` is kept until the next chunk shows what follows it.
fn push_chunk(buffer: &mut Vec<u8>, chunk: &[u8]) {
    buffer.extend_from_slice(chunk);
    if !buffer.contains(&b'\r') {
        return;
    }

    let mut folded = Vec::with_capacity(buffer.len());
    let mut bytes = buffer.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        if byte != b'\r' {
            folded.push(byte);
            continue;
        }
        match bytes.peek() {
            None => folded.push(b'\r'),
            Some(&b'\n') => {}
            Some(_) => folded.push(b'\n'),
        }
    }
    *buffer = folded;
}

/// Extract a complete event block from the buffer.
///
/// Returns `Some(block)` if a blank line terminates one (and removes it from
/// the buffer), or `None` if no complete block is available yet.
fn extract_frame(buffer: &mut Vec<u8>) -> Option<String> {
    let idx = buffer.windows(2).position(|w| w == b"\n\n")?;
    let block: Vec<u8> = buffer.drain(..idx + 2).take(idx).collect();
    Some(String::from_utf8_lossy(&block).into_owned())
}

/// Parse an event block into its fields.
///
/// Returns `None` for blocks with no recognised field (comments only).
fn parse_frame(block: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut data: Option<String> = None;
    let mut seen = false;

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = line.split_once(':').map_or((line, ""), |(field, value)| {
            (field, value.strip_prefix(' ').unwrap_or(value))
        });

        match field {
            "data" => {
                match &mut data {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
                seen = true;
            }
            "event" => {
                frame.event = Some(value.to_owned()).filter(|v| !v.is_empty());
                seen = true;
            }
            "id" if !value.contains('\0') => {
                frame.id = Some(value.to_owned());
                seen = true;
            }
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    frame.retry = Some(Duration::from_millis(ms));
                    seen = true;
                }
            }
            _ => trace!(field, "ignoring unknown event stream field"),
        }
    }

    frame.data = data;
    seen.then_some(frame)
}

/// Open an auto-reconnecting event stream against `url`.
///
/// Yields `Ok(data)` for each message and `Err` for each failure. Failures
/// after which the transport gives up are the last item of the stream.
pub fn open(
    client: reqwest::Client,
    url: String,
    initial_retry: Duration,
) -> impl Stream<Item = Result<String, ChannelError>> + Send + 'static {
    stream! {
        let mut retry = initial_retry;
        let mut last_event_id: Option<String> = None;

        loop {
            let mut request = client
                .get(&url)
                .header(ACCEPT, EVENT_STREAM)
                .header(CACHE_CONTROL, "no-cache");
            if let Some(id) = last_event_id.as_deref().filter(|id| !id.is_empty()) {
                request = request.header(LAST_EVENT_ID, id);
            }

            match request.send().await {
                Err(source) => {
                    yield Err(ChannelError::Connect { url: url.clone(), source });
                }
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        yield Err(ChannelError::Status { url: url.clone(), status });
                        return;
                    }

                    let content_type = response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_owned();
                    if !content_type.starts_with(EVENT_STREAM) {
                        yield Err(ChannelError::ContentType { url: url.clone(), content_type });
                        return;
                    }

                    debug!(url = %url, "event stream open");
                    let mut buffer = Vec::new();
                    let mut bytes = std::pin::pin!(response.bytes_stream());
                    let mut failure: Option<ChannelError> = None;

                    while let Some(chunk) = bytes.next().await {
                        match chunk {
                            Ok(chunk) => {
                                push_chunk(&mut buffer, &chunk);
                                while let Some(block) = extract_frame(&mut buffer) {
                                    let Some(frame) = parse_frame(&block) else {
                                        continue;
                                    };
                                    if let Some(delay) = frame.retry {
                                        retry = delay;
                                    }
                                    if frame.id.is_some() {
                                        last_event_id.clone_from(&frame.id);
                                    }
                                    let is_message = frame.is_message();
                                    if let Some(data) = frame.data.filter(|_| is_message) {
                                        yield Ok(data);
                                    }
                                }
                                if buffer.len() > MAX_BLOCK_BYTES {
                                    failure = Some(ChannelError::Oversized {
                                        url: url.clone(),
                                        limit: MAX_BLOCK_BYTES,
                                    });
                                    break;
                                }
                            }
                            Err(source) => {
                                failure = Some(ChannelError::Dropped { url: url.clone(), source });
                                break;
                            }
                        }
                    }

                    yield Err(failure.unwrap_or_else(|| ChannelError::Closed { url: url.clone() }));
                }
            }

            debug!(url = %url, delay_ms = retry.as_millis(), "reconnecting event stream");
            tokio::time::sleep(retry).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn buffer_of(text: &str) -> Vec<u8> {
        let mut buffer = Vec::new();
        push_chunk(&mut buffer, text.as_bytes());
        buffer
    }

    #[test]
    fn test_extract_frame() {
        let mut buffer = buffer_of("data: {\"a\":1}\n\ndata: {\"b\":2}\n\n");

        let first = extract_frame(&mut buffer);
        assert_eq!(first.as_deref(), Some("data: {\"a\":1}"));

        let second = extract_frame(&mut buffer);
        assert_eq!(second.as_deref(), Some("data: {\"b\":2}"));

        assert!(extract_frame(&mut buffer).is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_extract_frame_incomplete() {
        let mut buffer = buffer_of("data: {\"partial");
        assert!(extract_frame(&mut buffer).is_none());
        assert_eq!(buffer, b"data: {\"partial");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut buffer = Vec::new();
        push_chunk(&mut buffer, b"data: x\r\n\r");
        assert!(extract_frame(&mut buffer).is_none());
        push_chunk(&mut buffer, b"\ndata: y\r\n\r\n");

        assert_eq!(extract_frame(&mut buffer).as_deref(), Some("data: x"));
        assert_eq!(extract_frame(&mut buffer).as_deref(), Some("data: y"));
    }

    #[test]
    fn test_bare_carriage_returns_end_lines() {
        let mut buffer = Vec::new();
        push_chunk(&mut buffer, b"data: a\r\r");
        // The last `\r` may still be half of a `\r\n`.
        assert!(extract_frame(&mut buffer).is_none());
        push_chunk(&mut buffer, b"data: b\rid: 3\r\r: ping\r\n\r\n");

        assert_eq!(extract_frame(&mut buffer).as_deref(), Some("data: a"));
        assert_eq!(extract_frame(&mut buffer).as_deref(), Some("data: b\nid: 3"));
        assert_eq!(extract_frame(&mut buffer).as_deref(), Some(": ping"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_parse_multiline_data() {
        let frame = parse_frame("data: first\ndata: second\nid: 7").unwrap();
        assert_eq!(frame.data.as_deref(), Some("first\nsecond"));
        assert_eq!(frame.id.as_deref(), Some("7"));
        assert!(frame.is_message());
    }

    #[test]
    fn test_parse_retry_and_comment() {
        let frame = parse_frame(": keep-alive\nretry: 1500").unwrap();
        assert_eq!(frame.retry, Some(Duration::from_millis(1500)));
        assert!(frame.data.is_none());
        assert!(!frame.is_message());
    }

    #[test]
    fn test_parse_comment_only_block() {
        assert!(parse_frame(": ping").is_none());
        assert!(parse_frame("retry: soon").is_none());
    }

    #[test]
    fn test_named_event_is_not_a_message() {
        let frame = parse_frame("event: heartbeat\ndata: {}").unwrap();
        assert!(!frame.is_message());

        let frame = parse_frame("event: message\ndata: {}").unwrap();
        assert!(frame.is_message());
    }

    #[test]
    fn test_field_without_space_or_value() {
        let frame = parse_frame("data:tight\ndata").unwrap();
        assert_eq!(frame.data.as_deref(), Some("tight\n"));
    }
}
