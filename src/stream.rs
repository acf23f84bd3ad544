// Streaming response translation.
//
// This module implements the pump at the center of the proxy: it reads the
// backend's SSE byte stream line by line and re-encodes each content delta
// as an Ollama chat chunk, one JSON object per line, yielded as soon as it
// is available.
//
// # Termination
//
// The read loop has three exits: the `data: [DONE]` sentinel, upstream EOF,
// and an upstream read error. All three collapse into the same terminal
// emission, exactly one `done: true` record with empty content. Once the
// response status has gone out, a mid-stream failure cannot be surfaced any
// other way.
use std::convert::Infallible;
use std::fmt::Display;

use async_stream::stream;
use bytes::{Bytes, BytesMut};
use futures_util::{pin_mut, Stream, StreamExt};
use tracing::{debug, error, warn};

use crate::translate::{delta_response, final_response};
use crate::types::{ChatResponse, StreamChunk};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

// Outcome of inspecting one upstream line.
#[derive(Debug, PartialEq, Eq)]
enum LineEvent {
    // Nothing to forward: blank line, empty delta, or a malformed chunk
    Skip,
    // The terminal sentinel: stop reading
    Done,
    // A content fragment to forward downstream
    Delta(String),
}

// Classifies one raw line of the upstream stream.
//
// Malformed lines (bad UTF-8, unparseable JSON) are skipped, never fatal;
// a broken chunk from the backend must not tear down the client stream.
fn classify_line(raw: &[u8]) -> LineEvent {
    let Ok(line) = std::str::from_utf8(raw) else {
        debug!("Discarding non-UTF-8 stream line");
        return LineEvent::Skip;
    };

    let line = line.trim();
    if line.is_empty() {
        return LineEvent::Skip;
    }

    let line = line.strip_prefix(DATA_PREFIX).unwrap_or(line);
    if line == DONE_SENTINEL {
        return LineEvent::Done;
    }

    match serde_json::from_str::<StreamChunk>(line) {
        Ok(chunk) => {
            let Some(choice) = chunk.choices.first() else {
                return LineEvent::Skip;
            };
            if let Some(reason) = &choice.finish_reason {
                debug!("Upstream reported finish reason: {}", reason);
            }
            match &choice.delta.content {
                Some(content) if !content.is_empty() => LineEvent::Delta(content.clone()),
                _ => LineEvent::Skip,
            }
        }
        Err(e) => {
            debug!("Discarding malformed stream line: {}", e);
            LineEvent::Skip
        }
    }
}

// Serializes one chat chunk as a newline-terminated JSON record.
fn encode_line(response: &ChatResponse) -> Bytes {
    let mut buf = serde_json::to_vec(response).unwrap_or_else(|e| {
        error!("Failed to serialize chat chunk: {}", e);
        Vec::new()
    });
    buf.push(b'\n');
    Bytes::from(buf)
}

// Translates the backend's SSE stream into newline-delimited Ollama chat
// chunks.
//
// Each yielded item is one record and becomes one HTTP body frame, so the
// client observes tokens as they arrive. The generator only advances when
// the consumer polls it: a slow client throttles upstream reads through the
// connection's own flow control, and a disconnected client drops the
// generator mid-loop, which counts as normal cancellation.
//
// Generic over the upstream error type so tests can drive the pump without
// a live connection.
pub fn chat_stream<S, E>(
    model: String,
    upstream: S,
) -> impl Stream<Item = Result<Bytes, Infallible>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    stream! {
        pin_mut!(upstream);
        let mut buffer = BytesMut::new();

        'read: loop {
            match upstream.next().await {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(&bytes);
                    while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                        let line = buffer.split_to(newline + 1);
                        match classify_line(&line) {
                            LineEvent::Skip => {}
                            LineEvent::Done => break 'read,
                            LineEvent::Delta(content) => {
                                yield Ok(encode_line(&delta_response(&model, content)));
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    // Headers are already out; this ends the stream like a
                    // normal EOF.
                    warn!("Upstream stream error: {}", e);
                    break;
                }
                // EOF. A partial line left in the buffer is stream
                // termination, not a chunk to parse.
                None => break,
            }
        }

        yield Ok(encode_line(&final_response(&model)));
    }
}
