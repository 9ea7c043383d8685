//! Server-sent events decoding for provider streams.

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;

use crate::error::{LlmError, Result};
use crate::registry::Provider;
use crate::types::StreamDelta;
use crate::DeltaStream;

/// Incremental SSE decoder. Yields the joined `data` field of each event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the events completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
            self.handle_line(&line, &mut events);
        }
        events
    }

    /// Flush a trailing unterminated line and any pending event.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buf.is_empty() {
            let raw = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&raw);
            let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
            self.handle_line(&line, &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if !self.data.is_empty() {
            events.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}

/// Decode a byte stream into SSE data payloads.
pub fn sse_data<S, E>(bytes: S) -> impl Stream<Item = std::result::Result<String, E>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: Send + 'static,
{
    let state = (bytes, SseDecoder::new(), VecDeque::new(), false);
    stream::unfold(state, |(mut bytes, mut decoder, mut pending, mut done)| async move {
        loop {
            if let Some(event) = pending.pop_front() {
                return Some((Ok(event), (bytes, decoder, pending, done)));
            }
            if done {
                return None;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                Some(Err(e)) => {
                    done = true;
                    return Some((Err(e), (bytes, decoder, pending, done)));
                }
                None => {
                    done = true;
                    pending.extend(decoder.finish());
                }
            }
        }
    })
}

/// Provider-specific interpretation of SSE payloads.
pub trait EventParser: Send + 'static {
    fn on_event(&mut self, data: &str) -> Result<Vec<StreamDelta>>;

    /// Called once when the byte stream ends.
    fn on_end(&mut self) -> Vec<StreamDelta>;
}

/// Turn an SSE byte stream into provider deltas using `parser`.
pub fn delta_stream<S, E, P>(bytes: S, provider: Provider, parser: P) -> DeltaStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
    P: EventParser,
{
    let events = Box::pin(sse_data(bytes));
    let state = (events, parser, VecDeque::new(), false);
    Box::pin(stream::unfold(
        state,
        move |(mut events, mut parser, mut pending, mut done)| async move {
            loop {
                if let Some(item) = pending.pop_front() {
                    return Some((item, (events, parser, pending, done)));
                }
                if done {
                    return None;
                }
                match events.next().await {
                    Some(Ok(data)) => match parser.on_event(&data) {
                        Ok(deltas) => pending.extend(deltas.into_iter().map(Ok)),
                        Err(e) => {
                            done = true;
                            pending.push_back(Err(e));
                        }
                    },
                    Some(Err(e)) => {
                        done = true;
                        pending.push_back(Err(LlmError::request(provider, e)));
                    }
                    None => {
                        done = true;
                        pending.extend(parser.on_end().into_iter().map(Ok));
                    }
                }
            }
        },
    ))
}
