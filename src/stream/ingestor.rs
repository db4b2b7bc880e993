//! Incremental ingestion of a `data: <json>\n` response body.
//!
//! Bytes arrive in arbitrary pieces. Complete lines are parsed as they
//! become available; a trailing partial line is carried over to the next
//! read. The ingestor owns its source and is consumed by `ingest`, so the
//! underlying connection is released on every return path.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::error::StreamError;

use super::event::{DataPayload, StreamEvent};

const DATA_PREFIX: &str = "data:";

/// Receives the events of one stream, in order.
pub trait StreamConsumer: Send {
    /// Handle one event. Returning `false` detaches the consumer and stops
    /// ingestion.
    fn on_event(&mut self, event: StreamEvent) -> bool;
}

impl StreamConsumer for Vec<StreamEvent> {
    fn on_event(&mut self, event: StreamEvent) -> bool {
        self.push(event);
        true
    }
}

impl StreamConsumer for mpsc::UnboundedSender<StreamEvent> {
    fn on_event(&mut self, event: StreamEvent) -> bool {
        self.send(event).is_ok()
    }
}

/// How ingestion ended when no transport or framing failure occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// A `complete` event was delivered.
    Completed,
    /// An `error` event was delivered.
    Failed(String),
    /// The cancellation token fired; no terminal event was delivered.
    Cancelled,
    /// The consumer stopped accepting events.
    Detached,
}

/// Single-use reader of one streamed response.
pub struct StreamIngestor<S> {
    source: S,
    buffer: Vec<u8>,
    config: StreamConfig,
    cancel: CancellationToken,
}

impl<S, B, E> StreamIngestor<S>
where
    S: Stream<Item = Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]>,
    E: Display,
{
    pub fn new(source: S, config: StreamConfig) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop ingestion when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Read the whole stream, dispatching events to `consumer`.
    ///
    /// At most one terminal event is delivered and every chunk precedes it.
    /// A source that ends without one yields
    /// `Err(StreamError::EndedWithoutTerminal)`.
    pub async fn ingest<C>(mut self, consumer: &mut C) -> Result<StreamOutcome, StreamError>
    where
        C: StreamConsumer + ?Sized,
    {
        let idle_timeout = self.config.idle_timeout;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Stream ingestion cancelled");
                    return Ok(StreamOutcome::Cancelled);
                }
                next = tokio::time::timeout(idle_timeout, self.source.next()) => next,
            };

            let Ok(next) = next else {
                return Err(StreamError::IdleTimeout(idle_timeout));
            };
            let Some(read) = next else { break };
            let bytes = read.map_err(|e| StreamError::Read(e.to_string()))?;
            self.buffer.extend_from_slice(bytes.as_ref());

            while let Some(line) = self.take_line()? {
                if let Some(outcome) = Self::dispatch_line(&line, consumer) {
                    return Ok(outcome);
                }
            }

            // The pending line can only grow, so it is already too long.
            self.check_line_len(self.buffer.len())?;
        }

        // A final line without its newline still counts.
        if !self.buffer.is_empty() {
            self.check_line_len(self.buffer.len())?;
            let line = std::mem::take(&mut self.buffer);
            if let Some(outcome) = Self::dispatch_line(&line, consumer) {
                return Ok(outcome);
            }
        }

        warn!("Stream source exhausted without a terminal event");
        Err(StreamError::EndedWithoutTerminal)
    }

    /// Remove and return the next complete line (without its newline).
    ///
    /// Lines longer than `max_buffer_bytes` are rejected whether they
    /// arrived in one read or many.
    fn take_line(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        self.check_line_len(pos)?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        Ok(Some(line))
    }

    fn check_line_len(&self, len: usize) -> Result<(), StreamError> {
        if len > self.config.max_buffer_bytes {
            warn!(line_bytes = len, max = self.config.max_buffer_bytes, "Stream line too long");
            return Err(StreamError::BufferOverflow {
                max: self.config.max_buffer_bytes,
            });
        }
        Ok(())
    }

    /// Parse one line and deliver its events. Returns the outcome once the
    /// stream must stop.
    fn dispatch_line<C>(line: &[u8], consumer: &mut C) -> Option<StreamOutcome>
    where
        C: StreamConsumer + ?Sized,
    {
        for event in parse_line(line) {
            let outcome = match &event {
                StreamEvent::Complete => Some(StreamOutcome::Completed),
                StreamEvent::Error(message) => Some(StreamOutcome::Failed(message.clone())),
                StreamEvent::Chunk(_) => None,
            };
            if !consumer.on_event(event) {
                debug!("Stream consumer detached");
                return Some(StreamOutcome::Detached);
            }
            if outcome.is_some() {
                return outcome;
            }
        }
        None
    }
}

/// Decode one framed line into zero or more events.
///
/// Blank lines and non-data lines are ignored; malformed JSON is logged and
/// skipped without ending the stream.
fn parse_line(line: &[u8]) -> Vec<StreamEvent> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    let Ok(text) = std::str::from_utf8(line) else {
        warn!(line_bytes = line.len(), "Skipping non-UTF-8 stream line");
        return Vec::new();
    };

    let Some(data) = text.strip_prefix(DATA_PREFIX) else {
        if !text.trim().is_empty() {
            debug!(line = %text, "Ignoring non-data stream line");
        }
        return Vec::new();
    };
    let data = data.strip_prefix(' ').unwrap_or(data);

    match serde_json::from_str::<DataPayload>(data) {
        Ok(payload) => payload.into_events(),
        Err(e) => {
            warn!(%e, payload_bytes = data.len(), "Skipping malformed stream payload");
            Vec::new()
        }
    }
}
