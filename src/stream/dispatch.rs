//! UI event channel: fan-out of named events to the presentation layer.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::StreamError;

use super::event::StreamEvent;
use super::ingestor::{StreamConsumer, StreamIngestor, StreamOutcome};

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Which user-facing request a stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Chat,
    Screenshot,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Screenshot => "screenshot",
        }
    }
}

/// Severity of an update notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Event delivered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    StreamStart {
        kind: StreamKind,
        request_id: Uuid,
    },
    StreamChunk {
        kind: StreamKind,
        request_id: Uuid,
        chunk: String,
    },
    StreamComplete {
        kind: StreamKind,
        request_id: Uuid,
    },
    StreamError {
        kind: StreamKind,
        request_id: Uuid,
        message: String,
    },
    UpdateNotification {
        level: NoticeLevel,
        message: String,
    },
    UpdateProgress {
        percent: f32,
    },
}

impl UiEvent {
    /// Channel name the presentation layer listens on, e.g.
    /// `chat-stream-chunk` or `update-progress`.
    pub fn channel(&self) -> String {
        match self {
            Self::StreamStart { kind, .. } => format!("{}-stream-start", kind.as_str()),
            Self::StreamChunk { kind, .. } => format!("{}-stream-chunk", kind.as_str()),
            Self::StreamComplete { kind, .. } => format!("{}-stream-complete", kind.as_str()),
            Self::StreamError { kind, .. } => format!("{}-stream-error", kind.as_str()),
            Self::UpdateNotification { .. } => "update-notification".to_string(),
            Self::UpdateProgress { .. } => "update-progress".to_string(),
        }
    }
}

/// Broadcast sender for UI events. Each UI subscriber calls `subscribe`.
pub struct UiEvents {
    tx: broadcast::Sender<UiEvent>,
}

impl UiEvents {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self { tx })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    /// Broadcast. Fine if no UI is listening yet.
    pub fn emit(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

/// Result of a stream that reached the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedStream {
    pub request_id: Uuid,
    pub outcome: StreamOutcome,
    /// All chunks joined in receipt order.
    pub text: String,
}

/// Adapts stream events of one request onto the UI channel.
struct UiForwarder<'a> {
    events: &'a UiEvents,
    kind: StreamKind,
    request_id: Uuid,
    chunks: usize,
    text: String,
}

impl StreamConsumer for UiForwarder<'_> {
    fn on_event(&mut self, event: StreamEvent) -> bool {
        let ui_event = match event {
            StreamEvent::Chunk(chunk) => {
                self.chunks += 1;
                self.text.push_str(&chunk);
                UiEvent::StreamChunk {
                    kind: self.kind,
                    request_id: self.request_id,
                    chunk,
                }
            }
            StreamEvent::Complete => UiEvent::StreamComplete {
                kind: self.kind,
                request_id: self.request_id,
            },
            StreamEvent::Error(message) => UiEvent::StreamError {
                kind: self.kind,
                request_id: self.request_id,
                message,
            },
        };
        self.events.emit(ui_event);
        true
    }
}

/// Run `ingestor` to completion, forwarding its events to the UI.
///
/// Emits `*-stream-start`, the chunks, then exactly one of
/// `*-stream-complete` / `*-stream-error`. Transport failures and a source
/// that ends without a terminal event become `*-stream-error` as well, and
/// are also returned to the caller.
pub async fn forward_stream<S, B, E>(
    kind: StreamKind,
    ingestor: StreamIngestor<S>,
    events: &UiEvents,
) -> Result<ForwardedStream, StreamError>
where
    S: futures::Stream<Item = Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let request_id = Uuid::new_v4();
    events.emit(UiEvent::StreamStart { kind, request_id });
    debug!(kind = kind.as_str(), %request_id, "Stream started");

    let mut forwarder = UiForwarder {
        events,
        kind,
        request_id,
        chunks: 0,
        text: String::new(),
    };
    let result = ingestor.ingest(&mut forwarder).await;

    match &result {
        Ok(StreamOutcome::Completed) => {
            info!(kind = kind.as_str(), %request_id, chunks = forwarder.chunks, "Stream complete");
        }
        Ok(StreamOutcome::Failed(message)) => {
            warn!(kind = kind.as_str(), %request_id, "Backend reported stream error: {message}");
        }
        Ok(StreamOutcome::Cancelled) => {
            events.emit(UiEvent::StreamError {
                kind,
                request_id,
                message: "Cancelled".to_string(),
            });
        }
        Ok(StreamOutcome::Detached) => {}
        Err(e) => {
            warn!(kind = kind.as_str(), %request_id, chunks = forwarder.chunks, "Stream ended abnormally: {e}");
            events.emit(UiEvent::StreamError {
                kind,
                request_id,
                message: e.to_string(),
            });
        }
    }

    result.map(|outcome| ForwardedStream {
        request_id,
        outcome,
        text: forwarder.text,
    })
}
