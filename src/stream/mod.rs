//! Streamed response ingestion and UI event dispatch.
//!
//! - `event`: `StreamEvent` and the `data:` payload shape
//! - `ingestor`: incremental line framing over an async byte stream
//! - `dispatch`: forwarding stream events to the UI event channel

pub mod dispatch;
pub mod event;
pub mod ingestor;

pub use dispatch::{ForwardedStream, NoticeLevel, StreamKind, UiEvent, UiEvents, forward_stream};
pub use event::StreamEvent;
pub use ingestor::{StreamConsumer, StreamIngestor, StreamOutcome};
