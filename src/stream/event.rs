//! Stream events and the wire payload they are parsed from.

use serde::{Deserialize, Serialize};

/// One event decoded from a streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text.
    Chunk(String),
    /// The backend finished successfully.
    Complete,
    /// The backend reported a failure.
    Error(String),
}

impl StreamEvent {
    /// `Complete` and `Error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error(_))
    }
}

/// JSON body of a `data: ` line: `{chunk}`, `{complete: true}` or `{error}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DataPayload {
    #[serde(default)]
    pub chunk: Option<String>,
    #[serde(default)]
    pub complete: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DataPayload {
    /// Events carried by this payload, in emission order.
    ///
    /// A chunk is emitted before any terminal marker in the same payload, and
    /// `error` wins over `complete`.
    pub(crate) fn into_events(self) -> Vec<StreamEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(chunk) = self.chunk {
            events.push(StreamEvent::Chunk(chunk));
        }
        if let Some(error) = self.error {
            events.push(StreamEvent::Error(error));
        } else if self.complete == Some(true) {
            events.push(StreamEvent::Complete);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(json: &str) -> Vec<StreamEvent> {
        serde_json::from_str::<DataPayload>(json)
            .unwrap()
            .into_events()
    }

    #[test]
    fn payload_shapes() {
        assert_eq!(events(r#"{"chunk":"hi"}"#), vec![StreamEvent::Chunk("hi".into())]);
        assert_eq!(events(r#"{"complete":true}"#), vec![StreamEvent::Complete]);
        assert_eq!(
            events(r#"{"error":"quota"}"#),
            vec![StreamEvent::Error("quota".into())]
        );
    }

    #[test]
    fn complete_false_is_not_terminal() {
        assert!(events(r#"{"complete":false}"#).is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        assert!(events(r#"{"usage":{"tokens":12}}"#).is_empty());
    }

    #[test]
    fn chunk_precedes_terminal_in_same_payload() {
        assert_eq!(
            events(r#"{"chunk":"last","complete":true}"#),
            vec![StreamEvent::Chunk("last".into()), StreamEvent::Complete]
        );
        assert_eq!(
            events(r#"{"complete":true,"error":"late failure"}"#),
            vec![StreamEvent::Error("late failure".into())]
        );
    }

    #[test]
    fn terminal_flags() {
        assert!(StreamEvent::Complete.is_terminal());
        assert!(StreamEvent::Error("x".into()).is_terminal());
        assert!(!StreamEvent::Chunk("x".into()).is_terminal());
    }
}
