//! Update session state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of an update session, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePhase {
    Idle,
    Checking,
    Available,
    Downloading,
    Downloaded,
    Installing,
}

impl UpdatePhase {
    /// Check if this phase allows moving to `target`.
    pub fn can_transition_to(&self, target: UpdatePhase) -> bool {
        use UpdatePhase::*;

        matches!(
            (self, target),
            (Idle, Checking) |
            (Checking, Available) | (Checking, Idle) |
            (Available, Downloading) | (Available, Idle) |
            (Downloading, Downloaded) | (Downloading, Idle) |
            (Downloaded, Installing) | (Downloaded, Idle)
        )
    }

    /// Installing never leaves its phase; the process restarts instead.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Installing)
    }
}

impl std::fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Available => "available",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Installing => "installing",
        };
        write!(f, "{s}")
    }
}

/// Update session with the data each phase carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum UpdateSession {
    Idle,
    Checking,
    Available { version: String },
    Downloading { version: String, percent: f32 },
    Downloaded { version: String },
    Installing { version: String },
}

impl UpdateSession {
    pub fn phase(&self) -> UpdatePhase {
        match self {
            Self::Idle => UpdatePhase::Idle,
            Self::Checking => UpdatePhase::Checking,
            Self::Available { .. } => UpdatePhase::Available,
            Self::Downloading { .. } => UpdatePhase::Downloading,
            Self::Downloaded { .. } => UpdatePhase::Downloaded,
            Self::Installing { .. } => UpdatePhase::Installing,
        }
    }

    /// Candidate version, once one is known.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Available { version }
            | Self::Downloading { version, .. }
            | Self::Downloaded { version }
            | Self::Installing { version } => Some(version),
            Self::Idle | Self::Checking => None,
        }
    }
}

/// A recorded phase change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: UpdatePhase,
    pub to: UpdatePhase,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}
