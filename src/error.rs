//! Error types for Overlay Assist.

use std::time::Duration;

use crate::permissions::Capability;
use crate::update::UpdatePhase;
use crate::windows::WindowId;

/// Top-level error type for the assistant core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Backend error: {0}")]
    Client(#[from] ClientError),

    #[error("Update error: {0}")]
    Update(#[from] UpdateError),
}

impl Error {
    /// Short, human-readable text for the UI error channel.
    ///
    /// Permission failures carry their remediation hint; everything else is
    /// the plain display string.
    pub fn user_message(&self) -> String {
        match self {
            Self::Permission(e) => e.remediation(),
            other => other.to_string(),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse preferences: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the GUI runtime for a single window operation.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Window {id} was destroyed")]
    Destroyed { id: WindowId },

    #[error("Window {id} operation failed: {reason}")]
    OperationFailed { id: WindowId, reason: String },
}

/// OS capability (permission) errors.
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("{capability} permission not granted")]
    NotGranted { capability: Capability },

    #[error("{capability} operation failed after permission change: {reason}")]
    RetryFailed {
        capability: Capability,
        reason: String,
    },
}

impl PermissionError {
    /// Which capability, and where the user has to go to grant it.
    pub fn remediation(&self) -> String {
        let capability = match self {
            Self::NotGranted { capability } | Self::RetryFailed { capability, .. } => *capability,
        };
        format!(
            "{} access is required. Grant it in {}, then try again.",
            capability.display_name(),
            capability.settings_path()
        )
    }
}

/// Errors produced while ingesting a streamed response body.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Connection closed before stream completed")]
    EndedWithoutTerminal,

    #[error("Stream idle for {0:?}")]
    IdleTimeout(Duration),

    #[error("Stream buffer exceeded maximum size ({max} bytes)")]
    BufferOverflow { max: usize },

    #[error("Stream read failed: {0}")]
    Read(String),
}

/// HTTP backend errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Usage limit exceeded. Please contact the administrator.")]
    UsageLimitExceeded,

    #[error("Not signed in or session expired")]
    Unauthorized,

    #[error("Backend returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Update lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Cannot transition update session from {from} to {to}")]
    InvalidTransition { from: UpdatePhase, to: UpdatePhase },

    #[error("Invalid version string: {0}")]
    InvalidVersion(String),

    #[error("Update check failed: {0}")]
    CheckFailed(String),

    #[error("Update download failed: {0}")]
    DownloadFailed(String),
}

/// Result type alias for the assistant core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_error_user_message_names_settings_path() {
        let err = Error::from(PermissionError::NotGranted {
            capability: Capability::Screen,
        });
        let msg = err.user_message();
        assert!(msg.contains("Screen recording"));
        assert!(msg.contains(Capability::Screen.settings_path()));
    }

    #[test]
    fn other_errors_use_display_string() {
        let err = Error::from(StreamError::EndedWithoutTerminal);
        assert_eq!(
            err.user_message(),
            "Stream error: Connection closed before stream completed"
        );
    }
}
