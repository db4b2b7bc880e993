//! OS capabilities and their status as reported by the platform.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An OS-mediated permission gating an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Screen capture ("screen-recording" on macOS).
    Screen,
    Microphone,
    Camera,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Microphone => "microphone",
            Self::Camera => "camera",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Screen => "Screen recording",
            Self::Microphone => "Microphone",
            Self::Camera => "Camera",
        }
    }

    /// Where the user grants this capability on the current platform.
    pub fn settings_path(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            match self {
                Self::Screen => "System Settings > Privacy & Security > Screen Recording",
                Self::Microphone => "System Settings > Privacy & Security > Microphone",
                Self::Camera => "System Settings > Privacy & Security > Camera",
            }
        } else if cfg!(target_os = "windows") {
            match self {
                Self::Screen => "Settings > Privacy & security > Screenshot borders",
                Self::Microphone => "Settings > Privacy & security > Microphone",
                Self::Camera => "Settings > Privacy & security > Camera",
            }
        } else {
            "your desktop environment's privacy settings"
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a capability as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityStatus {
    NotDetermined,
    Denied,
    Restricted,
    Granted,
    Unknown,
}

impl CapabilityStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotDetermined => "not-determined",
            Self::Denied => "denied",
            Self::Restricted => "restricted",
            Self::Granted => "granted",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CapabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityStatus {
    type Err = std::convert::Infallible;

    /// Unrecognised strings map to `Unknown` rather than failing, since the
    /// platform vocabulary grows over time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "not-determined" => Self::NotDetermined,
            "denied" => Self::Denied,
            "restricted" => Self::Restricted,
            "granted" => Self::Granted,
            _ => Self::Unknown,
        })
    }
}

/// Synchronous, platform-provided capability lookup.
pub trait CapabilityQuery: Send + Sync {
    fn status(&self, capability: Capability) -> CapabilityStatus;
}

/// Query that reports the same status for every capability.
///
/// Used on platforms without a permission model and in headless runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilities(pub CapabilityStatus);

impl CapabilityQuery for StaticCapabilities {
    fn status(&self, _capability: Capability) -> CapabilityStatus {
        self.0
    }
}
