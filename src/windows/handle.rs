//! Overlay window abstraction over the host GUI runtime.

use serde::{Deserialize, Serialize};

use crate::error::WindowError;

/// Stable name of an overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowId {
    /// The assistant overlay itself.
    Main,
    /// Sign-in window.
    Auth,
    /// Side panel used to edit prompts and notes.
    Editor,
}

impl WindowId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Auth => "auth",
            Self::Editor => "editor",
        }
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stacking level of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowLevel {
    /// Default stacking, not always-on-top.
    Normal,
    /// Always-on-top above full-screen content.
    Elevated,
}

impl WindowLevel {
    pub fn is_always_on_top(&self) -> bool {
        matches!(self, Self::Elevated)
    }
}

/// Operations the core needs from one overlay window.
///
/// Implementations live in the GUI runtime. Any of them may race with the
/// user closing the window, so callers check `is_destroyed` first and still
/// handle `WindowError::Destroyed`.
pub trait OverlayWindow: Send + Sync {
    fn id(&self) -> WindowId;

    fn is_destroyed(&self) -> bool;

    fn is_visible(&self) -> bool;

    fn is_always_on_top(&self) -> bool;

    /// `set_always_on_top` in runtime terms: `Normal` clears the flag,
    /// `Elevated` sets it at the screen-saver level.
    fn set_level(&self, level: WindowLevel) -> Result<(), WindowError>;

    /// Show without taking focus.
    fn show_inactive(&self) -> Result<(), WindowError>;

    fn hide(&self) -> Result<(), WindowError>;
}

/// Point-in-time view of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub is_always_on_top: bool,
    pub is_visible: bool,
}

impl WindowState {
    pub fn capture(window: &dyn OverlayWindow) -> Self {
        Self {
            is_always_on_top: window.is_always_on_top(),
            is_visible: window.is_visible(),
        }
    }
}
