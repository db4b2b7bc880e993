//! Overlay windows and window-level coordination around OS dialogs.
//!
//! - `handle`: the `OverlayWindow` trait implemented by the GUI runtime
//! - `registry`: weak, name-keyed window references
//! - `preferences`: persisted "pinned" flag consulted on restore
//! - `coordinator`: lowers and restores window levels around dialogs

pub mod coordinator;
pub mod handle;
pub mod preferences;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{DialogKind, RestoreReport, WindowLevelCoordinator, WindowSnapshot};
pub use handle::{OverlayWindow, WindowId, WindowLevel, WindowState};
pub use preferences::Preferences;
pub use registry::WindowRegistry;
