//! Window registry: weak, name-keyed references to the live overlay windows.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use super::handle::{OverlayWindow, WindowId, WindowState};

/// Non-owning registry of overlay windows.
///
/// The GUI runtime owns the windows. An entry whose window has been dropped
/// or destroyed behaves as if it were absent.
#[derive(Default)]
pub struct WindowRegistry {
    windows: RwLock<BTreeMap<WindowId, Weak<dyn OverlayWindow>>>,
}

impl WindowRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register (or replace) the window under its id.
    pub fn register(&self, window: &Arc<dyn OverlayWindow>) {
        let id = window.id();
        let previous = self.windows.write().insert(id, Arc::downgrade(window));
        debug!(window = %id, replaced = previous.is_some(), "Window registered");
    }

    pub fn unregister(&self, id: WindowId) -> bool {
        let removed = self.windows.write().remove(&id).is_some();
        if removed {
            debug!(window = %id, "Window unregistered");
        }
        removed
    }

    /// Upgrade the entry for `id` if the window is still alive.
    pub fn get(&self, id: WindowId) -> Option<Arc<dyn OverlayWindow>> {
        let window = self.windows.read().get(&id)?.upgrade()?;
        if window.is_destroyed() {
            return None;
        }
        Some(window)
    }

    /// All live, non-destroyed windows, ordered by id.
    pub fn live(&self) -> Vec<Arc<dyn OverlayWindow>> {
        self.windows
            .read()
            .values()
            .filter_map(Weak::upgrade)
            .filter(|w| !w.is_destroyed())
            .collect()
    }

    /// Current state of every live window.
    pub fn states(&self) -> BTreeMap<WindowId, WindowState> {
        self.live()
            .iter()
            .map(|w| (w.id(), WindowState::capture(w.as_ref())))
            .collect()
    }

    /// Drop entries whose window is gone. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut windows = self.windows.write();
        let before = windows.len();
        windows.retain(|_, weak| weak.upgrade().is_some_and(|w| !w.is_destroyed()));
        before - windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live().is_empty()
    }
}
