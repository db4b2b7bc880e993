//! In-memory window used by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::WindowError;

use super::handle::{OverlayWindow, WindowId, WindowLevel};

pub(crate) struct FakeWindow {
    id: WindowId,
    visible: AtomicBool,
    destroyed: AtomicBool,
    fail_level_changes: AtomicBool,
    level: Mutex<WindowLevel>,
    level_history: Mutex<Vec<WindowLevel>>,
}

impl FakeWindow {
    pub(crate) fn new(id: WindowId, visible: bool, level: WindowLevel) -> Arc<Self> {
        Arc::new(Self {
            id,
            visible: AtomicBool::new(visible),
            destroyed: AtomicBool::new(false),
            fail_level_changes: AtomicBool::new(false),
            level: Mutex::new(level),
            level_history: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn as_dyn(self: &Arc<Self>) -> Arc<dyn OverlayWindow> {
        Arc::clone(self) as Arc<dyn OverlayWindow>
    }

    pub(crate) fn level(&self) -> WindowLevel {
        *self.level.lock()
    }

    pub(crate) fn level_history(&self) -> Vec<WindowLevel> {
        self.level_history.lock().clone()
    }

    pub(crate) fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_level_changes(&self) {
        self.fail_level_changes.store(true, Ordering::SeqCst);
    }
}

impl OverlayWindow for FakeWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn is_always_on_top(&self) -> bool {
        self.level().is_always_on_top()
    }

    fn set_level(&self, level: WindowLevel) -> Result<(), WindowError> {
        if self.is_destroyed() {
            return Err(WindowError::Destroyed { id: self.id });
        }
        if self.fail_level_changes.load(Ordering::SeqCst) {
            return Err(WindowError::OperationFailed {
                id: self.id,
                reason: "injected failure".into(),
            });
        }
        *self.level.lock() = level;
        self.level_history.lock().push(level);
        Ok(())
    }

    fn show_inactive(&self) -> Result<(), WindowError> {
        self.visible.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn hide(&self) -> Result<(), WindowError> {
        self.visible.store(false, Ordering::SeqCst);
        Ok(())
    }
}
