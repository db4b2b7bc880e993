//! Process-wide "pinned" preference, persisted as a small JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(default)]
    pinned: bool,
}

/// Whether overlay windows should stay above other windows.
///
/// Read by the coordinator on every restore, so a toggle takes effect at the
/// next restore without any extra plumbing.
#[derive(Debug, Default)]
pub struct Preferences {
    pinned: AtomicBool,
    path: Option<PathBuf>,
}

impl Preferences {
    /// Unpersisted preferences starting at `pinned`.
    pub fn in_memory(pinned: bool) -> Arc<Self> {
        Arc::new(Self {
            pinned: AtomicBool::new(pinned),
            path: None,
        })
    }

    /// Load from `path`. A missing file yields the default (unpinned); an
    /// unreadable one is logged and also falls back to the default.
    pub fn load(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let stored = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<StoredPreferences>(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Ignoring unreadable preferences: {e}");
                StoredPreferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredPreferences::default(),
            Err(e) => {
                warn!(path = %path.display(), "Could not read preferences: {e}");
                StoredPreferences::default()
            }
        };
        debug!(path = %path.display(), pinned = stored.pinned, "Preferences loaded");
        Arc::new(Self {
            pinned: AtomicBool::new(stored.pinned),
            path: Some(path),
        })
    }

    pub fn pinned(&self) -> bool {
        self.pinned.load(Ordering::SeqCst)
    }

    /// Update the flag and persist it when backed by a file.
    pub fn set_pinned(&self, pinned: bool) -> Result<(), ConfigError> {
        self.pinned.store(pinned, Ordering::SeqCst);
        match &self.path {
            Some(path) => Self::save(path, pinned),
            None => Ok(()),
        }
    }

    fn save(path: &Path, pinned: bool) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&StoredPreferences { pinned })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
