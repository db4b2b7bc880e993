//! Update lifecycle sequencing.
//!
//! The controller owns one [`UpdateSession`] and only moves it along the
//! edges allowed by [`UpdatePhase::can_transition_to`]. Each step emits an
//! `update-notification` or `update-progress` event for the UI.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::UpdateConfig;
use crate::error::UpdateError;
use crate::stream::{NoticeLevel, UiEvent, UiEvents};

use super::state::{PhaseTransition, UpdatePhase, UpdateSession};
use super::version::compare_versions;

const MAX_TRANSITIONS: usize = 50;

/// Restarts the process into the downloaded release.
pub trait Restarter: Send + Sync {
    fn restart(&self, version: &str);
}

/// Where releases come from.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Latest published version, or `None` if nothing is published.
    async fn latest_version(&self) -> Result<Option<String>, UpdateError>;

    /// Fetch `version`, reporting percent complete through `progress`.
    async fn download(
        &self,
        version: &str,
        progress: &(dyn Fn(f32) + Send + Sync),
    ) -> Result<(), UpdateError>;
}

struct Inner {
    session: UpdateSession,
    transitions: Vec<PhaseTransition>,
}

pub struct UpdateSessionController {
    inner: Mutex<Inner>,
    events: Arc<UiEvents>,
    restarter: Arc<dyn Restarter>,
    config: UpdateConfig,
}

impl UpdateSessionController {
    pub fn new(
        config: UpdateConfig,
        events: Arc<UiEvents>,
        restarter: Arc<dyn Restarter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                session: UpdateSession::Idle,
                transitions: Vec::new(),
            }),
            events,
            restarter,
            config,
        })
    }

    pub fn session(&self) -> UpdateSession {
        self.inner.lock().session.clone()
    }

    pub fn phase(&self) -> UpdatePhase {
        self.inner.lock().session.phase()
    }

    /// Recent phase changes, oldest first.
    pub fn transitions(&self) -> Vec<PhaseTransition> {
        self.inner.lock().transitions.clone()
    }

    fn transition(&self, next: UpdateSession, reason: Option<&str>) -> Result<(), UpdateError> {
        let mut inner = self.inner.lock();
        let from = inner.session.phase();
        let to = next.phase();
        if !from.can_transition_to(to) {
            return Err(UpdateError::InvalidTransition { from, to });
        }

        inner.transitions.push(PhaseTransition {
            from,
            to,
            timestamp: Utc::now(),
            reason: reason.map(str::to_string),
        });
        if inner.transitions.len() > MAX_TRANSITIONS {
            let drain_count = inner.transitions.len() - MAX_TRANSITIONS;
            inner.transitions.drain(..drain_count);
        }
        inner.session = next;

        debug!(%from, %to, "Update session transition");
        Ok(())
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.events.emit(UiEvent::UpdateNotification {
            level,
            message: message.into(),
        });
    }

    /// `idle → checking`.
    pub fn begin_check(&self) -> Result<(), UpdateError> {
        self.transition(UpdateSession::Checking, None)?;
        info!(current = %self.config.current_version, "Checking for updates");
        Ok(())
    }

    /// Resolve a check with the latest published version.
    ///
    /// A newer release leaves the session in `available`; anything else
    /// returns it to `idle` with an up-to-date notice.
    pub fn check_finished(&self, latest: Option<&str>) -> Result<UpdateSession, UpdateError> {
        let Some(candidate) = latest else {
            self.transition(UpdateSession::Idle, Some("no release published"))?;
            self.notify(NoticeLevel::Success, "You're running the latest version");
            return Ok(UpdateSession::Idle);
        };

        self.transition(
            UpdateSession::Available {
                version: candidate.to_string(),
            },
            None,
        )?;

        let ordering = match compare_versions(candidate, &self.config.current_version) {
            Ok(ordering) => ordering,
            Err(e) => {
                self.fail(&e.to_string());
                return Err(e);
            }
        };

        if ordering == Ordering::Greater {
            info!(version = candidate, "Update available");
            self.notify(
                NoticeLevel::Info,
                format!("Version {candidate} is available, downloading"),
            );
        } else {
            self.transition(UpdateSession::Idle, Some("already up to date"))?;
            info!(version = candidate, "Already up to date");
            self.notify(NoticeLevel::Success, "You're running the latest version");
        }
        Ok(self.session())
    }

    /// `available → downloading` at 0%.
    pub fn start_download(&self) -> Result<(), UpdateError> {
        let version = match &self.inner.lock().session {
            UpdateSession::Available { version } => version.clone(),
            other => {
                return Err(UpdateError::InvalidTransition {
                    from: other.phase(),
                    to: UpdatePhase::Downloading,
                });
            }
        };
        self.transition(
            UpdateSession::Downloading {
                version,
                percent: 0.0,
            },
            None,
        )
    }

    /// Record download progress and return the effective percent.
    ///
    /// Progress never goes backwards; a lower report keeps the current
    /// value.
    pub fn report_progress(&self, percent: f32) -> Result<f32, UpdateError> {
        let effective = {
            let mut inner = self.inner.lock();
            let phase = inner.session.phase();
            let UpdateSession::Downloading {
                percent: current, ..
            } = &mut inner.session
            else {
                return Err(UpdateError::InvalidTransition {
                    from: phase,
                    to: UpdatePhase::Downloading,
                });
            };
            let clamped = if percent.is_nan() {
                *current
            } else {
                percent.clamp(0.0, 100.0)
            };
            if clamped < *current {
                debug!(reported = clamped, current = *current, "Ignoring regressed progress");
            } else {
                *current = clamped;
            }
            *current
        };

        self.events.emit(UiEvent::UpdateProgress { percent: effective });
        Ok(effective)
    }

    /// `downloading → downloaded`.
    pub fn download_finished(&self) -> Result<(), UpdateError> {
        let version = match &self.inner.lock().session {
            UpdateSession::Downloading { version, .. } => version.clone(),
            other => {
                return Err(UpdateError::InvalidTransition {
                    from: other.phase(),
                    to: UpdatePhase::Downloaded,
                });
            }
        };
        self.transition(
            UpdateSession::Downloaded {
                version: version.clone(),
            },
            None,
        )?;
        info!(%version, "Update downloaded");
        self.notify(
            NoticeLevel::Success,
            format!("Version {version} downloaded, restarting shortly"),
        );
        Ok(())
    }

    /// Wait the install delay, then `downloaded → installing` and restart.
    pub async fn install(&self) -> Result<(), UpdateError> {
        let phase = self.phase();
        if phase != UpdatePhase::Downloaded {
            return Err(UpdateError::InvalidTransition {
                from: phase,
                to: UpdatePhase::Installing,
            });
        }

        tokio::time::sleep(self.config.install_delay).await;

        let version = match &self.inner.lock().session {
            UpdateSession::Downloaded { version } => version.clone(),
            other => {
                return Err(UpdateError::InvalidTransition {
                    from: other.phase(),
                    to: UpdatePhase::Installing,
                });
            }
        };
        self.transition(
            UpdateSession::Installing {
                version: version.clone(),
            },
            None,
        )?;
        info!(%version, "Restarting into new version");
        self.restarter.restart(&version);
        Ok(())
    }

    /// Abort the session back to `idle` with an error notice.
    ///
    /// Returns `false` once installing, which cannot be aborted.
    pub fn fail(&self, message: &str) -> bool {
        let phase = self.phase();
        if phase.is_terminal() {
            warn!(%phase, "Ignoring update error after install started: {message}");
            return false;
        }
        if phase != UpdatePhase::Idle {
            if let Err(e) = self.transition(UpdateSession::Idle, Some(message)) {
                warn!("Failed to reset update session: {e}");
                return false;
            }
        }
        warn!(%phase, "Update failed: {message}");
        self.notify(NoticeLevel::Error, format!("Update failed: {message}"));
        true
    }

    /// Check, download and install from `source` in one pass.
    pub async fn run_cycle(&self, source: &dyn UpdateSource) -> Result<UpdateSession, UpdateError> {
        self.begin_check()?;

        let latest = match source.latest_version().await {
            Ok(latest) => latest,
            Err(e) => {
                self.fail(&e.to_string());
                return Err(e);
            }
        };

        let UpdateSession::Available { version } = self.check_finished(latest.as_deref())? else {
            return Ok(self.session());
        };

        self.start_download()?;
        let progress = |percent: f32| {
            if let Err(e) = self.report_progress(percent) {
                debug!("Dropping progress report: {e}");
            }
        };
        if let Err(e) = source.download(&version, &progress).await {
            self.fail(&e.to_string());
            return Err(e);
        }

        self.download_finished()?;
        self.install().await?;
        Ok(self.session())
    }
}
