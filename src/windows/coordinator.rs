//! Window-level coordination around OS dialogs.
//!
//! Always-on-top overlays can cover (or be covered by) native permission
//! prompts. Before an operation that may raise one, every overlay is dropped
//! to the normal level; afterwards the levels are restored from a snapshot.
//! Dismissal of the native dialog is not observable, so a one-shot safety
//! timer and an emergency path make sure windows never stay lowered.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::permissions::{Capability, DetectionOutcome, PermissionCompletionDetector};

use super::handle::{WindowId, WindowLevel, WindowState};
use super::preferences::Preferences;
use super::registry::WindowRegistry;

/// How long the emergency path waits for the state lock before giving up.
/// It may run from a panic hook on a thread that already holds the lock.
const EMERGENCY_LOCK_WAIT: Duration = Duration::from_millis(100);

/// Window states captured when a dialog session starts.
pub type WindowSnapshot = BTreeMap<WindowId, WindowState>;

/// What kind of native dialog the guarded operation may raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// A dialog shown synchronously by the call itself (file pickers,
    /// alerts). Levels are restored as soon as the call returns.
    System,
    /// A capability prompt that appears asynchronously. Completion is
    /// detected by polling the capability status.
    Permission(Capability),
}

struct DialogSession {
    id: Uuid,
    kind: DialogKind,
    snapshot: WindowSnapshot,
    started_at: DateTime<Utc>,
}

#[derive(Default)]
struct CoordinatorState {
    session: Option<DialogSession>,
    safety_timer: Option<JoinHandle<()>>,
}

/// Outcome of one restore pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Windows closed while the dialog was up.
    pub skipped: usize,
    pub failed: usize,
}

/// Serializes dialog-triggering operations across the process.
///
/// One instance is shared (by `Arc`) with every call site; at most one
/// dialog session is active at a time.
pub struct WindowLevelCoordinator {
    registry: Arc<WindowRegistry>,
    preferences: Arc<Preferences>,
    detector: PermissionCompletionDetector,
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
}

impl WindowLevelCoordinator {
    pub fn new(
        registry: Arc<WindowRegistry>,
        preferences: Arc<Preferences>,
        detector: PermissionCompletionDetector,
        config: CoordinatorConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            preferences,
            detector,
            config,
            state: Mutex::new(CoordinatorState::default()),
        })
    }

    pub fn registry(&self) -> &Arc<WindowRegistry> {
        &self.registry
    }

    pub fn detector(&self) -> &PermissionCompletionDetector {
        &self.detector
    }

    pub fn is_dialog_active(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Snapshot held by the active session, if any.
    pub fn snapshot(&self) -> Option<WindowSnapshot> {
        self.state.lock().session.as_ref().map(|s| s.snapshot.clone())
    }

    pub fn has_pending_safety_restore(&self) -> bool {
        self.state.lock().safety_timer.is_some()
    }

    /// Snapshot and lower every live window, then wait for the platform to
    /// apply the change.
    ///
    /// Returns `false` without touching anything when a session is already
    /// active; that session belongs to another caller. With no windows
    /// registered a session still opens, so permissions can be requested
    /// before the first window exists.
    pub async fn lower_all_windows_for_dialog(&self, kind: DialogKind) -> bool {
        let windows = {
            let mut state = self.state.lock();
            if let Some(active) = &state.session {
                info!(
                    requested = ?kind,
                    active = ?active.kind,
                    session = %active.id,
                    "Dialog session already active, ignoring lower request"
                );
                return false;
            }

            let windows = self.registry.live();
            let snapshot: WindowSnapshot = windows
                .iter()
                .map(|w| (w.id(), WindowState::capture(w.as_ref())))
                .collect();

            let session = DialogSession {
                id: Uuid::new_v4(),
                kind,
                snapshot,
                started_at: Utc::now(),
            };
            info!(
                session = %session.id,
                kind = ?kind,
                windows = session.snapshot.len(),
                "Lowering windows for dialog"
            );
            state.session = Some(session);
            windows
        };

        for window in windows {
            if window.is_destroyed() {
                continue;
            }
            if let Err(e) = window.set_level(WindowLevel::Normal) {
                warn!(window = %window.id(), "Failed to lower window: {e}");
            }
        }

        tokio::time::sleep(self.config.settle_delay).await;
        true
    }

    /// Restore levels from the active session's snapshot after waiting at
    /// least `max(min_delay, restore_min_delay)`.
    ///
    /// No-op (returns `None`) when no session is active, or when the session
    /// was force-restored while waiting.
    pub async fn restore_all_windows_after_dialog(
        &self,
        min_delay: Duration,
    ) -> Option<RestoreReport> {
        let session_id = {
            let mut state = self.state.lock();
            let Some(session) = &state.session else {
                debug!("No dialog session active, nothing to restore");
                return None;
            };
            let id = session.id;
            if let Some(timer) = state.safety_timer.take() {
                timer.abort();
            }
            id
        };

        tokio::time::sleep(min_delay.max(self.config.restore_min_delay)).await;

        let session = {
            let mut state = self.state.lock();
            if state.session.as_ref().is_some_and(|s| s.id == session_id) {
                state.session.take()
            } else {
                None
            }
        };
        let Some(session) = session else {
            debug!(session = %session_id, "Session was restored while waiting");
            return None;
        };

        Some(self.apply_snapshot(&session, "dialog closed"))
    }

    /// Arm the one-shot safety timer with the configured timeout.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enable_safety_restore(self: &Arc<Self>) {
        self.enable_safety_restore_after(self.config.safety_timeout);
    }

    /// Arm (or re-arm) the safety timer. If a session is still active when
    /// it fires, windows are force-restored.
    pub fn enable_safety_restore_after(self: &Arc<Self>, timeout: Duration) {
        let coordinator = Arc::downgrade(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.on_safety_timeout(timeout);
            }
        });

        if let Some(previous) = self.state.lock().safety_timer.replace(timer) {
            previous.abort();
        }
        debug!(?timeout, "Safety restore armed");
    }

    fn on_safety_timeout(&self, timeout: Duration) {
        let session = {
            let mut state = self.state.lock();
            // Our own handle; dropping it detaches without aborting.
            state.safety_timer.take();
            state.session.take()
        };
        match session {
            Some(session) => {
                warn!(
                    session = %session.id,
                    ?timeout,
                    "Dialog session outlived safety timeout, force-restoring windows"
                );
                self.apply_snapshot(&session, "safety timeout");
            }
            None => debug!("Safety timer fired with no active session"),
        }
    }

    /// Cancel any safety timer, drop the active session and restore at once.
    ///
    /// Synchronous and panic-free so it can run from a panic hook or during
    /// shutdown. Returns `None` when there was nothing to restore.
    pub fn emergency_restore(&self) -> Option<RestoreReport> {
        let Some(mut state) = self.state.try_lock_for(EMERGENCY_LOCK_WAIT) else {
            error!("Emergency restore could not acquire coordinator state");
            return None;
        };
        if let Some(timer) = state.safety_timer.take() {
            timer.abort();
        }
        let session = state.session.take();
        drop(state);

        let Some(session) = session else {
            debug!("Emergency restore requested with no active session");
            return None;
        };
        warn!(session = %session.id, kind = ?session.kind, "Emergency restore");
        Some(self.apply_snapshot(&session, "emergency"))
    }

    /// Re-apply the pinned preference to every live window. Skipped while a
    /// dialog session is active; the restore at its end applies it instead.
    pub fn apply_pinned_preference(&self) -> bool {
        if self.is_dialog_active() {
            debug!("Dialog session active, deferring pinned preference");
            return false;
        }
        let pinned = self.preferences.pinned();
        for window in self.registry.live() {
            let level = Self::level_for(pinned, window.is_visible());
            if let Err(e) = window.set_level(level) {
                warn!(window = %window.id(), "Failed to apply pinned preference: {e}");
            }
        }
        true
    }

    fn level_for(pinned: bool, was_visible: bool) -> WindowLevel {
        // Never pin a window that was hidden.
        if pinned && was_visible {
            WindowLevel::Elevated
        } else {
            WindowLevel::Normal
        }
    }

    fn apply_snapshot(&self, session: &DialogSession, reason: &str) -> RestoreReport {
        let pinned = self.preferences.pinned();
        let mut report = RestoreReport::default();

        for (id, saved) in &session.snapshot {
            let Some(window) = self.registry.get(*id) else {
                debug!(window = %id, "Window gone, skipping restore");
                report.skipped += 1;
                continue;
            };
            let level = Self::level_for(pinned, saved.is_visible);
            match window.set_level(level) {
                Ok(()) => report.restored += 1,
                Err(e) => {
                    warn!(window = %id, ?level, "Failed to restore window level: {e}");
                    report.failed += 1;
                }
            }
        }

        let held = Utc::now().signed_duration_since(session.started_at);
        info!(
            session = %session.id,
            reason,
            pinned,
            restored = report.restored,
            skipped = report.skipped,
            failed = report.failed,
            held_ms = held.num_milliseconds(),
            "Window levels restored"
        );
        report
    }

    /// Lower windows, run `operation`, restore windows.
    ///
    /// `DialogKind::Permission` operations go through the completion
    /// detector first. Only the caller that opened the session restores it.
    pub async fn handle_system_dialog<T, E, F, Fut>(
        self: &Arc<Self>,
        kind: DialogKind,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match kind {
            DialogKind::Permission(capability) => {
                self.handle_permission_dialog(capability, operation)
                    .await
                    .result
            }
            DialogKind::System => {
                let mut operation = operation;
                let owns_session = self.begin(kind).await;
                let result = operation().await;
                if owns_session {
                    self.restore_all_windows_after_dialog(self.config.restore_min_delay)
                        .await;
                }
                result
            }
        }
    }

    /// Permission flavour of `handle_system_dialog`, keeping the detection
    /// details so callers can inspect the final capability status.
    pub async fn handle_permission_dialog<T, E, F, Fut>(
        self: &Arc<Self>,
        capability: Capability,
        operation: F,
    ) -> DetectionOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let owns_session = self.begin(DialogKind::Permission(capability)).await;

        let outcome = self.detector.guard(capability, operation).await;
        if !outcome.resolved {
            info!(%capability, status = %outcome.final_status, "Permission prompt unresolved");
        }

        if owns_session {
            self.restore_all_windows_after_dialog(self.config.restore_min_delay)
                .await;
        }
        outcome
    }

    /// Lower windows and arm a safety timer long enough to cover the
    /// operation. Returns whether this caller owns the session.
    async fn begin(self: &Arc<Self>, kind: DialogKind) -> bool {
        let owns_session = self.lower_all_windows_for_dialog(kind).await;
        if owns_session {
            let timeout = match kind {
                DialogKind::System => self.config.safety_timeout,
                DialogKind::Permission(_) => {
                    self.config.safety_timeout + self.detector.max_wait()
                }
            };
            self.enable_safety_restore_after(timeout);
        }
        owns_session
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::config::DetectorConfig;
    use crate::permissions::{CapabilityQuery, CapabilityStatus, StaticCapabilities};
    use crate::windows::OverlayWindow;
    use crate::windows::test_support::FakeWindow;

    fn coordinator_with(
        pinned: bool,
        query: Arc<dyn CapabilityQuery>,
    ) -> (Arc<WindowRegistry>, Arc<WindowLevelCoordinator>) {
        let registry = WindowRegistry::new();
        let detector = PermissionCompletionDetector::new(query, DetectorConfig::default());
        let coordinator = WindowLevelCoordinator::new(
            Arc::clone(&registry),
            Preferences::in_memory(pinned),
            detector,
            CoordinatorConfig::default(),
        );
        (registry, coordinator)
    }

    fn coordinator(pinned: bool) -> (Arc<WindowRegistry>, Arc<WindowLevelCoordinator>) {
        coordinator_with(pinned, Arc::new(StaticCapabilities(CapabilityStatus::Granted)))
    }

    /// main visible + on top, auth hidden, editor visible but not on top.
    fn three_windows(registry: &WindowRegistry) -> [Arc<FakeWindow>; 3] {
        let main = FakeWindow::new(WindowId::Main, true, WindowLevel::Elevated);
        let auth = FakeWindow::new(WindowId::Auth, false, WindowLevel::Elevated);
        let editor = FakeWindow::new(WindowId::Editor, true, WindowLevel::Normal);
        for w in [&main, &auth, &editor] {
            registry.register(&w.as_dyn());
        }
        [main, auth, editor]
    }

    #[tokio::test(start_paused = true)]
    async fn lower_snapshots_and_lowers_every_window() {
        let (registry, coordinator) = coordinator(true);
        let [main, auth, editor] = three_windows(&registry);

        assert!(coordinator.lower_all_windows_for_dialog(DialogKind::System).await);
        assert!(coordinator.is_dialog_active());

        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot[&WindowId::Main].is_always_on_top);
        assert!(!snapshot[&WindowId::Auth].is_visible);

        for w in [&main, &auth, &editor] {
            assert_eq!(w.level(), WindowLevel::Normal);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_lower_is_noop() {
        let (registry, coordinator) = coordinator(true);
        let [main, _auth, _editor] = three_windows(&registry);

        assert!(coordinator.lower_all_windows_for_dialog(DialogKind::System).await);
        let before = coordinator.snapshot().unwrap();

        // A window changing state mid-session must not leak into the snapshot.
        main.set_level(WindowLevel::Elevated).unwrap();
        assert!(
            !coordinator
                .lower_all_windows_for_dialog(DialogKind::Permission(Capability::Screen))
                .await
        );

        assert_eq!(coordinator.snapshot().unwrap(), before);
        assert_eq!(main.level(), WindowLevel::Elevated);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_without_session_is_noop() {
        let (registry, coordinator) = coordinator(true);
        let [main, _auth, _editor] = three_windows(&registry);

        assert!(coordinator.restore_all_windows_after_dialog(Duration::ZERO).await.is_none());
        assert!(coordinator.restore_all_windows_after_dialog(Duration::ZERO).await.is_none());
        assert!(main.level_history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_applies_pinned_and_visibility() {
        let (registry, coordinator) = coordinator(true);
        let [main, auth, editor] = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        let report = coordinator
            .restore_all_windows_after_dialog(Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(report.restored, 3);
        assert_eq!(main.level(), WindowLevel::Elevated);
        // Hidden windows are never pinned, whatever their level was.
        assert_eq!(auth.level(), WindowLevel::Normal);
        // Visible windows are pinned when the preference is on.
        assert_eq!(editor.level(), WindowLevel::Elevated);
        assert!(!coordinator.is_dialog_active());
        assert!(coordinator.snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_unpinned_leaves_everything_normal() {
        let (registry, coordinator) = coordinator(false);
        let windows = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        coordinator.restore_all_windows_after_dialog(Duration::ZERO).await;

        for w in &windows {
            assert_eq!(w.level(), WindowLevel::Normal);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restore_waits_at_least_floor_delay() {
        let (registry, coordinator) = coordinator(true);
        three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;

        let started = tokio::time::Instant::now();
        coordinator.restore_all_windows_after_dialog(Duration::from_millis(10)).await;
        assert!(started.elapsed() >= Duration::from_millis(500));

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        let started = tokio::time::Instant::now();
        coordinator.restore_all_windows_after_dialog(Duration::from_secs(2)).await;
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_skips_destroyed_and_survives_failures() {
        let (registry, coordinator) = coordinator(true);
        let [main, auth, editor] = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        auth.destroy();
        main.fail_level_changes();

        let report = coordinator
            .restore_all_windows_after_dialog(Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(
            report,
            RestoreReport {
                restored: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(editor.level(), WindowLevel::Elevated);
        assert!(!coordinator.is_dialog_active());
    }

    #[tokio::test(start_paused = true)]
    async fn cold_start_opens_empty_session() {
        let (_registry, coordinator) = coordinator(true);

        assert!(coordinator.lower_all_windows_for_dialog(DialogKind::System).await);
        assert!(coordinator.is_dialog_active());
        assert!(coordinator.snapshot().unwrap().is_empty());

        let report = coordinator
            .restore_all_windows_after_dialog(Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report, RestoreReport::default());
        assert!(!coordinator.is_dialog_active());
    }

    #[tokio::test(start_paused = true)]
    async fn safety_timer_force_restores_once() {
        let (registry, coordinator) = coordinator(true);
        let [main, _auth, _editor] = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        coordinator.enable_safety_restore();
        assert!(coordinator.has_pending_safety_restore());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(!coordinator.is_dialog_active());
        assert!(!coordinator.has_pending_safety_restore());
        assert_eq!(main.level(), WindowLevel::Elevated);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(
            main.level_history(),
            vec![WindowLevel::Normal, WindowLevel::Elevated]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn normal_restore_cancels_safety_timer() {
        let (registry, coordinator) = coordinator(true);
        let [main, _auth, _editor] = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        coordinator.enable_safety_restore();
        coordinator.restore_all_windows_after_dialog(Duration::ZERO).await;
        assert!(!coordinator.has_pending_safety_restore());

        // A new session must not be cut short by the stale timer.
        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert!(coordinator.is_dialog_active());
        assert_eq!(
            main.level_history(),
            vec![WindowLevel::Normal, WindowLevel::Elevated, WindowLevel::Normal]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn emergency_restore_without_session_is_harmless() {
        let (_registry, coordinator) = coordinator(true);
        assert!(coordinator.emergency_restore().is_none());
        assert!(coordinator.emergency_restore().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn emergency_restore_is_immediate_and_cancels_timer() {
        let (registry, coordinator) = coordinator(true);
        let [main, _auth, _editor] = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        coordinator.enable_safety_restore();

        let started = tokio::time::Instant::now();
        let report = coordinator.emergency_restore().unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(report.restored, 3);
        assert!(!coordinator.is_dialog_active());
        assert!(!coordinator.has_pending_safety_restore());
        assert_eq!(main.level(), WindowLevel::Elevated);

        // A pending normal restore finds nothing left to do.
        assert!(coordinator.restore_all_windows_after_dialog(Duration::ZERO).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn handle_system_dialog_restores_after_success_and_failure() {
        let (registry, coordinator) = coordinator(true);
        let [main, _auth, _editor] = three_windows(&registry);

        let inner = Arc::clone(&coordinator);
        let value = coordinator
            .handle_system_dialog(DialogKind::System, move || {
                let active = inner.is_dialog_active();
                async move { Ok::<_, String>(active) }
            })
            .await
            .unwrap();
        assert!(value, "operation runs inside the session");
        assert!(!coordinator.is_dialog_active());
        assert_eq!(main.level(), WindowLevel::Elevated);

        let err = coordinator
            .handle_system_dialog(DialogKind::System, || async { Err::<(), _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(!coordinator.is_dialog_active());
        assert!(!coordinator.has_pending_safety_restore());
    }

    #[tokio::test(start_paused = true)]
    async fn nested_dialog_does_not_restore_outer_session() {
        let (registry, coordinator) = coordinator(true);
        let [main, _auth, _editor] = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        coordinator
            .handle_system_dialog(DialogKind::System, || async { Ok::<_, String>(()) })
            .await
            .unwrap();

        assert!(coordinator.is_dialog_active());
        assert_eq!(main.level(), WindowLevel::Normal);
    }

    struct FlipOnPoll {
        calls: AtomicU32,
    }

    impl CapabilityQuery for FlipOnPoll {
        fn status(&self, _capability: Capability) -> CapabilityStatus {
            // Call 0 is the baseline; the third poll is call 3.
            if self.calls.fetch_add(1, Ordering::SeqCst) >= 3 {
                CapabilityStatus::Granted
            } else {
                CapabilityStatus::NotDetermined
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permission_dialog_retries_and_restores_once() {
        let query = Arc::new(FlipOnPoll {
            calls: AtomicU32::new(0),
        });
        let (registry, coordinator) = coordinator_with(true, query);
        let [main, auth, editor] = three_windows(&registry);

        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let result = coordinator
            .handle_system_dialog(DialogKind::Permission(Capability::Screen), move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("screen capture not permitted".to_string())
                } else {
                    Ok("captured")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "captured");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!coordinator.is_dialog_active());
        for w in [&main, &auth, &editor] {
            assert_eq!(w.level_history().len(), 2, "{} restored exactly once", w.id());
        }
        assert_eq!(main.level(), WindowLevel::Elevated);
        assert_eq!(auth.level(), WindowLevel::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn apply_pinned_preference_deferred_during_session() {
        let (registry, coordinator) = coordinator(true);
        let [_, auth, editor] = three_windows(&registry);

        coordinator.lower_all_windows_for_dialog(DialogKind::System).await;
        assert!(!coordinator.apply_pinned_preference());
        coordinator.emergency_restore();

        assert!(coordinator.apply_pinned_preference());
        assert_eq!(editor.level(), WindowLevel::Elevated);
        assert_eq!(auth.level(), WindowLevel::Normal);
    }
}
