//! Assistant facade: wires windows, permissions, the backend and UI events
//! into the user-facing actions.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::{BackendClient, ChatMessage, ChatRequest, ScreenshotRequest};
use crate::error::{Error, PermissionError, Result};
use crate::permissions::Capability;
use crate::stream::{ForwardedStream, StreamKind, StreamOutcome, UiEvent, UiEvents, forward_stream};
use crate::windows::{Preferences, RestoreReport, WindowId, WindowLevelCoordinator, WindowRegistry};

/// Grabs the screen contents. Provided by the GUI runtime.
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// One base64 PNG data URL per display. Fails while screen recording
    /// is not granted.
    async fn capture(&self) -> Result<Vec<String>>;
}

pub struct Assistant {
    coordinator: Arc<WindowLevelCoordinator>,
    preferences: Arc<Preferences>,
    client: BackendClient,
    events: Arc<UiEvents>,
    capturer: Arc<dyn ScreenCapturer>,
    history: Mutex<Vec<ChatMessage>>,
    custom_prompt: Option<String>,
}

impl Assistant {
    pub fn new(
        coordinator: Arc<WindowLevelCoordinator>,
        preferences: Arc<Preferences>,
        client: BackendClient,
        events: Arc<UiEvents>,
        capturer: Arc<dyn ScreenCapturer>,
    ) -> Arc<Self> {
        Self::build(coordinator, preferences, client, events, capturer, None)
    }

    /// Same as `new`, with a system prompt sent on every request.
    pub fn with_custom_prompt(
        coordinator: Arc<WindowLevelCoordinator>,
        preferences: Arc<Preferences>,
        client: BackendClient,
        events: Arc<UiEvents>,
        capturer: Arc<dyn ScreenCapturer>,
        custom_prompt: String,
    ) -> Arc<Self> {
        Self::build(
            coordinator,
            preferences,
            client,
            events,
            capturer,
            Some(custom_prompt),
        )
    }

    fn build(
        coordinator: Arc<WindowLevelCoordinator>,
        preferences: Arc<Preferences>,
        client: BackendClient,
        events: Arc<UiEvents>,
        capturer: Arc<dyn ScreenCapturer>,
        custom_prompt: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            coordinator,
            preferences,
            client,
            events,
            capturer,
            history: Mutex::new(Vec::new()),
            custom_prompt,
        })
    }

    pub fn registry(&self) -> &Arc<WindowRegistry> {
        self.coordinator.registry()
    }

    pub fn coordinator(&self) -> &Arc<WindowLevelCoordinator> {
        &self.coordinator
    }

    pub fn events(&self) -> &Arc<UiEvents> {
        &self.events
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// Send a chat message and stream the reply to the UI.
    ///
    /// The exchange is added to the conversation history only when the
    /// backend completes it.
    pub async fn send_chat(&self, text: &str, image: Option<String>) -> Result<ForwardedStream> {
        let request = ChatRequest {
            text: text.to_string(),
            image,
            chat_history: self.history(),
            custom_prompt: self.custom_prompt.clone(),
            ..ChatRequest::default()
        };

        let ingestor = match self.client.stream_chat(request).await {
            Ok(ingestor) => ingestor,
            Err(e) => return Err(self.report(StreamKind::Chat, e.into())),
        };
        let forwarded = forward_stream(StreamKind::Chat, ingestor, &self.events).await?;

        if forwarded.outcome == StreamOutcome::Completed {
            let mut history = self.history.lock();
            history.push(ChatMessage::user(text));
            history.push(ChatMessage::assistant(forwarded.text.clone()));
        }
        Ok(forwarded)
    }

    /// Capture the screen behind a screen-recording prompt and stream the
    /// analysis to the UI.
    pub async fn take_screenshot(&self) -> Result<ForwardedStream> {
        let this = self;
        let outcome = self
            .coordinator
            .handle_permission_dialog(Capability::Screen, move || async move {
                this.capture_hidden().await
            })
            .await;

        let images = match outcome.result {
            Ok(images) => images,
            Err(e) => {
                let err = if !outcome.final_status.is_granted() {
                    debug!(status = %outcome.final_status, "Capture failed: {e}");
                    PermissionError::NotGranted {
                        capability: Capability::Screen,
                    }
                    .into()
                } else if outcome.retried {
                    PermissionError::RetryFailed {
                        capability: Capability::Screen,
                        reason: e.to_string(),
                    }
                    .into()
                } else {
                    e
                };
                return Err(self.report(StreamKind::Screenshot, err));
            }
        };
        info!(displays = images.len(), "Screen captured");

        let request = ScreenshotRequest {
            images,
            custom_prompt: self.custom_prompt.clone(),
            ..ScreenshotRequest::default()
        };
        let ingestor = match self.client.stream_screenshot(request).await {
            Ok(ingestor) => ingestor,
            Err(e) => return Err(self.report(StreamKind::Screenshot, e.into())),
        };
        Ok(forward_stream(StreamKind::Screenshot, ingestor, &self.events).await?)
    }

    /// Hide visible overlays so they are not in the shot, then show them
    /// again without stealing focus.
    async fn capture_hidden(&self) -> Result<Vec<String>> {
        let mut hidden: Vec<WindowId> = Vec::new();
        for window in self.registry().live() {
            if !window.is_visible() {
                continue;
            }
            match window.hide() {
                Ok(()) => hidden.push(window.id()),
                Err(e) => warn!(window = %window.id(), "Failed to hide before capture: {e}"),
            }
        }

        let result = self.capturer.capture().await;

        for id in hidden {
            let Some(window) = self.registry().get(id) else {
                debug!(window = %id, "Window closed during capture");
                continue;
            };
            if let Err(e) = window.show_inactive() {
                warn!(window = %id, "Failed to re-show after capture: {e}");
            }
        }
        result
    }

    /// Persist the pinned flag and apply it to the windows now.
    pub fn set_pinned(&self, pinned: bool) -> Result<()> {
        self.preferences.set_pinned(pinned)?;
        let applied = self.coordinator.apply_pinned_preference();
        info!(pinned, applied, "Pinned preference changed");
        Ok(())
    }

    /// Put every window back before the process exits.
    pub fn shutdown(&self) -> Option<RestoreReport> {
        info!("Shutting down assistant");
        self.coordinator.emergency_restore()
    }

    /// Surface a failure on the UI error channel and hand it back.
    fn report(&self, kind: StreamKind, err: Error) -> Error {
        warn!(kind = kind.as_str(), "Request failed: {err}");
        self.events.emit(UiEvent::StreamError {
            kind,
            request_id: Uuid::new_v4(),
            message: err.user_message(),
        });
        err
    }
}

/// Route panics through an emergency window restore before the previous
/// hook runs.
pub fn install_fault_handler(coordinator: &Arc<WindowLevelCoordinator>) {
    let coordinator: Weak<WindowLevelCoordinator> = Arc::downgrade(coordinator);
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(coordinator) = coordinator.upgrade() {
            coordinator.emergency_restore();
        }
        error!("Unhandled panic: {info}");
        previous(info);
    }));
}
