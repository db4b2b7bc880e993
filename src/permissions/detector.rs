//! Permission completion detection.
//!
//! The platform gives no notification when the user answers a permission
//! prompt, so the detector polls the capability status until it moves away
//! from the value read before the prompt, or a deadline passes.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DetectorConfig;

use super::capability::{Capability, CapabilityQuery, CapabilityStatus};

/// What happened while guarding one permission-sensitive operation.
#[derive(Debug)]
pub struct DetectionOutcome<T, E> {
    /// The status moved away from the baseline before the deadline.
    pub resolved: bool,
    /// The operation was run a second time after the status changed.
    pub retried: bool,
    /// Status read when detection finished. Callers check this themselves;
    /// a resolved prompt is not necessarily a granted one.
    pub final_status: CapabilityStatus,
    pub result: Result<T, E>,
}

pub struct PermissionCompletionDetector {
    query: Arc<dyn CapabilityQuery>,
    config: DetectorConfig,
}

impl PermissionCompletionDetector {
    pub fn new(query: Arc<dyn CapabilityQuery>, config: DetectorConfig) -> Self {
        Self { query, config }
    }

    pub fn status(&self, capability: Capability) -> CapabilityStatus {
        self.query.status(capability)
    }

    pub fn max_wait(&self) -> std::time::Duration {
        self.config.max_wait
    }

    /// Poll until the status differs from `baseline`.
    ///
    /// Returns the new status after the dismiss settle delay, or `None` if
    /// `max_wait` elapsed first.
    pub async fn wait_for_change(
        &self,
        capability: Capability,
        baseline: CapabilityStatus,
    ) -> Option<CapabilityStatus> {
        let poll = async {
            let mut polls = 0u32;
            loop {
                tokio::time::sleep(self.config.poll_interval).await;
                polls += 1;
                let status = self.query.status(capability);
                if status != baseline {
                    debug!(%capability, %baseline, %status, polls, "Capability status changed");
                    return status;
                }
            }
        };

        match tokio::time::timeout(self.config.max_wait, poll).await {
            Ok(status) => {
                tokio::time::sleep(self.config.dismiss_settle).await;
                Some(status)
            }
            Err(_) => {
                info!(
                    %capability,
                    %baseline,
                    waited = ?self.config.max_wait,
                    "Permission prompt not answered before deadline"
                );
                None
            }
        }
    }

    /// Run `operation`, wait for the permission prompt it may raise to be
    /// answered, and retry once if the first attempt failed.
    pub async fn guard<T, E, F, Fut>(
        &self,
        capability: Capability,
        mut operation: F,
    ) -> DetectionOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let baseline = self.query.status(capability);

        if baseline.is_granted() {
            return DetectionOutcome {
                resolved: true,
                retried: false,
                final_status: baseline,
                result: operation().await,
            };
        }

        let first = operation().await;
        if let Err(e) = &first {
            // Expected while the capability is not granted yet.
            debug!(%capability, %baseline, "Operation failed before permission answer: {e}");
        }

        let Some(status) = self.wait_for_change(capability, baseline).await else {
            return DetectionOutcome {
                resolved: false,
                retried: false,
                final_status: self.query.status(capability),
                result: first,
            };
        };

        if first.is_ok() {
            return DetectionOutcome {
                resolved: true,
                retried: false,
                final_status: status,
                result: first,
            };
        }

        info!(%capability, %status, "Permission prompt answered, retrying operation once");
        let retry = operation().await;
        if let Err(e) = &retry {
            warn!(%capability, %status, "Operation failed again after permission change: {e}");
        }

        DetectionOutcome {
            resolved: true,
            retried: true,
            final_status: status,
            result: retry,
        }
    }
}
