//! OS capability status and permission prompt completion detection.

pub mod capability;
pub mod detector;

pub use capability::{Capability, CapabilityQuery, CapabilityStatus, StaticCapabilities};
pub use detector::{DetectionOutcome, PermissionCompletionDetector};
