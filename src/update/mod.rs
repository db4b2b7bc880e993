//! Self-update lifecycle: version checks, download progress, restart.

mod controller;
mod state;
mod version;

pub use controller::{Restarter, UpdateSessionController, UpdateSource};
pub use state::{PhaseTransition, UpdatePhase, UpdateSession};
pub use version::{compare_versions, parse_version};
