//! Overlay Assist: window-level coordination and streaming ingestion core
//! for a desktop assistant overlay.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod permissions;
pub mod stream;
pub mod update;
pub mod windows;
