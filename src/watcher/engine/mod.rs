//! Release decision engine.
//!
//! - [`decision`] - Skip rules and tag resolution
//! - [`notes`] - Release notes and checksum sidecar
//! - `orchestrator` - The [`ReleaseWatcher`] workflow

pub mod decision;
pub mod notes;
mod orchestrator;

pub use orchestrator::{Outcome, ReleaseWatcher};
