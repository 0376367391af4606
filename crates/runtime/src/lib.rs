//! Frame loop: one tick runs every due coroutine, then renders the scene.
//!
//! # Invariants
//! - Coroutines and rendering interleave; they never run in parallel within
//!   a frame.
//! - Tree mutation happens only in the update step; the render step reads.

mod app;
mod config;
mod timer;

pub use app::{App, FrameReport, RuntimeError};
pub use config::{ConfigError, RuntimeConfig};
pub use timer::FrameTimer;

pub fn crate_info() -> &'static str {
    "stagehand-runtime v0.1.0"
}
