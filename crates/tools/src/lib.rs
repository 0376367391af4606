//! Developer tooling: scene inspector.
//!
//! # Invariants
//! - Tools only read the scene.

mod inspector;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "stagehand-tools v0.1.0"
}
