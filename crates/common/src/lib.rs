//! Shared types and 2D vector math used by every stagehand crate.
//!
//! # Invariants
//! - Vector operations are pure; they never mutate their receiver.
//! - A default `LocalTransform` is an exact identity.

pub mod math;
pub mod types;

pub use glam::Vec2;
pub use math::VectorExt;
pub use types::{LocalTransform, NodeId, NodeKind};

pub fn crate_info() -> &'static str {
    "stagehand-common v0.1.0"
}
