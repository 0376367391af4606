//! Scene tree: hierarchical local transforms and their resolution to world space.
//!
//! # Invariants
//! - Parents own their children; a node's `parent` is a non-owning handle.
//! - The parent chain is acyclic. `SceneTree::attach` rejects any edge that
//!   would close a cycle, and the resolver relies on that.
//! - Resolving never mutates the tree.

mod resolve;
pub mod tree;

pub use tree::{Ancestors, SceneError, SceneEvent, SceneNode, SceneTree};

pub fn crate_info() -> &'static str {
    "stagehand-scene v0.1.0"
}
