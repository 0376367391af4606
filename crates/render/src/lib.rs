//! Rendering adapter: per-kind renderer dispatch over the scene tree.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Every drawable node kind has an explicitly registered renderer.
//! - A released resource handle can never reach a live resource.

mod registry;
mod renderer;
pub mod resource;

pub use registry::{
    DrawCommand, MarkerRenderer, NodeRenderer, PolygonRenderer, RenderList, RendererRegistry,
};
pub use renderer::{DebugTextRenderer, FrameRenderer, ListRenderer, RenderError};
pub use resource::{ResourceError, ResourceHandle, ResourceKind, ResourceTable};

pub fn crate_info() -> &'static str {
    "stagehand-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
