use stagehand_common::{NodeId, NodeKind};
use stagehand_scene::{SceneError, SceneTree};

use crate::registry::{RenderList, RendererRegistry};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("no renderer registered for node kind `{kind}` (node {node})")]
    UnregisteredKind { kind: NodeKind, node: NodeId },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Renderer-agnostic frame interface.
///
/// A frame renderer reads the scene and produces output. It never mutates
/// the tree; tree mutation belongs to the update step.
pub trait FrameRenderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene.
    fn render(&self, scene: &SceneTree) -> Result<Self::Output, RenderError>;
}

/// Walks the scene depth-first and dispatches each node through the registry.
#[derive(Debug)]
pub struct ListRenderer {
    registry: RendererRegistry,
}

impl ListRenderer {
    pub fn new(registry: RendererRegistry) -> Self {
        Self { registry }
    }

    pub fn registry_mut(&mut self) -> &mut RendererRegistry {
        &mut self.registry
    }
}

impl Default for ListRenderer {
    fn default() -> Self {
        Self::new(RendererRegistry::with_builtins())
    }
}

impl FrameRenderer for ListRenderer {
    type Output = RenderList;

    fn render(&self, scene: &SceneTree) -> Result<RenderList, RenderError> {
        let _span = tracing::info_span!("render_frame", nodes = scene.len()).entered();
        let mut out = RenderList::default();
        for id in scene.walk() {
            let kind = scene.get(id).ok_or(SceneError::NodeNotFound(id))?.kind;
            if kind == NodeKind::GROUP {
                continue;
            }
            let renderer = self
                .registry
                .get(kind)
                .ok_or(RenderError::UnregisteredKind { kind, node: id })?;
            renderer.render(scene, id, &mut out)?;
        }
        tracing::trace!(commands = out.len(), "render list built");
        Ok(out)
    }
}

/// Debug text renderer.
///
/// Dumps the resolved draw list as plain text, one line per command.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    inner: ListRenderer,
}

impl DebugTextRenderer {
    pub fn new(inner: ListRenderer) -> Self {
        Self { inner }
    }
}

impl FrameRenderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneTree) -> Result<String, RenderError> {
        let list = self.inner.render(scene)?;
        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame (nodes={}, draws={}) ===\n",
            scene.len(),
            list.len()
        ));
        for cmd in &list.commands {
            out.push_str(&format!("  [{}] {:<8}", cmd.node, cmd.kind));
            for p in &cmd.points {
                out.push_str(&format!(" ({:.2}, {:.2})", p.x, p.y));
            }
            out.push('\n');
        }
        Ok(out)
    }
}
