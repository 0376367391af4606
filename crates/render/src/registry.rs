use glam::Vec2;
use std::collections::HashMap;
use stagehand_common::{NodeId, NodeKind};
use stagehand_scene::{SceneError, SceneTree};

/// One draw call in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub node: NodeId,
    pub kind: NodeKind,
    pub points: Vec<Vec2>,
}

/// Draw commands for one frame, in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderList {
    pub commands: Vec<DrawCommand>,
}

impl RenderList {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn for_node(&self, node: NodeId) -> Option<&DrawCommand> {
        self.commands.iter().find(|c| c.node == node)
    }
}

/// Renders a single node of the kind it was registered for.
pub trait NodeRenderer: Send + Sync {
    fn render(&self, scene: &SceneTree, id: NodeId, out: &mut RenderList) -> Result<(), SceneError>;
}

/// Draws every local vertex, offset by the node anchor.
#[derive(Debug, Default)]
pub struct PolygonRenderer;

impl NodeRenderer for PolygonRenderer {
    fn render(&self, scene: &SceneTree, id: NodeId, out: &mut RenderList) -> Result<(), SceneError> {
        let node = scene.get(id).ok_or(SceneError::NodeNotFound(id))?;
        if node.vertices.is_empty() {
            return Ok(());
        }
        let points = scene.resolve_all(id, &node.vertices, node.anchor)?;
        out.push(DrawCommand {
            node: id,
            kind: node.kind,
            points,
        });
        Ok(())
    }
}

/// Draws a single point at the node origin.
#[derive(Debug, Default)]
pub struct MarkerRenderer;

impl NodeRenderer for MarkerRenderer {
    fn render(&self, scene: &SceneTree, id: NodeId, out: &mut RenderList) -> Result<(), SceneError> {
        let node = scene.get(id).ok_or(SceneError::NodeNotFound(id))?;
        out.push(DrawCommand {
            node: id,
            kind: node.kind,
            points: vec![scene.world_origin(id)?],
        });
        Ok(())
    }
}

/// Mapping from node kind to the renderer that draws it, filled at startup.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<NodeKind, Box<dyn NodeRenderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in polygon and marker renderers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(NodeKind::POLYGON, PolygonRenderer);
        registry.register(NodeKind::MARKER, MarkerRenderer);
        registry
    }

    /// Register `renderer` for `kind`, replacing any previous one.
    pub fn register<R: NodeRenderer + 'static>(&mut self, kind: NodeKind, renderer: R) {
        if self.renderers.insert(kind, Box::new(renderer)).is_some() {
            tracing::debug!(%kind, "replaced renderer");
        }
    }

    pub fn get(&self, kind: NodeKind) -> Option<&dyn NodeRenderer> {
        self.renderers.get(&kind).map(|r| r.as_ref())
    }

    pub fn is_registered(&self, kind: NodeKind) -> bool {
        self.renderers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.renderers.keys().collect();
        kinds.sort();
        f.debug_struct("RendererRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
