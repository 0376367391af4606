use glam::Vec2;
use stagehand_common::{LocalTransform, NodeId, NodeKind};
use stagehand_scene::{SceneError, SceneTree};

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene for debugging and CLI output.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &SceneTree) -> SceneSummary {
        let max_depth = scene
            .walk()
            .into_iter()
            .filter_map(|id| scene.depth(id).ok())
            .max()
            .unwrap_or(0);
        SceneSummary {
            node_count: scene.len(),
            root_count: scene.roots().len(),
            max_depth,
            pending_events: scene.events().len(),
        }
    }

    /// Local and resolved world data for one node.
    pub fn inspect_node(scene: &SceneTree, id: NodeId) -> Result<NodeInfo, SceneError> {
        let node = scene.get(id).ok_or(SceneError::NodeNotFound(id))?;
        Ok(NodeInfo {
            id,
            kind: node.kind,
            depth: scene.depth(id)?,
            local: node.transform,
            world_origin: scene.world_origin(id)?,
            children: node.children().len(),
        })
    }

    /// Every node with its info, in traversal order.
    pub fn list_nodes(scene: &SceneTree) -> Result<Vec<NodeInfo>, SceneError> {
        scene
            .walk()
            .into_iter()
            .map(|id| Self::inspect_node(scene, id))
            .collect()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSummary {
    pub node_count: usize,
    pub root_count: usize,
    pub max_depth: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} roots={} max_depth={} pending_events={}",
            self.node_count, self.root_count, self.max_depth, self.pending_events
        )
    }
}

#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub kind: NodeKind,
    pub depth: usize,
    pub local: LocalTransform,
    pub world_origin: Vec2,
    pub children: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:indent$}[{}] {} loc=({:.2}, {:.2}) angle={:.1} scale=({:.2}, {:.2}) world=({:.2}, {:.2})",
            "",
            self.id,
            self.kind,
            self.local.location.x,
            self.local.location.y,
            self.local.angle,
            self.local.scale.x,
            self.local.scale.y,
            self.world_origin.x,
            self.world_origin.y,
            indent = self.depth * 2,
        )
    }
}
