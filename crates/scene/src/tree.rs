use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stagehand_common::{LocalTransform, NodeId, NodeKind};

/// Errors from tree mutation and lookup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleRejected { child: NodeId, parent: NodeId },
}

/// An event record produced by every mutation to the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// Node was created detached with the given transform.
    Spawned { id: NodeId, transform: LocalTransform },
    /// Node was placed under `parent`.
    Attached { child: NodeId, parent: NodeId },
    /// Node was taken out of `parent` and is now a root.
    Detached { child: NodeId, parent: NodeId },
    /// Node was destroyed along with its owner link.
    Removed { id: NodeId },
    /// Local transform was replaced.
    TransformUpdated {
        id: NodeId,
        old: LocalTransform,
        new: LocalTransform,
    },
    /// Local-space geometry was replaced.
    VerticesUpdated { id: NodeId, count: usize },
    /// Vertex anchor moved.
    AnchorUpdated { id: NodeId, old: Vec2, new: Vec2 },
}

/// A single node in the tree.
///
/// Read-only outside the tree; every change goes through a `SceneTree`
/// setter so it lands in the event log.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub transform: LocalTransform,
    /// Local-space geometry drawn by the node's renderer.
    pub vertices: Vec<Vec2>,
    /// Offset applied to every vertex before the node's own transform.
    pub anchor: Vec2,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    fn new(kind: NodeKind, transform: LocalTransform) -> Self {
        Self {
            kind,
            transform,
            vertices: Vec::new(),
            anchor: Vec2::ZERO,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena of scene nodes keyed by `NodeId`.
///
/// The map owns every node; ownership in the scene sense flows from parent to
/// children and is expressed by the `children` lists. Roots keep insertion
/// order so traversal is deterministic.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    nodes: BTreeMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
    events: Vec<SceneEvent>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Top-level nodes in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(&self.node(id)?.children)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Create a detached node. Returns its id.
    pub fn spawn(&mut self, kind: NodeKind, transform: LocalTransform) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, SceneNode::new(kind, transform));
        self.roots.push(id);
        self.events.push(SceneEvent::Spawned { id, transform });
        tracing::debug!(%id, %kind, "spawned node");
        id
    }

    /// Create a node directly under `parent`.
    pub fn spawn_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        transform: LocalTransform,
    ) -> Result<NodeId, SceneError> {
        self.node(parent)?;
        let id = self.spawn(kind, transform);
        self.attach(id, parent)?;
        Ok(id)
    }

    /// Place `child` under `parent`, reparenting if it is already attached.
    ///
    /// Rejects self attachment and attaching a node below one of its own
    /// descendants.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.node(child)?;
        self.node(parent)?;
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            tracing::debug!(%child, %parent, "rejected cyclic attach");
            return Err(SceneError::CycleRejected { child, parent });
        }

        self.unlink(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.events.push(SceneEvent::Attached { child, parent });
        tracing::debug!(%child, %parent, "attached node");
        Ok(())
    }

    /// Take `child` out of its parent and make it a root. No-op for roots.
    pub fn detach(&mut self, child: NodeId) -> Result<(), SceneError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        self.unlink(child);
        self.node_mut(child)?.parent = None;
        self.roots.push(child);
        self.events.push(SceneEvent::Detached { child, parent });
        tracing::debug!(%child, %parent, "detached node");
        Ok(())
    }

    /// Destroy a node and everything it owns.
    ///
    /// Returns the removed ids in depth-first pre-order.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.node(id)?;
        self.unlink(id);

        let removed = self.subtree(id);
        for node in &removed {
            self.nodes.remove(node);
            self.events.push(SceneEvent::Removed { id: *node });
        }
        tracing::debug!(%id, count = removed.len(), "removed subtree");
        Ok(removed)
    }

    /// Replace a node's local transform and log the change.
    pub fn set_transform(&mut self, id: NodeId, new: LocalTransform) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        let old = node.transform;
        node.transform = new;
        self.events.push(SceneEvent::TransformUpdated { id, old, new });
        Ok(())
    }

    pub fn set_vertices(&mut self, id: NodeId, vertices: Vec<Vec2>) -> Result<(), SceneError> {
        let count = vertices.len();
        self.node_mut(id)?.vertices = vertices;
        self.events.push(SceneEvent::VerticesUpdated { id, count });
        Ok(())
    }

    pub fn set_anchor(&mut self, id: NodeId, new: Vec2) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        let old = node.anchor;
        node.anchor = new;
        self.events.push(SceneEvent::AnchorUpdated { id, old, new });
        Ok(())
    }

    /// Iterate over the ancestors of `id`, nearest first. Empty for roots and
    /// unknown ids.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes.get(&id).and_then(|n| n.parent),
        }
    }

    /// Number of ancestors above `id`. Roots have depth 0.
    pub fn depth(&self, id: NodeId) -> Result<usize, SceneError> {
        self.node(id)?;
        Ok(self.ancestors(id).count())
    }

    /// Every node, depth-first pre-order starting from the roots.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            out.extend(self.subtree(*root));
        }
        out
    }

    /// `id` followed by all of its descendants, depth-first pre-order.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Remove `id` from its parent's child list, or from the roots.
    fn unlink(&mut self, id: NodeId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    parent_node.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a SceneTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes.get(&current).and_then(|n| n.parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(tree: &mut SceneTree) -> NodeId {
        tree.spawn(NodeKind::GROUP, LocalTransform::default())
    }

    #[test]
    fn tree_starts_empty() {
        let tree = SceneTree::new();
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn spawn_creates_detached_root() {
        let mut tree = SceneTree::new();
        let id = group(&mut tree);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.parent(id).unwrap(), None);
        assert_eq!(tree.roots(), &[id]);
    }

    #[test]
    fn attach_links_both_directions() {
        let mut tree = SceneTree::new();
        let parent = group(&mut tree);
        let child = group(&mut tree);
        tree.attach(child, parent).unwrap();

        assert_eq!(tree.parent(child).unwrap(), Some(parent));
        assert_eq!(tree.children(parent).unwrap(), &[child]);
        assert_eq!(tree.roots(), &[parent]);
        assert_eq!(tree.depth(child).unwrap(), 1);
    }

    #[test]
    fn attach_self_is_rejected() {
        let mut tree = SceneTree::new();
        let a = group(&mut tree);
        assert_eq!(
            tree.attach(a, a),
            Err(SceneError::CycleRejected { child: a, parent: a })
        );
    }

    #[test]
    fn attach_to_descendant_is_rejected() {
        let mut tree = SceneTree::new();
        let a = group(&mut tree);
        let b = tree
            .spawn_child(a, NodeKind::GROUP, LocalTransform::default())
            .unwrap();
        let c = tree
            .spawn_child(b, NodeKind::GROUP, LocalTransform::default())
            .unwrap();

        let err = tree.attach(a, c).unwrap_err();
        assert_eq!(err, SceneError::CycleRejected { child: a, parent: c });
        // tree is unchanged
        assert_eq!(tree.parent(a).unwrap(), None);
        assert_eq!(tree.ancestors(c).collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn attach_reparents() {
        let mut tree = SceneTree::new();
        let a = group(&mut tree);
        let b = group(&mut tree);
        let child = tree
            .spawn_child(a, NodeKind::GROUP, LocalTransform::default())
            .unwrap();

        tree.attach(child, b).unwrap();
        assert!(tree.children(a).unwrap().is_empty());
        assert_eq!(tree.children(b).unwrap(), &[child]);
    }

    #[test]
    fn attach_unknown_node_fails() {
        let mut tree = SceneTree::new();
        let a = group(&mut tree);
        let ghost = NodeId::new();
        assert_eq!(tree.attach(ghost, a), Err(SceneError::NodeNotFound(ghost)));
        assert_eq!(tree.attach(a, ghost), Err(SceneError::NodeNotFound(ghost)));
    }

    #[test]
    fn detach_makes_root() {
        let mut tree = SceneTree::new();
        let a = group(&mut tree);
        let b = tree
            .spawn_child(a, NodeKind::GROUP, LocalTransform::default())
            .unwrap();
        tree.detach(b).unwrap();

        assert_eq!(tree.parent(b).unwrap(), None);
        assert_eq!(tree.roots(), &[a, b]);
        // detaching a root is a no-op
        let before = tree.events().len();
        tree.detach(a).unwrap();
        assert_eq!(tree.events().len(), before);
    }

    #[test]
    fn remove_destroys_owned_subtree() {
        let mut tree = SceneTree::new();
        let root = group(&mut tree);
        let a = tree
            .spawn_child(root, NodeKind::GROUP, LocalTransform::default())
            .unwrap();
        let a1 = tree
            .spawn_child(a, NodeKind::GROUP, LocalTransform::default())
            .unwrap();
        let b = tree
            .spawn_child(root, NodeKind::GROUP, LocalTransform::default())
            .unwrap();

        let removed = tree.remove(a).unwrap();
        assert_eq!(removed, vec![a, a1]);
        assert!(!tree.contains(a1));
        assert_eq!(tree.children(root).unwrap(), &[b]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn walk_is_depth_first_preorder() {
        let mut tree = SceneTree::new();
        let r1 = group(&mut tree);
        let r2 = group(&mut tree);
        let a = tree
            .spawn_child(r1, NodeKind::GROUP, LocalTransform::default())
            .unwrap();
        let a1 = tree
            .spawn_child(a, NodeKind::GROUP, LocalTransform::default())
            .unwrap();
        let b = tree
            .spawn_child(r1, NodeKind::GROUP, LocalTransform::default())
            .unwrap();

        assert_eq!(tree.walk(), vec![r1, a, a1, b, r2]);
    }

    #[test]
    fn set_transform_logs_event() {
        let mut tree = SceneTree::new();
        let id = group(&mut tree);
        let new = LocalTransform::from_location(Vec2::new(1.0, 2.0));
        tree.set_transform(id, new).unwrap();

        assert_eq!(tree.get(id).unwrap().transform, new);
        assert!(matches!(
            tree.events().last(),
            Some(SceneEvent::TransformUpdated { .. })
        ));
    }

    #[test]
    fn geometry_changes_are_logged() {
        let mut tree = SceneTree::new();
        let id = group(&mut tree);
        tree.drain_events();

        tree.set_vertices(id, vec![Vec2::ZERO, Vec2::X, Vec2::Y]).unwrap();
        tree.set_anchor(id, Vec2::splat(-0.5)).unwrap();

        assert_eq!(
            tree.drain_events(),
            vec![
                SceneEvent::VerticesUpdated { id, count: 3 },
                SceneEvent::AnchorUpdated {
                    id,
                    old: Vec2::ZERO,
                    new: Vec2::splat(-0.5),
                },
            ]
        );
        assert_eq!(tree.get(id).unwrap().vertices.len(), 3);
        assert!(tree.set_anchor(NodeId::new(), Vec2::ZERO).is_err());
        assert!(tree.events().is_empty());
    }

    #[test]
    fn drain_events_clears_log() {
        let mut tree = SceneTree::new();
        let a = group(&mut tree);
        let b = group(&mut tree);
        tree.attach(b, a).unwrap();
        let events = tree.drain_events();
        assert_eq!(events.len(), 3); // spawn + spawn + attach
        assert!(tree.events().is_empty());
    }

    #[test]
    fn events_serialize() {
        let mut tree = SceneTree::new();
        group(&mut tree);
        let json = serde_json::to_string(tree.events()).unwrap();
        let back: Vec<SceneEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree.events());
    }
}
