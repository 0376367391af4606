//! Leaf-to-root transform resolution.
//!
//! A vertex is first offset by the caller's local offset, then mapped through
//! the node's own transform and every ancestor's transform in turn. At every
//! level the order is rotate, scale, translate.
//!
//! # Precondition
//! The parent chain must be acyclic. There is no cycle detection here; the
//! walk would not terminate on a cyclic chain. `SceneTree::attach` is the only
//! way to create parent links and it refuses cycles.

use glam::Vec2;
use stagehand_common::{NodeId, VectorExt};

use crate::tree::{SceneError, SceneTree};

impl SceneTree {
    /// Map `vertex`, given in `id`'s local space after `local_offset`, into
    /// world space.
    pub fn resolve(&self, id: NodeId, vertex: Vec2, local_offset: Vec2) -> Result<Vec2, SceneError> {
        let node = self.node(id)?;
        let mut v = node.transform.apply(vertex.translate(local_offset));

        let mut next = node.parent();
        while let Some(parent) = next {
            let ancestor = self.node(parent)?;
            v = ancestor.transform.apply(v);
            next = ancestor.parent();
        }
        Ok(v)
    }

    /// `resolve` with a zero local offset.
    pub fn resolve_point(&self, id: NodeId, vertex: Vec2) -> Result<Vec2, SceneError> {
        self.resolve(id, vertex, Vec2::ZERO)
    }

    /// World-space position of the node's own origin.
    pub fn world_origin(&self, id: NodeId) -> Result<Vec2, SceneError> {
        self.resolve(id, Vec2::ZERO, Vec2::ZERO)
    }

    /// Resolve a batch of vertices sharing the same node and offset.
    ///
    /// The ancestor chain is looked up once for the whole batch.
    pub fn resolve_all(
        &self,
        id: NodeId,
        vertices: &[Vec2],
        local_offset: Vec2,
    ) -> Result<Vec<Vec2>, SceneError> {
        let node = self.node(id)?;
        let mut chain = vec![node.transform];
        let mut next = node.parent();
        while let Some(parent) = next {
            let ancestor = self.node(parent)?;
            chain.push(ancestor.transform);
            next = ancestor.parent();
        }

        Ok(vertices
            .iter()
            .map(|v| {
                chain
                    .iter()
                    .fold(v.translate(local_offset), |acc, t| t.apply(acc))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_common::{LocalTransform, NodeKind};

    const EPS: f32 = 1e-4;

    #[test]
    fn identity_node_returns_input_exactly() {
        let mut tree = SceneTree::new();
        let id = tree.spawn(NodeKind::GROUP, LocalTransform::default());
        for v in [
            Vec2::ZERO,
            Vec2::new(1.5, -2.25),
            Vec2::new(-1e6, 3.0e-7),
            Vec2::new(0.1, 0.2),
        ] {
            assert_eq!(tree.resolve_point(id, v).unwrap(), v);
        }
    }

    #[test]
    fn detached_node_applies_single_level() {
        let mut tree = SceneTree::new();
        let t = LocalTransform::from_location(Vec2::new(3.0, 4.0))
            .with_angle(90.0)
            .with_scale(Vec2::new(2.0, 1.0));
        let id = tree.spawn(NodeKind::GROUP, t);

        let v = Vec2::new(1.0, 0.0);
        let got = tree.resolve_point(id, v).unwrap();
        assert_eq!(got, t.apply(v));
        // (1,0) -> rotate -> (0,1) -> scale -> (0,1) -> translate -> (3,5)
        assert!(got.abs_diff_eq(Vec2::new(3.0, 5.0), EPS));
    }

    #[test]
    fn two_levels_compose_child_then_parent() {
        let mut tree = SceneTree::new();
        let parent_t = LocalTransform::from_location(Vec2::new(-1.0, 2.0))
            .with_angle(30.0)
            .with_scale(Vec2::new(1.5, 0.5));
        let child_t = LocalTransform::from_location(Vec2::new(4.0, 0.0))
            .with_angle(90.0)
            .with_scale(Vec2::new(2.0, 1.0));
        let parent = tree.spawn(NodeKind::GROUP, parent_t);
        let child = tree.spawn_child(parent, NodeKind::GROUP, child_t).unwrap();

        let v = Vec2::new(1.0, 0.0);
        let manual = {
            let at_child = v
                .rotate_radians(90f32.to_radians())
                .scale(Vec2::new(2.0, 1.0))
                .translate(Vec2::new(4.0, 0.0));
            at_child
                .rotate_radians(30f32.to_radians())
                .scale(Vec2::new(1.5, 0.5))
                .translate(Vec2::new(-1.0, 2.0))
        };
        let got = tree.resolve_point(child, v).unwrap();
        assert!(got.abs_diff_eq(manual, EPS));

        // Scaling before rotating would land somewhere else.
        let swapped = {
            let at_child = v
                .scale(Vec2::new(2.0, 1.0))
                .rotate_radians(90f32.to_radians())
                .translate(Vec2::new(4.0, 0.0));
            at_child
                .scale(Vec2::new(1.5, 0.5))
                .rotate_radians(30f32.to_radians())
                .translate(Vec2::new(-1.0, 2.0))
        };
        assert!(!got.abs_diff_eq(swapped, 1e-2));
    }

    #[test]
    fn child_of_translated_parent_scenario() {
        let mut tree = SceneTree::new();
        let a = tree.spawn(
            NodeKind::GROUP,
            LocalTransform::from_location(Vec2::new(10.0, 0.0)),
        );
        let b = tree
            .spawn_child(
                a,
                NodeKind::GROUP,
                LocalTransform::from_location(Vec2::new(0.0, 5.0)).with_angle(90.0),
            )
            .unwrap();

        let got = tree.resolve_point(b, Vec2::ZERO).unwrap();
        assert!(got.abs_diff_eq(Vec2::new(10.0, 5.0), EPS));
        assert_eq!(tree.world_origin(b).unwrap(), got);
    }

    #[test]
    fn local_offset_is_applied_before_node_transform() {
        let mut tree = SceneTree::new();
        let id = tree.spawn(
            NodeKind::GROUP,
            LocalTransform::from_location(Vec2::new(1.0, 1.0)).with_scale(Vec2::splat(2.0)),
        );
        let got = tree
            .resolve(id, Vec2::new(1.0, 0.0), Vec2::new(0.5, 0.5))
            .unwrap();
        // (1.5, 0.5) * 2 + (1, 1)
        assert_eq!(got, Vec2::new(4.0, 2.0));
    }

    #[test]
    fn deep_chain_accumulates_translation() {
        let mut tree = SceneTree::new();
        let mut last = tree.spawn(
            NodeKind::GROUP,
            LocalTransform::from_location(Vec2::new(1.0, 0.0)),
        );
        for _ in 0..9 {
            last = tree
                .spawn_child(
                    last,
                    NodeKind::GROUP,
                    LocalTransform::from_location(Vec2::new(1.0, 0.0)),
                )
                .unwrap();
        }
        assert_eq!(tree.world_origin(last).unwrap(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn resolve_all_matches_single_resolves() {
        let mut tree = SceneTree::new();
        let root = tree.spawn(
            NodeKind::GROUP,
            LocalTransform::from_location(Vec2::new(2.0, -3.0)).with_angle(45.0),
        );
        let leaf = tree
            .spawn_child(
                root,
                NodeKind::POLYGON,
                LocalTransform::default().with_scale(Vec2::new(3.0, 0.5)),
            )
            .unwrap();
        let verts = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let offset = Vec2::new(-0.5, -0.5);

        let batch = tree.resolve_all(leaf, &verts, offset).unwrap();
        for (v, b) in verts.iter().zip(&batch) {
            assert_eq!(*b, tree.resolve(leaf, *v, offset).unwrap());
        }
    }

    #[test]
    fn unknown_node_is_an_error() {
        let tree = SceneTree::new();
        let ghost = NodeId::new();
        assert_eq!(
            tree.resolve_point(ghost, Vec2::ZERO),
            Err(SceneError::NodeNotFound(ghost))
        );
    }
}
