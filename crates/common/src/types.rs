use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::math::VectorExt;

/// Unique identifier for a node in a scene tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for logs and debug output.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Type tag used to pick a renderer for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKind(pub &'static str);

impl NodeKind {
    /// Pure grouping node. Carries a transform, draws nothing.
    pub const GROUP: NodeKind = NodeKind("group");
    pub const POLYGON: NodeKind = NodeKind("polygon");
    pub const MARKER: NodeKind = NodeKind("marker");
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.0)
    }
}

/// Local transform relative to the parent node: location, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    pub location: Vec2,
    /// Rotation in degrees.
    pub angle: f32,
    pub scale: Vec2,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            location: Vec2::ZERO,
            angle: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl LocalTransform {
    pub fn from_location(location: Vec2) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    pub fn with_angle(mut self, degrees: f32) -> Self {
        self.angle = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Map a point from this node's space into its parent's space.
    ///
    /// Order is fixed: rotate, then scale, then translate.
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        v.rotate_radians(self.angle.to_radians())
            .scale(self.scale)
            .translate(self.location)
    }
}
