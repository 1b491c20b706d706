//! The draw-backend seam.
//!
//! Scene nodes mirror frames: each node carries a local matrix relative to
//! its parent node, and primitives are attached to nodes in node-local
//! coordinates. Backends own the actual drawing; callers only push state.

use asset::Profile;
use corelib::camera::Camera;
use corelib::frames::FrameId;
use corelib::{DMat4, DVec3};

use crate::palette::Color;

/// Scene node handle; one per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl From<FrameId> for NodeKey {
    fn from(id: FrameId) -> Self {
        NodeKey(id.raw())
    }
}

/// Handle of a primitive created by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Screen-space dots.
    Points {
        positions: Vec<DVec3>,
        color: Color,
        size_px: f32,
    },
    Label {
        position: DVec3,
        text: String,
        color: Color,
        height: f32,
    },
    Arrow {
        origin: DVec3,
        axis: DVec3,
        shaft_width: f64,
        head_width: f64,
        head_length: f64,
        color: Color,
    },
    Cylinder {
        position: DVec3,
        axis: DVec3,
        radius: f64,
        color: Color,
    },
    /// `profile` swept along `path`, turned by `twist` radians per sample.
    Extrusion {
        path: Vec<DVec3>,
        profile: Profile,
        up: DVec3,
        twist: f64,
        color: Color,
    },
}

impl Primitive {
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Points { .. } => "points",
            Primitive::Label { .. } => "label",
            Primitive::Arrow { .. } => "arrow",
            Primitive::Cylinder { .. } => "cylinder",
            Primitive::Extrusion { .. } => "extrusion",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Primitive::Points { color, .. }
            | Primitive::Label { color, .. }
            | Primitive::Arrow { color, .. }
            | Primitive::Cylinder { color, .. }
            | Primitive::Extrusion { color, .. } => *color,
        }
    }
}

pub trait DrawBackend: Send {
    fn set_camera(&mut self, camera: &Camera);

    /// Create the node or replace its parent and local matrix.
    fn upsert_node(&mut self, key: NodeKey, parent: Option<NodeKey>, local: DMat4);

    /// Hidden nodes hide their whole subtree.
    fn set_node_visible(&mut self, key: NodeKey, visible: bool);

    fn create_primitive(&mut self, node: NodeKey, primitive: Primitive) -> PrimitiveId;

    fn update_primitive(&mut self, id: PrimitiveId, primitive: Primitive);

    fn set_primitive_visible(&mut self, id: PrimitiveId, visible: bool);
}
