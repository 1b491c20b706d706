//! Headless backend that records the scene for inspection and export.

use std::collections::BTreeMap;

use asset::{MeshData, sweep};
use bytemuck::{Pod, Zeroable};
use corelib::camera::Camera;
use corelib::{DMat4, DVec3};

use crate::backend::{DrawBackend, NodeKey, Primitive, PrimitiveId};

/// Vertex: position + color, world space.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub parent: Option<NodeKey>,
    pub local: DMat4,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveRecord {
    pub node: NodeKey,
    pub primitive: Primitive,
    pub visible: bool,
    /// Number of `update_primitive` calls since creation.
    pub updates: u32,
}

#[derive(Debug, Default)]
pub struct SceneRecorder {
    camera: Option<Camera>,
    nodes: BTreeMap<NodeKey, NodeRecord>,
    primitives: Vec<PrimitiveRecord>,
}

impl SceneRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn node(&self, key: NodeKey) -> Option<&NodeRecord> {
        self.nodes.get(&key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&PrimitiveRecord> {
        self.primitives.get(id.0 as usize)
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn primitives(&self) -> impl Iterator<Item = (PrimitiveId, &PrimitiveRecord)> {
        self.primitives
            .iter()
            .enumerate()
            .map(|(i, p)| (PrimitiveId(i as u32), p))
    }

    pub fn primitives_on(&self, node: NodeKey) -> impl Iterator<Item = (PrimitiveId, &PrimitiveRecord)> {
        self.primitives().filter(move |(_, p)| p.node == node)
    }

    /// Walk from `key` to its root; `None` for unknown nodes or a parent
    /// loop.
    fn lineage(&self, key: NodeKey) -> Option<Vec<&NodeRecord>> {
        let mut out = Vec::new();
        let mut cursor = Some(key);
        while let Some(cur) = cursor {
            if out.len() > self.nodes.len() {
                return None;
            }
            let node = self.nodes.get(&cur)?;
            out.push(node);
            cursor = node.parent;
        }
        Some(out)
    }

    /// Local matrices composed up to the root.
    pub fn node_world(&self, key: NodeKey) -> Option<DMat4> {
        Some(
            self.lineage(key)?
                .into_iter()
                .fold(DMat4::IDENTITY, |acc, node| node.local * acc),
        )
    }

    /// Visible when the node and all its ancestors are.
    pub fn is_node_shown(&self, key: NodeKey) -> bool {
        self.lineage(key)
            .is_some_and(|nodes| nodes.iter().all(|n| n.visible))
    }

    pub fn is_primitive_shown(&self, id: PrimitiveId) -> bool {
        self.primitive(id)
            .is_some_and(|p| p.visible && self.is_node_shown(p.node))
    }

    /// Triangle mesh of an extrusion in node-local coordinates.
    pub fn tessellate(&self, id: PrimitiveId) -> Option<MeshData> {
        match &self.primitive(id)?.primitive {
            Primitive::Extrusion {
                path,
                profile,
                up,
                twist,
                ..
            } => Some(sweep(profile, path, *up, *twist)),
            _ => None,
        }
    }

    /// World-space, non-indexed triangle list of an extrusion.
    pub fn world_vertices(&self, id: PrimitiveId) -> Option<Vec<Vertex>> {
        let record = self.primitive(id)?;
        let mesh = self.tessellate(id)?;
        let world = self.node_world(record.node)?;
        let color = record.primitive.color();
        Some(
            mesh.indices
                .iter()
                .map(|&i| {
                    let p = mesh.vertices[i as usize].position;
                    let p = world.transform_point3(DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64));
                    Vertex {
                        pos: p.as_vec3().to_array(),
                        color,
                    }
                })
                .collect(),
        )
    }

    /// Packed vertex bytes of every shown extrusion, ready for upload.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let vertices: Vec<Vertex> = self
            .primitives()
            .filter(|(id, _)| self.is_primitive_shown(*id))
            .filter_map(|(id, _)| self.world_vertices(id))
            .flatten()
            .collect();
        bytemuck::cast_slice(&vertices).to_vec()
    }
}

impl DrawBackend for SceneRecorder {
    fn set_camera(&mut self, camera: &Camera) {
        self.camera = Some(*camera);
    }

    fn upsert_node(&mut self, key: NodeKey, parent: Option<NodeKey>, local: DMat4) {
        self.nodes
            .entry(key)
            .and_modify(|n| {
                n.parent = parent;
                n.local = local;
            })
            .or_insert(NodeRecord {
                parent,
                local,
                visible: true,
            });
    }

    fn set_node_visible(&mut self, key: NodeKey, visible: bool) {
        match self.nodes.get_mut(&key) {
            Some(node) => node.visible = visible,
            None => log::warn!("visibility set on unknown node {key:?}"),
        }
    }

    fn create_primitive(&mut self, node: NodeKey, primitive: Primitive) -> PrimitiveId {
        let id = PrimitiveId(self.primitives.len() as u32);
        log::trace!("primitive {id:?} ({}) on {node:?}", primitive.kind());
        self.primitives.push(PrimitiveRecord {
            node,
            primitive,
            visible: true,
            updates: 0,
        });
        id
    }

    fn update_primitive(&mut self, id: PrimitiveId, primitive: Primitive) {
        match self.primitives.get_mut(id.0 as usize) {
            Some(record) => {
                record.primitive = primitive;
                record.updates += 1;
            }
            None => log::warn!("update of unknown primitive {id:?}"),
        }
    }

    fn set_primitive_visible(&mut self, id: PrimitiveId, visible: bool) {
        match self.primitives.get_mut(id.0 as usize) {
            Some(record) => record.visible = visible,
            None => log::warn!("visibility set on unknown primitive {id:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette;
    use asset::Profile;

    fn translation(x: f64, y: f64, z: f64) -> DMat4 {
        DMat4::from_translation(DVec3::new(x, y, z))
    }

    #[test]
    fn world_matrices_compose_parent_first() {
        let mut scene = SceneRecorder::new();
        scene.upsert_node(NodeKey(0), None, DMat4::from_rotation_z(std::f64::consts::FRAC_PI_2));
        scene.upsert_node(NodeKey(1), Some(NodeKey(0)), translation(1.0, 0.0, 0.0));
        let w = scene.node_world(NodeKey(1)).unwrap();
        assert!(w.transform_point3(DVec3::ZERO).abs_diff_eq(DVec3::Y, 1e-12));
        assert!(scene.node_world(NodeKey(7)).is_none());
    }

    #[test]
    fn hidden_parent_hides_children() {
        let mut scene = SceneRecorder::new();
        scene.upsert_node(NodeKey(0), None, DMat4::IDENTITY);
        scene.upsert_node(NodeKey(1), Some(NodeKey(0)), DMat4::IDENTITY);
        let id = scene.create_primitive(
            NodeKey(1),
            Primitive::Points {
                positions: vec![DVec3::ZERO],
                color: palette::TEXT,
                size_px: 4.0,
            },
        );
        assert!(scene.is_primitive_shown(id));
        scene.set_node_visible(NodeKey(0), false);
        assert!(!scene.is_node_shown(NodeKey(1)));
        assert!(!scene.is_primitive_shown(id));
    }

    #[test]
    fn parent_loop_is_not_followed() {
        let mut scene = SceneRecorder::new();
        scene.upsert_node(NodeKey(0), Some(NodeKey(1)), DMat4::IDENTITY);
        scene.upsert_node(NodeKey(1), Some(NodeKey(0)), DMat4::IDENTITY);
        assert!(scene.node_world(NodeKey(0)).is_none());
    }

    #[test]
    fn extrusions_export_packed_world_vertices() {
        let mut scene = SceneRecorder::new();
        scene.upsert_node(NodeKey(0), None, translation(0.0, 0.0, 2.0));
        let id = scene.create_primitive(
            NodeKey(0),
            Primitive::Extrusion {
                path: vec![DVec3::ZERO, DVec3::X],
                profile: Profile::rectangle(0.1, 0.1),
                up: DVec3::Z,
                twist: 0.0,
                color: palette::LINK_BODY,
            },
        );
        let mesh = scene.tessellate(id).unwrap();
        let verts = scene.world_vertices(id).unwrap();
        assert_eq!(verts.len(), mesh.indices.len());
        assert!(verts.iter().all(|v| (v.pos[2] - 2.0).abs() <= 0.05 + 1e-6));
        let bytes = scene.vertex_bytes();
        assert_eq!(bytes.len(), verts.len() * std::mem::size_of::<Vertex>());

        scene.set_primitive_visible(id, false);
        assert!(scene.vertex_bytes().is_empty());
    }
}
