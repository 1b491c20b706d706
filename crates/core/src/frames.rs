//! Frame tree: named poses, each optionally relative to a parent frame.
//!
//! Frames live in a dense arena and refer to their parent by [`FrameId`].
//! Parents must exist when a frame is inserted and [`FrameTree::reparent`]
//! refuses to create cycles, so the tree is always a forest and every walk
//! toward the root terminates.

use std::collections::VecDeque;
use std::fmt;

use crate::DVec3;
use crate::error::{CoreError, CoreResult};
use crate::operand::Operand;
use crate::se3::{Transform, check_translation};
use crate::so3::Rotation;

/// Stable handle of a frame (index into the arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u32);

impl FrameId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named pose. Without a parent it is defined in world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    name: String,
    pose: Transform,
    parent: Option<FrameId>,
}

impl Frame {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pose relative to the parent (or the world).
    #[inline]
    pub fn pose(&self) -> &Transform {
        &self.pose
    }

    #[inline]
    pub fn translation(&self) -> DVec3 {
        self.pose.translation()
    }

    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.pose.rotation()
    }

    #[inline]
    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// What changed on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameChange {
    Added,
    Pose,
    Parent,
    Renamed,
}

/// Receives every frame mutation synchronously, after it has been applied.
pub trait FrameObserver: Send {
    fn frame_changed(&mut self, change: FrameChange, id: FrameId, frame: &Frame);
}

#[derive(Default)]
pub struct FrameTree {
    frames: Vec<Frame>,
    observers: Vec<Box<dyn FrameObserver>>,
}

impl FrameTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        translation: DVec3,
        rotation: Rotation,
        parent: Option<FrameId>,
    ) -> CoreResult<FrameId> {
        self.insert_pose(name, Transform::from_parts(rotation, translation), parent)
    }

    pub fn insert_pose(
        &mut self,
        name: impl Into<String>,
        pose: Transform,
        parent: Option<FrameId>,
    ) -> CoreResult<FrameId> {
        if let Some(p) = parent {
            self.get(p)?;
        }
        check_translation(pose.translation()).map_err(CoreError::InvalidTransform)?;
        Ok(self.push(name.into(), pose, parent))
    }

    /// Insert a frame defined in world coordinates. The pose is taken as is;
    /// use [`FrameTree::insert_pose`] for poses that still need checking.
    pub fn insert_root(&mut self, name: impl Into<String>, pose: Transform) -> FrameId {
        self.push(name.into(), pose, None)
    }

    fn push(&mut self, name: String, pose: Transform, parent: Option<FrameId>) -> FrameId {
        let id = FrameId(self.frames.len() as u32);
        log::debug!("frame {id} '{name}' added (parent {parent:?})");
        self.frames.push(Frame { name, pose, parent });
        self.notify(FrameChange::Added, id);
        id
    }

    /// Sibling with the same pose and parent. A name starting with `_` is
    /// used as a suffix of the source name (`"0"` + `"_copy"`).
    ///
    /// Only geometry is copied; a binding gives the new frame its default
    /// style unless told otherwise (see `FrameBinding::copy_style`).
    pub fn copy_frame(&mut self, id: FrameId, name: &str) -> CoreResult<FrameId> {
        let src = self.get(id)?;
        let name = if name.starts_with('_') {
            format!("{}{}", src.name, name)
        } else {
            name.to_string()
        };
        let (pose, parent) = (src.pose, src.parent);
        self.insert_pose(name, pose, parent)
    }

    #[inline]
    pub fn get(&self, id: FrameId) -> CoreResult<&Frame> {
        self.frames.get(id.index()).ok_or(CoreError::UnknownFrame(id))
    }

    #[inline]
    fn get_mut(&mut self, id: FrameId) -> CoreResult<&mut Frame> {
        self.frames
            .get_mut(id.index())
            .ok_or(CoreError::UnknownFrame(id))
    }

    /// First frame with this name.
    pub fn find(&self, name: &str) -> Option<FrameId> {
        self.frames
            .iter()
            .position(|f| f.name == name)
            .map(|i| FrameId(i as u32))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameId, &Frame)> {
        self.frames
            .iter()
            .enumerate()
            .map(|(i, f)| (FrameId(i as u32), f))
    }

    pub fn parent(&self, id: FrameId) -> CoreResult<Option<FrameId>> {
        Ok(self.get(id)?.parent)
    }

    pub fn children(&self, id: FrameId) -> impl Iterator<Item = FrameId> + '_ {
        self.iter()
            .filter(move |(_, f)| f.parent == Some(id))
            .map(|(child, _)| child)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: FrameId) -> CoreResult<Vec<FrameId>> {
        let mut out = Vec::new();
        let mut cursor = self.get(id)?.parent;
        while let Some(cur) = cursor {
            out.push(cur);
            cursor = self.get(cur)?.parent;
        }
        Ok(out)
    }

    pub fn depth(&self, id: FrameId) -> CoreResult<usize> {
        Ok(self.ancestors(id)?.len())
    }

    /// All frames, every parent before its children.
    pub fn topological_order(&self) -> Vec<FrameId> {
        let mut order = Vec::with_capacity(self.frames.len());
        let mut queue: VecDeque<FrameId> = self
            .iter()
            .filter(|(_, f)| f.is_root())
            .map(|(id, _)| id)
            .collect();
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.children(id));
        }
        order
    }

    // ----- mutation -----

    pub fn set_translation(&mut self, id: FrameId, translation: DVec3) -> CoreResult<()> {
        self.get_mut(id)?.pose.set_translation(translation)?;
        self.notify(FrameChange::Pose, id);
        Ok(())
    }

    pub fn set_rotation(&mut self, id: FrameId, rotation: Rotation) -> CoreResult<()> {
        self.get_mut(id)?.pose.set_rotation(rotation);
        self.notify(FrameChange::Pose, id);
        Ok(())
    }

    pub fn set_pose(&mut self, id: FrameId, pose: Transform) -> CoreResult<()> {
        check_translation(pose.translation()).map_err(CoreError::InvalidTransform)?;
        self.get_mut(id)?.pose = pose;
        self.notify(FrameChange::Pose, id);
        Ok(())
    }

    pub fn rename(&mut self, id: FrameId, name: impl Into<String>) -> CoreResult<()> {
        self.get_mut(id)?.name = name.into();
        self.notify(FrameChange::Renamed, id);
        Ok(())
    }

    /// Rotate or transform the frame in place, about the axes it is defined
    /// in: a rotation replaces `R` with `op·R` and keeps the translation, a
    /// transform replaces `H` with `op·H`.
    pub fn premultiply(&mut self, id: FrameId, op: Operand) -> CoreResult<()> {
        let frame = self.get(id)?;
        match op.validated()? {
            Operand::Rotation(r) => {
                let rotation = r * frame.rotation();
                self.set_rotation(id, rotation)
            }
            Operand::Transform(h) => {
                let pose = h * frame.pose;
                self.set_pose(id, pose)
            }
            other => Err(CoreError::UnsupportedOperand {
                left: other.kind(),
                right: "frame",
            }),
        }
    }

    /// Rotate or transform the frame in place about its own axes (`H·op`).
    pub fn postmultiply(&mut self, id: FrameId, op: Operand) -> CoreResult<()> {
        let pose = self.compose_right(id, op)?;
        self.set_pose(id, pose)
    }

    /// `op · pose(id)` as a value; the tree is not touched.
    ///
    /// A rotation operand acts as a transform without translation, so it
    /// also rotates the frame's translation. Use [`FrameTree::premultiply`]
    /// to rotate the orientation alone.
    pub fn compose_left(&self, id: FrameId, op: Operand) -> CoreResult<Transform> {
        let pose = self.get(id)?.pose;
        if let Operand::Point(_) = op {
            return Err(CoreError::UnsupportedOperand {
                left: op.kind(),
                right: "frame",
            });
        }
        Ok(op.as_transform()? * pose)
    }

    /// `pose(id) · op` as a value; the tree is not touched. A rotation
    /// operand turns the frame about its own origin.
    pub fn compose_right(&self, id: FrameId, op: Operand) -> CoreResult<Transform> {
        let pose = self.get(id)?.pose;
        if let Operand::Point(_) = op {
            return Err(CoreError::UnsupportedOperand {
                left: "frame",
                right: op.kind(),
            });
        }
        Ok(pose * op.as_transform()?)
    }

    /// Attach `id` under `new_parent` (or make it a root). The stored local
    /// pose is kept, so the world pose follows the new ancestors.
    pub fn reparent(&mut self, id: FrameId, new_parent: Option<FrameId>) -> CoreResult<()> {
        self.get(id)?;
        if let Some(parent) = new_parent {
            let mut cursor = Some(parent);
            while let Some(cur) = cursor {
                if cur == id {
                    return Err(CoreError::FrameCycle { frame: id, parent });
                }
                cursor = self.get(cur)?.parent;
            }
        }
        log::debug!("frame {id} reparented to {new_parent:?}");
        self.get_mut(id)?.parent = new_parent;
        self.notify(FrameChange::Parent, id);
        Ok(())
    }

    // ----- world / local conversion -----

    /// Express a point given in frame `id` in world coordinates.
    pub fn world_translation(&self, id: FrameId, local: DVec3) -> CoreResult<DVec3> {
        let mut point = local;
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let frame = self.get(cur)?;
            point = frame.pose.transform_point(point);
            cursor = frame.parent;
        }
        Ok(point)
    }

    pub fn world_rotation(&self, id: FrameId, local: Rotation) -> CoreResult<Rotation> {
        let mut rotation = local;
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let frame = self.get(cur)?;
            rotation = frame.rotation() * rotation;
            cursor = frame.parent;
        }
        Ok(rotation)
    }

    pub fn world_transform(&self, id: FrameId, local: Transform) -> CoreResult<Transform> {
        let mut pose = local;
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let frame = self.get(cur)?;
            pose = frame.pose * pose;
            cursor = frame.parent;
        }
        Ok(pose)
    }

    /// Pose of the frame itself in world coordinates.
    #[inline]
    pub fn world_pose(&self, id: FrameId) -> CoreResult<Transform> {
        self.world_transform(id, Transform::IDENTITY)
    }

    /// `id` followed by its ancestors, root last.
    fn lineage(&self, id: FrameId) -> CoreResult<Vec<FrameId>> {
        let mut chain = vec![id];
        chain.extend(self.ancestors(id)?);
        Ok(chain)
    }

    /// Express a world point in the coordinates of frame `id`.
    pub fn local_translation(&self, id: FrameId, world: DVec3) -> CoreResult<DVec3> {
        let mut point = world;
        for cur in self.lineage(id)?.into_iter().rev() {
            point = self.get(cur)?.pose.inverse().transform_point(point);
        }
        Ok(point)
    }

    pub fn local_rotation(&self, id: FrameId, world: Rotation) -> CoreResult<Rotation> {
        let mut rotation = world;
        for cur in self.lineage(id)?.into_iter().rev() {
            rotation = self.get(cur)?.rotation().transpose() * rotation;
        }
        Ok(rotation)
    }

    pub fn local_transform(&self, id: FrameId, world: Transform) -> CoreResult<Transform> {
        let mut pose = world;
        for cur in self.lineage(id)?.into_iter().rev() {
            pose = self.get(cur)?.pose.inverse() * pose;
        }
        Ok(pose)
    }

    // ----- observers -----

    /// Register an observer; it first receives `Added` for every existing
    /// frame, parents before children.
    pub fn subscribe(&mut self, mut observer: Box<dyn FrameObserver>) {
        for id in self.topological_order() {
            observer.frame_changed(FrameChange::Added, id, &self.frames[id.index()]);
        }
        self.observers.push(observer);
    }

    fn notify(&mut self, change: FrameChange, id: FrameId) {
        let frame = &self.frames[id.index()];
        for observer in &mut self.observers {
            observer.frame_changed(change, id, frame);
        }
    }
}

impl fmt::Debug for FrameTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTree")
            .field("frames", &self.frames)
            .field("observers", &self.observers.len())
            .finish()
    }
}
