//! Serial kinematic chain: links mounted one after another on a root frame.

use crate::error::{CoreError, CoreResult};
use crate::frames::{FrameId, FrameObserver, FrameTree};
use crate::link::{DhField, Link, LinkConfig, ShapeObserver};
use crate::se3::Transform;

#[derive(Debug)]
pub struct Chain {
    tree: FrameTree,
    root: FrameId,
    links: Vec<Link>,
}

impl Chain {
    /// New tree with a single world-aligned root frame.
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut tree = FrameTree::new();
        let root = tree.insert_root(root_name, Transform::IDENTITY);
        Self {
            tree,
            root,
            links: Vec::new(),
        }
    }

    /// Build on an existing tree, mounting the first link on `root`.
    pub fn with_tree(tree: FrameTree, root: FrameId) -> CoreResult<Self> {
        tree.get(root)?;
        Ok(Self {
            tree,
            root,
            links: Vec::new(),
        })
    }

    /// Append a link on the previous link's frame (or the root); returns its index.
    pub fn push(&mut self, config: LinkConfig) -> CoreResult<usize> {
        let mount = self.end_effector();
        let link = Link::attach(&mut self.tree, mount, config)?;
        self.links.push(link);
        Ok(self.links.len() - 1)
    }

    #[inline]
    pub fn root(&self) -> FrameId {
        self.root
    }

    /// Frame of the last link, or the root for an empty chain.
    pub fn end_effector(&self) -> FrameId {
        self.links.last().map_or(self.root, Link::frame)
    }

    #[inline]
    pub fn tree(&self) -> &FrameTree {
        &self.tree
    }

    /// Direct tree access; links are not recomputed by frame edits.
    #[inline]
    pub fn tree_mut(&mut self) -> &mut FrameTree {
        &mut self.tree
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, index: usize) -> CoreResult<&Link> {
        self.links.get(index).ok_or(CoreError::UnknownLink(index))
    }

    /// Mutable link for batched setters; finish with [`Chain::recompute_all`].
    pub fn link_mut(&mut self, index: usize) -> CoreResult<&mut Link> {
        self.links.get_mut(index).ok_or(CoreError::UnknownLink(index))
    }

    pub fn update(&mut self, index: usize, field: DhField, value: f64) -> CoreResult<()> {
        let link = self
            .links
            .get_mut(index)
            .ok_or(CoreError::UnknownLink(index))?;
        link.update(&mut self.tree, field, value)
    }

    /// Add `delta` to one field and recompute that link.
    pub fn nudge(&mut self, index: usize, field: DhField, delta: f64) -> CoreResult<()> {
        let link = self
            .links
            .get_mut(index)
            .ok_or(CoreError::UnknownLink(index))?;
        link.nudge(field, delta)?;
        link.recompute(&mut self.tree)?;
        Ok(())
    }

    /// Recompute every dirty link; returns how many changed.
    pub fn recompute_all(&mut self) -> CoreResult<usize> {
        let mut changed = 0;
        for link in &mut self.links {
            if link.recompute(&mut self.tree)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn joint_values(&self) -> Vec<f64> {
        self.links.iter().map(Link::q).collect()
    }

    pub fn subscribe_frames(&mut self, observer: Box<dyn FrameObserver>) {
        self.tree.subscribe(observer);
    }

    pub fn subscribe_link(
        &mut self,
        index: usize,
        observer: Box<dyn ShapeObserver>,
    ) -> CoreResult<()> {
        self.link_mut(index)?.subscribe(observer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DVec3;
    use crate::link::DhParams;
    use crate::so3::Rotation;

    fn planar() -> Chain {
        let mut chain = Chain::new("0, joint 1");
        chain
            .push(LinkConfig::revolute(DhParams::new(1.0, -90.0, 0.0, 0.0), 45.0).named("1"))
            .unwrap();
        chain
            .push(LinkConfig::prismatic(DhParams::new(1.0, 0.0, 0.0, 0.0), 0.5).named("2"))
            .unwrap();
        chain
    }

    #[test]
    fn links_mount_on_previous_frame() {
        let chain = planar();
        assert_eq!(chain.len(), 2);
        let l0 = chain.link(0).unwrap();
        let l1 = chain.link(1).unwrap();
        assert_eq!(l0.parent_frame(), chain.root());
        assert_eq!(l1.parent_frame(), l0.frame());
        assert_eq!(chain.end_effector(), l1.frame());
        assert_eq!(chain.tree().depth(chain.end_effector()).unwrap(), 2);
        assert_eq!(chain.joint_values(), vec![45.0, 0.5]);
    }

    #[test]
    fn batched_edits_recompute_once() {
        let mut chain = planar();
        {
            let link = chain.link_mut(0).unwrap();
            link.set_q(0.0).unwrap();
            link.set_a(2.0).unwrap();
        }
        chain.link_mut(1).unwrap().set_q(0.0).unwrap();
        assert_eq!(chain.recompute_all().unwrap(), 2);
        assert_eq!(chain.recompute_all().unwrap(), 0);
        let tip = chain
            .tree()
            .world_translation(chain.end_effector(), DVec3::ZERO)
            .unwrap();
        assert!((tip - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-12);
        assert_eq!(chain.link(0).unwrap().revision(), 1);
    }

    #[test]
    fn bad_index_is_reported() {
        let mut chain = planar();
        assert_eq!(
            chain.update(5, DhField::Q, 1.0),
            Err(CoreError::UnknownLink(5))
        );
        assert!(chain.link(2).is_err());
    }

    #[test]
    fn chain_mounts_on_an_existing_frame() {
        let mut tree = FrameTree::new();
        let world = tree.insert_root("world", Transform::IDENTITY);
        let base = tree
            .insert("base", DVec3::new(0.0, 0.0, 1.0), Rotation::IDENTITY, Some(world))
            .unwrap();
        let mut chain = Chain::with_tree(tree, base).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.end_effector(), base);
        chain
            .push(LinkConfig::revolute(DhParams::new(1.0, 0.0, 0.0, 0.0), 0.0))
            .unwrap();
        assert_eq!(chain.link(0).unwrap().parent_frame(), base);
        let tip = chain
            .tree()
            .world_translation(chain.end_effector(), DVec3::ZERO)
            .unwrap();
        assert!((tip - DVec3::new(1.0, 0.0, 1.0)).length() < 1e-12);

        assert!(matches!(
            Chain::with_tree(FrameTree::new(), base),
            Err(CoreError::UnknownFrame(_))
        ));
    }

    #[test]
    fn nudge_is_relative() {
        let mut chain = planar();
        chain.nudge(0, DhField::Q, 10.0).unwrap();
        chain.nudge(0, DhField::Q, 10.0).unwrap();
        assert!((chain.link(0).unwrap().q() - 65.0).abs() < 1e-12);
    }
}
