//! Link visuals: the swept body, two hinge cylinders and the prismatic
//! travel marker.

use asset::Profile;
use corelib::DVec3;
use corelib::link::{Hinge, LinkShape, ShapeObserver, ShapeUpdate};

use crate::Shared;
use crate::backend::{DrawBackend, NodeKey, Primitive, PrimitiveId};
use crate::palette::{self, Color};

/// Arc resolution of the rounded cross-section corners.
const CORNER_SEGMENTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkPrimitives {
    pub body: PrimitiveId,
    pub base_hinge: PrimitiveId,
    pub tip_hinge: PrimitiveId,
    pub travel: Option<PrimitiveId>,
}

pub struct LinkView<B: DrawBackend> {
    backend: Shared<B>,
    color: Color,
    prims: Option<LinkPrimitives>,
    revision: Option<u64>,
}

impl<B: DrawBackend> LinkView<B> {
    pub fn new(backend: Shared<B>) -> Self {
        Self {
            backend,
            color: palette::LINK_BODY,
            prims: None,
            revision: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn primitives(&self) -> Option<LinkPrimitives> {
        self.prims
    }

    /// Revision of the last shape pushed to the backend.
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    fn body(&self, shape: &LinkShape) -> Primitive {
        let cs = shape.cross_section();
        Primitive::Extrusion {
            path: shape.path().to_vec(),
            profile: Profile::rounded_rectangle(cs.width, cs.height, cs.roundness, CORNER_SEGMENTS),
            up: DVec3::Z,
            twist: shape.twist(),
            color: self.color,
        }
    }
}

fn cylinder(hinge: Hinge, color: Color) -> Primitive {
    Primitive::Cylinder {
        position: hinge.position,
        axis: hinge.axis,
        radius: hinge.radius,
        color,
    }
}

impl<B: DrawBackend> ShapeObserver for LinkView<B> {
    fn shape_changed(&mut self, update: &ShapeUpdate<'_>) {
        let shape = update.shape;
        let parent = NodeKey::from(update.parent);
        let own = NodeKey::from(update.frame);
        let body = self.body(shape);
        let base = cylinder(shape.base_hinge(), palette::BASE_HINGE);
        let tip = cylinder(shape.tip_hinge(), palette::TIP_HINGE);
        let travel = shape
            .travel()
            .map(|h| cylinder(h, palette::PRISMATIC_TRAVEL));

        let mut backend = self.backend.lock();
        let prims = match self.prims {
            None => LinkPrimitives {
                body: backend.create_primitive(parent, body),
                base_hinge: backend.create_primitive(parent, base),
                tip_hinge: backend.create_primitive(own, tip),
                travel: travel.map(|t| backend.create_primitive(parent, t)),
            },
            Some(mut prims) => {
                backend.update_primitive(prims.body, body);
                backend.update_primitive(prims.base_hinge, base);
                backend.update_primitive(prims.tip_hinge, tip);
                match (prims.travel, travel) {
                    (Some(id), Some(t)) => backend.update_primitive(id, t),
                    (None, Some(t)) => prims.travel = Some(backend.create_primitive(parent, t)),
                    (Some(id), None) => backend.set_primitive_visible(id, false),
                    (None, None) => {}
                }
                prims
            }
        };
        log::trace!(
            "link on {parent:?} pushed (rev {}, {} samples)",
            update.revision,
            shape.sample_count()
        );
        self.prims = Some(prims);
        self.revision = Some(update.revision);
    }
}
