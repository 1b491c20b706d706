use crate::error::CoreResult;
use crate::frames::{FrameId, FrameTree};
use crate::{DMat4, DVec3};

/// Near-zero field of view: the viewer then looks orthographic.
pub const ORTHOGRAPHIC_FOV: f64 = 0.01;

/// Viewer camera looking along `forward` at `center` (right-handed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub center: DVec3,
    pub forward: DVec3,
    pub up: DVec3,
    pub fov_y_rad: f64,
}

impl Camera {
    pub fn new(center: DVec3, forward: DVec3, up: DVec3) -> Self {
        Self {
            center,
            forward,
            up,
            fov_y_rad: ORTHOGRAPHIC_FOV,
        }
    }

    /// Camera vectors given in the coordinates of `frame`.
    pub fn in_frame(
        tree: &FrameTree,
        frame: FrameId,
        center: DVec3,
        forward: DVec3,
        up: DVec3,
    ) -> CoreResult<Self> {
        let origin = tree.world_translation(frame, DVec3::ZERO)?;
        Ok(Self::new(
            tree.world_translation(frame, center)?,
            tree.world_translation(frame, forward)? - origin,
            tree.world_translation(frame, up)? - origin,
        ))
    }

    #[inline]
    pub fn with_fov(mut self, fov_y_rad: f64) -> Self {
        self.fov_y_rad = fov_y_rad;
        self
    }

    /// Unit viewing direction; zero for a degenerate `forward`.
    #[inline]
    pub fn direction(&self) -> DVec3 {
        self.forward.normalize_or_zero()
    }

    /// Eye position `distance` behind the center.
    #[inline]
    pub fn eye(&self, distance: f64) -> DVec3 {
        self.center - self.direction() * distance
    }

    /// World-to-view matrix; `forward` and `up` need not be unit length.
    #[inline]
    pub fn view(&self, distance: f64) -> DMat4 {
        DMat4::look_to_rh(self.eye(distance), self.direction(), self.up.normalize_or_zero())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DVec3::ZERO, DVec3::NEG_Z, DVec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::so3::Rotation;
    use crate::unit::AngleUnit;

    #[test]
    fn view_is_finite_and_maps_center_forward() {
        let cam = Camera::new(DVec3::ZERO, DVec3::new(-1.0, -1.0, -1.0), DVec3::Z);
        let v = cam.view(5.0);
        assert!(v.to_cols_array().iter().all(|f| f.is_finite()));
        let c = v.transform_point3(cam.center);
        assert!(c.x.abs() < 1e-9 && c.y.abs() < 1e-9);
        assert!((c.z + 5.0).abs() < 1e-9);
    }

    #[test]
    fn view_ignores_forward_length() {
        let long = Camera::new(DVec3::X, DVec3::new(0.0, 0.0, -7.0), DVec3::Y * 3.0);
        let unit = Camera::new(DVec3::X, DVec3::NEG_Z, DVec3::Y);
        assert!(long.view(2.0).abs_diff_eq(unit.view(2.0), 1e-12));
        let c = long.view(2.0).transform_point3(long.center);
        assert!(c.abs_diff_eq(DVec3::new(0.0, 0.0, -2.0), 1e-12));
        assert!((long.eye(2.0) - DVec3::new(1.0, 0.0, 2.0)).length() < 1e-12);
    }

    #[test]
    fn camera_follows_frame_axes() {
        let mut tree = FrameTree::new();
        let rz = Rotation::about_z(90.0, AngleUnit::Degrees).unwrap();
        let f = tree.insert("cam", DVec3::new(0.0, 0.0, 2.0), rz, None).unwrap();
        let cam = Camera::in_frame(&tree, f, DVec3::ZERO, DVec3::X, DVec3::Z).unwrap();
        assert!((cam.center - DVec3::new(0.0, 0.0, 2.0)).length() < 1e-12);
        assert!((cam.forward - DVec3::Y).length() < 1e-12);
        assert!((cam.up - DVec3::Z).length() < 1e-12);
    }
}
