//! Closed 2D outlines swept along paths.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec2;

const EPSILON: f64 = 1e-9;

/// Counter-clockwise closed outline centered at the origin. The closing edge
/// from the last point back to the first is implicit.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    points: Vec<DVec2>,
}

impl Profile {
    pub fn new(points: Vec<DVec2>) -> Self {
        Self { points }
    }

    pub fn rectangle(width: f64, height: f64) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(vec![
            DVec2::new(-hw, -hh),
            DVec2::new(hw, -hh),
            DVec2::new(hw, hh),
            DVec2::new(-hw, hh),
        ])
    }

    /// Rectangle whose corners are quarter circles of radius
    /// `roundness · min(width, height)`, each approximated by
    /// `corner_segments` arcs.
    pub fn rounded_rectangle(
        width: f64,
        height: f64,
        roundness: f64,
        corner_segments: usize,
    ) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let r = (roundness * width.min(height)).min(hw).min(hh);
        if r <= EPSILON {
            return Self::rectangle(width, height);
        }
        let segments = corner_segments.max(1);
        let step = FRAC_PI_2 / segments as f64;
        let corner = |cx: f64, cy: f64, start: f64| {
            (0..=segments).map(move |i| {
                let angle = start + i as f64 * step;
                DVec2::new(cx + r * angle.cos(), cy + r * angle.sin())
            })
        };
        let (cx, cy) = (hw - r, hh - r);
        let points = corner(-cx, -cy, PI)
            .chain(corner(cx, -cy, 1.5 * PI))
            .chain(corner(cx, cy, 0.0))
            .chain(corner(-cx, cy, 0.5 * PI))
            .collect();
        Self::new(points)
    }

    #[inline]
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area; positive for counter-clockwise outlines.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| self.points[i].perp_dot(self.points[(i + 1) % n]))
            .sum::<f64>()
            * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_is_centered_and_ccw() {
        let p = Profile::rectangle(0.1, 0.05);
        assert_eq!(p.len(), 4);
        assert!((p.signed_area() - 0.005).abs() < 1e-12);
        let centroid: DVec2 = p.points().iter().copied().sum::<DVec2>() / 4.0;
        assert!(centroid.length() < 1e-12);
    }

    #[test]
    fn rounded_corners_shrink_area() {
        let p = Profile::rounded_rectangle(0.1, 0.05, 0.2, 4);
        assert_eq!(p.len(), 4 * 5);
        let r: f64 = 0.2 * 0.05;
        let expected = 0.1 * 0.05 - (4.0 - PI) * r * r;
        // the polygonal arcs cut slightly inside the true circle
        assert!(p.signed_area() < expected + 1e-12);
        assert!(p.signed_area() > expected - 1e-5);
        assert!(p.points().iter().all(|q| q.x.abs() <= 0.05 + 1e-12 && q.y.abs() <= 0.025 + 1e-12));
    }

    #[test]
    fn zero_roundness_falls_back_to_rectangle() {
        assert_eq!(
            Profile::rounded_rectangle(2.0, 1.0, 0.0, 8),
            Profile::rectangle(2.0, 1.0)
        );
    }
}
