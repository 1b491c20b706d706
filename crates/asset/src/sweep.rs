//! Extrude a profile along a polyline.
//!
//! At every path sample the profile is placed in a local frame: `z` along
//! the path tangent, `y` along the `up` hint projected off the tangent,
//! `x = y × z`. Sample `i` is additionally rotated by `i · twist` about the
//! tangent. Neighbouring rings are stitched with quads and both ends get a
//! flat fan cap.

use glam::{DVec2, DVec3};

use crate::mesh::{MeshData, MeshVertex};
use crate::profile::Profile;

const EPSILON: f64 = 1e-12;

/// Orthonormal frame of one ring.
#[derive(Clone, Copy, Debug)]
struct RingFrame {
    x: DVec3,
    y: DVec3,
    tangent: DVec3,
}

impl RingFrame {
    fn new(tangent: DVec3, up: DVec3) -> Self {
        let t = tangent.normalize();
        let mut y = up - t * up.dot(t);
        if y.length_squared() < EPSILON {
            // up is parallel to the path; any perpendicular will do
            let arbitrary = if t.x.abs() < 0.9 { DVec3::X } else { DVec3::Y };
            y = t.cross(arbitrary);
        }
        let y = y.normalize();
        Self {
            x: y.cross(t),
            y,
            tangent: t,
        }
    }

    fn place(&self, origin: DVec3, p: DVec2) -> DVec3 {
        origin + self.x * p.x + self.y * p.y
    }
}

fn to_f32(v: DVec3) -> [f32; 3] {
    v.as_vec3().to_array()
}

/// Drop consecutive duplicates so tangents are well defined.
fn distinct_points(path: &[DVec3]) -> Vec<DVec3> {
    let mut out: Vec<DVec3> = Vec::with_capacity(path.len());
    for &p in path {
        if out.last().is_none_or(|q| q.distance_squared(p) > EPSILON) {
            out.push(p);
        }
    }
    out
}

/// Tessellate `profile` swept along `path`. A path with fewer than two
/// distinct points yields an empty mesh.
pub fn sweep(profile: &Profile, path: &[DVec3], up: DVec3, twist: f64) -> MeshData {
    let path = distinct_points(path);
    let m = profile.len();
    if path.len() < 2 || m < 3 {
        log::trace!("sweep skipped: {} distinct points, {m} profile points", path.len());
        return MeshData::default();
    }
    let n = path.len();
    let frames: Vec<RingFrame> = (0..n)
        .map(|i| {
            let tangent = path[(i + 1).min(n - 1)] - path[i.saturating_sub(1)];
            RingFrame::new(tangent, up)
        })
        .collect();

    let mut mesh = MeshData::default();
    for (i, (frame, &origin)) in frames.iter().zip(&path).enumerate() {
        let (sin, cos) = (twist * i as f64).sin_cos();
        let rot = DVec2::new(cos, sin);
        let v = i as f32 / (n - 1) as f32;
        for (k, &p) in profile.points().iter().enumerate() {
            let local = rot.rotate(p);
            let normal = frame.place(DVec3::ZERO, local.normalize_or_zero());
            mesh.push_vertex(MeshVertex::new(
                to_f32(frame.place(origin, local)),
                to_f32(normal),
                [k as f32 / m as f32, v],
            ));
        }
    }

    let m32 = m as u32;
    for i in 0..(n as u32 - 1) {
        for k in 0..m32 {
            let a = i * m32 + k;
            let b = i * m32 + (k + 1) % m32;
            let c = a + m32;
            let d = b + m32;
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(a, d, c);
        }
    }

    add_cap(&mut mesh, 0, -frames[0].tangent, path[0], m32, true);
    add_cap(&mut mesh, n - 1, frames[n - 1].tangent, path[n - 1], m32, false);
    log::trace!(
        "swept {m}-point profile along {n} samples: {} triangles",
        mesh.triangle_count()
    );
    mesh
}

fn add_cap(mesh: &mut MeshData, ring: usize, normal: DVec3, center: DVec3, m: u32, flip: bool) {
    let normal = to_f32(normal);
    let first = ring as u32 * m;
    let hub = mesh.push_vertex(MeshVertex::new(to_f32(center), normal, [0.5, 0.5]));
    let rim: Vec<u32> = (0..m)
        .map(|k| {
            let src = mesh.vertices[(first + k) as usize];
            mesh.push_vertex(MeshVertex::new(src.position, normal, src.uv))
        })
        .collect();
    for k in 0..m as usize {
        let (a, b) = (rim[k], rim[(k + 1) % m as usize]);
        if flip {
            mesh.push_triangle(hub, b, a);
        } else {
            mesh.push_triangle(hub, a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(n: usize) -> Vec<DVec3> {
        (0..n).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn vertex_and_triangle_counts() {
        let profile = Profile::rectangle(0.1, 0.05);
        let mesh = sweep(&profile, &straight(3), DVec3::Z, 0.0);
        // 3 rings of 4, plus hub + rim per cap
        assert_eq!(mesh.vertices.len(), 3 * 4 + 2 * 5);
        assert_eq!(mesh.triangle_count(), 2 * 4 * 2 + 2 * 4);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn degenerate_paths_are_empty() {
        let profile = Profile::rectangle(1.0, 1.0);
        assert!(!sweep(&profile, &[], DVec3::Z, 0.0).is_valid());
        assert!(!sweep(&profile, &[DVec3::ONE], DVec3::Z, 0.0).is_valid());
        assert!(!sweep(&profile, &[DVec3::ONE, DVec3::ONE], DVec3::Z, 0.0).is_valid());
    }

    #[test]
    fn rings_stay_in_planes_normal_to_the_path() {
        let profile = Profile::rounded_rectangle(0.2, 0.1, 0.2, 3);
        let mesh = sweep(&profile, &straight(4), DVec3::Z, 0.3);
        let m = profile.len();
        for ring in 0..4 {
            for v in &mesh.vertices[ring * m..(ring + 1) * m] {
                assert!((v.position[0] - ring as f32).abs() < 1e-6);
            }
        }
        let (lo, hi) = mesh.bounds().unwrap();
        assert!((lo[0] - 0.0).abs() < 1e-6 && (hi[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn twist_rotates_later_rings() {
        let profile = Profile::rectangle(2.0, 0.0001);
        let twist = std::f64::consts::FRAC_PI_2;
        let mesh = sweep(&profile, &straight(2), DVec3::Z, twist);
        // ring 0 is wide along x = y × tangent, ring 1 is turned a quarter
        let spread = |ring: usize, axis: usize| {
            let vs = &mesh.vertices[ring * 4..ring * 4 + 4];
            vs.iter().map(|v| v.position[axis].abs()).fold(0.0f32, f32::max)
        };
        assert!(spread(0, 1) > 0.9 && spread(0, 2) < 1e-3);
        assert!(spread(1, 2) > 0.9 && spread(1, 1) < 1e-3);
    }

    #[test]
    fn up_parallel_to_path_still_sweeps() {
        let profile = Profile::rectangle(1.0, 1.0);
        let path = [DVec3::ZERO, DVec3::Z];
        let mesh = sweep(&profile, &path, DVec3::Z, 0.0);
        assert!(mesh.is_valid());
        assert!(
            mesh.vertices
                .iter()
                .flat_map(|v| v.position)
                .all(f32::is_finite)
        );
    }
}
