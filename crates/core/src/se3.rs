//! SE(3): homogeneous rigid transforms with a maintained inverse.

use std::fmt;
use std::ops::Mul;

use crate::error::{CoreError, CoreResult};
use crate::so3::{Rotation, RotationDefect, check_rotation};
use crate::unit::AngleUnit;
use crate::{DMat3, DMat4, DVec3, DVec4};

const BOTTOM_ROW: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Why a matrix failed [`check_transform`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformDefect {
    Shape { len: usize },
    /// The last row must be exactly `[0, 0, 0, 1]`.
    BottomRow { row: [f64; 4] },
    Rotation(RotationDefect),
    NonFiniteTranslation { translation: DVec3 },
}

impl fmt::Display for TransformDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformDefect::Shape { len } => write!(f, "expected 16 elements, got {len}"),
            TransformDefect::BottomRow { row } => {
                write!(f, "last row is {row:?}, expected [0, 0, 0, 1]")
            }
            TransformDefect::Rotation(defect) => write!(f, "rotation block: {defect}"),
            TransformDefect::NonFiniteTranslation { translation } => {
                write!(f, "translation {translation} has NaN or infinite entries")
            }
        }
    }
}

pub fn check_transform(m: &DMat4) -> Result<(), TransformDefect> {
    let row = m.row(3).to_array();
    if row != BOTTOM_ROW {
        return Err(TransformDefect::BottomRow { row });
    }
    check_rotation(&DMat3::from_mat4(*m)).map_err(TransformDefect::Rotation)?;
    check_translation(m.w_axis.truncate())
}

#[inline]
pub fn check_translation(t: DVec3) -> Result<(), TransformDefect> {
    if t.is_finite() {
        Ok(())
    } else {
        Err(TransformDefect::NonFiniteTranslation { translation: t })
    }
}

#[inline]
pub fn is_transform(m: &DMat4) -> bool {
    check_transform(m).is_ok()
}

#[inline]
fn homogeneous(r: &DMat3, t: DVec3) -> DMat4 {
    DMat4::from_cols(
        r.x_axis.extend(0.0),
        r.y_axis.extend(0.0),
        r.z_axis.extend(0.0),
        t.extend(1.0),
    )
}

/// Rigid transform `[R t; 0 1]`.
///
/// The composed matrix and its inverse `[Rᵗ -Rᵗt; 0 1]` are kept in sync by
/// every setter; the inverse is never obtained by a generic matrix inversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    rotation: Rotation,
    translation: DVec3,
    hom: DMat4,
    hom_inv: DMat4,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Rotation::IDENTITY,
        translation: DVec3::ZERO,
        hom: DMat4::IDENTITY,
        hom_inv: DMat4::IDENTITY,
    };

    /// Rotation by `angle` about `axis`, followed by `translation`.
    pub fn new(translation: DVec3, angle: f64, axis: DVec3, unit: AngleUnit) -> CoreResult<Self> {
        check_translation(translation).map_err(CoreError::InvalidTransform)?;
        Ok(Self::from_parts(Rotation::new(angle, axis, unit)?, translation))
    }

    pub fn from_parts(rotation: Rotation, translation: DVec3) -> Self {
        let r = rotation.matrix();
        let rt = r.transpose();
        Self {
            rotation,
            translation,
            hom: homogeneous(&r, translation),
            hom_inv: homogeneous(&rt, -(rt * translation)),
        }
    }

    #[inline]
    pub fn from_translation(translation: DVec3) -> Self {
        Self::from_parts(Rotation::IDENTITY, translation)
    }

    #[inline]
    pub fn from_rotation(rotation: Rotation) -> Self {
        Self::from_parts(rotation, DVec3::ZERO)
    }

    pub fn from_matrix(m: DMat4) -> CoreResult<Self> {
        check_transform(&m).map_err(CoreError::InvalidTransform)?;
        Ok(Self::from_parts(
            Rotation::from_matrix_unchecked(DMat3::from_mat4(m)),
            m.w_axis.truncate(),
        ))
    }

    /// Sixteen row-major values.
    pub fn from_slice(values: &[f64]) -> CoreResult<Self> {
        let rows: [f64; 16] = values.try_into().map_err(|_| {
            CoreError::InvalidTransform(TransformDefect::Shape { len: values.len() })
        })?;
        Self::from_matrix(DMat4::from_cols_array(&rows).transpose())
    }

    /// Replace the whole matrix; on failure `self` is left untouched.
    pub fn set_matrix(&mut self, m: DMat4) -> CoreResult<()> {
        *self = Self::from_matrix(m)?;
        Ok(())
    }

    /// Only the translation columns of the matrix and of its inverse change.
    /// A non-finite translation is rejected and `self` is left untouched.
    pub fn set_translation(&mut self, translation: DVec3) -> CoreResult<()> {
        check_translation(translation).map_err(CoreError::InvalidTransform)?;
        self.translation = translation;
        self.hom.w_axis = translation.extend(1.0);
        self.hom_inv.w_axis = (-(self.rotation.transpose().apply(translation))).extend(1.0);
        Ok(())
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        let r = rotation.matrix();
        let rt = r.transpose();
        self.hom.x_axis = r.x_axis.extend(0.0);
        self.hom.y_axis = r.y_axis.extend(0.0);
        self.hom.z_axis = r.z_axis.extend(0.0);
        self.hom_inv.x_axis = rt.x_axis.extend(0.0);
        self.hom_inv.y_axis = rt.y_axis.extend(0.0);
        self.hom_inv.z_axis = rt.z_axis.extend(0.0);
        self.hom_inv.w_axis = (-(rt * self.translation)).extend(1.0);
    }

    pub fn set_rotation_matrix(&mut self, m: DMat3) -> CoreResult<()> {
        let rotation = Rotation::from_matrix(m)?;
        self.set_rotation(rotation);
        Ok(())
    }

    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[inline]
    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    #[inline]
    pub fn matrix(&self) -> DMat4 {
        self.hom
    }

    #[inline]
    pub fn inverse_matrix(&self) -> DMat4 {
        self.hom_inv
    }

    /// The group inverse, read from the cache.
    #[inline]
    pub fn inverse(&self) -> Transform {
        Transform {
            rotation: self.rotation.transpose(),
            translation: self.hom_inv.w_axis.truncate(),
            hom: self.hom_inv,
            hom_inv: self.hom,
        }
    }

    /// Literal matrix transpose, re-validated on the way back in.
    ///
    /// Only a pure rotation survives: any translation ends up in the bottom
    /// row, which fails with [`CoreError::InvalidTransform`].
    pub fn transpose(&self) -> CoreResult<Transform> {
        Self::from_matrix(self.hom.transpose())
    }

    /// `self · other`.
    pub fn compose(&self, other: &Transform) -> Transform {
        Self::from_parts(
            self.rotation.compose(&other.rotation),
            self.translation + self.rotation.apply(other.translation),
        )
    }

    #[inline]
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.translation + self.rotation.apply(p)
    }

    #[inline]
    pub fn transform_vector(&self, v: DVec3) -> DVec3 {
        self.rotation.apply(v)
    }

    /// Equals det(R) since the matrix is block triangular.
    #[inline]
    pub fn det(&self) -> f64 {
        self.hom.determinant()
    }

    #[inline]
    pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f64) -> bool {
        self.hom.abs_diff_eq(other.hom, max_abs_diff)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Rotation> for Transform {
    fn from(rotation: Rotation) -> Self {
        Self::from_rotation(rotation)
    }
}

impl Mul for Transform {
    type Output = Transform;

    #[inline]
    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

impl Mul<DVec3> for Transform {
    type Output = DVec3;

    #[inline]
    fn mul(self, rhs: DVec3) -> DVec3 {
        self.transform_point(rhs)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transform:")?;
        for i in 0..4 {
            let DVec4 { x, y, z, w } = self.hom.row(i);
            writeln!(f, "  [{x:>10.6} {y:>10.6} {z:>10.6} {w:>10.6}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn random_transform(rng: &mut StdRng) -> Transform {
        let t = DVec3::new(
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
        );
        let axis = DVec3::new(
            rng.gen_range(0.1..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        Transform::new(t, rng.gen_range(-180.0..180.0), axis, AngleUnit::Degrees).unwrap()
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let h = random_transform(&mut rng);
            assert!((h * h.inverse()).abs_diff_eq(&Transform::IDENTITY, 1e-9));
            assert!((h.inverse() * h).abs_diff_eq(&Transform::IDENTITY, 1e-9));
            assert!(h.inverse().inverse().abs_diff_eq(&h, 1e-12));
        }
    }

    #[test]
    fn rotation_part_matches_independent_rotation() {
        let h = Transform::new(DVec3::Y, 30.0, DVec3::Y, AngleUnit::Degrees).unwrap();
        let r = Rotation::new(30.0, DVec3::Y, AngleUnit::Degrees).unwrap();
        assert!(h.rotation().abs_diff_eq(&r, 1e-12));
        assert_eq!(h.translation(), DVec3::Y);
        assert!(is_transform(&h.matrix()));
        assert!((h.det() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn random_matrices_are_not_transforms() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let vals: Vec<f64> = (0..16).map(|_| rng.gen_range(-1.0..1.0)).collect();
            assert!(Transform::from_slice(&vals).is_err());
        }
    }

    #[test]
    fn bottom_row_must_be_exact() {
        let mut m = DMat4::IDENTITY;
        m.x_axis.w = 1e-12;
        let err = Transform::from_matrix(m).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransform(TransformDefect::BottomRow { .. })
        ));
    }

    #[test]
    fn setters_keep_inverse_in_sync() {
        let mut h = Transform::new(DVec3::new(1.0, 2.0, 3.0), 40.0, DVec3::Z, AngleUnit::Degrees)
            .unwrap();
        h.set_translation(DVec3::new(-1.0, 0.5, 2.0)).unwrap();
        assert!((h.matrix() * h.inverse_matrix()).abs_diff_eq(DMat4::IDENTITY, 1e-12));
        let rx = Rotation::about_x(75.0, AngleUnit::Degrees).unwrap();
        h.set_rotation(rx);
        assert_eq!(h.translation(), DVec3::new(-1.0, 0.5, 2.0));
        assert!((h.matrix() * h.inverse_matrix()).abs_diff_eq(DMat4::IDENTITY, 1e-12));
        let rebuilt = Transform::from_parts(rx, DVec3::new(-1.0, 0.5, 2.0));
        assert!(h.abs_diff_eq(&rebuilt, 1e-12));
    }

    #[test]
    fn failed_set_leaves_transform_unchanged() {
        let mut h = Transform::from_translation(DVec3::X);
        let before = h;
        assert!(h.set_matrix(DMat4::from_diagonal(DVec4::splat(2.0))).is_err());
        assert!(h.set_rotation_matrix(DMat3::ZERO).is_err());
        assert_eq!(h, before);
    }

    #[test]
    fn non_finite_translation_is_rejected() {
        let mut m = DMat4::IDENTITY;
        m.w_axis.y = f64::NAN;
        assert!(matches!(
            Transform::from_matrix(m),
            Err(CoreError::InvalidTransform(TransformDefect::NonFiniteTranslation { .. }))
        ));
        let inf = DVec3::new(f64::INFINITY, 0.0, 0.0);
        assert!(Transform::new(inf, 10.0, DVec3::Z, AngleUnit::Degrees).is_err());

        let mut h = Transform::from_translation(DVec3::X);
        let before = h;
        assert!(h.set_translation(DVec3::splat(f64::NAN)).is_err());
        assert_eq!(h, before);
    }

    #[test]
    fn transpose_round_trips_only_pure_rotations() {
        let r = Transform::new(DVec3::ZERO, 25.0, DVec3::X, AngleUnit::Degrees).unwrap();
        let rt = r.transpose().unwrap();
        assert!(rt.abs_diff_eq(&r.inverse(), 1e-12));

        let h = Transform::new(DVec3::new(0.0, 1.0, 0.0), 25.0, DVec3::X, AngleUnit::Degrees)
            .unwrap();
        assert!(matches!(
            h.transpose(),
            Err(CoreError::InvalidTransform(TransformDefect::BottomRow { .. }))
        ));
    }

    #[test]
    fn points_follow_rotation_then_translation() {
        let h = Transform::new(DVec3::new(1.0, 0.0, 0.0), 90.0, DVec3::Z, AngleUnit::Degrees)
            .unwrap();
        let p = h * DVec3::X;
        assert!((p - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
        assert!((h.inverse() * p - DVec3::X).length() < 1e-12);
        assert!((h.transform_vector(DVec3::X) - DVec3::Y).length() < 1e-12);
    }
}
