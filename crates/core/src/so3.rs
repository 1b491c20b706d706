//! SO(3): validated right-handed rotation matrices.
//!
//! A [`Rotation`] can only be obtained through validation, so every value in
//! circulation is orthonormal with determinant +1 (within
//! [`ROTATION_TOLERANCE`]). Products and transposes of valid rotations stay in
//! the group and are not re-checked.

use std::fmt;
use std::ops::Mul;

use crate::error::{CoreError, CoreResult};
use crate::unit::AngleUnit;
use crate::{DMat3, DVec3};

/// Absolute tolerance for the determinant and `RᵗR = I` checks.
pub const ROTATION_TOLERANCE: f64 = 1e-4;

/// Why a matrix failed [`check_rotation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RotationDefect {
    /// Input had the wrong number of elements.
    Shape { len: usize },
    NonFinite,
    /// det(R) = -1: a reflection, rotations must be right handed.
    LeftHanded { det: f64 },
    BadDeterminant { det: f64 },
    NotOrthonormal { max_error: f64 },
}

impl fmt::Display for RotationDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationDefect::Shape { len } => {
                write!(f, "expected 9 elements, got {len}")
            }
            RotationDefect::NonFinite => write!(f, "matrix contains NaN or infinite entries"),
            RotationDefect::LeftHanded { det } => {
                write!(f, "det(R)={det:.6}, rotations must be right handed")
            }
            RotationDefect::BadDeterminant { det } => {
                write!(f, "det(R)={det:.6} and not 1, so R is not a rotation matrix")
            }
            RotationDefect::NotOrthonormal { max_error } => {
                write!(f, "RᵗR differs from identity by {max_error:.6}")
            }
        }
    }
}

/// Diagnostic check: reports why `m` is not a rotation.
pub fn check_rotation(m: &DMat3) -> Result<(), RotationDefect> {
    if !m.is_finite() {
        return Err(RotationDefect::NonFinite);
    }
    let det = m.determinant();
    if (det - 1.0).abs() > ROTATION_TOLERANCE {
        if (det + 1.0).abs() <= ROTATION_TOLERANCE {
            return Err(RotationDefect::LeftHanded { det });
        }
        return Err(RotationDefect::BadDeterminant { det });
    }
    let gram = m.transpose() * *m - DMat3::IDENTITY;
    let max_error = gram
        .to_cols_array()
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if max_error > ROTATION_TOLERANCE {
        return Err(RotationDefect::NotOrthonormal { max_error });
    }
    Ok(())
}

#[inline]
pub fn is_rotation(m: &DMat3) -> bool {
    check_rotation(m).is_ok()
}

/// Skew-symmetric matrix [v]× such that [v]× u = v × u.
#[inline]
pub fn skew(v: DVec3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.0, v.z, -v.y),
        DVec3::new(-v.z, 0.0, v.x),
        DVec3::new(v.y, -v.x, 0.0),
    )
}

/// Rodrigues: R = I + sin θ [k]× + (1 - cos θ) [k]×², k = axis / |axis|.
///
/// A zero axis yields a NaN matrix which then fails validation.
pub fn axis_angle_matrix(angle_rad: f64, axis: DVec3) -> DMat3 {
    let k = skew(axis / axis.length());
    DMat3::IDENTITY + k * angle_rad.sin() + (k * k) * (1.0 - angle_rad.cos())
}

/// A 3×3 right-handed rotation matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    mat: DMat3,
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        mat: DMat3::IDENTITY,
    };

    /// Rotation by `angle` about `axis`.
    pub fn new(angle: f64, axis: DVec3, unit: AngleUnit) -> CoreResult<Self> {
        Self::from_matrix(axis_angle_matrix(unit.to_radians(angle), axis))
    }

    #[inline]
    pub fn about_x(angle: f64, unit: AngleUnit) -> CoreResult<Self> {
        Self::new(angle, DVec3::X, unit)
    }

    #[inline]
    pub fn about_y(angle: f64, unit: AngleUnit) -> CoreResult<Self> {
        Self::new(angle, DVec3::Y, unit)
    }

    #[inline]
    pub fn about_z(angle: f64, unit: AngleUnit) -> CoreResult<Self> {
        Self::new(angle, DVec3::Z, unit)
    }

    pub fn from_matrix(mat: DMat3) -> CoreResult<Self> {
        check_rotation(&mat).map_err(CoreError::InvalidRotation)?;
        Ok(Self { mat })
    }

    /// Row-major nested array, as matrices are usually written down.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> CoreResult<Self> {
        Self::from_matrix(DMat3::from_cols_array_2d(&rows).transpose())
    }

    /// Nine row-major values.
    pub fn from_slice(values: &[f64]) -> CoreResult<Self> {
        let rows: [f64; 9] = values.try_into().map_err(|_| {
            CoreError::InvalidRotation(RotationDefect::Shape { len: values.len() })
        })?;
        Self::from_matrix(DMat3::from_cols_array(&rows).transpose())
    }

    /// Caller guarantees `mat` is already a member of SO(3).
    #[inline]
    pub(crate) fn from_matrix_unchecked(mat: DMat3) -> Self {
        Self { mat }
    }

    #[inline]
    pub fn matrix(&self) -> DMat3 {
        self.mat
    }

    /// Replace the matrix; on failure `self` is left untouched.
    pub fn set_matrix(&mut self, mat: DMat3) -> CoreResult<()> {
        *self = Self::from_matrix(mat)?;
        Ok(())
    }

    /// `self · other`.
    #[inline]
    pub fn compose(&self, other: &Rotation) -> Rotation {
        Self::from_matrix_unchecked(self.mat * other.mat)
    }

    /// The inverse rotation.
    #[inline]
    pub fn transpose(&self) -> Rotation {
        Self::from_matrix_unchecked(self.mat.transpose())
    }

    #[inline]
    pub fn det(&self) -> f64 {
        self.mat.determinant()
    }

    /// Rotate a vector.
    #[inline]
    pub fn apply(&self, v: DVec3) -> DVec3 {
        self.mat * v
    }

    #[inline]
    pub fn abs_diff_eq(&self, other: &Rotation, max_abs_diff: f64) -> bool {
        self.mat.abs_diff_eq(other.mat, max_abs_diff)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Rotation {
    type Output = Rotation;

    #[inline]
    fn mul(self, rhs: Rotation) -> Rotation {
        self.compose(&rhs)
    }
}

impl Mul<DVec3> for Rotation {
    type Output = DVec3;

    #[inline]
    fn mul(self, rhs: DVec3) -> DVec3 {
        self.apply(rhs)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rotation:")?;
        for i in 0..3 {
            let r = self.mat.row(i);
            writeln!(f, "  [{:>10.6} {:>10.6} {:>10.6}]", r.x, r.y, r.z)?;
        }
        Ok(())
    }
}
