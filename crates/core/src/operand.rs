//! Runtime-tagged composition operands.
//!
//! Statically typed code should use `Rotation * Rotation` and
//! `Transform * Transform` directly. `Operand` exists for callers that pick
//! the kind at runtime (scripted scenes, raw matrices from a file).

use crate::error::{CoreError, CoreResult};
use crate::se3::Transform;
use crate::so3::Rotation;
use crate::{DMat3, DMat4, DVec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    Rotation(Rotation),
    Transform(Transform),
    /// Unvalidated 3×3 matrix, checked on use.
    Matrix3(DMat3),
    /// Unvalidated 4×4 matrix, checked on use.
    Matrix4(DMat4),
    Point(DVec3),
}

impl Operand {
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Rotation(_) => "rotation",
            Operand::Transform(_) => "transform",
            Operand::Matrix3(_) => "3x3 matrix",
            Operand::Matrix4(_) => "4x4 matrix",
            Operand::Point(_) => "point",
        }
    }

    /// Validate raw matrices into their group type.
    pub fn validated(self) -> CoreResult<Operand> {
        match self {
            Operand::Matrix3(m) => Ok(Operand::Rotation(Rotation::from_matrix(m)?)),
            Operand::Matrix4(m) => Ok(Operand::Transform(Transform::from_matrix(m)?)),
            other => Ok(other),
        }
    }

    /// Promote a pose-like operand to a transform; rotations get zero
    /// translation.
    pub fn as_transform(self) -> CoreResult<Transform> {
        match self.validated()? {
            Operand::Rotation(r) => Ok(Transform::from_rotation(r)),
            Operand::Transform(h) => Ok(h),
            other => Err(CoreError::UnsupportedOperand {
                left: "transform",
                right: other.kind(),
            }),
        }
    }

    /// `self · rhs` for matching kinds, or a group element applied to a point.
    pub fn compose(self, rhs: Operand) -> CoreResult<Operand> {
        let (lhs, rhs) = (self.validated()?, rhs.validated()?);
        match (lhs, rhs) {
            (Operand::Rotation(a), Operand::Rotation(b)) => Ok(Operand::Rotation(a * b)),
            (Operand::Transform(a), Operand::Transform(b)) => Ok(Operand::Transform(a * b)),
            (Operand::Rotation(a), Operand::Point(p)) => Ok(Operand::Point(a * p)),
            (Operand::Transform(a), Operand::Point(p)) => Ok(Operand::Point(a * p)),
            (a, b) => Err(CoreError::UnsupportedOperand {
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }
}

impl From<Rotation> for Operand {
    fn from(r: Rotation) -> Self {
        Operand::Rotation(r)
    }
}

impl From<Transform> for Operand {
    fn from(h: Transform) -> Self {
        Operand::Transform(h)
    }
}

impl From<DVec3> for Operand {
    fn from(p: DVec3) -> Self {
        Operand::Point(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::AngleUnit;

    #[test]
    fn mixed_kinds_are_rejected() {
        let r = Rotation::about_z(30.0, AngleUnit::Degrees).unwrap();
        let h = Transform::from_translation(DVec3::X);
        let err = Operand::from(r).compose(Operand::from(h)).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnsupportedOperand {
                left: "rotation",
                right: "transform"
            }
        );
        assert!(Operand::Point(DVec3::X).compose(r.into()).is_err());
    }

    #[test]
    fn raw_matrices_are_validated_before_use() {
        let ok = Operand::Matrix3(DMat3::IDENTITY)
            .compose(Operand::Point(DVec3::Y))
            .unwrap();
        assert_eq!(ok, Operand::Point(DVec3::Y));
        assert!(matches!(
            Operand::Matrix4(DMat4::ZERO).as_transform(),
            Err(CoreError::InvalidTransform(_))
        ));
    }

    #[test]
    fn same_kinds_compose() {
        let a = Transform::from_translation(DVec3::X);
        let b = Transform::from_translation(DVec3::Y);
        let Operand::Transform(ab) = Operand::from(a).compose(b.into()).unwrap() else {
            panic!("expected a transform");
        };
        assert_eq!(ab.translation(), DVec3::new(1.0, 1.0, 0.0));
    }
}
