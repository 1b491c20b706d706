//! Error type shared by the pose algebra, the frame tree and links.

use thiserror::Error;

use crate::frames::FrameId;
use crate::se3::TransformDefect;
use crate::so3::RotationDefect;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("matrix is not a rotation: {0}")]
    InvalidRotation(RotationDefect),
    #[error("matrix is not a homogeneous transform: {0}")]
    InvalidTransform(TransformDefect),
    #[error("cannot compose {left} with {right}")]
    UnsupportedOperand {
        left: &'static str,
        right: &'static str,
    },
    #[error("unknown frame {0}")]
    UnknownFrame(FrameId),
    #[error("frame {frame} cannot be attached to {parent}: it is one of its ancestors")]
    FrameCycle { frame: FrameId, parent: FrameId },
    #[error("unknown link field '{0}' (expected q, theta, d, a or alpha)")]
    UnknownField(String),
    #[error("unknown joint type '{0}' (expected 'r' or 'p')")]
    UnknownJoint(String),
    #[error("unknown angle unit '{0}' (expected 'deg' or 'rad')")]
    UnknownUnit(String),
    #[error("link index {0} is out of range")]
    UnknownLink(usize),
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f64 },
}

pub type CoreResult<T> = Result<T, CoreError>;
