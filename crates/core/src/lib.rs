//! Core types: math re-exports, SO(3)/SE(3), frame tree, DH links.

pub use glam::{DMat3, DMat4, DVec3, DVec4, dvec3};

pub mod animate;
pub mod camera;
pub mod chain;
pub mod error;
pub mod frames;
pub mod link;
pub mod operand;
pub mod se3;
pub mod so3;
pub mod unit;

pub use error::{CoreError, CoreResult};
