//! CPU-side geometry: mesh data, 2D profiles and path sweeps.

pub mod mesh;
pub mod profile;
pub mod sweep;

pub use mesh::{MeshData, MeshVertex};
pub use profile::Profile;
pub use sweep::sweep;
