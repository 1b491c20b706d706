//! Render binding: mirrors frames and link shapes into a draw backend.

use std::sync::Arc;

use parking_lot::Mutex;

pub mod backend;
pub mod binding;
pub mod link_view;
pub mod palette;
pub mod recorder;

pub use backend::{DrawBackend, NodeKey, Primitive, PrimitiveId};
pub use binding::{FrameBinding, FrameStyle};
pub use link_view::LinkView;
pub use recorder::{SceneRecorder, Vertex};

/// A backend shared between bindings and the caller.
pub type Shared<B> = Arc<Mutex<B>>;

pub fn shared<B: DrawBackend>(backend: B) -> Shared<B> {
    Arc::new(Mutex::new(backend))
}
