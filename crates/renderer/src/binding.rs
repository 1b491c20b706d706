//! Frame visuals: a node per frame with a point, a name label and an axes
//! triad.

use std::collections::HashMap;
use std::sync::Arc;

use corelib::DVec3;
use corelib::frames::{Frame, FrameChange, FrameId, FrameObserver};
use parking_lot::Mutex;

use crate::Shared;
use crate::backend::{DrawBackend, NodeKey, Primitive, PrimitiveId};
use crate::palette::{self, Color};

const AXES: [(DVec3, Color, &str); 3] = [
    (DVec3::X, palette::X_AXIS, "x"),
    (DVec3::Y, palette::Y_AXIS, "y"),
    (DVec3::Z, palette::Z_AXIS, "z"),
];

/// How one frame is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStyle {
    /// Color of the point and the name label.
    pub color: Color,
    /// Axis length; widths and label heights follow it.
    pub scale: f64,
    pub visible: bool,
    pub visible_label: bool,
    pub visible_axes: bool,
    pub visible_axis_labels: bool,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            color: palette::TEXT,
            scale: 1.0,
            visible: true,
            visible_label: true,
            visible_axes: true,
            visible_axis_labels: true,
        }
    }
}

impl FrameStyle {
    /// A labelled point without the axes triad.
    pub fn point() -> Self {
        Self {
            visible_axes: false,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Primitive handles owned by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePrimitives {
    pub point: PrimitiveId,
    pub label: PrimitiveId,
    pub axes: [PrimitiveId; 3],
    pub axis_labels: [PrimitiveId; 3],
}

#[derive(Clone, Debug)]
struct FrameVisual {
    name: String,
    style: FrameStyle,
    prims: FramePrimitives,
}

#[derive(Default)]
struct BindingState {
    visuals: HashMap<FrameId, FrameVisual>,
    /// Styles set before the frame was seen, or the current style otherwise.
    styles: HashMap<FrameId, FrameStyle>,
    default_style: FrameStyle,
}

/// Mirrors a [`corelib::frames::FrameTree`] into a backend.
///
/// Subscribe a clone to the tree and keep another to restyle frames later;
/// clones share their state.
pub struct FrameBinding<B: DrawBackend> {
    backend: Shared<B>,
    state: Arc<Mutex<BindingState>>,
}

impl<B: DrawBackend> Clone for FrameBinding<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: DrawBackend> FrameBinding<B> {
    pub fn new(backend: Shared<B>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(BindingState::default())),
        }
    }

    /// Style for frames without an explicit one.
    pub fn with_default_style(self, style: FrameStyle) -> Self {
        self.state.lock().default_style = style;
        self
    }

    pub fn style(&self, id: FrameId) -> FrameStyle {
        let state = self.state.lock();
        state.styles.get(&id).copied().unwrap_or(state.default_style)
    }

    pub fn primitives(&self, id: FrameId) -> Option<FramePrimitives> {
        self.state.lock().visuals.get(&id).map(|v| v.prims)
    }

    /// Restyle a frame. For a frame not added yet the style is kept until it
    /// is.
    pub fn set_style(&self, id: FrameId, style: FrameStyle) {
        let mut state = self.state.lock();
        state.styles.insert(id, style);
        let Some(visual) = state.visuals.get_mut(&id) else {
            return;
        };
        let old = visual.style;
        visual.style = style;
        let prims = visual.prims;
        let mut backend = self.backend.lock();
        if old.color != style.color {
            backend.update_primitive(prims.point, point_marker(&style));
        }
        if old.color != style.color || old.scale != style.scale {
            backend.update_primitive(prims.label, name_label(&visual.name, &style));
        }
        if old.scale != style.scale {
            for (i, (dir, color, name)) in AXES.into_iter().enumerate() {
                backend.update_primitive(prims.axes[i], axis_arrow(dir, color, style.scale));
                backend.update_primitive(prims.axis_labels[i], axis_label(dir, name, style.scale));
            }
        }
        apply_visibility(&mut *backend, id, &style, &prims);
    }

    /// Give `to` the current style of `from`, e.g. after
    /// [`corelib::frames::FrameTree::copy_frame`].
    pub fn copy_style(&self, from: FrameId, to: FrameId) {
        self.set_style(to, self.style(from));
    }

    fn add(&self, id: FrameId, frame: &Frame) {
        let mut state = self.state.lock();
        let style = state.styles.get(&id).copied().unwrap_or(state.default_style);
        let node = NodeKey::from(id);
        let mut backend = self.backend.lock();
        backend.upsert_node(node, frame.parent().map(NodeKey::from), frame.pose().matrix());
        let point = backend.create_primitive(node, point_marker(&style));
        let label = backend.create_primitive(node, name_label(frame.name(), &style));
        let mut axes = [PrimitiveId(0); 3];
        let mut axis_labels = [PrimitiveId(0); 3];
        for (i, (dir, color, name)) in AXES.into_iter().enumerate() {
            axes[i] = backend.create_primitive(node, axis_arrow(dir, color, style.scale));
            axis_labels[i] = backend.create_primitive(node, axis_label(dir, name, style.scale));
        }
        let prims = FramePrimitives {
            point,
            label,
            axes,
            axis_labels,
        };
        apply_visibility(&mut *backend, id, &style, &prims);
        log::trace!("frame {id} bound to node {node:?}");
        state.styles.insert(id, style);
        state.visuals.insert(
            id,
            FrameVisual {
                name: frame.name().to_string(),
                style,
                prims,
            },
        );
    }
}

impl<B: DrawBackend> FrameObserver for FrameBinding<B> {
    fn frame_changed(&mut self, change: FrameChange, id: FrameId, frame: &Frame) {
        match change {
            FrameChange::Added => self.add(id, frame),
            FrameChange::Pose | FrameChange::Parent => {
                self.backend.lock().upsert_node(
                    NodeKey::from(id),
                    frame.parent().map(NodeKey::from),
                    frame.pose().matrix(),
                );
            }
            FrameChange::Renamed => {
                let mut state = self.state.lock();
                if let Some(visual) = state.visuals.get_mut(&id) {
                    visual.name = frame.name().to_string();
                    self.backend
                        .lock()
                        .update_primitive(visual.prims.label, name_label(&visual.name, &visual.style));
                }
            }
        }
    }
}

fn apply_visibility<B: DrawBackend + ?Sized>(
    backend: &mut B,
    id: FrameId,
    style: &FrameStyle,
    prims: &FramePrimitives,
) {
    backend.set_node_visible(NodeKey::from(id), style.visible);
    backend.set_primitive_visible(prims.label, style.visible_label);
    for (arrow, label) in prims.axes.iter().zip(&prims.axis_labels) {
        backend.set_primitive_visible(*arrow, style.visible_axes);
        backend.set_primitive_visible(*label, style.visible_axes && style.visible_axis_labels);
    }
}

fn point_marker(style: &FrameStyle) -> Primitive {
    Primitive::Points {
        positions: vec![DVec3::ZERO],
        color: style.color,
        size_px: 4.0,
    }
}

fn name_label(name: &str, style: &FrameStyle) -> Primitive {
    Primitive::Label {
        position: DVec3::ZERO,
        text: name.to_string(),
        color: style.color,
        height: 16.0 * style.scale as f32,
    }
}

fn axis_arrow(dir: DVec3, color: Color, scale: f64) -> Primitive {
    Primitive::Arrow {
        origin: DVec3::ZERO,
        axis: dir * scale,
        shaft_width: 0.01 * scale,
        head_width: 0.03 * scale,
        head_length: 0.05 * scale,
        color,
    }
}

fn axis_label(dir: DVec3, text: &str, scale: f64) -> Primitive {
    Primitive::Label {
        position: dir * scale,
        text: text.to_string(),
        color: palette::FAINT_TEXT,
        height: 10.0 * scale as f32,
    }
}
