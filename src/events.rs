//! Pointer input queue and hit testing
use crate::{BBox, Canvas, NodeId, Point, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EventKind {
    Click,
    MouseMove,
}

/// Pointer event queued until the next frame resolves its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: EventKind,
    pub x: Scalar,
    pub y: Scalar,
    /// Topmost element under the pointer, resolved while the frame is rendered
    pub target: Option<NodeId>,
}

/// Queue of pending pointer events
///
/// Every hit test of a later drawn element overwrites the target of the event,
/// so after a frame each event points to the topmost element under it.
#[derive(Debug, Clone, Default)]
pub struct Mouse {
    events: Vec<PointerEvent>,
}

impl Mouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_click(&mut self, x: Scalar, y: Scalar) {
        self.push(EventKind::Click, x, y);
    }

    pub fn on_mouse_move(&mut self, x: Scalar, y: Scalar) {
        self.push(EventKind::MouseMove, x, y);
    }

    fn push(&mut self, kind: EventKind, x: Scalar, y: Scalar) {
        self.events.push(PointerEvent {
            kind,
            x,
            y,
            target: None,
        });
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Hit test current path of the canvas against pending events
    pub fn check_path(&mut self, id: NodeId, canvas: &Canvas) {
        for event in self.events.iter_mut() {
            if canvas.is_point_in_path(event.x, event.y) {
                event.target = Some(id);
            }
        }
    }

    /// Hit test a box given in device coordinates against pending events
    pub fn check_bbox(&mut self, id: NodeId, bbox: BBox) {
        if bbox.is_empty() {
            return;
        }
        for event in self.events.iter_mut() {
            if bbox.contains(Point::new(event.x, event.y)) {
                event.target = Some(id);
            }
        }
    }

    /// Drain resolved events
    pub fn take_events(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.events)
    }
}
