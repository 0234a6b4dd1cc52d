//! Input model: modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Modifiers` captures the keyboard state at the time of a pointer event.
//! `Gesture` is the interaction being tracked between pointer-down and
//! pointer-up. It carries the baseline geometry captured at pointer-down and
//! the current proposal, so nothing reaches the store until the gesture
//! completes.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::RectId;
use crate::geometry::Bounds;
use crate::hit::ResizeAnchor;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether a click should extend (toggle within) the selection.
    #[must_use]
    pub fn extends_selection(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone)]
pub struct UiState {
    /// Selected rectangle ids in the order they were selected.
    pub selected_ids: Vec<RectId>,
    /// CSS cursor currently requested from the host.
    pub cursor: &'static str,
}

impl Default for UiState {
    fn default() -> Self {
        Self { selected_ids: Vec::new(), cursor: "default" }
    }
}

/// The interaction in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the stage or image background.
    Panning {
        /// Screen position at pointer-down, used to tell a click from a drag.
        start_screen: Point,
        /// Screen position of the previous pointer event.
        last_screen: Point,
        /// Whether the pointer has moved since pointer-down.
        moved: bool,
    },
    /// Moving a rectangle, together with the rest of the selection when the
    /// pressed one is selected.
    DraggingRect {
        /// Rectangle under the pointer at pointer-down.
        id: RectId,
        /// Image-space pointer position at pointer-down.
        start_world: Point,
        /// Geometry at pointer-down of every rectangle being moved.
        baselines: Vec<(RectId, Bounds)>,
        /// Image-space offset applied to every baseline.
        offset: Point,
        moved: bool,
    },
    /// Resizing a rectangle by one of its eight handles.
    ResizingRect {
        id: RectId,
        anchor: ResizeAnchor,
        start_world: Point,
        baseline: Bounds,
        current: Bounds,
    },
    /// Rotating a rectangle by its rotate handle, pivoting on its center.
    RotatingRect {
        id: RectId,
        /// Image-space pivot.
        center: Point,
        /// Pointer angle around the pivot at pointer-down, in degrees.
        start_angle: f64,
        baseline: Bounds,
        current: Bounds,
    },
}

impl Gesture {
    /// The rectangle the gesture started on, if any.
    #[must_use]
    pub fn target(&self) -> Option<RectId> {
        match self {
            Self::DraggingRect { id, .. } | Self::ResizingRect { id, .. } | Self::RotatingRect { id, .. } => Some(*id),
            Self::Idle | Self::Panning { .. } => None,
        }
    }

    /// In-flight geometry of every rectangle the gesture moves, for the
    /// renderer to draw instead of the committed records.
    #[must_use]
    pub fn previews(&self) -> Vec<(RectId, Bounds)> {
        match self {
            Self::DraggingRect { baselines, offset, .. } => {
                baselines.iter().map(|(id, b)| (*id, b.translated(offset.x, offset.y))).collect()
            }
            Self::ResizingRect { id, current, .. } | Self::RotatingRect { id, current, .. } => vec![(*id, *current)],
            Self::Idle | Self::Panning { .. } => Vec::new(),
        }
    }

    /// In-flight geometry for one rectangle, if the gesture moves it.
    #[must_use]
    pub fn preview_of(&self, id: &RectId) -> Option<Bounds> {
        self.previews().into_iter().find(|(p, _)| p == id).map(|(_, b)| b)
    }

    /// Whether this is [`Gesture::Idle`].
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// The completed result of a transform gesture, relative to the last
/// committed geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOutcome {
    pub x: f64,
    pub y: f64,
    /// Multiplier applied to the committed width.
    pub scale_x: f64,
    /// Multiplier applied to the committed height.
    pub scale_y: f64,
    /// Absolute rotation in degrees.
    pub rotation: f64,
}

impl TransformOutcome {
    /// Express `current` as an outcome relative to `baseline`.
    #[must_use]
    pub fn between(baseline: Bounds, current: Bounds) -> Self {
        Self {
            x: current.x,
            y: current.y,
            scale_x: current.width / baseline.width,
            scale_y: current.height / baseline.height,
            rotation: current.rotation,
        }
    }

    /// An outcome that leaves `bounds` exactly as it is.
    #[must_use]
    pub fn identity(bounds: Bounds) -> Self {
        Self { x: bounds.x, y: bounds.y, scale_x: 1.0, scale_y: 1.0, rotation: bounds.rotation }
    }
}
