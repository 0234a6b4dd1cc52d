//! Hit-testing against rectangles and the selection handles.
//!
//! Rectangles rotate about their top-left corner, so every test maps the
//! image-space point into the rectangle's local frame first. Handle sizes are
//! given in screen pixels and converted through the camera zoom.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::consts::{HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX};
use crate::doc::{AnnotationStore, RectId};
use crate::geometry::{Bounds, rotate_point};

/// Which part of a rectangle was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RotateHandle,
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// All anchors, clockwise from the top edge.
    pub const ALL: [Self; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Handle position as a fraction of the rectangle's width and height.
    #[must_use]
    pub fn fraction(self) -> (f64, f64) {
        match self {
            Self::N => (0.5, 0.0),
            Self::Ne => (1.0, 0.0),
            Self::E => (1.0, 0.5),
            Self::Se => (1.0, 1.0),
            Self::S => (0.5, 1.0),
            Self::Sw => (0.0, 1.0),
            Self::W => (0.0, 0.5),
            Self::Nw => (0.0, 0.0),
        }
    }

    /// Direction of the handle from the box center on an unrotated box, in
    /// degrees clockwise from up.
    #[must_use]
    pub fn angle(self) -> f64 {
        match self {
            Self::N => 0.0,
            Self::Ne => 45.0,
            Self::E => 90.0,
            Self::Se => 135.0,
            Self::S => 180.0,
            Self::Sw => 225.0,
            Self::W => 270.0,
            Self::Nw => 315.0,
        }
    }

    /// CSS cursor shown while hovering this handle on a box turned by
    /// `rotation` degrees, snapped to the nearest of the four resize axes.
    #[must_use]
    pub fn cursor(self, rotation: f64) -> &'static str {
        let axis = ((self.angle() + rotation) / 45.0).round().rem_euclid(4.0);
        if axis < 0.5 {
            "ns-resize"
        } else if axis < 1.5 {
            "nesw-resize"
        } else if axis < 2.5 {
            "ew-resize"
        } else {
            "nwse-resize"
        }
    }

    /// Resize `baseline` by a pointer delta given in image space.
    ///
    /// The edges opposite the anchor stay put in the rectangle's own frame.
    /// The result is unconstrained: it may be undersized or inverted.
    #[must_use]
    pub fn apply(self, baseline: Bounds, world_delta: Point) -> Bounds {
        let local = rotate_point(world_delta.x, world_delta.y, 0.0, 0.0, -baseline.rotation);
        let left = matches!(self, Self::W | Self::Nw | Self::Sw);
        let right = matches!(self, Self::E | Self::Ne | Self::Se);
        let top = matches!(self, Self::N | Self::Ne | Self::Nw);
        let bottom = matches!(self, Self::S | Self::Se | Self::Sw);

        let (width, shift_x) = match (left, right) {
            (true, _) => (baseline.width - local.x, local.x),
            (_, true) => (baseline.width + local.x, 0.0),
            _ => (baseline.width, 0.0),
        };
        let (height, shift_y) = match (top, bottom) {
            (true, _) => (baseline.height - local.y, local.y),
            (_, true) => (baseline.height + local.y, 0.0),
            _ => (baseline.height, 0.0),
        };

        let origin = baseline.local_to_world(Point::new(shift_x, shift_y));
        Bounds { x: origin.x, y: origin.y, width, height, rotation: baseline.rotation }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub rect_id: RectId,
    pub part: HitPart,
}

/// Image-space positions of the eight resize handles, in [`ResizeAnchor::ALL`] order.
#[must_use]
pub fn resize_handle_positions(bounds: &Bounds) -> [Point; 8] {
    ResizeAnchor::ALL.map(|anchor| {
        let (fx, fy) = anchor.fraction();
        bounds.local_to_world(Point::new(bounds.width * fx, bounds.height * fy))
    })
}

/// Image-space position of the rotate handle, a fixed screen distance above
/// the top edge midpoint.
#[must_use]
pub fn rotate_handle_position(bounds: &Bounds, zoom: f64) -> Point {
    let offset = ROTATE_HANDLE_OFFSET_PX / zoom;
    bounds.local_to_world(Point::new(bounds.width / 2.0, -offset))
}

/// Test which rectangle (if any) is under `world_pt`.
///
/// Handles are only live when exactly one rectangle is selected and are
/// checked before any body. Bodies are checked topmost first.
#[must_use]
pub fn hit_test(world_pt: Point, doc: &AnnotationStore, camera: &Camera, selected: &[RectId]) -> Option<Hit> {
    if let [only] = selected {
        if let Some(rect) = doc.get(only) {
            if let Some(part) = handle_at(world_pt, &rect.bounds(), camera) {
                return Some(Hit { rect_id: rect.id, part });
            }
        }
    }

    doc.rectangles()
        .iter()
        .rev()
        .find(|rect| rect.bounds().contains(world_pt))
        .map(|rect| Hit { rect_id: rect.id, part: HitPart::Body })
}

fn handle_at(world_pt: Point, bounds: &Bounds, camera: &Camera) -> Option<HitPart> {
    let radius = camera.screen_dist_to_world(HANDLE_RADIUS_PX);
    let near = |p: Point| (p.x - world_pt.x).hypot(p.y - world_pt.y) <= radius;

    if near(rotate_handle_position(bounds, camera.zoom)) {
        return Some(HitPart::RotateHandle);
    }
    ResizeAnchor::ALL
        .into_iter()
        .zip(resize_handle_positions(bounds))
        .find(|(_, pos)| near(*pos))
        .map(|(anchor, _)| HitPart::ResizeHandle(anchor))
}
