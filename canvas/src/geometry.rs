//! Closed-form geometry shared by the controller, hit-testing and rendering.
//!
//! Rectangles rotate about their top-left corner, clockwise-positive in screen
//! space. Everything here works in image-pixel coordinates.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::camera::Point;
use crate::consts::{LABEL_OFFSET_Y, MIN_RECT_SIZE};

/// Bound `value` to `[min, max]`.
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Rotate `(px, py)` about `(cx, cy)` by `angle_deg`, clockwise in screen space.
#[must_use]
pub fn rotate_point(px: f64, py: f64, cx: f64, cy: f64, angle_deg: f64) -> Point {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let dx = px - cx;
    let dy = py - cy;
    Point { x: cx + dx * cos - dy * sin, y: cy + dx * sin + dy * cos }
}

/// Position and size of a rectangle, independent of its identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees about the top-left corner.
    pub rotation: f64,
}

impl Bounds {
    /// Map a point in the rectangle's local (unrotated, origin at top-left)
    /// frame into image space.
    #[must_use]
    pub fn local_to_world(&self, local: Point) -> Point {
        rotate_point(self.x + local.x, self.y + local.y, self.x, self.y, self.rotation)
    }

    /// Inverse of [`Bounds::local_to_world`].
    #[must_use]
    pub fn world_to_local(&self, world: Point) -> Point {
        let p = rotate_point(world.x, world.y, self.x, self.y, -self.rotation);
        Point { x: p.x - self.x, y: p.y - self.y }
    }

    /// Image-space center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        self.local_to_world(Point::new(self.width / 2.0, self.height / 2.0))
    }

    /// Whether `world` lies inside the (rotated) rectangle, edges included.
    #[must_use]
    pub fn contains(&self, world: Point) -> bool {
        let local = self.world_to_local(world);
        (0.0..=self.width).contains(&local.x) && (0.0..=self.height).contains(&local.y)
    }

    /// Re-express the rectangle with a new rotation about its center,
    /// moving the top-left corner so the center stays fixed.
    #[must_use]
    pub fn rotated_about_center(&self, rotation: f64) -> Self {
        let center = self.center();
        let corner = rotate_point(
            center.x - self.width / 2.0,
            center.y - self.height / 2.0,
            center.x,
            center.y,
            rotation,
        );
        Self { x: corner.x, y: corner.y, rotation, ..*self }
    }

    /// The same box shifted by an image-space offset.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..*self }
    }

    /// Whether every field is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.rotation].iter().all(|v| v.is_finite())
    }
}

/// Reject a proposed box that would fall below the minimum size.
///
/// Returns `old` unchanged when either dimension of `new` is under
/// [`MIN_RECT_SIZE`], so a dragged resize handle sticks at the floor.
#[must_use]
pub fn constrain_box(old: Bounds, new: Bounds) -> Bounds {
    if new.width < MIN_RECT_SIZE || new.height < MIN_RECT_SIZE {
        return old;
    }
    new
}

/// Where a rectangle's label text is anchored: [`LABEL_OFFSET_Y`] above the
/// unrotated top-left corner, then rotated with the rectangle.
#[must_use]
pub fn label_anchor(bounds: &Bounds) -> Point {
    rotate_point(bounds.x, bounds.y - LABEL_OFFSET_Y, bounds.x, bounds.y, bounds.rotation)
}
