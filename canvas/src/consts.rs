//! Shared numeric constants for the canvas crate.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height a rectangle annotation may have, in image pixels.
pub const MIN_RECT_SIZE: f64 = 5.0;

// ── Camera ──────────────────────────────────────────────────────

/// Lower zoom bound.
pub const MIN_ZOOM: f64 = 0.1;

/// Upper zoom bound.
pub const MAX_ZOOM: f64 = 5.0;

/// Multiplicative zoom step per wheel tick.
pub const ZOOM_STEP: f64 = 1.1;

// ── New annotations ─────────────────────────────────────────────

/// Fraction of the image width/height used for a freshly added rectangle.
pub const NEW_RECT_FRACTION: f64 = 0.2;

/// Stroke width as a fraction of the image's shorter side.
pub const STROKE_WIDTH_FRACTION: f64 = 0.002;

/// Stroke color for new rectangles.
pub const DEFAULT_STROKE: &str = "black";

/// Image size assumed until the real image has finished loading.
pub const PLACEHOLDER_IMAGE_SIZE: f64 = 100.0;

// ── Labels ──────────────────────────────────────────────────────

/// Label font size in image pixels.
pub const LABEL_FONT_SIZE: f64 = 80.0;

/// Distance above the rectangle's top edge where the label is anchored.
pub const LABEL_OFFSET_Y: f64 = 100.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;
