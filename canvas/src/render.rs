//! Rendering: draws the full canvas scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads engine state and produces pixels; it never mutates anything.
//! Rectangles under an in-flight gesture are drawn from the gesture's
//! preview geometry rather than their committed records.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::{HANDLE_RADIUS_PX, LABEL_FONT_SIZE};
use crate::doc::Rectangle;
use crate::engine::EngineCore;
use crate::geometry::{Bounds, label_anchor};
use crate::hit;
use crate::image::ImageStatus;

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;

/// Border drawn around the background image, in image pixels.
const IMAGE_BORDER_WIDTH: f64 = 20.0;

const SELECTION_COLOR: &str = "#1E90FF";

/// Draw the full scene: background image, rectangles with labels, selection UI.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, core: &EngineCore, image: Option<&HtmlImageElement>) -> Result<(), JsValue> {
    let camera = core.camera();

    // Layer 1: clear and set up transforms.
    ctx.set_transform(core.dpr, 0.0, 0.0, core.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, core.viewport_width, core.viewport_height);
    ctx.translate(camera.pan_x, camera.pan_y)?;
    ctx.scale(camera.zoom, camera.zoom)?;

    // Layer 2: background image.
    if let (Some(element), ImageStatus::Ready { width, height }) = (image, core.image.status()) {
        ctx.draw_image_with_html_image_element_and_dw_and_dh(element, 0.0, 0.0, width, height)?;
        ctx.set_stroke_style_str("black");
        ctx.set_line_width(IMAGE_BORDER_WIDTH);
        ctx.stroke_rect(0.0, 0.0, width, height);
    }

    // Layer 3: rectangles in insertion order, each with its label.
    let previews = core.gesture.previews();
    let live_bounds = |rect: &Rectangle| {
        previews.iter().find(|(id, _)| *id == rect.id).map_or_else(|| rect.bounds(), |(_, bounds)| *bounds)
    };
    for rect in core.doc.rectangles() {
        let bounds = live_bounds(rect);
        draw_rectangle(ctx, rect, &bounds)?;
        draw_label(ctx, &rect.label, &bounds)?;
    }

    // Layer 4: selection UI.
    let selected = core.selection();
    let show_handles = selected.len() == 1;
    for id in &selected {
        if let Some(rect) = core.doc.get(id) {
            draw_selection(ctx, &live_bounds(rect), camera.zoom, show_handles)?;
        }
    }

    Ok(())
}

// =============================================================
// Annotations
// =============================================================

fn draw_rectangle(ctx: &CanvasRenderingContext2d, rect: &Rectangle, bounds: &Bounds) -> Result<(), JsValue> {
    ctx.save();
    translate_and_rotate(ctx, bounds)?;
    ctx.set_stroke_style_str(&rect.stroke);
    ctx.set_line_width(rect.stroke_width);
    ctx.stroke_rect(0.0, 0.0, bounds.width, bounds.height);
    ctx.restore();
    Ok(())
}

/// Label text sits above the rectangle and turns with it.
fn draw_label(ctx: &CanvasRenderingContext2d, label: &str, bounds: &Bounds) -> Result<(), JsValue> {
    let anchor = label_anchor(bounds);
    ctx.save();
    ctx.translate(anchor.x, anchor.y)?;
    ctx.rotate(bounds.rotation.to_radians())?;
    ctx.set_font(&format!("{LABEL_FONT_SIZE}px Arial"));
    ctx.set_text_baseline("top");
    ctx.set_fill_style_str("black");
    ctx.fill_text(label, 0.0, 0.0)?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Selection
// =============================================================

fn draw_selection(ctx: &CanvasRenderingContext2d, bounds: &Bounds, zoom: f64, show_handles: bool) -> Result<(), JsValue> {
    ctx.save();

    // Dashed bounding box (rotated with the rectangle).
    translate_and_rotate(ctx, bounds)?;

    let dash_world = SELECTION_DASH_PX / zoom;
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0 / zoom);
    let dash_array = js_sys::Array::new();
    dash_array.push(&dash_world.into());
    dash_array.push(&dash_world.into());
    ctx.set_line_dash(&dash_array)?;

    ctx.stroke_rect(0.0, 0.0, bounds.width, bounds.height);
    ctx.set_line_dash(&js_sys::Array::new())?;

    ctx.restore();

    if !show_handles {
        return Ok(());
    }

    // Handles are drawn in image coordinates, not the rotated context.
    let handle_size_world = HANDLE_RADIUS_PX / zoom;
    let handles = hit::resize_handle_positions(bounds);

    ctx.save();
    ctx.set_fill_style_str("#fff");
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0 / zoom);

    for pos in &handles {
        let (x, y, side) = (pos.x - handle_size_world, pos.y - handle_size_world, handle_size_world * 2.0);
        ctx.fill_rect(x, y, side, side);
        ctx.stroke_rect(x, y, side, side);
    }

    let rh = hit::rotate_handle_position(bounds, zoom);
    let n_handle = handles[0];

    ctx.begin_path();
    ctx.move_to(n_handle.x, n_handle.y);
    ctx.line_to(rh.x, rh.y);
    ctx.stroke();

    ctx.begin_path();
    ctx.arc(rh.x, rh.y, handle_size_world, 0.0, 2.0 * PI)?;
    ctx.fill();
    ctx.stroke();

    ctx.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

/// Translate to the rectangle's top-left corner and rotate about it.
fn translate_and_rotate(ctx: &CanvasRenderingContext2d, bounds: &Bounds) -> Result<(), JsValue> {
    ctx.translate(bounds.x, bounds.y)?;
    ctx.rotate(bounds.rotation.to_radians())?;
    Ok(())
}
