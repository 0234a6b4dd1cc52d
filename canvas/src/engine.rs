use uuid::Uuid;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::camera::{Camera, Point};
use crate::consts::{DEFAULT_STROKE, MIN_RECT_SIZE, NEW_RECT_FRACTION, STROKE_WIDTH_FRACTION};
use crate::doc::{AnnotationStore, RectId, Rectangle, RectanglePatch};
use crate::geometry::{Bounds, constrain_box};
use crate::hit::{self, HitPart};
use crate::image::{ImageError, ImageSlot, ImageStatus, LoadTicket, TempResource};
use crate::input::{Button, Gesture, Key, Modifiers, TransformOutcome, UiState, WheelDelta};
use crate::render;
use crate::selection::{self, ClickTarget};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RectangleCreated(Rectangle),
    RectangleUpdated { id: RectId, fields: RectanglePatch },
    RectangleDeleted { id: RectId },
    SelectionChanged(Vec<RectId>),
    SetCursor(String),
    RenderNeeded,
}

/// Core engine state — all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub doc: AnnotationStore,
    pub camera: Camera,
    pub ui: UiState,
    pub gesture: Gesture,
    pub image: ImageSlot,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            doc: AnnotationStore::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            gesture: Gesture::default(),
            image: ImageSlot::new(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Replace the whole store, e.g. when a saved session is opened.
    pub fn load_store(&mut self, doc: AnnotationStore) {
        self.doc = doc;
        self.gesture = Gesture::Idle;
        self.ui.selected_ids = selection::prune(&self.ui.selected_ids, &self.doc);
    }

    /// Create a rectangle for `label`, centered on the image at a fifth of its size.
    ///
    /// The first rectangle with a given label gets an empty name; later ones
    /// are named `"<label> <n>"` where `n` counts the new one.
    pub fn add_annotation(&mut self, label: &str) -> Vec<Action> {
        if label.is_empty() {
            return Vec::new();
        }
        let (image_w, image_h) = self.image.size();
        let rect = new_annotation(label, image_w, image_h, self.doc.label_count(label));
        log::debug!("adding {} annotation {}", rect.label, rect.id);

        if !self.doc.add_rectangle(rect.clone()) {
            return Vec::new();
        }
        vec![Action::RectangleCreated(rect), Action::RenderNeeded]
    }

    /// Delete a rectangle and drop it from the selection.
    pub fn remove_rectangle(&mut self, id: &RectId) -> Vec<Action> {
        if self.doc.remove_rectangle(id).is_none() {
            return Vec::new();
        }
        if self.gesture.preview_of(id).is_some() {
            self.gesture = Gesture::Idle;
        }

        let mut actions = vec![Action::RectangleDeleted { id: *id }];
        let pruned = selection::prune(&self.ui.selected_ids, &self.doc);
        actions.extend(self.set_selection(pruned));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Apply a direct field edit (e.g. from the annotation editor panel).
    pub fn update_rectangle(&mut self, id: &RectId, fields: RectanglePatch) -> Vec<Action> {
        if fields.is_empty() || !self.doc.update_rectangle(id, &fields) {
            return Vec::new();
        }
        vec![Action::RectangleUpdated { id: *id, fields }, Action::RenderNeeded]
    }

    /// Change a rectangle's label. Empty labels are ignored.
    pub fn update_label(&mut self, id: &RectId, label: &str) -> Vec<Action> {
        if label.is_empty() {
            return Vec::new();
        }
        let fields = RectanglePatch { label: Some(label.to_owned()), ..RectanglePatch::default() };
        self.update_rectangle(id, fields)
    }

    /// Commit a finished move/resize/rotate.
    ///
    /// Scale factors are applied to the last committed size and the size
    /// floor is enforced. Outcomes with NaN or infinite geometry are dropped.
    /// The gesture is reset, so the next gesture's scale is measured from
    /// what was committed here rather than compounding.
    pub fn commit_transform(&mut self, id: &RectId, outcome: TransformOutcome) -> Vec<Action> {
        self.gesture = Gesture::Idle;
        let Some(committed) = self.doc.get(id).map(Rectangle::bounds) else {
            return Vec::new();
        };

        let next = Bounds {
            x: outcome.x,
            y: outcome.y,
            width: (committed.width * outcome.scale_x).max(MIN_RECT_SIZE),
            height: (committed.height * outcome.scale_y).max(MIN_RECT_SIZE),
            rotation: outcome.rotation,
        };
        if !next.is_finite() || next == committed {
            return Vec::new();
        }

        let fields = RectanglePatch::from_bounds(next);
        self.doc.update_rectangle(id, &fields);
        vec![Action::RectangleUpdated { id: *id, fields }, Action::RenderNeeded]
    }

    /// Commit a finished drag by shifting every moved rectangle by `offset`.
    fn commit_drag(&mut self, baselines: &[(RectId, Bounds)], offset: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        for (id, baseline) in baselines {
            let outcome = TransformOutcome::identity(baseline.translated(offset.x, offset.y));
            let committed = self.commit_transform(id, outcome);
            actions.extend(committed.into_iter().filter(|a| !matches!(a, Action::RenderNeeded)));
        }
        if !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Apply the click-to-select protocol to `target`.
    pub fn click(&mut self, target: ClickTarget, modifiers: Modifiers) -> Vec<Action> {
        let current = self.selection();
        let next = selection::select_on_click(&current, target, modifiers.extends_selection());
        self.set_selection(next).into_iter().collect()
    }

    // --- Image ---

    /// Start loading a new background image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotAnImage`] for non-image MIME types.
    pub fn begin_image_load(
        &mut self,
        filename: &str,
        mime: &str,
        resource: Option<Box<dyn TempResource>>,
    ) -> Result<LoadTicket, ImageError> {
        self.image.begin_load(filename, mime, resource)
    }

    /// Finish loading the background image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidDimensions`] for an unusable size.
    pub fn finish_image_load(&mut self, ticket: LoadTicket, width: f64, height: f64) -> Result<Vec<Action>, ImageError> {
        if self.image.complete(ticket, width, height)? {
            return Ok(vec![Action::RenderNeeded]);
        }
        Ok(Vec::new())
    }

    // --- Export ---

    /// The store as a Pascal-VOC document for the current image. Rotation is
    /// not represented: each box is written from its unrotated corners.
    #[must_use]
    pub fn voc_document(&self, depth: u32) -> voc::VocAnnotation {
        let (width, height) = self.image.size();
        let mut doc = voc::VocAnnotation::new(self.image.filename(), width, height).with_depth(depth);
        for rect in self.doc.rectangles() {
            doc.push_box(&rect.label, rect.x, rect.y, rect.width, rect.height);
        }
        doc
    }

    /// Render [`EngineCore::voc_document`] as XML.
    #[must_use]
    pub fn export_voc(&self, depth: u32) -> String {
        self.voc_document(depth).to_xml()
    }

    // --- Queries ---

    /// The selected rectangle ids, minus any that no longer exist.
    #[must_use]
    pub fn selection(&self) -> Vec<RectId> {
        selection::prune(&self.ui.selected_ids, &self.doc)
    }

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Look up a rectangle by ID.
    #[must_use]
    pub fn rectangle(&self, id: &RectId) -> Option<&Rectangle> {
        self.doc.get(id)
    }

    /// What a click at `world` would land on when no rectangle is hit.
    fn background_target(&self, world: Point) -> ClickTarget {
        let (w, h) = self.image.size();
        let on_image = matches!(self.image.status(), ImageStatus::Ready { .. })
            && (0.0..=w).contains(&world.x)
            && (0.0..=h).contains(&world.y);
        if on_image { ClickTarget::Image } else { ClickTarget::Stage }
    }

    fn set_selection(&mut self, next: Vec<RectId>) -> Option<Action> {
        if next == self.ui.selected_ids {
            return None;
        }
        self.ui.selected_ids.clone_from(&next);
        Some(Action::SelectionChanged(next))
    }

    fn set_cursor(&mut self, cursor: &'static str) -> Option<Action> {
        if self.ui.cursor == cursor {
            return None;
        }
        self.ui.cursor = cursor;
        Some(Action::SetCursor(cursor.to_owned()))
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let pan = Gesture::Panning { start_screen: screen_pt, last_screen: screen_pt, moved: false };
        match button {
            Button::Secondary => return Vec::new(),
            Button::Middle => {
                self.gesture = pan;
                return Vec::new();
            }
            Button::Primary => {}
        }

        let world = self.camera.screen_to_world(screen_pt);
        let selected = self.selection();
        let hit = hit::hit_test(world, &self.doc, &self.camera, &selected);
        let target = hit.and_then(|h| self.doc.get(&h.rect_id).map(|r| (h.part, r.id, r.bounds())));

        self.gesture = match target {
            None => pan,
            Some((HitPart::Body, id, baseline)) => {
                let mut baselines = vec![(id, baseline)];
                if selected.contains(&id) {
                    let others = selected.iter().filter(|other| **other != id);
                    baselines.extend(others.filter_map(|other| self.doc.get(other).map(|r| (r.id, r.bounds()))));
                }
                Gesture::DraggingRect { id, start_world: world, baselines, offset: Point::new(0.0, 0.0), moved: false }
            }
            Some((HitPart::ResizeHandle(anchor), id, baseline)) => {
                Gesture::ResizingRect { id, anchor, start_world: world, baseline, current: baseline }
            }
            Some((HitPart::RotateHandle, id, baseline)) => {
                let center = baseline.center();
                Gesture::RotatingRect { id, center, start_angle: angle_deg(center, world), baseline, current: baseline }
            }
        };
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        let mut actions = Vec::new();

        match &mut self.gesture {
            Gesture::Idle => {
                let cursor = self.hover_cursor(world);
                actions.extend(self.set_cursor(cursor));
            }
            Gesture::Panning { last_screen, moved, .. } => {
                if screen_pt == *last_screen {
                    return actions;
                }
                let dx = screen_pt.x - last_screen.x;
                let dy = screen_pt.y - last_screen.y;
                *last_screen = screen_pt;
                let first_move = !*moved;
                *moved = true;

                self.camera.pan_by(dx, dy);
                if first_move {
                    actions.extend(self.set_selection(Vec::new()));
                }
                actions.push(Action::RenderNeeded);
            }
            Gesture::DraggingRect { start_world, offset, moved, .. } => {
                *offset = Point::new(world.x - start_world.x, world.y - start_world.y);
                *moved = *moved || world != *start_world;
                actions.push(Action::RenderNeeded);
            }
            Gesture::ResizingRect { anchor, start_world, baseline, current, .. } => {
                let delta = Point::new(world.x - start_world.x, world.y - start_world.y);
                *current = constrain_box(*current, anchor.apply(*baseline, delta));
                actions.push(Action::RenderNeeded);
            }
            Gesture::RotatingRect { center, start_angle, baseline, current, .. } => {
                let rotation = baseline.rotation + angle_deg(*center, world) - *start_angle;
                *current = baseline.rotated_about_center(rotation);
                actions.push(Action::RenderNeeded);
            }
        }
        actions
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Panning { moved: true, .. } => Vec::new(),
            Gesture::Panning { start_screen, moved: false, .. } => {
                let world = self.camera.screen_to_world(start_screen);
                let target = self.background_target(world);
                self.click(target, modifiers)
            }
            Gesture::DraggingRect { id, moved: false, .. } => self.click(ClickTarget::Rectangle(id), modifiers),
            Gesture::DraggingRect { baselines, offset, moved: true, .. } => self.commit_drag(&baselines, offset),
            Gesture::ResizingRect { id, baseline, current, .. }
            | Gesture::RotatingRect { id, baseline, current, .. } => {
                if current == baseline {
                    return Vec::new();
                }
                self.commit_transform(&id, TransformOutcome::between(baseline, current))
            }
        }
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        if self.camera.zoom_at(screen_pt, delta.dy) {
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    pub fn on_key_down(&mut self, key: Key, _modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "Delete" | "Backspace" if self.gesture.is_idle() => {
                let mut actions = Vec::new();
                for id in self.selection() {
                    actions.extend(self.remove_rectangle(&id));
                }
                actions
            }
            "Escape" => {
                let had_preview = !self.gesture.previews().is_empty();
                self.gesture = Gesture::Idle;
                let mut actions: Vec<Action> = self.set_selection(Vec::new()).into_iter().collect();
                if had_preview || !actions.is_empty() {
                    actions.push(Action::RenderNeeded);
                }
                actions
            }
            _ => Vec::new(),
        }
    }

    fn hover_cursor(&self, world: Point) -> &'static str {
        let selected = self.selection();
        let Some(hit) = hit::hit_test(world, &self.doc, &self.camera, &selected) else {
            return "default";
        };
        match hit.part {
            HitPart::Body => "move",
            HitPart::RotateHandle => "grab",
            HitPart::ResizeHandle(anchor) => anchor.cursor(self.doc.get(&hit.rect_id).map_or(0.0, |r| r.rotation)),
        }
    }
}

/// Build the rectangle the add-annotation action inserts.
///
/// `existing` is how many rectangles already carry `label`.
#[must_use]
pub fn new_annotation(label: &str, image_w: f64, image_h: f64, existing: usize) -> Rectangle {
    let width = image_w * NEW_RECT_FRACTION;
    let height = image_h * NEW_RECT_FRACTION;
    let name = if existing == 0 { String::new() } else { format!("{label} {}", existing + 1) };
    Rectangle {
        id: Uuid::new_v4(),
        x: (image_w - width) / 2.0,
        y: (image_h - height) / 2.0,
        width,
        height,
        rotation: 0.0,
        label: label.to_owned(),
        name,
        stroke: DEFAULT_STROKE.to_owned(),
        stroke_width: image_w.min(image_h) * STROKE_WIDTH_FRACTION,
    }
}

/// Angle of `p` around `center`, in degrees, clockwise from +x in screen space.
fn angle_deg(center: Point, p: Point) -> f64 {
    (p.y - center.y).atan2(p.x - center.x).to_degrees()
}

/// An object URL backing the current background image.
struct ObjectUrl(String);

impl TempResource for ObjectUrl {
    fn release(&mut self) {
        if let Err(e) = web_sys::Url::revoke_object_url(&self.0) {
            log::warn!("failed to revoke object URL {}: {e:?}", self.0);
        }
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser elements.
pub struct Engine {
    canvas: HtmlCanvasElement,
    image: Option<HtmlImageElement>,
    pending: Option<LoadTicket>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, image: None, pending: None, core: EngineCore::new() }
    }

    // --- Delegated data inputs ---

    pub fn load_store(&mut self, doc: AnnotationStore) {
        self.core.load_store(doc);
    }

    pub fn add_annotation(&mut self, label: &str) -> Vec<Action> {
        self.core.add_annotation(label)
    }

    pub fn remove_rectangle(&mut self, id: &RectId) -> Vec<Action> {
        self.core.remove_rectangle(id)
    }

    pub fn update_rectangle(&mut self, id: &RectId, fields: RectanglePatch) -> Vec<Action> {
        self.core.update_rectangle(id, fields)
    }

    pub fn update_label(&mut self, id: &RectId, label: &str) -> Vec<Action> {
        self.core.update_label(id, label)
    }

    // --- Image ---

    /// Point the background image at `object_url`, taking ownership of the URL.
    ///
    /// Call [`Engine::on_image_loaded`] from the image element's `load` event.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotAnImage`] for non-image files (the URL is
    /// revoked) and [`ImageError::Browser`] if the element can't be created.
    pub fn load_image(&mut self, filename: &str, mime: &str, object_url: String) -> Result<&HtmlImageElement, ImageError> {
        let element = HtmlImageElement::new().map_err(|e| ImageError::Browser(format!("{e:?}")))?;
        let ticket = self.core.begin_image_load(filename, mime, Some(Box::new(ObjectUrl(object_url.clone()))))?;
        element.set_src(&object_url);
        self.pending = Some(ticket);
        Ok(self.image.insert(element))
    }

    /// Read the decoded size from the image element and finish the pending load.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidDimensions`] if the element reports no size.
    pub fn on_image_loaded(&mut self) -> Result<Vec<Action>, ImageError> {
        let (Some(ticket), Some(element)) = (self.pending.take(), self.image.as_ref()) else {
            return Ok(Vec::new());
        };
        let width = f64::from(element.natural_width());
        let height = f64::from(element.natural_height());
        self.core.finish_image_load(ticket, width, height)
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio, resizing the backing store.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.viewport_width = width_css;
        self.core.viewport_height = height_css;
        self.core.dpr = dpr;
        self.canvas.set_width((width_css * dpr).round() as u32);
        self.canvas.set_height((height_css * dpr).round() as u32);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a draw call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        render::draw(&ctx, &self.core, self.image.as_ref())
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> Vec<RectId> {
        self.core.selection()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.core.camera()
    }

    #[must_use]
    pub fn rectangle(&self, id: &RectId) -> Option<&Rectangle> {
        self.core.rectangle(id)
    }

    #[must_use]
    pub fn export_voc(&self, depth: u32) -> String {
        self.core.export_voc(depth)
    }
}
