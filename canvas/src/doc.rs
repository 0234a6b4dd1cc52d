//! Document model: rectangle annotations, the label vocabulary, and the store.
//!
//! `Rectangle` is the unit of ground-truth data. `RectanglePatch` is a sparse
//! update used by gesture commits and by numeric field edits in the editor
//! panel. `AnnotationStore` owns both the rectangle list and the attribute
//! vocabulary; every mutation goes through its operations so the size floor
//! and the no-duplicate rule always hold.
//!
//! List order is z-order: later rectangles are drawn on top and win hit tests.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::MIN_RECT_SIZE;
use crate::geometry::Bounds;

/// Unique identifier for a rectangle annotation.
pub type RectId = Uuid;

/// A labeled, rotatable box over the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    /// Assigned at creation; never changes.
    pub id: RectId,
    /// Left edge of the unrotated box, in image pixels.
    pub x: f64,
    /// Top edge of the unrotated box, in image pixels.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees about the top-left corner.
    pub rotation: f64,
    /// Attribute name this box is tagged with.
    pub label: String,
    /// Secondary tag that tells repeated labels apart.
    #[serde(default)]
    pub name: String,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Rectangle {
    /// Geometry of this rectangle without its identity or styling.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds { x: self.x, y: self.y, width: self.width, height: self.height, rotation: self.rotation }
    }
}

/// Sparse update for a rectangle. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectanglePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl RectanglePatch {
    /// A patch that replaces all geometry fields.
    #[must_use]
    pub fn from_bounds(bounds: Bounds) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: Some(bounds.width),
            height: Some(bounds.height),
            rotation: Some(bounds.rotation),
            ..Self::default()
        }
    }

    /// Whether the patch carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether every numeric field present is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.rotation, self.stroke_width]
            .into_iter()
            .flatten()
            .all(f64::is_finite)
    }
}

/// Raise a dimension to the size floor.
fn floor_size(value: f64) -> f64 {
    value.max(MIN_RECT_SIZE)
}

/// The shared annotation state: rectangles plus the attribute vocabulary.
///
/// Deserializing goes through [`AnnotationStore::load`], so a hand-edited
/// session file cannot smuggle in undersized boxes or duplicate labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoreSnapshot")]
pub struct AnnotationStore {
    rectangles: Vec<Rectangle>,
    attributes: Vec<String>,
}

impl AnnotationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Rectangles ---

    /// Append a rectangle.
    ///
    /// Rejected (returns `false`) when the id is nil or already present, when
    /// the label is empty, or when any number is NaN or infinite. Width and
    /// height are raised to the size floor.
    pub fn add_rectangle(&mut self, mut rect: Rectangle) -> bool {
        if rect.id.is_nil() || rect.label.is_empty() {
            log::debug!("rejecting rectangle {} with missing id or label", rect.id);
            return false;
        }
        if !rect.bounds().is_finite() || !rect.stroke_width.is_finite() {
            log::debug!("rejecting rectangle {} with non-finite geometry", rect.id);
            return false;
        }
        if self.contains(&rect.id) {
            log::debug!("rejecting duplicate rectangle {}", rect.id);
            return false;
        }
        rect.width = floor_size(rect.width);
        rect.height = floor_size(rect.height);
        self.rectangles.push(rect);
        true
    }

    /// Remove a rectangle by id, returning it if it was present.
    pub fn remove_rectangle(&mut self, id: &RectId) -> Option<Rectangle> {
        let index = self.rectangles.iter().position(|r| r.id == *id)?;
        Some(self.rectangles.remove(index))
    }

    /// Merge `patch` into the rectangle with `id`.
    ///
    /// Returns `false` and changes nothing if the rectangle is absent or the
    /// patch carries a NaN or infinite number.
    pub fn update_rectangle(&mut self, id: &RectId, patch: &RectanglePatch) -> bool {
        if !patch.is_finite() {
            log::debug!("rejecting non-finite patch for rectangle {id}");
            return false;
        }
        let Some(rect) = self.rectangles.iter_mut().find(|r| r.id == *id) else {
            return false;
        };
        if let Some(x) = patch.x {
            rect.x = x;
        }
        if let Some(y) = patch.y {
            rect.y = y;
        }
        if let Some(w) = patch.width {
            rect.width = floor_size(w);
        }
        if let Some(h) = patch.height {
            rect.height = floor_size(h);
        }
        if let Some(r) = patch.rotation {
            rect.rotation = r;
        }
        if let Some(ref label) = patch.label {
            rect.label.clone_from(label);
        }
        if let Some(ref name) = patch.name {
            rect.name.clone_from(name);
        }
        if let Some(ref stroke) = patch.stroke {
            rect.stroke.clone_from(stroke);
        }
        if let Some(sw) = patch.stroke_width {
            rect.stroke_width = sw;
        }
        true
    }

    /// Change only the label of a rectangle.
    pub fn update_label(&mut self, id: &RectId, label: &str) -> bool {
        let patch = RectanglePatch { label: Some(label.to_owned()), ..RectanglePatch::default() };
        self.update_rectangle(id, &patch)
    }

    /// Return a reference to a rectangle by id.
    #[must_use]
    pub fn get(&self, id: &RectId) -> Option<&Rectangle> {
        self.rectangles.iter().find(|r| r.id == *id)
    }

    /// Whether a rectangle with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &RectId) -> bool {
        self.rectangles.iter().any(|r| r.id == *id)
    }

    /// All rectangles in list (draw) order.
    #[must_use]
    pub fn rectangles(&self) -> &[Rectangle] {
        &self.rectangles
    }

    /// How many rectangles currently carry `label`.
    #[must_use]
    pub fn label_count(&self, label: &str) -> usize {
        self.rectangles.iter().filter(|r| r.label == label).count()
    }

    /// Number of rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    /// Returns `true` if there are no rectangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    // --- Attributes ---

    /// Add a label name to the vocabulary.
    ///
    /// The input is trimmed; empty input and exact duplicates are ignored.
    pub fn add_attribute(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.attributes.iter().any(|a| a == name) {
            return false;
        }
        self.attributes.push(name.to_owned());
        true
    }

    /// Remove a label name (exact match). Rectangles using it are untouched.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| a != name);
        self.attributes.len() != before
    }

    /// The vocabulary in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Whether `name` is in the vocabulary.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    // --- Bulk ---

    /// Replace all contents, routing every entry through the single-item guards.
    pub fn load(&mut self, rectangles: Vec<Rectangle>, attributes: Vec<String>) {
        self.rectangles.clear();
        self.attributes.clear();
        for name in &attributes {
            self.add_attribute(name);
        }
        for rect in rectangles {
            self.add_rectangle(rect);
        }
    }
}

#[derive(Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    rectangles: Vec<Rectangle>,
    #[serde(default)]
    attributes: Vec<String>,
}

impl From<StoreSnapshot> for AnnotationStore {
    fn from(snapshot: StoreSnapshot) -> Self {
        let mut store = Self::new();
        store.load(snapshot.rectangles, snapshot.attributes);
        store
    }
}
