//! Pascal-VOC annotation documents.
//!
//! Builds the XML written next to an annotated image: one `<object>` per
//! bounding box, coordinates in image pixels. Boxes are axis-aligned, so any
//! rotation the editor applied is not represented here.


use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;

/// Color channels written when the caller does not say otherwise.
pub const DEFAULT_DEPTH: u32 = 3;

/// Error returned by [`VocAnnotation::write_to`].
#[derive(Debug, thiserror::Error)]
pub enum VocError {
    #[error("failed to write VOC XML: {0}")]
    Io(#[from] std::io::Error),
}

/// Axis-aligned box corners in image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BndBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BndBox {
    /// Corners of the box with top-left `x, y` and the given size.
    #[must_use]
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { xmin: x, ymin: y, xmax: x + width, ymax: y + height }
    }
}

/// One labeled object.
#[derive(Clone, Debug, PartialEq)]
pub struct VocObject {
    pub name: String,
    pub pose: String,
    pub truncated: bool,
    pub difficult: bool,
    pub bndbox: BndBox,
}

/// A complete `<annotation>` document for one image.
#[derive(Clone, Debug, PartialEq)]
pub struct VocAnnotation {
    pub folder: String,
    pub filename: String,
    pub path: String,
    pub database: String,
    pub width: f64,
    pub height: f64,
    pub depth: u32,
    pub segmented: bool,
    pub objects: Vec<VocObject>,
}

impl VocAnnotation {
    /// An empty document for `filename`, which also serves as its path.
    #[must_use]
    pub fn new(filename: &str, width: f64, height: f64) -> Self {
        Self {
            folder: "VOCImages".to_owned(),
            filename: filename.to_owned(),
            path: filename.to_owned(),
            database: "Unknown".to_owned(),
            width,
            height,
            depth: DEFAULT_DEPTH,
            segmented: false,
            objects: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Append an object for the box with top-left `x, y` and the given size.
    pub fn push_box(&mut self, name: &str, x: f64, y: f64, width: f64, height: f64) {
        self.objects.push(VocObject {
            name: name.to_owned(),
            pose: "Unspecified".to_owned(),
            truncated: false,
            difficult: false,
            bndbox: BndBox::from_rect(x, y, width, height),
        });
    }

    /// Render the document. Numbers are written as-is, so fractional pixel
    /// positions survive.
    #[must_use]
    pub fn to_xml(&self) -> String {
        self.to_string()
    }

    /// Write the rendered document to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VocError::Io`] if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<(), VocError> {
        fs::write(path, self.to_xml())?;
        Ok(())
    }
}

impl fmt::Display for VocAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<?xml version=\"1.0\"?>")?;
        writeln!(f, "<annotation>")?;
        writeln!(f, "    <folder>{}</folder>", escape_text(&self.folder))?;
        writeln!(f, "    <filename>{}</filename>", escape_text(&self.filename))?;
        writeln!(f, "    <path>{}</path>", escape_text(&self.path))?;
        writeln!(f, "    <source>")?;
        writeln!(f, "        <database>{}</database>", escape_text(&self.database))?;
        writeln!(f, "    </source>")?;
        writeln!(f, "    <size>")?;
        writeln!(f, "        <width>{}</width>", self.width)?;
        writeln!(f, "        <height>{}</height>", self.height)?;
        writeln!(f, "        <depth>{}</depth>", self.depth)?;
        writeln!(f, "    </size>")?;
        writeln!(f, "    <segmented>{}</segmented>", u8::from(self.segmented))?;

        for obj in &self.objects {
            let b = obj.bndbox;
            writeln!(f, "    <object>")?;
            writeln!(f, "        <name>{}</name>", escape_text(&obj.name))?;
            writeln!(f, "        <pose>{}</pose>", escape_text(&obj.pose))?;
            writeln!(f, "        <truncated>{}</truncated>", u8::from(obj.truncated))?;
            writeln!(f, "        <difficult>{}</difficult>", u8::from(obj.difficult))?;
            writeln!(f, "        <bndbox>")?;
            writeln!(f, "            <xmin>{}</xmin>", b.xmin)?;
            writeln!(f, "            <ymin>{}</ymin>", b.ymin)?;
            writeln!(f, "            <xmax>{}</xmax>", b.xmax)?;
            writeln!(f, "            <ymax>{}</ymax>", b.ymax)?;
            writeln!(f, "        </bndbox>")?;
            writeln!(f, "    </object>")?;
        }

        writeln!(f, "</annotation>")
    }
}

/// Escape `&`, `<` and `>` for XML text content.
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Download name for the export of `image_filename`: the last extension is
/// replaced by `_VOC.xml`.
///
/// Only a final extension is stripped, and only when it sits in the last
/// path segment: `a.b.jpg` becomes `a.b_VOC.xml`, `dir.d/img` keeps its name.
#[must_use]
pub fn export_filename(image_filename: &str) -> String {
    let stem = match image_filename.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !ext.contains('/') => stem,
        _ => image_filename,
    };
    format!("{stem}_VOC.xml")
}
