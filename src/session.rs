//! Session file: the image being annotated plus its annotation store.
//!
//! The file is JSON: `{ "image": {filename, width, height}, "attributes": [..],
//! "rectangles": [..] }`. Loading replays every entry through the store's
//! guards, and opening a session rebuilds an [`EngineCore`] with the image
//! already "loaded" so controller operations see the real image size.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::fs;
use std::path::{Path, PathBuf};

use canvas::doc::AnnotationStore;
use canvas::engine::EngineCore;
use canvas::image::ImageError;
use serde::{Deserialize, Serialize};

/// Error returned by session load/save.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session at {0}; run `annotate init` first")]
    Missing(PathBuf),
    #[error("session already exists at {0}; pass --force to replace it")]
    Exists(PathBuf),
    #[error("session I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid session JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// The image a session annotates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub filename: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub image: ImageInfo,
    #[serde(flatten)]
    pub store: AnnotationStore,
}

impl Session {
    /// A fresh session for `image` with an initial label vocabulary.
    #[must_use]
    pub fn new(image: ImageInfo, attributes: &[String]) -> Self {
        let mut store = AnnotationStore::new();
        for name in attributes {
            store.add_attribute(name);
        }
        Self { image, store }
    }

    /// Read a session file.
    ///
    /// # Errors
    ///
    /// [`SessionError::Missing`] if `path` does not exist, otherwise I/O or JSON errors.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        if !path.exists() {
            return Err(SessionError::Missing(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let session: Self = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), rectangles = session.store.len(), "session loaded");
        Ok(session)
    }

    /// Write the session as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns I/O or JSON errors.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let rendered = serde_json::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        tracing::debug!(path = %path.display(), rectangles = self.store.len(), "session saved");
        Ok(())
    }

    /// Rebuild an editor around this session.
    ///
    /// # Errors
    ///
    /// [`ImageError`] if the filename is not an image or the size is unusable.
    pub fn open(self) -> Result<EngineCore, SessionError> {
        let mut core = EngineCore::new();
        let ticket = core.begin_image_load(&self.image.filename, mime_for(&self.image.filename), None)?;
        core.finish_image_load(ticket, self.image.width, self.image.height)?;
        core.load_store(self.store);
        Ok(core)
    }

    /// Capture an editor's state for saving.
    #[must_use]
    pub fn from_engine(core: &EngineCore) -> Self {
        let (width, height) = core.image.size();
        Self {
            image: ImageInfo { filename: core.image.filename().to_owned(), width, height },
            store: core.doc.clone(),
        }
    }
}

/// MIME type guessed from the file extension.
#[must_use]
pub fn mime_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
