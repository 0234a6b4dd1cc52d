//! Background image slot: the editor's one asynchronous boundary.
//!
//! Loading an image is a single-shot operation. [`ImageSlot::begin_load`]
//! hands out a [`LoadTicket`] that is consumed by [`ImageSlot::complete`];
//! a ticket from a superseded load is ignored. Until the current load
//! completes the slot reports a placeholder size.
//!
//! Each load may own a temporary resource (an object URL in the browser). The
//! slot keeps at most one alive: it is released when a new load replaces it
//! and when the slot is dropped.

#[cfg(test)]
#[path = "image_test.rs"]
mod image_test;

use crate::consts::PLACEHOLDER_IMAGE_SIZE;

/// Error returned by [`ImageSlot`] operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ImageError {
    /// The selected file's MIME type is not `image/*`.
    #[error("please upload an image file (got `{mime}`)")]
    NotAnImage { mime: String },
    /// The decoded image reported a zero or non-finite size.
    #[error("image has unusable dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    /// A browser API call failed.
    #[error("browser error: {0}")]
    Browser(String),
}

/// A temporary resource tied to one loaded image.
pub trait TempResource {
    /// Give the resource back. Called exactly once.
    fn release(&mut self);
}

/// Proof of a pending load, redeemed once by [`ImageSlot::complete`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct LoadTicket {
    generation: u64,
}

/// Loading state of the current image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageStatus {
    /// No image requested yet.
    Empty,
    /// A load is in flight.
    Pending,
    /// The image decoded with this natural size.
    Ready { width: f64, height: f64 },
}

/// The current background image and its temporary resource.
pub struct ImageSlot {
    filename: String,
    status: ImageStatus,
    generation: u64,
    resource: Option<Box<dyn TempResource>>,
}

impl Default for ImageSlot {
    fn default() -> Self {
        Self { filename: String::new(), status: ImageStatus::Empty, generation: 0, resource: None }
    }
}

impl std::fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSlot")
            .field("filename", &self.filename)
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("has_resource", &self.resource.is_some())
            .finish()
    }
}

impl ImageSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading a new image, replacing the current one.
    ///
    /// `resource` is released immediately if the MIME type is rejected, so the
    /// caller never has to clean up after an error.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotAnImage`] when `mime` does not start with
    /// `image/`; the current image is kept.
    pub fn begin_load(
        &mut self,
        filename: &str,
        mime: &str,
        resource: Option<Box<dyn TempResource>>,
    ) -> Result<LoadTicket, ImageError> {
        if !mime.starts_with("image/") {
            if let Some(mut rejected) = resource {
                rejected.release();
            }
            log::warn!("rejecting non-image upload {filename} ({mime})");
            return Err(ImageError::NotAnImage { mime: mime.to_owned() });
        }

        self.release_resource();
        self.resource = resource;
        self.filename = filename.to_owned();
        self.status = ImageStatus::Pending;
        self.generation += 1;
        log::debug!("loading image {filename} (generation {})", self.generation);
        Ok(LoadTicket { generation: self.generation })
    }

    /// Finish a load. Returns `Ok(false)` when the ticket was superseded.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidDimensions`] for a zero, negative or
    /// non-finite size; the slot stays pending.
    pub fn complete(&mut self, ticket: LoadTicket, width: f64, height: f64) -> Result<bool, ImageError> {
        if ticket.generation != self.generation {
            log::debug!("ignoring stale image load (generation {})", ticket.generation);
            return Ok(false);
        }
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(width) || !usable(height) {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        self.status = ImageStatus::Ready { width, height };
        Ok(true)
    }

    /// Natural image size, or the placeholder while nothing has loaded.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        match self.status {
            ImageStatus::Ready { width, height } => (width, height),
            ImageStatus::Empty | ImageStatus::Pending => (PLACEHOLDER_IMAGE_SIZE, PLACEHOLDER_IMAGE_SIZE),
        }
    }

    /// Name of the file most recently accepted by [`ImageSlot::begin_load`].
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn status(&self) -> ImageStatus {
        self.status
    }

    /// Whether a temporary resource is currently held.
    #[must_use]
    pub fn holds_resource(&self) -> bool {
        self.resource.is_some()
    }

    fn release_resource(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.release();
        }
    }
}

impl Drop for ImageSlot {
    fn drop(&mut self) {
        self.release_resource();
    }
}
