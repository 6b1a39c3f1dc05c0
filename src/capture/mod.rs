//! Frame capture and thumbnailing collaborators.
//!
//! Pixel grabbing is platform territory; the orchestrator only needs a
//! source that hands out base64 frames and can tell it when capture has
//! been revoked. [`FileCaptureSource`] serves frames from an image file,
//! which is what the CLI and the tests use.

mod file;
#[cfg(feature = "thumbnails")]
mod thumbnail;

pub use file::FileCaptureSource;
#[cfg(feature = "thumbnails")]
pub use thumbnail::ImageThumbnailer;

use async_trait::async_trait;

use crate::Result;

/// Placeholder stored when thumbnailing fails (1x1 transparent PNG).
pub const DEFAULT_THUMBNAIL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Called once when the source stops delivering frames for good.
pub type TerminationCallback = Box<dyn Fn() + Send + Sync>;

/// Where frames come from.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Acquire whatever the source needs before the first frame.
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Grab one frame as base64 (a `data:` URL is accepted too).
    async fn acquire_frame(&self) -> Result<String>;

    /// Register a callback for upstream termination (e.g. permission revoked).
    fn on_terminated(&self, callback: TerminationCallback);

    /// Release all capture resources. Must be safe to call repeatedly.
    fn release(&self);
}

/// Downscales frames for storage alongside tasks.
pub trait ThumbnailMaker: Send + Sync {
    fn make_thumbnail(&self, image: &str) -> Result<String>;
}

/// Stores frames unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughThumbnailer;

impl ThumbnailMaker for PassthroughThumbnailer {
    fn make_thumbnail(&self, image: &str) -> Result<String> {
        Ok(image.to_string())
    }
}
