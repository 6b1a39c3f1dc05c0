use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};

use super::ThumbnailMaker;
use crate::providers::split_data_url;
use crate::{Result, TaskshotError};

/// JPEG thumbnailer backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageThumbnailer {
    max_width: u32,
    max_height: u32,
}

impl ImageThumbnailer {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self::new(320, 180)
    }
}

impl ThumbnailMaker for ImageThumbnailer {
    fn make_thumbnail(&self, image: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(split_data_url(image).data)
            .map_err(|e| TaskshotError::Capture(format!("frame is not valid base64: {e}")))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| TaskshotError::Capture(format!("failed to decode frame: {e}")))?;

        // JPEG has no alpha channel.
        let thumb = DynamicImage::ImageRgb8(
            decoded.thumbnail(self.max_width, self.max_height).to_rgb8(),
        );
        let mut out = Vec::new();
        thumb
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
            .map_err(|e| TaskshotError::Capture(format!("failed to encode thumbnail: {e}")))?;
        Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(out)))
    }
}
