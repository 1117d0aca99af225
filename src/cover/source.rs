//! Decoded source image for one cover
//!
//! The raw bytes are decoded once; color extraction and compositing both
//! work from the same decoded image. Nothing here outlives a single page.

use image::{ColorType, DynamicImage, ImageFormat};

use crate::error::CoverError;

/// A source image downloaded for one page
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    format: Option<ImageFormat>,
    byte_len: usize,
}

impl SourceImage {
    /// Decode raw image bytes
    ///
    /// # Returns
    /// * `Ok(SourceImage)` - Decoded image with its detected format
    /// * `Err(CoverError::Decode)` - The bytes are not a supported raster image
    pub fn decode(bytes: &[u8]) -> Result<Self, CoverError> {
        let format = image::guess_format(bytes).ok();
        let image = image::load_from_memory(bytes).map_err(CoverError::Decode)?;

        Ok(Self {
            image,
            format,
            byte_len: bytes.len(),
        })
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color mode of the decoded pixels
    pub fn color_type(&self) -> ColorType {
        self.image.color()
    }

    /// Container format sniffed from the magic bytes, if recognised
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Size of the encoded source in bytes
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}
