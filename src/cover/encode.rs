//! PNG serialization of the finished cover

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::error::CoverError;

/// Encode an image as PNG with the encoder's default lossless settings
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, CoverError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(CoverError::Encode)?;
    Ok(bytes)
}
