//! Cover rendering
//!
//! Turns the bytes of an external cover image into the PNG that gets uploaded:
//! - `source.rs` - decoding the downloaded bytes
//! - `compose.rs` - fitting the image onto the fixed canvas
//! - `encode.rs` - PNG serialization
//!
//! The border color comes from [`crate::color`].

pub mod compose;
pub mod encode;
pub mod source;

use image::Rgb;
use tracing::debug;

use crate::color::{self, DEFAULT_QUALITY};
use crate::error::CoverError;
pub use compose::{CanvasSize, Placement, Resample};
pub use source::SourceImage;

/// Everything that shapes a rendered cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverOptions {
    pub canvas: CanvasSize,
    /// Sampling step for the border color, 1 = every pixel
    pub color_quality: u32,
    pub filter: Resample,
}

impl Default for CoverOptions {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            color_quality: DEFAULT_QUALITY,
            filter: Resample::default(),
        }
    }
}

/// A cover ready for upload
#[derive(Debug, Clone)]
pub struct RenderedCover {
    /// PNG bytes of the full canvas
    pub png: Vec<u8>,
    /// Border color taken from the source
    pub fill: Rgb<u8>,
    /// Where the source sits on the canvas
    pub placement: Placement,
}

/// Decode `bytes` and render them as a cover
pub fn render_bytes(bytes: &[u8], options: &CoverOptions) -> Result<RenderedCover, CoverError> {
    let source = SourceImage::decode(bytes)?;
    render(&source, options)
}

/// Render a decoded source: extract the color, letterbox, encode
pub fn render(source: &SourceImage, options: &CoverOptions) -> Result<RenderedCover, CoverError> {
    let fill = color::dominant_color(source.image(), options.color_quality);
    let placement = compose::fit(source.width(), source.height(), options.canvas);
    let canvas = compose::letterbox(source.image(), fill, options.canvas, options.filter.into());
    let png = encode::encode_png(&canvas)?;

    debug!(
        format = ?source.format(),
        color_type = ?source.color_type(),
        source_bytes = source.byte_len(),
        source_width = source.width(),
        source_height = source.height(),
        fill = ?fill.0,
        x = placement.x,
        y = placement.y,
        scaled_width = placement.width,
        scaled_height = placement.height,
        fills_canvas = placement.fills(options.canvas),
        png_bytes = png.len(),
        "rendered cover"
    );

    Ok(RenderedCover { png, fill, placement })
}
