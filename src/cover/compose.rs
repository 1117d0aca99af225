//! Letterboxing onto the fixed cover canvas
//!
//! The source is scaled by a single factor so it fits entirely inside the
//! canvas, then centered on a canvas filled with the border color. Nothing is
//! ever cropped or stretched.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, Rgba, RgbImage, RgbaImage};
use serde::Deserialize;

/// Cover width used by Notion page headers
pub const COVER_WIDTH: u32 = 1500;
/// Cover height used by Notion page headers
pub const COVER_HEIGHT: u32 = 600;

/// Target canvas dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: COVER_WIDTH,
            height: COVER_HEIGHT,
        }
    }
}

/// Resampling filter used when scaling the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Resample {
    Nearest,
    Triangle,
    /// Bicubic
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<Resample> for FilterType {
    fn from(filter: Resample) -> Self {
        match filter {
            Resample::Nearest => FilterType::Nearest,
            Resample::Triangle => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Where the scaled source lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// True when the scaled source covers the whole canvas
    pub fn fills(&self, canvas: CanvasSize) -> bool {
        self.width == canvas.width && self.height == canvas.height
    }
}

/// Compute the uniform fit of a `width` × `height` source inside `canvas`
///
/// The constrained axis matches the canvas exactly; the other is rounded to
/// the nearest pixel (never below one) and centered. Halves round to even.
pub fn fit(width: u32, height: u32, canvas: CanvasSize) -> Placement {
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));
    let (cw, ch) = (u64::from(canvas.width), u64::from(canvas.height));

    // Compare aspect ratios without floating point: w/h vs cw/ch
    let source_wider = w * ch;
    let canvas_wider = cw * h;

    if source_wider == canvas_wider {
        return Placement {
            x: 0,
            y: 0,
            width: canvas.width,
            height: canvas.height,
        };
    }

    if source_wider > canvas_wider {
        let scaled = scaled_extent(h, w, canvas.width, canvas.height);
        Placement {
            x: 0,
            y: centered_offset(canvas.height, scaled),
            width: canvas.width,
            height: scaled,
        }
    } else {
        let scaled = scaled_extent(w, h, canvas.height, canvas.width);
        Placement {
            x: centered_offset(canvas.width, scaled),
            y: 0,
            width: scaled,
            height: canvas.height,
        }
    }
}

/// `round(free / bound * bound_target)`, clamped to `1..=free_target`
fn scaled_extent(free: u64, bound: u64, bound_target: u32, free_target: u32) -> u32 {
    let exact = free as f64 / bound as f64 * f64::from(bound_target);
    (exact.round_ties_even() as u32).clamp(1, free_target)
}

fn centered_offset(canvas: u32, extent: u32) -> u32 {
    (f64::from(canvas - extent) / 2.0).round_ties_even() as u32
}

/// Scale `img` to fit `canvas` and center it on a `fill`-colored background
///
/// The result is RGBA when the source carries an alpha channel and RGB
/// otherwise. Grayscale and 16-bit sources are widened to RGB8 because the
/// border color is an RGB triple that a luma canvas cannot hold.
pub fn letterbox(img: &DynamicImage, fill: Rgb<u8>, canvas: CanvasSize, filter: FilterType) -> DynamicImage {
    let placement = fit(img.width(), img.height(), canvas);
    let resized = img.resize_exact(placement.width, placement.height, filter);
    let (x, y) = (i64::from(placement.x), i64::from(placement.y));

    if img.color().has_alpha() {
        let [r, g, b] = fill.0;
        let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba([r, g, b, u8::MAX]));
        imageops::replace(&mut out, &resized.to_rgba8(), x, y);
        DynamicImage::ImageRgba8(out)
    } else {
        let mut out = RgbImage::from_pixel(canvas.width, canvas.height, fill);
        imageops::replace(&mut out, &resized.to_rgb8(), x, y);
        DynamicImage::ImageRgb8(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GrayImage, Luma};
    use proptest::prelude::*;

    const FILL: Rgb<u8> = Rgb([10, 20, 30]);
    const INK: Rgb<u8> = Rgb([200, 100, 50]);

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, INK))
    }

    fn pixel(img: &DynamicImage, x: u32, y: u32) -> [u8; 3] {
        img.to_rgb8().get_pixel(x, y).0
    }

    #[test]
    fn test_fit_portrait_source() {
        let placement = fit(300, 900, CanvasSize::default());
        assert_eq!(
            placement,
            Placement {
                x: 650,
                y: 0,
                width: 200,
                height: 600
            }
        );
    }

    #[test]
    fn test_fit_common_ratios() {
        let canvas = CanvasSize::default();

        // 1:1
        assert_eq!(fit(1000, 1000, canvas), Placement { x: 450, y: 0, width: 600, height: 600 });
        // 16:9 is still narrower than 5:2; the 216.5 offset rounds to even
        assert_eq!(fit(1600, 900, canvas), Placement { x: 216, y: 0, width: 1067, height: 600 });
        // 9:16; the 337.5 width rounds to even
        assert_eq!(fit(900, 1600, canvas), Placement { x: 581, y: 0, width: 338, height: 600 });
        // wider than the canvas
        assert_eq!(fit(3000, 600, canvas), Placement { x: 0, y: 150, width: 1500, height: 300 });
    }

    #[test]
    fn test_fit_exact_ratio_fills_canvas() {
        let canvas = CanvasSize::default();
        assert!(fit(750, 300, canvas).fills(canvas));
        assert!(fit(3000, 1200, canvas).fills(canvas));
    }

    #[test]
    fn test_fit_degenerate_sources() {
        let canvas = CanvasSize::default();

        let tall = fit(1, 1000, canvas);
        assert_eq!((tall.width, tall.height), (1, 600));
        assert_eq!(tall.x, 750);

        let wide = fit(1000, 1, canvas);
        assert_eq!((wide.width, wide.height), (1500, 2));
        assert_eq!(wide.y, 299);
    }

    #[test]
    fn test_letterbox_portrait_fills_side_bars() {
        let out = letterbox(&solid(300, 900), FILL, CanvasSize::default(), FilterType::Nearest);

        assert_eq!((out.width(), out.height()), (1500, 600));
        assert_eq!(pixel(&out, 0, 0), FILL.0);
        assert_eq!(pixel(&out, 649, 300), FILL.0);
        assert_eq!(pixel(&out, 650, 300), INK.0);
        assert_eq!(pixel(&out, 849, 599), INK.0);
        assert_eq!(pixel(&out, 850, 0), FILL.0);
        assert_eq!(pixel(&out, 1499, 599), FILL.0);
    }

    #[test]
    fn test_letterbox_upscales_small_source() {
        let out = letterbox(&solid(10, 4), FILL, CanvasSize::default(), FilterType::Nearest);

        assert_eq!((out.width(), out.height()), (1500, 600));
        assert_eq!(pixel(&out, 0, 0), INK.0);
        assert_eq!(pixel(&out, 1499, 599), INK.0);
    }

    #[test]
    fn test_letterbox_landscape_fills_top_and_bottom() {
        let out = letterbox(&solid(4000, 800), FILL, CanvasSize::default(), FilterType::Nearest);

        // 4000x800 scales to 1500x300 at y=150
        assert_eq!(pixel(&out, 700, 149), FILL.0);
        assert_eq!(pixel(&out, 700, 150), INK.0);
        assert_eq!(pixel(&out, 700, 449), INK.0);
        assert_eq!(pixel(&out, 700, 450), FILL.0);
    }

    #[test]
    fn test_letterbox_keeps_alpha_mode() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, Rgba([1, 2, 3, 0])));
        let out = letterbox(&src, FILL, CanvasSize::default(), FilterType::Triangle);

        assert_eq!(out.color(), ColorType::Rgba8);
        let rgba = out.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(rgba.get_pixel(750, 300).0[3], 0);
    }

    #[test]
    fn test_letterbox_grayscale_becomes_rgb() {
        let src = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([90])));
        let out = letterbox(&src, FILL, CanvasSize::default(), FilterType::Nearest);

        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(pixel(&out, 750, 300), [90, 90, 90]);
        assert_eq!(pixel(&out, 0, 300), FILL.0);
    }

    #[test]
    fn test_letterbox_default_filter_dimensions() {
        for (w, h) in [(1, 1), (1, 600), (700, 1), (1920, 1080), (1080, 1920), (1500, 600)] {
            let out = letterbox(&solid(w, h), FILL, CanvasSize::default(), Resample::default().into());
            assert_eq!((out.width(), out.height()), (1500, 600), "source {w}x{h}");
        }
    }

    #[test]
    fn test_resample_names() {
        use clap::ValueEnum;

        let parsed = Resample::from_str("catmull-rom", false).unwrap();
        assert_eq!(parsed, Resample::CatmullRom);
        assert_eq!(FilterType::from(Resample::Lanczos3), FilterType::Lanczos3);
    }

    proptest! {
        #[test]
        fn prop_fit_stays_inside_canvas(w in 1u32..5000, h in 1u32..5000) {
            let canvas = CanvasSize::default();
            let p = fit(w, h, canvas);

            prop_assert!(p.width >= 1 && p.height >= 1);
            prop_assert!(p.x + p.width <= canvas.width);
            prop_assert!(p.y + p.height <= canvas.height);
            prop_assert!(p.width == canvas.width || p.height == canvas.height);
        }

        #[test]
        fn prop_fit_is_centered(w in 1u32..5000, h in 1u32..5000) {
            let canvas = CanvasSize::default();
            let p = fit(w, h, canvas);

            let dx = i64::from(2 * p.x + p.width) - i64::from(canvas.width);
            let dy = i64::from(2 * p.y + p.height) - i64::from(canvas.height);
            prop_assert!(dx.abs() <= 1 && dy.abs() <= 1);
        }

        #[test]
        fn prop_fit_scales_uniformly(w in 1u32..5000, h in 1u32..5000) {
            let canvas = CanvasSize::default();
            let p = fit(w, h, canvas);

            let scale = (f64::from(canvas.width) / f64::from(w)).min(f64::from(canvas.height) / f64::from(h));
            prop_assert!((f64::from(p.width) - f64::from(w) * scale).abs() <= 1.0);
            prop_assert!((f64::from(p.height) - f64::from(h) * scale).abs() <= 1.0);
        }
    }
}
