//! Dominant color extraction
//!
//! Picks a single background color for an image using modified median-cut
//! quantization (MMCQ):
//! - Sample every `quality`-th pixel, skipping transparent and near-white ones
//! - Histogram the samples at 5 bits per channel
//! - Repeatedly split color boxes at the population median of their longest axis
//! - Return the mean color of the box with the largest count × volume
//!
//! The default quality samples every pixel.

use image::{DynamicImage, Rgb};

/// Sampling step used when nothing else is configured (every pixel)
pub const DEFAULT_QUALITY: u32 = 1;

/// Significant bits kept per channel in the histogram
const SIGBITS: u32 = 5;
const RSHIFT: u32 = 8 - SIGBITS;
const HISTO_SIZE: usize = 1 << (3 * SIGBITS);

/// Number of palette entries the quantizer aims for
const PALETTE_SIZE: usize = 5;
/// Share of the palette produced by population-only splitting
const FRACT_BY_POPULATIONS: f64 = 0.75;
const MAX_ITERATIONS: usize = 1000;

/// Pixels below this alpha do not contribute
const MIN_ALPHA: u8 = 125;
/// Pixels with every channel above this are treated as paper white
const WHITE_THRESHOLD: u8 = 250;

/// Extract the dominant color of a decoded image
///
/// # Arguments
/// * `img` - Source image, any color type
/// * `quality` - Sampling step; 1 visits every pixel, higher is faster and coarser
pub fn dominant_color(img: &DynamicImage, quality: u32) -> Rgb<u8> {
    let step = quality.max(1) as usize;
    let rgba = img.to_rgba8();

    let sampled: Vec<[u8; 4]> = rgba.pixels().step_by(step).map(|p| p.0).collect();
    let kept: Vec<[u8; 3]> = sampled
        .iter()
        .filter(|p| p[3] >= MIN_ALPHA && !p[..3].iter().all(|&c| c > WHITE_THRESHOLD))
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    // Blank or fully transparent images have nothing to quantize
    if kept.is_empty() {
        return mean_color(&sampled);
    }

    quantize(&kept, PALETTE_SIZE)
        .into_iter()
        .next()
        .unwrap_or_else(|| mean_color(&sampled))
}

/// Plain average of the sampled pixels, ignoring alpha
fn mean_color(pixels: &[[u8; 4]]) -> Rgb<u8> {
    if pixels.is_empty() {
        return Rgb([0, 0, 0]);
    }

    let mut sums = [0u64; 3];
    for p in pixels {
        for (sum, &c) in sums.iter_mut().zip(&p[..3]) {
            *sum += u64::from(c);
        }
    }

    let n = pixels.len() as f64;
    Rgb(sums.map(|s| (s as f64 / n).round().clamp(0.0, 255.0) as u8))
}

fn histogram_index(rgb: [i32; 3]) -> usize {
    ((rgb[0] << (2 * SIGBITS)) | (rgb[1] << SIGBITS) | rgb[2]) as usize
}

fn reduce(pixel: &[u8; 3]) -> [i32; 3] {
    pixel.map(|c| i32::from(c >> RSHIFT))
}

fn histogram(pixels: &[[u8; 3]]) -> Vec<u64> {
    let mut histo = vec![0u64; HISTO_SIZE];
    for p in pixels {
        histo[histogram_index(reduce(p))] += 1;
    }
    histo
}

/// Axis-aligned box in the reduced color space, bounds inclusive
///
/// A box with `lo > hi` on some axis is empty; median cuts can produce those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColorBox {
    lo: [i32; 3],
    hi: [i32; 3],
}

impl ColorBox {
    fn enclosing(pixels: &[[u8; 3]]) -> Self {
        let mut lo = [i32::MAX; 3];
        let mut hi = [i32::MIN; 3];
        for p in pixels {
            for (axis, c) in reduce(p).into_iter().enumerate() {
                lo[axis] = lo[axis].min(c);
                hi[axis] = hi[axis].max(c);
            }
        }
        Self { lo, hi }
    }

    fn width(&self, axis: usize) -> i32 {
        self.hi[axis] - self.lo[axis] + 1
    }

    fn volume(&self) -> u64 {
        (0..3).map(|axis| self.width(axis).max(0) as u64).product()
    }

    /// Visit every histogram cell inside the box
    fn for_each_cell(&self, histo: &[u64], mut f: impl FnMut([i32; 3], u64)) {
        for r in self.lo[0]..=self.hi[0] {
            for g in self.lo[1]..=self.hi[1] {
                for b in self.lo[2]..=self.hi[2] {
                    let cell = [r, g, b];
                    f(cell, histo[histogram_index(cell)]);
                }
            }
        }
    }

    fn count(&self, histo: &[u64]) -> u64 {
        let mut total = 0;
        self.for_each_cell(histo, |_, n| total += n);
        total
    }

    /// Population-weighted mean color of the box
    fn average(&self, histo: &[u64]) -> Rgb<u8> {
        let mult = f64::from(1u32 << RSHIFT);
        let mut total = 0u64;
        let mut sums = [0f64; 3];
        self.for_each_cell(histo, |cell, n| {
            total += n;
            for (sum, c) in sums.iter_mut().zip(cell) {
                *sum += n as f64 * (f64::from(c) + 0.5) * mult;
            }
        });

        let channels = if total > 0 {
            sums.map(|s| (s / total as f64).trunc())
        } else {
            [0, 1, 2].map(|axis| (mult * f64::from(self.lo[axis] + self.hi[axis] + 1) / 2.0).trunc())
        };
        Rgb(channels.map(|c| c.clamp(0.0, 255.0) as u8))
    }

    /// Split at the population median of the longest axis
    ///
    /// Returns `None` for an empty box. A box holding a single pixel comes
    /// back unchanged with no second half.
    fn median_cut(&self, histo: &[u64]) -> Option<(ColorBox, Option<ColorBox>)> {
        let count = self.count(histo);
        if count == 0 {
            return None;
        }
        if count == 1 {
            return Some((*self, None));
        }

        let widths = [self.width(0), self.width(1), self.width(2)];
        let longest = widths.iter().copied().max().unwrap_or(0);
        let axis = widths.iter().position(|&w| w == longest).unwrap_or(0);
        let (lo, hi) = (self.lo[axis], self.hi[axis]);

        // Running totals along the axis; cells outside [lo, hi] read as zero
        let mut partial = [0u64; 1 << SIGBITS];
        let mut total = 0;
        for i in lo..=hi {
            let mut plane = *self;
            plane.lo[axis] = i;
            plane.hi[axis] = i;
            total += plane.count(histo);
            partial[i as usize] = total;
        }
        let partial_at = |i: i32| if (lo..=hi).contains(&i) { partial[i as usize] } else { 0 };

        for i in lo..=hi {
            if 2 * partial_at(i) <= total {
                continue;
            }

            let left = i - lo;
            let right = hi - i;
            let mut cut = if left <= right {
                (hi - 1).min(i + right / 2)
            } else {
                lo.max(i - 1 - (left + 1) / 2)
            };
            while partial_at(cut) == 0 {
                cut += 1;
            }
            let mut remaining = total - partial_at(cut);
            while remaining == 0 && partial_at(cut - 1) != 0 {
                cut -= 1;
                remaining = total - partial_at(cut);
            }

            let mut first = *self;
            let mut second = *self;
            first.hi[axis] = cut;
            second.lo[axis] = cut + 1;
            return Some((first, Some(second)));
        }

        None
    }
}

/// Split boxes from the back of `queue` (ordered by `key`) until `target` colors exist
fn split_boxes(queue: &mut Vec<ColorBox>, histo: &[u64], key: impl Fn(&ColorBox) -> u64, target: f64) {
    let mut colors = 1usize;

    for _ in 0..MAX_ITERATIONS {
        queue.sort_by_cached_key(|b| key(b));
        let Some(next) = queue.pop() else {
            return;
        };

        if next.count(histo) == 0 {
            queue.push(next);
            continue;
        }

        let Some((first, second)) = next.median_cut(histo) else {
            queue.push(next);
            return;
        };
        queue.push(first);
        if let Some(second) = second {
            queue.push(second);
            colors += 1;
        }

        if colors as f64 >= target {
            return;
        }
    }
}

/// Quantize pixels into at most `max_colors` colors, most significant first
fn quantize(pixels: &[[u8; 3]], max_colors: usize) -> Vec<Rgb<u8>> {
    if pixels.is_empty() {
        return Vec::new();
    }

    let histo = histogram(pixels);
    let mut by_count = vec![ColorBox::enclosing(pixels)];
    split_boxes(
        &mut by_count,
        &histo,
        |b| b.count(&histo),
        FRACT_BY_POPULATIONS * max_colors as f64,
    );

    // Re-queue from most to least populated, then refine by count × volume
    by_count.sort_by_cached_key(|b| b.count(&histo));
    let mut by_weight: Vec<ColorBox> = by_count.into_iter().rev().collect();
    let weight = |b: &ColorBox| b.count(&histo) * b.volume();
    let remaining = max_colors as f64 - by_weight.len() as f64;
    split_boxes(&mut by_weight, &histo, weight, remaining);

    by_weight.sort_by_cached_key(|b| weight(b));
    by_weight.iter().rev().map(|b| b.average(&histo)).collect()
}
