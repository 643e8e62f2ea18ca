//! Stylize filters: Binarization, Quaternization, Hexadecimalization, Mosaic, RGB 3x3.
//!
//! The three quantizers reduce the shift-based [`fast_gray`] luma to 2, 4 or 16
//! levels with integer arithmetic only.
//!
//! ## Supported Formats
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`binarization`] | RGBA8 | Gray8, levels 0 / 255 |
//! | [`quaternization`] | RGBA8 | Gray8, levels 0 / 85 / 170 / 255 |
//! | [`hexadecimalization`] | RGBA8 | Gray8, levels 0 / 17 / ... / 255 |
//! | [`mosaic_pixelation`] | RGBA8 | in place |
//! | [`pixel_to_rgb3x3`] | RGBA8 | RGBA8, 3x the size |

use tracing::debug;

use crate::error::{ensure_range, FilterError, FilterResult};
use crate::luma::fast_gray;
use crate::parallel::executor;
use crate::pixel::{PixelU8, MAX_CHANNEL};
use crate::raster::{ChannelImage, ChannelLayout, RasterBuffer};

// ============================================================================
// Quantization
// ============================================================================

/// Two-level quantization of one pixel.
#[inline]
pub fn binarize(pixel: PixelU8, threshold: f32) -> u8 {
    if fast_gray(pixel) as f32 >= threshold * MAX_CHANNEL {
        255
    } else {
        0
    }
}

/// Four-level quantization of one pixel.
///
/// A lower threshold shifts every boundary down, so more pixels land on the
/// brighter levels.
#[inline]
pub fn quaternize(pixel: PixelU8, threshold: f32) -> u8 {
    let mut g = fast_gray(pixel);
    g += (86.0 - 85.0 * threshold) as u16;
    // roughly g / 85
    g = (g * 3) >> 8;
    (g * 85) as u8
}

/// Sixteen-level quantization of one pixel.
#[inline]
pub fn hexadecimalize(pixel: PixelU8) -> u8 {
    let mut g = fast_gray(pixel) + 8;
    // roughly g / 17
    g = (g * 15) >> 8;
    (g | (g << 4)) as u8
}

fn quantize<F>(input: &mut RasterBuffer, f: F) -> FilterResult<ChannelImage>
where
    F: Fn(PixelU8) -> u8 + Sync + Send,
{
    let view = input.view()?;
    let width = view.width();
    let mut output = ChannelImage::new(width, view.height(), ChannelLayout::Gray)?;
    executor().rows(&mut output.data, width, |y, row| {
        for (v, &p) in row.iter_mut().zip(view.row(y)) {
            *v = f(p);
        }
    });
    Ok(output)
}

/// Black and white by luma threshold.
///
/// # Arguments
/// * `input` - Source image
/// * `threshold` - 0.0-1.0; pixels with luma >= threshold * 255 become white
pub fn binarization(input: &mut RasterBuffer, threshold: f32) -> FilterResult<ChannelImage> {
    ensure_range("threshold", threshold, 0.0, 1.0)?;
    debug!(width = input.width(), height = input.height(), threshold, "binarization");
    quantize(input, |p| binarize(p, threshold))
}

/// Four gray levels.
///
/// # Arguments
/// * `input` - Source image
/// * `threshold` - 0.0-1.0; 1.0 = plain rounding down, lower values brighten
pub fn quaternization(input: &mut RasterBuffer, threshold: f32) -> FilterResult<ChannelImage> {
    ensure_range("threshold", threshold, 0.0, 1.0)?;
    debug!(width = input.width(), height = input.height(), threshold, "quaternization");
    quantize(input, |p| quaternize(p, threshold))
}

/// Sixteen gray levels.
pub fn hexadecimalization(input: &mut RasterBuffer) -> FilterResult<ChannelImage> {
    debug!(width = input.width(), height = input.height(), "hexadecimalization");
    quantize(input, hexadecimalize)
}

// ============================================================================
// Mosaic
// ============================================================================

#[inline]
fn accumulate(sum: &mut [u64; 4], p: PixelU8) {
    for (s, c) in sum.iter_mut().zip(p.to_array()) {
        *s += c as u64;
    }
}

/// Replace each `side` x `side` block with its average color, in place.
///
/// Each band of `side` rows is one unit of parallel work: a horizontal pass
/// sums each row segment, a vertical pass sums the segments, and the averaged
/// first row is copied over the rest of the band. Blocks cut off by the right
/// or bottom edge are padded by repeating the last column or row, so every
/// average is over `side * side` samples.
///
/// # Arguments
/// * `input` - Image pixelated in place
/// * `side` - Block side length (>= 1; 1 leaves the image unchanged)
pub fn mosaic_pixelation(input: &mut RasterBuffer, side: usize) -> FilterResult<()> {
    if input.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    if side == 0 {
        return Err(FilterError::InvalidParameter("mosaic side must be >= 1".into()));
    }
    let width = input.width();
    debug!(width, height = input.height(), side, "mosaic_pixelation");
    if side == 1 {
        return Ok(());
    }

    let blocks = width.div_ceil(side);
    let count = (side * side) as u64;

    executor().bands(input.pixels_mut(), width, side, |_, band| {
        let rows = band.len() / width;

        let mut segments = vec![[0u64; 4]; rows * blocks];
        for (r, row) in band.chunks_exact(width).enumerate() {
            for (b, segment) in segments[r * blocks..(r + 1) * blocks].iter_mut().enumerate() {
                for dx in 0..side {
                    accumulate(segment, row[(b * side + dx).min(width - 1)]);
                }
            }
        }

        for b in 0..blocks {
            let mut sum = [0u64; 4];
            for dy in 0..side {
                let segment = segments[dy.min(rows - 1) * blocks + b];
                for (s, v) in sum.iter_mut().zip(segment) {
                    *s += v;
                }
            }
            let mean = PixelU8::from_array(sum.map(|s| ((s + count / 2) / count) as u8));
            let start = b * side;
            band[start..(start + side).min(width)].fill(mean);
        }

        for r in 1..rows {
            band.copy_within(0..width, r * width);
        }
    });

    Ok(())
}

// ============================================================================
// RGB sub-pixels
// ============================================================================

#[inline]
fn dim(channel: u8, brightness: f32) -> u8 {
    (channel as f32 * brightness) as u8
}

/// Expand each pixel into a 3x3 block of red, green and blue stripes.
///
/// The left column keeps red at full strength, the middle green, the right
/// blue; the other two channels of each stripe are scaled by `brightness`.
/// Alpha is copied into all nine pixels.
///
/// # Arguments
/// * `input` - Source image
/// * `brightness` - 0.0-1.0 strength of the non-dominant channels
///
/// # Returns
/// Image of 3 * width x 3 * height
pub fn pixel_to_rgb3x3(input: &mut RasterBuffer, brightness: f32) -> FilterResult<RasterBuffer> {
    let view = input.view()?;
    ensure_range("brightness", brightness, 0.0, 1.0)?;
    let (width, height) = (view.width(), view.height());
    debug!(width, height, brightness, "pixel_to_rgb3x3");

    let out_w = width
        .checked_mul(3)
        .ok_or_else(|| FilterError::DegenerateGeometry(format!("{width} * 3 overflows")))?;
    let out_h = height
        .checked_mul(3)
        .ok_or_else(|| FilterError::DegenerateGeometry(format!("{height} * 3 overflows")))?;
    let mut output = RasterBuffer::allocate(out_w, out_h)?;

    executor().bands(output.pixels_mut(), out_w, 3, |first_row, band| {
        let (top, rest) = band.split_at_mut(out_w);
        for (cell, &p) in top.chunks_exact_mut(3).zip(view.row(first_row / 3)) {
            cell[0] = PixelU8::new(p.r, dim(p.g, brightness), dim(p.b, brightness), p.a);
            cell[1] = PixelU8::new(dim(p.r, brightness), p.g, dim(p.b, brightness), p.a);
            cell[2] = PixelU8::new(dim(p.r, brightness), dim(p.g, brightness), p.b, p.a);
        }
        for row in rest.chunks_exact_mut(out_w) {
            row.copy_from_slice(top);
        }
    });

    Ok(output)
}
