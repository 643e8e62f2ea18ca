//! Single-channel brightness derived from RGB.
//!
//! Three flavors with different cost/quality trade-offs:
//!
//! | Function | Weights | Notes |
//! |----------|---------|-------|
//! | [`fast_gray`] | 4/16 R, 10/16 G, 2/16 B | shifts only, not gamma-correct |
//! | [`gray_color`] | 0.2973 R, 0.6274 G, 0.0753 B | weighted in gamma 2.2 linear light |
//! | [`hsl_lightness`] | (max + min) / 2 | HSL "L" |
//!
//! The quantization filters and the zoom edge map use [`fast_gray`]; full-quality
//! grayscale output uses [`gray_color`].

use crate::pixel::{max3, min3, PixelU8, MAX_CHANNEL};

/// Display gamma used by [`gray_color`].
const GAMMA: f32 = 2.2;

const GRAY_R: f32 = 0.2973;
const GRAY_G: f32 = 0.6274;
const GRAY_B: f32 = 0.0753;

/// Shift-based approximate luma, 0-255.
#[inline]
pub fn fast_gray(pixel: PixelU8) -> u16 {
    let r = pixel.r as u16;
    let g = pixel.g as u16;
    let b = pixel.b as u16;
    ((r << 2) + (g << 3) + (g << 1) + (b << 1)) >> 4
}

/// Gamma-aware luma, 0-255.
pub fn gray_color(pixel: PixelU8) -> u8 {
    let linear = |c: u8| (c as f32 / MAX_CHANNEL).powf(GAMMA);
    let sum = linear(pixel.r) * GRAY_R + linear(pixel.g) * GRAY_G + linear(pixel.b) * GRAY_B;
    (sum.powf(1.0 / GAMMA) * MAX_CHANNEL).round().clamp(0.0, MAX_CHANNEL) as u8
}

/// HSL lightness, 0-255.
#[inline]
pub fn hsl_lightness(pixel: PixelU8) -> u8 {
    let max = max3(pixel.r, pixel.g, pixel.b) as u16;
    let min = min3(pixel.r, pixel.g, pixel.b) as u16;
    ((max + min) >> 1) as u8
}
