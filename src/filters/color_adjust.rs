//! Per-pixel color adjustments: tone mapping, vividness, HSL, inversion.
//!
//! All filters here work in place on the structured pixels (the byte cache is
//! dropped before the parallel pass) and leave alpha untouched.
//!
//! ## Supported Formats
//!
//! - **RGBA8** buffers only. Each pixel is converted to 0.0-1.0 floats, adjusted
//!   and clamped back to 0-255.

use tracing::debug;

use crate::error::{ensure_finite, FilterError, FilterResult};
use crate::parallel::executor;
use crate::pixel::{clamp, max3, PixelF32};
use crate::raster::RasterBuffer;

/// Ratios closer to zero than this leave the image unchanged.
const NEGLIGIBLE_RATIO: f32 = 0.001;

/// Run `f` over every pixel in float space, keeping the original alpha.
fn map_in_place<F>(input: &mut RasterBuffer, f: F) -> FilterResult<()>
where
    F: Fn(PixelF32) -> PixelF32 + Sync + Send,
{
    if input.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    let width = input.width();
    executor().rows(input.pixels_mut(), width, |_, row| {
        for p in row.iter_mut() {
            *p = f(PixelF32::from_u8(*p)).to_u8().with_alpha(p.a);
        }
    });
    Ok(())
}

// ============================================================================
// Tone mapping
// ============================================================================

/// ACES filmic curve for one channel value.
#[inline]
pub fn aces_curve(x: f32) -> f32 {
    const A: f32 = 2.51;
    const B: f32 = 0.03;
    const C: f32 = 2.43;
    const D: f32 = 0.59;
    const E: f32 = 0.14;
    (x * (A * x + B)) / (x * (C * x + D) + E)
}

/// ACES filmic tone mapping.
///
/// # Arguments
/// * `input` - Image adjusted in place
/// * `exposure` - Ratio applied to each channel before the curve (>= 0)
pub fn aces_tone_mapping(input: &mut RasterBuffer, exposure: f32) -> FilterResult<()> {
    ensure_finite("exposure", exposure)?;
    if exposure < 0.0 {
        return Err(FilterError::InvalidParameter(format!(
            "exposure must be >= 0, got {exposure}"
        )));
    }
    debug!(width = input.width(), height = input.height(), exposure, "aces_tone_mapping");

    map_in_place(input, |p| {
        let c = p * exposure;
        PixelF32::new(aces_curve(c.r()), aces_curve(c.g()), aces_curve(c.b()), p.a())
    })
}

// ============================================================================
// Vividness
// ============================================================================

/// Push channels away from (or towards) their mean.
///
/// # Arguments
/// * `input` - Image adjusted in place
/// * `ratio` - 0 = unchanged, > 0 more saturated, -1 = fully gray
pub fn vividness(input: &mut RasterBuffer, ratio: f32) -> FilterResult<()> {
    ensure_finite("ratio", ratio)?;
    debug!(width = input.width(), height = input.height(), ratio, "vividness");
    if input.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    if ratio.abs() < NEGLIGIBLE_RATIO {
        return Ok(());
    }

    let gain = 1.0 + ratio;
    map_in_place(input, |p| {
        let avg = p.rgb_sum() / 3.0;
        (p - avg) * gain + avg
    })
}

/// Vividness that moves each channel towards the pixel's brightest channel.
///
/// The step is scaled by the distance between the brightest channel and the
/// BT.601 luma, so already saturated pixels barely move and do not clip.
///
/// # Arguments
/// * `input` - Image adjusted in place
/// * `ratio` - 0 = unchanged, > 0 more vivid, < 0 less vivid
pub fn natural_vividness(input: &mut RasterBuffer, ratio: f32) -> FilterResult<()> {
    ensure_finite("ratio", ratio)?;
    debug!(width = input.width(), height = input.height(), ratio, "natural_vividness");
    if input.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    if ratio.abs() < NEGLIGIBLE_RATIO {
        return Ok(());
    }

    let luma = PixelF32::new(0.299, 0.587, 0.114, 0.0);
    map_in_place(input, |p| {
        let avg = (p * luma).rgb_sum();
        let max = max3(p.r(), p.g(), p.b());
        let amount = (max - avg).abs() * 2.0 * -ratio;
        p + (PixelF32::splat(max) - p) * amount
    })
}

// ============================================================================
// HSL
// ============================================================================

/// Rotate hue and scale saturation and lightness.
///
/// Saturation and lightness are clamped to 0.0-1.0 after scaling, so
/// achromatic pixels are unaffected by the hue shift.
///
/// # Arguments
/// * `input` - Image adjusted in place
/// * `hue` - Hue shift in degrees (any finite value, wraps at 360)
/// * `saturation` - Saturation ratio (>= 0, 1.0 = unchanged)
/// * `lightness` - Lightness ratio (>= 0, 1.0 = unchanged)
pub fn hsl_adjustment(
    input: &mut RasterBuffer,
    hue: f32,
    saturation: f32,
    lightness: f32,
) -> FilterResult<()> {
    ensure_finite("hue", hue)?;
    ensure_finite("saturation", saturation)?;
    ensure_finite("lightness", lightness)?;
    if saturation < 0.0 || lightness < 0.0 {
        return Err(FilterError::InvalidParameter(format!(
            "saturation and lightness ratios must be >= 0, got {saturation} and {lightness}"
        )));
    }
    debug!(width = input.width(), height = input.height(), hue, saturation, lightness, "hsl_adjustment");

    map_in_place(input, |p| {
        let hsl = p.to_hsl();
        let h = ((hsl.h() + hue) % 360.0 + 360.0) % 360.0;
        let s = clamp(hsl.s() * saturation, 0.0, 1.0);
        let l = clamp(hsl.l() * lightness, 0.0, 1.0);
        PixelF32::new(h, s, l, p.a()).to_rgb()
    })
}

// ============================================================================
// Inversion
// ============================================================================

/// Invert R, G and B in place.
pub fn invert(input: &mut RasterBuffer) -> FilterResult<()> {
    if input.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    debug!(width = input.width(), height = input.height(), "invert");

    for p in input.pixels_mut() {
        *p = p.inverted();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_util::gradient;
    use crate::pixel::PixelU8;
    use approx::assert_abs_diff_eq;

    fn single(p: PixelU8) -> RasterBuffer {
        RasterBuffer::filled(1, 1, p).unwrap()
    }

    // ========================================================================
    // Tone mapping
    // ========================================================================

    #[test]
    fn test_aces_curve_shape() {
        assert_abs_diff_eq!(aces_curve(0.0), 0.0);
        // saturates a little above 1.0 for large inputs
        assert!(aces_curve(100.0) > 1.0);
        assert!(aces_curve(0.5) < 0.5 * 1.3);
    }

    #[test]
    fn test_aces_keeps_alpha_and_zero_exposure_blacks_out() {
        let mut img = single(PixelU8::new(200, 100, 50, 66));
        aces_tone_mapping(&mut img, 0.0).unwrap();
        assert_eq!(img.pixels()[0], PixelU8::new(0, 0, 0, 66));
        assert!(aces_tone_mapping(&mut img, -1.0).is_err());
    }

    // ========================================================================
    // Vividness
    // ========================================================================

    #[test]
    fn test_vividness_minus_one_is_gray() {
        let mut img = single(PixelU8::new(210, 90, 30, 255));
        vividness(&mut img, -1.0).unwrap();
        let p = img.pixels()[0];
        assert!((p.r as i32 - p.g as i32).abs() <= 1);
        assert!((p.g as i32 - p.b as i32).abs() <= 1);
        assert!((p.r as i32 - 110).abs() <= 1);
    }

    #[test]
    fn test_vividness_negligible_ratio_is_noop() {
        let mut img = gradient(3, 3);
        let before = img.pixels().to_vec();
        vividness(&mut img, 0.0001).unwrap();
        natural_vividness(&mut img, -0.0005).unwrap();
        assert_eq!(img.pixels(), before.as_slice());
    }

    #[test]
    fn test_natural_vividness_gray_is_fixed_point() {
        // max == luma for a gray pixel, so nothing moves
        let mut img = single(PixelU8::gray(128));
        natural_vividness(&mut img, 0.8).unwrap();
        let p = img.pixels()[0];
        assert!((p.r as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_natural_vividness_moves_towards_max() {
        let mut img = single(PixelU8::new(200, 100, 100, 255));
        natural_vividness(&mut img, -0.5).unwrap();
        let p = img.pixels()[0];
        assert!(p.g > 100);
        assert!((p.r as i32 - 200).abs() <= 1);
    }

    // ========================================================================
    // HSL
    // ========================================================================

    #[test]
    fn test_hsl_white_is_fixed() {
        let mut img = RasterBuffer::filled(4, 4, PixelU8::WHITE).unwrap();
        hsl_adjustment(&mut img, 180.0, 1.0, 1.0).unwrap();
        assert!(img.pixels().iter().all(|&p| p == PixelU8::WHITE));
    }

    #[test]
    fn test_hsl_hue_rotation() {
        let mut img = single(PixelU8::new(255, 0, 0, 255));
        hsl_adjustment(&mut img, 120.0, 1.0, 1.0).unwrap();
        let p = img.pixels()[0];
        assert!(p.r <= 1 && p.g >= 254 && p.b <= 1, "{p:?}");
    }

    #[test]
    fn test_hsl_zero_saturation_is_gray() {
        let mut img = single(PixelU8::new(255, 0, 0, 40));
        hsl_adjustment(&mut img, -30.0, 0.0, 1.0).unwrap();
        let p = img.pixels()[0];
        assert_eq!(p.r, p.g);
        assert_eq!(p.g, p.b);
        assert_eq!(p.a, 40);
        assert!(hsl_adjustment(&mut img, 0.0, -1.0, 1.0).is_err());
    }

    // ========================================================================
    // Inversion
    // ========================================================================

    #[test]
    fn test_invert_twice_restores() {
        let mut img = gradient(4, 3);
        let before = img.pixels().to_vec();
        invert(&mut img).unwrap();
        assert_eq!(img.pixels()[0], before[0].inverted());
        invert(&mut img).unwrap();
        assert_eq!(img.pixels(), before.as_slice());
        assert_eq!(invert(&mut RasterBuffer::new()), Err(FilterError::EmptyInput));
    }
}
