//! Resampling: edge-adaptive bilinear zoom and bicubic convolution.
//!
//! ## Coordinate mapping
//!
//! Both families map a destination pixel back to a fractional source position
//! with the pixel-center convention
//!
//! ```text
//! src = max(0, (dst + 0.5) / magnification - 0.5)
//! ```
//!
//! and split it into an integer cell plus the fraction inside that cell.
//! Neighbors outside the image are clamped to the edge.
//!
//! ## Output size
//!
//! Output dimensions are `round(dim * magnification)`. When that rounds to
//! zero on either axis, the magnification is raised to `1 / min(width, height)`
//! so the result is at least 1x1.

use std::str::FromStr;

use ndarray::Array2;
use tracing::{debug, trace};

use crate::error::{ensure_finite, ensure_range, FilterError, FilterResult};
use crate::luma::fast_gray;
use crate::parallel::executor;
use crate::pixel::{clamp, PixelF32, MAX_CHANNEL};
use crate::raster::{PixelView, RasterBuffer};

/// Valid range of the bicubic `a` parameter.
pub const BICUBIC_A_RANGE: (f32, f32) = (-3.0, -0.1);

/// Strongest negative lobe the contrast-adaptive sharpening pass may apply.
const RCAS_LIMIT: f32 = -0.1875;

// ============================================================================
// Geometry
// ============================================================================

/// Output dimensions and the effective magnification for a zoom.
pub fn zoom_dimensions(
    width: usize,
    height: usize,
    magnification: f32,
) -> FilterResult<(usize, usize, f32)> {
    ensure_finite("magnification", magnification)?;
    if magnification <= 0.0 {
        return Err(FilterError::InvalidParameter(format!(
            "magnification must be > 0, got {magnification}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(FilterError::EmptyInput);
    }

    let scaled = |dim: usize, mag: f32| (dim as f64 * mag as f64).round();
    let mut mag = magnification;
    if scaled(width, mag) < 1.0 || scaled(height, mag) < 1.0 {
        mag = mag.max(1.0 / width.min(height) as f32);
        trace!(requested = magnification, effective = mag, "zoom magnification raised");
    }

    let (w, h) = (scaled(width, mag).max(1.0), scaled(height, mag).max(1.0));
    if w > u32::MAX as f64 || h > u32::MAX as f64 {
        return Err(FilterError::DegenerateGeometry(format!(
            "{width}x{height} scaled by {magnification} is too large"
        )));
    }
    Ok((w as usize, h as usize, mag))
}

/// Source cell and fraction for destination index `dst`.
#[inline]
fn source_index(dst: usize, scale: f32, limit: usize) -> (usize, f32) {
    let src = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
    let cell = src.floor();
    ((cell as usize).min(limit - 1), src - cell)
}

// ============================================================================
// Edge-adaptive zoom
// ============================================================================

/// Interpolation weight curve used across detected edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightCurve {
    /// Plain bilinear everywhere; no edge detection, no sharpening.
    Linear,
    /// `t² / (t² + (1-t)²)`
    #[default]
    InverseSquare,
    /// `t⁴ / (t⁴ + (1-t)⁴)`
    InverseQuartic,
}

impl WeightCurve {
    /// Map a linear weight in 0.0-1.0 through the curve.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            WeightCurve::Linear => t,
            WeightCurve::InverseSquare => {
                let a = t * t;
                let b = (1.0 - t) * (1.0 - t);
                a / (a + b)
            }
            WeightCurve::InverseQuartic => {
                let a = (t * t) * (t * t);
                let b = ((1.0 - t) * (1.0 - t)) * ((1.0 - t) * (1.0 - t));
                a / (a + b)
            }
        }
    }
}

impl FromStr for WeightCurve {
    type Err = FilterError;

    /// `linear`, `square` or `quartic`.
    fn from_str(name: &str) -> FilterResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(WeightCurve::Linear),
            "square" => Ok(WeightCurve::InverseSquare),
            "quartic" => Ok(WeightCurve::InverseQuartic),
            other => Err(FilterError::InvalidParameter(format!(
                "unknown weight curve '{other}'"
            ))),
        }
    }
}

#[inline]
fn bilinear(view: &PixelView, column: i64, row: i64, dx: f32, dy: f32) -> PixelF32 {
    let top = view.at_f32(column, row).lerp(view.at_f32(column + 1, row), dx);
    let bottom = view.at_f32(column, row + 1).lerp(view.at_f32(column + 1, row + 1), dx);
    top.lerp(bottom, dy)
}

/// Fast luma of every source pixel, built once and shared by all output rows.
fn gray_map(view: &PixelView) -> FilterResult<Array2<i16>> {
    let (width, height) = (view.width(), view.height());
    let mut gray = vec![0i16; width * height];
    executor().rows(&mut gray, width, |y, row| {
        for (g, &p) in row.iter_mut().zip(view.row(y)) {
            *g = fast_gray(p) as i16;
        }
    });
    trace!(width, height, "zoom gray map built");
    Array2::from_shape_vec((height, width), gray)
        .map_err(|e| FilterError::SizeMismatch(e.to_string()))
}

/// Edge-adaptive zoom.
///
/// With [`WeightCurve::Linear`] this is plain bilinear interpolation. With the
/// other curves, each axis whose local edge ratio exceeds `threshold` has its
/// weight replaced by the curve, and the result gets a contrast-adaptive
/// sharpening pass against the four direct neighbors. Alpha always comes from
/// the bilinear interpolation.
///
/// # Arguments
/// * `input` - Source image
/// * `magnification` - Scale factor (> 0)
/// * `threshold` - Edge ratio above which the curve kicks in (>= 0)
/// * `curve` - Weight curve used across edges
///
/// # Returns
/// New image of `round(width * magnification) x round(height * magnification)`
pub fn zoom(
    input: &mut RasterBuffer,
    magnification: f32,
    threshold: f32,
    curve: WeightCurve,
) -> FilterResult<RasterBuffer> {
    let view = input.view()?;
    ensure_finite("threshold", threshold)?;
    if threshold < 0.0 {
        return Err(FilterError::InvalidParameter(format!(
            "threshold must be >= 0, got {threshold}"
        )));
    }
    let (out_w, out_h, mag) = zoom_dimensions(view.width(), view.height(), magnification)?;
    debug!(
        width = view.width(),
        height = view.height(),
        out_w,
        out_h,
        threshold,
        ?curve,
        "zoom"
    );

    let mut output = RasterBuffer::allocate(out_w, out_h)?;
    let scale = 1.0 / mag;
    let (src_w, src_h) = (view.width(), view.height());

    if curve == WeightCurve::Linear {
        executor().rows(output.pixels_mut(), out_w, |y, row| {
            let (src_row, dy) = source_index(y, scale, src_h);
            for (x, out) in row.iter_mut().enumerate() {
                let (src_col, dx) = source_index(x, scale, src_w);
                *out = bilinear(&view, src_col as i64, src_row as i64, dx, dy).to_u8();
            }
        });
        return Ok(output);
    }

    let gray = gray_map(&view)?;
    let rcas_gain = mag / MAX_CHANNEL * 0.25;

    executor().rows(output.pixels_mut(), out_w, |y, row| {
        let (src_row, dy) = source_index(y, scale, src_h);
        let up_row = src_row.saturating_sub(1);
        let down_row = (src_row + 1).min(src_h - 1);

        for (x, out) in row.iter_mut().enumerate() {
            let (src_col, dx) = source_index(x, scale, src_w);
            let left_col = src_col.saturating_sub(1);
            let right_col = (src_col + 1).min(src_w - 1);

            let left = gray[[src_row, left_col]];
            let right = gray[[src_row, right_col]];
            let up = gray[[up_row, src_col]];
            let down = gray[[down_row, src_col]];
            let this = gray[[src_row, src_col]];

            let edge_weight = |t: f32, a: i16, b: i16| {
                let numerator = (a - b).abs();
                let denominator = (a - this).abs().max((b - this).abs());
                if denominator != 0 && numerator as f32 / denominator as f32 > threshold {
                    curve.apply(t)
                } else {
                    t
                }
            };
            let dx_w = edge_weight(dx, left, right);
            let dy_w = edge_weight(dy, up, down);

            let g_max = left.max(right).max(up).max(down).max(this) as f32;
            let g_min = left.min(right).min(up).min(down).min(this) as f32;
            // f32::max drops the NaN side of a flat black or flat white patch
            let lobe = (-g_min / g_max).max((MAX_CHANNEL - g_max) / (g_min - MAX_CHANNEL));
            let w = if lobe.is_nan() { 0.0 } else { clamp(rcas_gain * lobe, RCAS_LIMIT, 0.0) };

            let (col, row) = (src_col as i64, src_row as i64);
            let base = bilinear(&view, col, row, dx_w, dy_w);
            let neighbors = view.at_f32(col - 1, row)
                + view.at_f32(col + 1, row)
                + view.at_f32(col, row - 1)
                + view.at_f32(col, row + 1);

            let mut sharpened = (neighbors * w + base) / (4.0 * w + 1.0);
            sharpened.set_a(base.a());
            *out = sharpened.to_u8();
        }
    });

    Ok(output)
}

// ============================================================================
// Bicubic convolution
// ============================================================================

/// Cubic convolution kernel value at distance `x` for parameter `a`.
#[inline]
pub fn bicubic_weight(a: f32, x: f32) -> f32 {
    let x = x.abs();
    if x <= 1.0 {
        (a + 2.0) * x * x * x - (a + 3.0) * x * x + 1.0
    } else if x < 2.0 {
        a * x * x * x - 5.0 * a * x * x + 8.0 * a * x - 4.0 * a
    } else {
        0.0
    }
}

/// Bicubic convolution zoom over the 4x4 neighborhood.
///
/// Weights are the outer product of two 1-D cubic kernels evaluated at the
/// fractional offset. The weighted sum is not renormalized; overshoot is clamped
/// only when converting back to 8 bits.
///
/// # Arguments
/// * `input` - Source image
/// * `magnification` - Scale factor (> 0)
/// * `a` - Kernel sharpness, -3.0 to -0.1 (-0.5 is Catmull-Rom)
pub fn zoom_bicubic(input: &mut RasterBuffer, magnification: f32, a: f32) -> FilterResult<RasterBuffer> {
    let view = input.view()?;
    ensure_range("a", a, BICUBIC_A_RANGE.0, BICUBIC_A_RANGE.1)?;
    let (out_w, out_h, mag) = zoom_dimensions(view.width(), view.height(), magnification)?;
    debug!(width = view.width(), height = view.height(), out_w, out_h, a, "zoom_bicubic");

    let mut output = RasterBuffer::allocate(out_w, out_h)?;
    let scale = 1.0 / mag;
    let (src_w, src_h) = (view.width(), view.height());

    executor().rows(output.pixels_mut(), out_w, |y, row| {
        let (src_row, dy) = source_index(y, scale, src_h);
        let wy: [f32; 4] = std::array::from_fn(|j| bicubic_weight(a, (j as f32 - 1.0) - dy));

        for (x, out) in row.iter_mut().enumerate() {
            let (src_col, dx) = source_index(x, scale, src_w);
            let wx: [f32; 4] = std::array::from_fn(|i| bicubic_weight(a, (i as f32 - 1.0) - dx));

            let mut sum = PixelF32::ZERO;
            for (j, &ky) in wy.iter().enumerate() {
                let r = src_row as i64 + j as i64 - 1;
                for (i, &kx) in wx.iter().enumerate() {
                    let c = src_col as i64 + i as i64 - 1;
                    sum += PixelF32::from_u8_weighted(view.at(c, r), kx * ky);
                }
            }
            *out = sum.to_u8();
        }
    });

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_util::{checkerboard, gradient};
    use crate::pixel::PixelU8;
    use approx::assert_abs_diff_eq;

    // ========================================================================
    // Geometry
    // ========================================================================

    #[test]
    fn test_dimensions_round() {
        assert_eq!(zoom_dimensions(10, 5, 1.5).unwrap(), (15, 8, 1.5));
        assert_eq!(zoom_dimensions(3, 3, 0.5).unwrap(), (2, 2, 0.5));
    }

    #[test]
    fn test_dimensions_never_zero() {
        let (w, h, mag) = zoom_dimensions(4, 2, 0.01).unwrap();
        assert!(w >= 1 && h >= 1);
        assert_abs_diff_eq!(mag, 0.5);
    }

    #[test]
    fn test_dimensions_reject_bad_magnification() {
        assert!(zoom_dimensions(4, 4, 0.0).is_err());
        assert!(zoom_dimensions(4, 4, -1.0).is_err());
        assert!(zoom_dimensions(4, 4, f32::NAN).is_err());
        assert!(matches!(
            zoom_dimensions(4, 4, f32::MAX),
            Err(FilterError::DegenerateGeometry(_))
        ));
    }

    // ========================================================================
    // Weight curves
    // ========================================================================

    #[test]
    fn test_curves_fix_ends_and_midpoint() {
        for curve in [WeightCurve::Linear, WeightCurve::InverseSquare, WeightCurve::InverseQuartic] {
            assert_abs_diff_eq!(curve.apply(0.0), 0.0);
            assert_abs_diff_eq!(curve.apply(1.0), 1.0);
            assert_abs_diff_eq!(curve.apply(0.5), 0.5);
        }
        // steeper curve pulls harder towards the nearer sample
        let sq = WeightCurve::InverseSquare.apply(0.25);
        let qu = WeightCurve::InverseQuartic.apply(0.25);
        assert!(qu < sq && sq < 0.25);
    }

    #[test]
    fn test_curve_names() {
        assert_eq!("Linear".parse::<WeightCurve>().unwrap(), WeightCurve::Linear);
        assert_eq!("quartic".parse::<WeightCurve>().unwrap(), WeightCurve::InverseQuartic);
        assert!("cubic".parse::<WeightCurve>().is_err());
    }

    // ========================================================================
    // Edge-adaptive zoom
    // ========================================================================

    #[test]
    fn test_identity_linear_zoom() {
        let mut input = gradient(6, 5);
        let expected = input.pixels().to_vec();
        let mut output = zoom(&mut input, 1.0, 0.0, WeightCurve::Linear).unwrap();
        for (a, b) in output.pixels().iter().zip(&expected) {
            for (x, y) in a.to_array().iter().zip(b.to_array()) {
                assert!((*x as i32 - y as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_zoom_uniform_image_stays_uniform() {
        let color = PixelU8::new(90, 150, 30, 200);
        let mut input = RasterBuffer::filled(4, 4, color).unwrap();
        for curve in [WeightCurve::Linear, WeightCurve::InverseSquare, WeightCurve::InverseQuartic] {
            let mut output = zoom(&mut input, 2.5, 0.5, curve).unwrap();
            assert_eq!((output.width(), output.height()), (10, 10));
            for p in output.pixels() {
                for (x, y) in p.to_array().iter().zip(color.to_array()) {
                    assert!((*x as i32 - y as i32).abs() <= 1, "{p:?}");
                }
            }
        }
    }

    #[test]
    fn test_zoom_carries_alpha() {
        let mut input = checkerboard(4, 4, 1);
        for p in input.pixels_mut() {
            p.a = 77;
        }
        let mut output = zoom(&mut input, 2.0, 0.1, WeightCurve::InverseQuartic).unwrap();
        assert!(output.pixels().iter().all(|p| (p.a as i32 - 77).abs() <= 1));
    }

    /// Two black columns then two white columns, two rows.
    fn step_edge() -> RasterBuffer {
        let pixels = (0..8)
            .map(|i| if i % 4 < 2 { PixelU8::BLACK } else { PixelU8::WHITE })
            .collect();
        RasterBuffer::from_pixels(4, 2, pixels).unwrap()
    }

    /// Red channel of the two output pixels that fall between columns 1 and 2 at 2x.
    fn transition(output: &mut RasterBuffer) -> (u8, u8) {
        let view = output.view().unwrap();
        (view.at(3, 1).r, view.at(4, 1).r)
    }

    #[test]
    fn test_edge_curve_pulls_towards_nearer_side() {
        let mut input = step_edge();
        let mut linear = zoom(&mut input, 2.0, 0.5, WeightCurve::Linear).unwrap();
        let mut quartic = zoom(&mut input, 2.0, 0.5, WeightCurve::InverseQuartic).unwrap();
        let mut square = zoom(&mut input, 2.0, 0.5, WeightCurve::InverseSquare).unwrap();

        // dx = 0.25 and 0.75 across the step
        assert_eq!(transition(&mut linear), (63, 191));
        let (q_dark, q_light) = transition(&mut quartic);
        let (s_dark, s_light) = transition(&mut square);
        assert!(q_dark < s_dark && s_dark < 63, "{q_dark} {s_dark}");
        assert!(q_light > s_light && s_light > 191, "{q_light} {s_light}");
        // t⁴ / (t⁴ + (1-t)⁴) at 0.25 is about 0.012
        assert!(q_dark <= 4 && q_light >= 251);
    }

    #[test]
    fn test_threshold_above_every_edge_ratio_is_bilinear() {
        // |a - b| <= 2 * max(|a - c|, |b - c|), so no ratio exceeds 2
        let mut input = step_edge();
        let mut linear = zoom(&mut input, 2.0, 0.0, WeightCurve::Linear).unwrap();
        let mut quartic = zoom(&mut input, 2.0, 2.0, WeightCurve::InverseQuartic).unwrap();
        assert_eq!(transition(&mut quartic), transition(&mut linear));
    }

    #[test]
    fn test_huge_magnification_fails_without_allocating() {
        let mut input = RasterBuffer::filled(4, 4, PixelU8::WHITE).unwrap();
        for curve in [WeightCurve::Linear, WeightCurve::InverseQuartic] {
            assert!(matches!(
                zoom(&mut input, 3.0e8, 0.0, curve),
                Err(FilterError::DegenerateGeometry(_))
            ));
        }
        assert!(matches!(
            zoom_bicubic(&mut input, 3.0e8, -0.5),
            Err(FilterError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_zoom_rejects_empty_and_bad_threshold() {
        assert_eq!(
            zoom(&mut RasterBuffer::new(), 2.0, 1.0, WeightCurve::Linear).unwrap_err(),
            FilterError::EmptyInput
        );
        let mut input = gradient(2, 2);
        assert!(zoom(&mut input, 2.0, -1.0, WeightCurve::InverseSquare).is_err());
    }

    // ========================================================================
    // Bicubic
    // ========================================================================

    #[test]
    fn test_bicubic_kernel_partition_of_unity() {
        for &dx in &[0.0f32, 0.25, 0.5, 0.9] {
            let sum: f32 = (0..4).map(|i| bicubic_weight(-0.5, (i as f32 - 1.0) - dx)).sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
        }
        assert_abs_diff_eq!(bicubic_weight(-0.5, 0.0), 1.0);
        assert_abs_diff_eq!(bicubic_weight(-0.5, 1.0), 0.0);
        assert_abs_diff_eq!(bicubic_weight(-0.5, 2.5), 0.0);
    }

    #[test]
    fn test_bicubic_identity() {
        let mut input = gradient(5, 4);
        let expected = input.pixels().to_vec();
        let mut output = zoom_bicubic(&mut input, 1.0, -0.5).unwrap();
        for (a, b) in output.pixels().iter().zip(&expected) {
            for (x, y) in a.to_array().iter().zip(b.to_array()) {
                assert!((*x as i32 - y as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_bicubic_rejects_out_of_range_a() {
        let mut input = gradient(2, 2);
        assert!(zoom_bicubic(&mut input, 2.0, 0.5).is_err());
        assert!(zoom_bicubic(&mut input, 2.0, -4.0).is_err());
        let output = zoom_bicubic(&mut input, 3.0, -3.0).unwrap();
        assert_eq!((output.width(), output.height()), (6, 6));
    }
}
