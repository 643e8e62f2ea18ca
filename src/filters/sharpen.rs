//! Sharpen filters: Laplace 3x3, Gauss-Laplace 5x5.
//!
//! Both kernels are derived from a single `strength` so the weights always sum
//! to one and flat regions keep their brightness. Taps with the same weight are
//! summed first and scaled once.
//!
//! ```text
//! Laplace 3x3 (f = -0.01 * strength, d = f / sqrt(2)):
//!   d  f  d
//!   f  c  f      c = 1 - 4 * (1 + 1/sqrt(2)) * f
//!   d  f  d
//!
//! Gauss-Laplace 5x5 (f = -0.002 * strength):
//!   f  2f  2f  2f  f
//!   2f  0 -4f   0  2f
//!   2f -4f  c  -4f 2f     c = 1 - 12 * f
//!   2f  0 -4f   0  2f
//!   f  2f  2f  2f  f
//! ```
//!
//! Borders are clamped to the edge. Alpha is taken from the center pixel.

use tracing::debug;

use crate::error::{ensure_finite, FilterResult};
use crate::parallel::executor;
use crate::pixel::PixelF32;
use crate::raster::RasterBuffer;

const HALF_ROOT: f32 = std::f32::consts::FRAC_1_SQRT_2;

const CROSS_1: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
const DIAGONAL_1: [(i64, i64); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];
const CORNERS_2: [(i64, i64); 4] = [(-2, -2), (2, -2), (-2, 2), (2, 2)];
const EDGES_2: [(i64, i64); 12] = [
    (-1, -2),
    (0, -2),
    (1, -2),
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (2, -1),
    (2, 0),
    (2, 1),
    (-1, 2),
    (0, 2),
    (1, 2),
];

/// A group of taps sharing one weight.
struct TapGroup {
    offsets: &'static [(i64, i64)],
    weight: f32,
}

fn convolve(input: &mut RasterBuffer, groups: &[TapGroup], center: f32) -> FilterResult<RasterBuffer> {
    let view = input.view()?;
    let width = view.width();
    let mut output = RasterBuffer::allocate(width, view.height())?;

    executor().rows(output.pixels_mut(), width, |y, row| {
        let y = y as i64;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            let this = view.at(x, y);
            let mut acc = PixelF32::from_u8_weighted(this, center);
            for group in groups {
                let mut sum = PixelF32::ZERO;
                for &(dx, dy) in group.offsets {
                    sum += view.at_f32(x + dx, y + dy);
                }
                acc += sum * group.weight;
            }
            *out = acc.to_u8().with_alpha(this.a);
        }
    });

    Ok(output)
}

/// Sharpen with the 3x3 Laplace kernel.
///
/// # Arguments
/// * `input` - Source image
/// * `strength` - Sharpening amount (0 = unchanged, 100 = a full -1 cross)
pub fn sharpen_laplace_3x3(input: &mut RasterBuffer, strength: f32) -> FilterResult<RasterBuffer> {
    ensure_finite("strength", strength)?;
    debug!(width = input.width(), height = input.height(), strength, "sharpen_laplace_3x3");

    let near = -0.01 * strength;
    let far = near * HALF_ROOT;
    let center = 1.0 - 4.0 * (1.0 + HALF_ROOT) * near;
    convolve(
        input,
        &[
            TapGroup { offsets: &CROSS_1, weight: near },
            TapGroup { offsets: &DIAGONAL_1, weight: far },
        ],
        center,
    )
}

/// Sharpen with the 5x5 Gauss-Laplace kernel.
///
/// # Arguments
/// * `input` - Source image
/// * `strength` - Sharpening amount (0 = unchanged)
pub fn sharpen_gauss_laplace_5x5(input: &mut RasterBuffer, strength: f32) -> FilterResult<RasterBuffer> {
    ensure_finite("strength", strength)?;
    debug!(width = input.width(), height = input.height(), strength, "sharpen_gauss_laplace_5x5");

    let factor = -0.002 * strength;
    convolve(
        input,
        &[
            TapGroup { offsets: &CORNERS_2, weight: factor },
            TapGroup { offsets: &EDGES_2, weight: 2.0 * factor },
            TapGroup { offsets: &CROSS_1, weight: -4.0 * factor },
        ],
        1.0 - 12.0 * factor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::filters::test_util::{checkerboard, gradient};
    use crate::pixel::PixelU8;

    fn assert_close(a: &[PixelU8], b: &[PixelU8]) {
        for (p, q) in a.iter().zip(b) {
            for (x, y) in p.to_array().iter().zip(q.to_array()) {
                assert!((*x as i32 - y as i32).abs() <= 1, "{p:?} vs {q:?}");
            }
        }
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let mut input = gradient(5, 5);
        let expected = input.pixels().to_vec();
        let mut out3 = sharpen_laplace_3x3(&mut input, 0.0).unwrap();
        let mut out5 = sharpen_gauss_laplace_5x5(&mut input, 0.0).unwrap();
        assert_close(out3.pixels(), &expected);
        assert_close(out5.pixels(), &expected);
    }

    #[test]
    fn test_flat_region_keeps_brightness() {
        let color = PixelU8::new(120, 60, 200, 255);
        let mut input = RasterBuffer::filled(6, 6, color).unwrap();
        let mut out3 = sharpen_laplace_3x3(&mut input, 80.0).unwrap();
        let mut out5 = sharpen_gauss_laplace_5x5(&mut input, 80.0).unwrap();
        assert_close(out3.pixels(), &[color; 36]);
        assert_close(out5.pixels(), &[color; 36]);
    }

    #[test]
    fn test_sharpen_increases_contrast() {
        let mut input = checkerboard(6, 6, 3);
        let mut output = sharpen_laplace_3x3(&mut input, 50.0).unwrap();
        // dark pixel next to the white block gets darker (clamped at 0)
        let view = output.view().unwrap();
        assert_eq!(view.at(3, 0).r, 0);
        // white pixel stays saturated
        assert_eq!(view.at(2, 0).r, 255);
    }

    #[test]
    fn test_sharpen_keeps_center_alpha() {
        let mut input = checkerboard(4, 4, 1);
        for (i, p) in input.pixels_mut().iter_mut().enumerate() {
            p.a = (i * 10) as u8;
        }
        let expected: Vec<u8> = input.pixels().iter().map(|p| p.a).collect();
        let mut output = sharpen_gauss_laplace_5x5(&mut input, 100.0).unwrap();
        let alpha: Vec<u8> = output.pixels().iter().map(|p| p.a).collect();
        assert_eq!(alpha, expected);
    }

    #[test]
    fn test_sharpen_rejects() {
        assert_eq!(
            sharpen_laplace_3x3(&mut RasterBuffer::new(), 1.0).unwrap_err(),
            FilterError::EmptyInput
        );
        assert!(sharpen_gauss_laplace_5x5(&mut gradient(2, 2), f32::INFINITY).is_err());
    }
}
