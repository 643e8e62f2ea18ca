//! Surface blur (edge-preserving).
//!
//! Every neighbor in the square window of the given radius contributes with
//!
//! ```text
//! weight = max(0, 1 - |mean(neighbor.rgb - center.rgb)| * 0.4 / threshold)
//! ```
//!
//! so pixels that differ strongly from the center (across an edge) drop out of
//! the average while similar pixels are smoothed. Borders are clamped to the
//! edge and the center alpha is kept.

use tracing::debug;

use crate::error::{ensure_finite, FilterError, FilterResult};
use crate::parallel::executor;
use crate::pixel::PixelF32;
use crate::raster::RasterBuffer;

/// Surface blur.
///
/// # Arguments
/// * `input` - Source image
/// * `radius` - Window half-size in pixels (0 = copy)
/// * `threshold` - Color distance (0.0-1.0 scale) that still blends; must be > 0
///
/// # Returns
/// Blurred image of the same size
pub fn surface_blur(input: &mut RasterBuffer, radius: usize, threshold: f32) -> FilterResult<RasterBuffer> {
    let view = input.view()?;
    ensure_finite("threshold", threshold)?;
    if threshold <= 0.0 {
        return Err(FilterError::InvalidParameter(format!(
            "threshold must be > 0, got {threshold}"
        )));
    }
    let width = view.width();
    debug!(width, height = view.height(), radius, threshold, "surface_blur");

    let falloff = 0.40 / threshold;
    let r = radius as i64;

    let mut output = RasterBuffer::allocate(width, view.height())?;
    executor().rows(output.pixels_mut(), width, |y, row| {
        let y = y as i64;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            let center = view.at_f32(x, y);

            let mut acc = PixelF32::ZERO;
            let mut total = 0.0f32;
            for dy in -r..=r {
                for dx in -r..=r {
                    let p = view.at_f32(x + dx, y + dy);
                    let distance = ((p - center).rgb_sum() / 3.0).abs();
                    let weight = (1.0 - distance * falloff).max(0.0);
                    total += weight;
                    acc += p * weight;
                }
            }

            let mut blurred = if total > f32::EPSILON { acc / total } else { center };
            blurred.set_a(center.a());
            *out = blurred.to_u8();
        }
    });

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_util::{checkerboard, gradient};
    use crate::pixel::PixelU8;

    #[test]
    fn test_radius_zero_is_copy() {
        let mut img = gradient(4, 3);
        let expected = img.pixels().to_vec();
        let mut out = surface_blur(&mut img, 0, 0.5).unwrap();
        for (p, q) in out.pixels().iter().zip(&expected) {
            for (a, b) in p.to_array().iter().zip(q.to_array()) {
                assert!((*a as i32 - b as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_hard_edge_is_preserved() {
        // distance between black and white is 1.0, weight clamps to 0
        let mut img = checkerboard(6, 6, 3);
        let mut out = surface_blur(&mut img, 2, 0.2).unwrap();
        let view = out.view().unwrap();
        assert_eq!(view.at(2, 2), PixelU8::WHITE);
        assert_eq!(view.at(3, 2), PixelU8::BLACK);
    }

    #[test]
    fn test_similar_pixels_are_smoothed() {
        let pixels = vec![
            PixelU8::gray(100),
            PixelU8::gray(110),
            PixelU8::gray(120),
        ];
        let mut img = RasterBuffer::from_pixels(3, 1, pixels).unwrap();
        let mut out = surface_blur(&mut img, 1, 1.0).unwrap();
        let middle = out.pixels()[1];
        assert!((middle.r as i32 - 110).abs() <= 1);
        // the left pixel moves towards its neighbors
        assert!(out.pixels()[0].r > 100);
    }

    #[test]
    fn test_keeps_alpha() {
        let mut img = gradient(3, 3);
        for (i, p) in img.pixels_mut().iter_mut().enumerate() {
            p.a = 20 * i as u8;
        }
        let expected: Vec<u8> = img.pixels().iter().map(|p| p.a).collect();
        let mut out = surface_blur(&mut img, 1, 0.5).unwrap();
        let alpha: Vec<u8> = out.pixels().iter().map(|p| p.a).collect();
        for (a, b) in alpha.iter().zip(&expected) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let mut img = gradient(2, 2);
        assert!(surface_blur(&mut img, 1, 0.0).is_err());
        assert!(surface_blur(&mut img, 1, f32::NAN).is_err());
        assert_eq!(
            surface_blur(&mut RasterBuffer::new(), 1, 0.5).unwrap_err(),
            FilterError::EmptyInput
        );
    }
}
