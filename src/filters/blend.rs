//! Mixed pictures: two images folded into one gray + alpha image.
//!
//! The "outside" image is what shows over a white background, the "inside"
//! image what shows over a black one. Each policy maps the outside luma into
//! an upper band and the inside luma into a lower band; the alpha and gray that
//! reproduce both under compositing are then solved per pixel:
//!
//! ```text
//! alpha = 255 - out + in
//! gray  = min(255, in * 256 / alpha)      (255 when alpha == 0)
//! ```

use std::str::FromStr;

use tracing::debug;

use crate::error::{FilterError, FilterResult};
use crate::luma::fast_gray;
use crate::parallel::executor;
use crate::raster::{ChannelImage, ChannelLayout, RasterBuffer};

/// How the two lumas share the 0-255 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendPolicy {
    /// Outside 128-255, inside 0-127.
    #[default]
    Even,
    /// Outside 171-255, inside 0-170.
    InsideTwoThirds,
    /// Outside 86-255, inside 0-85.
    OutsideTwoThirds,
    /// Outside 192-255, inside 0-191.
    InsideThreeQuarters,
}

impl BlendPolicy {
    /// Map the two fast lumas into their bands, returning `(out, in)`.
    #[inline]
    pub fn split(self, outside: u16, inside: u16) -> (u8, u8) {
        let (out, inn) = match self {
            BlendPolicy::Even => (128 | (outside >> 1), inside >> 1),
            BlendPolicy::InsideTwoThirds => (171 + outside / 3, (inside << 1) / 3),
            BlendPolicy::OutsideTwoThirds => (86 + (outside << 1) / 3, inside / 3),
            BlendPolicy::InsideThreeQuarters => (192 + (outside >> 2), (inside * 3) >> 2),
        };
        // the top of the outside band can reach 256
        (out.min(255) as u8, inn as u8)
    }
}

impl FromStr for BlendPolicy {
    type Err = FilterError;

    /// `even`, `inside_two_thirds`, `outside_two_thirds` or `inside_three_quarters`.
    fn from_str(name: &str) -> FilterResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "even" => Ok(BlendPolicy::Even),
            "inside_two_thirds" => Ok(BlendPolicy::InsideTwoThirds),
            "outside_two_thirds" => Ok(BlendPolicy::OutsideTwoThirds),
            "inside_three_quarters" => Ok(BlendPolicy::InsideThreeQuarters),
            other => Err(FilterError::InvalidParameter(format!(
                "unknown blend policy '{other}'"
            ))),
        }
    }
}

/// Gray and alpha that show `out` over white and `inside` over black.
#[inline]
pub fn solve_gray_alpha(out: u8, inside: u8) -> (u8, u8) {
    let alpha = (!out).wrapping_add(inside);
    let gray = if alpha != 0 {
        (((inside as u32) << 8) / alpha as u32).min(255) as u8
    } else {
        255
    };
    (gray, alpha)
}

/// Combine two images into a GrayAlpha8 image.
///
/// The output covers the overlap of both inputs (`min` of each dimension).
///
/// # Arguments
/// * `outside` - Image visible on a light background
/// * `inside` - Image visible on a dark background
/// * `policy` - How the luma range is shared
pub fn mixed_pictures(
    outside: &mut RasterBuffer,
    inside: &mut RasterBuffer,
    policy: BlendPolicy,
) -> FilterResult<ChannelImage> {
    let outer = outside.view()?;
    let inner = inside.view()?;
    let width = outer.width().min(inner.width());
    let height = outer.height().min(inner.height());
    debug!(width, height, ?policy, "mixed_pictures");

    let mut output = ChannelImage::new(width, height, ChannelLayout::GrayAlpha)?;
    executor().rows(&mut output.data, width * 2, |y, row| {
        let y = y as i64;
        for (x, px) in row.chunks_exact_mut(2).enumerate() {
            let x = x as i64;
            let (out, inn) = policy.split(fast_gray(outer.at(x, y)), fast_gray(inner.at(x, y)));
            let (gray, alpha) = solve_gray_alpha(out, inn);
            px[0] = gray;
            px[1] = alpha;
        }
    });

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelU8;

    const POLICIES: [BlendPolicy; 4] = [
        BlendPolicy::Even,
        BlendPolicy::InsideTwoThirds,
        BlendPolicy::OutsideTwoThirds,
        BlendPolicy::InsideThreeQuarters,
    ];

    #[test]
    fn test_bands_do_not_overlap() {
        for policy in POLICIES {
            let (out_low, _) = policy.split(0, 0);
            let (_, in_high) = policy.split(255, 255);
            assert!(out_low > in_high, "{policy:?}");
            let (out_high, _) = policy.split(255, 0);
            assert_eq!(out_high, 255, "{policy:?}");
        }
    }

    #[test]
    fn test_policy_values() {
        assert_eq!(BlendPolicy::Even.split(200, 100), (228, 50));
        assert_eq!(BlendPolicy::InsideTwoThirds.split(90, 90), (201, 60));
        assert_eq!(BlendPolicy::OutsideTwoThirds.split(90, 90), (146, 30));
        assert_eq!(BlendPolicy::InsideThreeQuarters.split(100, 100), (217, 75));
    }

    #[test]
    fn test_policy_names() {
        assert_eq!("even".parse::<BlendPolicy>().unwrap(), BlendPolicy::Even);
        assert_eq!(
            "Inside_Three_Quarters".parse::<BlendPolicy>().unwrap(),
            BlendPolicy::InsideThreeQuarters
        );
        assert!("half".parse::<BlendPolicy>().is_err());
    }

    #[test]
    fn test_solve_gray_alpha() {
        // white over white and black over black: nothing to draw
        assert_eq!(solve_gray_alpha(255, 0), (255, 0));
        assert_eq!(solve_gray_alpha(128, 0), (0, 127));
        // gray saturates instead of wrapping
        assert_eq!(solve_gray_alpha(255, 100), (255, 100));
        assert_eq!(solve_gray_alpha(200, 50), (121, 105));
    }

    #[test]
    fn test_output_covers_overlap() {
        let mut a = RasterBuffer::filled(4, 2, PixelU8::WHITE).unwrap();
        let mut b = RasterBuffer::filled(3, 5, PixelU8::BLACK).unwrap();
        let out = mixed_pictures(&mut a, &mut b, BlendPolicy::Even).unwrap();
        assert_eq!((out.width, out.height), (3, 2));
        assert_eq!(out.layout, ChannelLayout::GrayAlpha);
        // out = 255, in = 0: alpha 0
        assert!(out.data.chunks_exact(2).all(|px| px == [255, 0]));
    }

    #[test]
    fn test_rejects_empty_either_side() {
        let mut a = RasterBuffer::filled(2, 2, PixelU8::WHITE).unwrap();
        assert_eq!(
            mixed_pictures(&mut a, &mut RasterBuffer::new(), BlendPolicy::Even).unwrap_err(),
            FilterError::EmptyInput
        );
        assert!(mixed_pictures(&mut RasterBuffer::new(), &mut a, BlendPolicy::Even).is_err());
    }
}
