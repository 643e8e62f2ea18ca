//! Grayscale conversion and per-channel split.
//!
//! ## Supported Formats
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`grayscale`] | RGBA8 | Gray8, gamma-aware luma |
//! | [`channel_split`] | RGBA8 | three Gray8 images (R, G, B) |

use tracing::debug;

use crate::error::FilterResult;
use crate::luma::gray_color;
use crate::parallel::executor;
use crate::pixel::PixelU8;
use crate::raster::{ChannelImage, ChannelLayout, RasterBuffer};

/// Gamma-aware single-channel grayscale.
///
/// # Arguments
/// * `input` - Source image
///
/// # Returns
/// Gray8 image of the same size
pub fn grayscale(input: &mut RasterBuffer) -> FilterResult<ChannelImage> {
    let view = input.view()?;
    let width = view.width();
    debug!(width, height = view.height(), "grayscale");

    let mut output = ChannelImage::new(width, view.height(), ChannelLayout::Gray)?;
    executor().rows(&mut output.data, width, |y, row| {
        for (g, &p) in row.iter_mut().zip(view.row(y)) {
            *g = gray_color(p);
        }
    });
    Ok(output)
}

/// Split into one Gray8 image per color channel.
///
/// # Returns
/// `[red, green, blue]`
pub fn channel_split(input: &mut RasterBuffer) -> FilterResult<[ChannelImage; 3]> {
    let view = input.view()?;
    let (width, height) = (view.width(), view.height());
    debug!(width, height, "channel_split");

    let pick = |f: fn(PixelU8) -> u8| -> FilterResult<ChannelImage> {
        let mut image = ChannelImage::new(width, height, ChannelLayout::Gray)?;
        executor().rows(&mut image.data, width, |y, row| {
            for (v, &p) in row.iter_mut().zip(view.row(y)) {
                *v = f(p);
            }
        });
        Ok(image)
    };

    Ok([pick(|p| p.r)?, pick(|p| p.g)?, pick(|p| p.b)?])
}
