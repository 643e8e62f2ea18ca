//! Filter library.
//!
//! ## Supported Formats
//!
//! Every filter consumes RGBA8 [`RasterBuffer`](crate::raster::RasterBuffer)s:
//!
//! | Output | Layout | Produced by |
//! |--------|--------|-------------|
//! | RGBA8 buffer | 4 channels, 0-255 | zoom, sharpen, color adjust, sobel, blur, mosaic, rgb 3x3, scramble |
//! | Gray8 image | 1 channel, 0-255 | grayscale, channel split, binarization, quaternization, hexadecimalization |
//! | GrayAlpha8 image | 2 channels, 0-255 | mixed pictures |
//!
//! ## Architecture
//!
//! All filters follow these principles:
//! - **Reject empty input** - an empty source fails with `EmptyInput` before any work
//! - **Validate parameters up front** - out-of-range scalars fail with `InvalidParameter`
//! - **Size first, then fan out** - the destination is allocated before the row pass starts
//! - **Row-parallel** - rows (or row bands) are dispatched on the shared [`executor`](crate::parallel::executor)
//! - **Clamp-to-edge** - neighborhoods read through [`PixelView::at`](crate::raster::PixelView::at)
//! - **Alpha preservation** - alpha is carried over unless the filter defines it
//!
//! In-place filters take `&mut RasterBuffer` and return `FilterResult<()>`; the
//! rest return a new buffer or [`ChannelImage`](crate::raster::ChannelImage).

pub mod blend;
pub mod blur;
pub mod color_adjust;
pub mod edge;
pub mod grayscale;
pub mod scramble;
pub mod sharpen;
pub mod stylize;
pub mod zoom;

#[cfg(test)]
pub(crate) mod test_util {
    use crate::pixel::PixelU8;
    use crate::raster::RasterBuffer;

    /// Opaque image whose channels vary with position.
    pub fn gradient(width: usize, height: usize) -> RasterBuffer {
        let pixels = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    PixelU8::new((x * 40) as u8, (y * 40) as u8, ((x + y) * 20) as u8, 255)
                })
            })
            .collect();
        RasterBuffer::from_pixels(width, height, pixels).unwrap()
    }

    /// Black and white squares of side `cell`.
    pub fn checkerboard(width: usize, height: usize, cell: usize) -> RasterBuffer {
        let pixels = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    if (x / cell + y / cell) % 2 == 0 {
                        PixelU8::WHITE
                    } else {
                        PixelU8::BLACK
                    }
                })
            })
            .collect();
        RasterBuffer::from_pixels(width, height, pixels).unwrap()
    }
}
