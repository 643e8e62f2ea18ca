//! Raster containers.
//!
//! [`RasterBuffer`] is the RGBA working image every filter consumes. It keeps
//! two interchangeable representations of the same pixels:
//!
//! - a flat byte stream, 4 bytes per pixel in R, G, B, A order (what codecs hand over)
//! - a structured `Vec<PixelU8>` (what filters index)
//!
//! Whichever exists is authoritative; the other is derived on first access and
//! cached. Mutable access through one representation drops the other, so the two
//! never disagree. [`RasterBuffer::clear_bytes`] and [`RasterBuffer::clear_pixels`]
//! drop a single cache to keep peak memory down when chaining filters.
//!
//! [`PixelView`] is the read-only, `Copy` window filters share across worker
//! threads. Its [`PixelView::at`] clamps both coordinates to the image (edge
//! extension), which is the boundary policy of every neighborhood filter.
//!
//! [`ChannelImage`] is the export unit: 1, 2 or 4 channels of 8-bit data plus
//! the layout tag a codec needs.

use std::ops::Range;

use ndarray::{Array3, ArrayView3};

use crate::config::{channel_order, ChannelOrder};
use crate::error::{FilterError, FilterResult};
use crate::pixel::{clamp, PixelF32, PixelU8};

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Checked `width * height * channels`.
pub(crate) fn checked_len(width: usize, height: usize, channels: usize) -> FilterResult<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| {
            FilterError::DegenerateGeometry(format!("{width}x{height}x{channels} overflows usize"))
        })
}

/// `len` copies of `value`, failing with `DegenerateGeometry` instead of aborting
/// when the allocation cannot be satisfied.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> FilterResult<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|e| {
        FilterError::DegenerateGeometry(format!("cannot allocate {len} elements: {e}"))
    })?;
    data.resize(len, value);
    Ok(data)
}

// ============================================================================
// Storage
// ============================================================================

/// Which representations a [`RasterBuffer`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Empty,
    Bytes,
    Pixels,
    Both,
}

#[derive(Debug, Clone, Default)]
enum Storage {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Pixels(Vec<PixelU8>),
    Both {
        bytes: Vec<u8>,
        pixels: Vec<PixelU8>,
    },
}

fn bytes_to_pixels(bytes: &[u8]) -> Vec<PixelU8> {
    bytes
        .chunks_exact(BYTES_PER_PIXEL)
        .map(|c| PixelU8::new(c[0], c[1], c[2], c[3]))
        .collect()
}

fn pixels_to_bytes(pixels: &[PixelU8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(pixels.len() * BYTES_PER_PIXEL);
    for p in pixels {
        bytes.extend_from_slice(&p.to_array());
    }
    bytes
}

// ============================================================================
// RasterBuffer
// ============================================================================

/// Width x height RGBA image, row-major.
#[derive(Debug, Clone, Default)]
pub struct RasterBuffer {
    width: usize,
    height: usize,
    storage: Storage,
}

impl RasterBuffer {
    /// Empty buffer; every filter rejects it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transparent-black buffer of the given size.
    ///
    /// Filters use this to size their destination before the parallel pass.
    pub fn allocate(width: usize, height: usize) -> FilterResult<Self> {
        let len = checked_len(width, height, 1)?;
        checked_len(width, height, BYTES_PER_PIXEL)?;
        let storage = if len == 0 {
            Storage::Empty
        } else {
            Storage::Pixels(try_filled(len, PixelU8::TRANSPARENT)?)
        };
        Ok(Self { width, height, storage })
    }

    /// Buffer filled with one color.
    pub fn filled(width: usize, height: usize, color: PixelU8) -> FilterResult<Self> {
        let mut buffer = Self::allocate(width, height)?;
        buffer.pixels_mut().fill(color);
        Ok(buffer)
    }

    /// Wrap structured pixels.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<PixelU8>) -> FilterResult<Self> {
        let expected = checked_len(width, height, 1)?;
        if pixels.len() != expected {
            return Err(FilterError::SizeMismatch(format!(
                "expected {} pixels for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        let storage = if pixels.is_empty() {
            Storage::Empty
        } else {
            Storage::Pixels(pixels)
        };
        Ok(Self { width, height, storage })
    }

    /// Wrap a decoded R, G, B, A byte stream.
    pub fn from_rgba_bytes(width: usize, height: usize, bytes: Vec<u8>) -> FilterResult<Self> {
        Self::from_bytes(width, height, bytes, ChannelOrder::Rgba)
    }

    /// Wrap a byte stream in the process-wide order (see [`channel_order`]).
    pub fn from_stream(width: usize, height: usize, bytes: Vec<u8>) -> FilterResult<Self> {
        Self::from_bytes(width, height, bytes, channel_order())
    }

    /// Wrap a decoded byte stream in the given channel order.
    ///
    /// A zero-length stream yields an empty buffer (which filters then reject)
    /// rather than an error.
    pub fn from_bytes(
        width: usize,
        height: usize,
        mut bytes: Vec<u8>,
        order: ChannelOrder,
    ) -> FilterResult<Self> {
        if bytes.is_empty() {
            return Ok(Self { width, height, storage: Storage::Empty });
        }
        let expected = checked_len(width, height, BYTES_PER_PIXEL)?;
        if bytes.len() != expected {
            return Err(FilterError::SizeMismatch(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                bytes.len()
            )));
        }
        if order == ChannelOrder::Bgra {
            for px in bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
                px.swap(0, 2);
            }
        }
        Ok(Self { width, height, storage: Storage::Bytes(bytes) })
    }

    /// Copy an `(height, width, 4)` array.
    pub fn from_array(array: ArrayView3<u8>) -> FilterResult<Self> {
        let (height, width, channels) = array.dim();
        if channels != BYTES_PER_PIXEL {
            return Err(FilterError::SizeMismatch(format!(
                "expected 4 channels, got {channels}"
            )));
        }
        let mut pixels = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                pixels.push(PixelU8::new(
                    array[[y, x, 0]],
                    array[[y, x, 1]],
                    array[[y, x, 2]],
                    array[[y, x, 3]],
                ));
            }
        }
        Self::from_pixels(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// True when there is nothing to filter.
    pub fn is_empty(&self) -> bool {
        self.len() == 0 || matches!(self.storage, Storage::Empty)
    }

    pub fn storage_kind(&self) -> StorageKind {
        match self.storage {
            Storage::Empty => StorageKind::Empty,
            Storage::Bytes(_) => StorageKind::Bytes,
            Storage::Pixels(_) => StorageKind::Pixels,
            Storage::Both { .. } => StorageKind::Both,
        }
    }

    /// Structured pixels, deriving them from the byte stream on first access.
    pub fn pixels(&mut self) -> &[PixelU8] {
        if let Storage::Bytes(bytes) = &mut self.storage {
            let bytes = std::mem::take(bytes);
            let pixels = bytes_to_pixels(&bytes);
            self.storage = Storage::Both { bytes, pixels };
        }
        match &self.storage {
            Storage::Empty => &[],
            Storage::Pixels(pixels) | Storage::Both { pixels, .. } => pixels,
            Storage::Bytes(_) => unreachable!("byte storage converted above"),
        }
    }

    /// Mutable structured pixels. Drops the byte cache.
    pub fn pixels_mut(&mut self) -> &mut [PixelU8] {
        self.storage = match std::mem::take(&mut self.storage) {
            Storage::Empty => Storage::Empty,
            Storage::Bytes(bytes) => Storage::Pixels(bytes_to_pixels(&bytes)),
            Storage::Pixels(pixels) | Storage::Both { pixels, .. } => Storage::Pixels(pixels),
        };
        match &mut self.storage {
            Storage::Pixels(pixels) => pixels,
            _ => &mut [],
        }
    }

    /// R, G, B, A byte stream, deriving it from the pixels on first access.
    pub fn bytes(&mut self) -> &[u8] {
        if let Storage::Pixels(pixels) = &mut self.storage {
            let pixels = std::mem::take(pixels);
            let bytes = pixels_to_bytes(&pixels);
            self.storage = Storage::Both { bytes, pixels };
        }
        match &self.storage {
            Storage::Empty => &[],
            Storage::Bytes(bytes) | Storage::Both { bytes, .. } => bytes,
            Storage::Pixels(_) => unreachable!("pixel storage converted above"),
        }
    }

    /// Mutable byte stream. Drops the pixel cache.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.storage = match std::mem::take(&mut self.storage) {
            Storage::Empty => Storage::Empty,
            Storage::Pixels(pixels) => Storage::Bytes(pixels_to_bytes(&pixels)),
            Storage::Bytes(bytes) | Storage::Both { bytes, .. } => Storage::Bytes(bytes),
        };
        match &mut self.storage {
            Storage::Bytes(bytes) => bytes,
            _ => &mut [],
        }
    }

    /// Drop the byte stream. If it was the only representation the buffer becomes empty.
    pub fn clear_bytes(&mut self) {
        self.storage = match std::mem::take(&mut self.storage) {
            Storage::Both { pixels, .. } | Storage::Pixels(pixels) => Storage::Pixels(pixels),
            Storage::Bytes(_) | Storage::Empty => Storage::Empty,
        };
    }

    /// Drop the structured pixels. If they were the only representation the buffer becomes empty.
    pub fn clear_pixels(&mut self) {
        self.storage = match std::mem::take(&mut self.storage) {
            Storage::Both { bytes, .. } | Storage::Bytes(bytes) => Storage::Bytes(bytes),
            Storage::Pixels(_) | Storage::Empty => Storage::Empty,
        };
    }

    /// Release all pixel memory and reset the dimensions.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Read-only view for filters. Fails on an empty buffer.
    pub fn view(&mut self) -> FilterResult<PixelView<'_>> {
        if self.is_empty() {
            return Err(FilterError::EmptyInput);
        }
        let (width, height) = (self.width, self.height);
        Ok(PixelView { width, height, pixels: self.pixels() })
    }

    /// Clamped pixel lookup, see [`PixelView::at`].
    pub fn at(&mut self, column: i64, row: i64) -> FilterResult<PixelU8> {
        Ok(self.view()?.at(column, row))
    }

    /// Byte stream in the process-wide order (see [`channel_order`]).
    pub fn to_stream(&mut self) -> Vec<u8> {
        self.to_bytes(channel_order())
    }

    /// Byte stream in the requested channel order.
    pub fn to_bytes(&mut self, order: ChannelOrder) -> Vec<u8> {
        let mut bytes = self.bytes().to_vec();
        if order == ChannelOrder::Bgra {
            for px in bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
                px.swap(0, 2);
            }
        }
        bytes
    }

    /// Export unit with full RGBA layout.
    pub fn export(&mut self, order: ChannelOrder) -> ChannelImage {
        ChannelImage {
            width: self.width,
            height: self.height,
            layout: ChannelLayout::Rgba,
            data: self.to_bytes(order),
        }
    }

    /// Convert into an `(height, width, 4)` array.
    pub fn into_array(mut self) -> FilterResult<Array3<u8>> {
        let (width, height) = (self.width, self.height);
        let bytes = match std::mem::take(&mut self.storage) {
            Storage::Empty => Vec::new(),
            Storage::Bytes(bytes) | Storage::Both { bytes, .. } => bytes,
            Storage::Pixels(pixels) => pixels_to_bytes(&pixels),
        };
        let (width, height) = if bytes.is_empty() { (0, 0) } else { (width, height) };
        Array3::from_shape_vec((height, width, BYTES_PER_PIXEL), bytes)
            .map_err(|e| FilterError::SizeMismatch(e.to_string()))
    }
}

// ============================================================================
// PixelView
// ============================================================================

/// Shared read-only window over a [`RasterBuffer`]'s pixels.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    width: usize,
    height: usize,
    pixels: &'a [PixelU8],
}

impl<'a> PixelView<'a> {
    /// View over raw pixels; `pixels.len()` must be `width * height`.
    pub fn new(width: usize, height: usize, pixels: &'a [PixelU8]) -> FilterResult<Self> {
        if width * height == 0 || pixels.is_empty() {
            return Err(FilterError::EmptyInput);
        }
        if pixels.len() != width * height {
            return Err(FilterError::SizeMismatch(format!(
                "expected {} pixels, got {}",
                width * height,
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &'a [PixelU8] {
        self.pixels
    }

    /// One row of pixels.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [PixelU8] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Pixel at `(column, row)` with both coordinates clamped into the image.
    #[inline]
    pub fn at(&self, column: i64, row: i64) -> PixelU8 {
        let x = clamp(column, 0, self.width as i64 - 1) as usize;
        let y = clamp(row, 0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width + x]
    }

    /// [`PixelView::at`] converted to 0.0-1.0 floats.
    #[inline]
    pub fn at_f32(&self, column: i64, row: i64) -> PixelF32 {
        PixelF32::from_u8(self.at(column, row))
    }
}

// ============================================================================
// ChannelImage
// ============================================================================

/// Channel layout of an export unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// R, G, B, A
    Rgba,
    /// Single luminance channel
    Gray,
    /// Luminance + alpha
    GrayAlpha,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Rgba => 4,
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
        }
    }
}

/// 8-bit image data plus its layout, ready for a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelImage {
    pub width: usize,
    pub height: usize,
    pub layout: ChannelLayout,
    pub data: Vec<u8>,
}

impl ChannelImage {
    /// Zeroed image.
    pub fn new(width: usize, height: usize, layout: ChannelLayout) -> FilterResult<Self> {
        let len = checked_len(width, height, layout.channels())?;
        Ok(Self { width, height, layout, data: try_filled(len, 0)? })
    }

    /// Bits per channel; always 8.
    pub fn bit_depth(&self) -> u8 {
        8
    }

    pub fn row_bytes(&self) -> usize {
        self.width * self.layout.channels()
    }

    /// Value of `channel` at `(x, y)`.
    pub fn get(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[y * self.row_bytes() + x * self.layout.channels() + channel]
    }

    /// Split the rows into consecutive bands of at most `max_bytes` each.
    ///
    /// Fails with [`FilterError::RangeOverflow`] when a single row is already too large.
    pub fn row_bands(&self, max_bytes: usize) -> FilterResult<Vec<Range<usize>>> {
        if max_bytes == 0 {
            return Err(FilterError::InvalidParameter("max_bytes must be > 0".into()));
        }
        let row_bytes = self.row_bytes();
        if self.data.is_empty() || row_bytes == 0 {
            return Ok(Vec::new());
        }
        if row_bytes > max_bytes {
            return Err(FilterError::RangeOverflow {
                required: self.data.len().div_ceil(max_bytes),
                limit: max_bytes,
            });
        }
        let rows_per_band = max_bytes / row_bytes;
        Ok((0..self.height)
            .step_by(rows_per_band)
            .map(|start| start..(start + rows_per_band).min(self.height))
            .collect())
    }

    /// Number of export units needed when each holds at most `max_bytes`.
    pub fn required_splits(&self, max_bytes: usize) -> FilterResult<usize> {
        Ok(self.row_bands(max_bytes)?.len())
    }

    /// Fail with [`FilterError::RangeOverflow`] unless the data fits one unit.
    pub fn ensure_single_unit(&self, max_bytes: usize) -> FilterResult<()> {
        let required = self.required_splits(max_bytes)?;
        if required > 1 {
            return Err(FilterError::RangeOverflow { required, limit: max_bytes });
        }
        Ok(())
    }

    /// Copy one band of rows into its own image.
    pub fn slice_rows(&self, rows: Range<usize>) -> ChannelImage {
        let row_bytes = self.row_bytes();
        ChannelImage {
            width: self.width,
            height: rows.len(),
            layout: self.layout,
            data: self.data[rows.start * row_bytes..rows.end * row_bytes].to_vec(),
        }
    }

    /// Convert into an `(height, width, channels)` array.
    pub fn into_array(self) -> FilterResult<Array3<u8>> {
        let channels = self.layout.channels();
        Array3::from_shape_vec((self.height, self.width, channels), self.data)
            .map_err(|e| FilterError::SizeMismatch(e.to_string()))
    }
}
