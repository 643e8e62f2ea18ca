//! Pixel value types and the small numeric helpers shared by all filters.
//!
//! - [`PixelU8`]: 8 bits per channel RGBA, packable into one `u32` word
//! - [`PixelF32`]: four `f32` lanes, read as RGBA, HSLA or XYZW depending on the caller
//!
//! Float pixels are normally in 0.0-1.0 per lane. Convolution sums may leave that
//! range for a while; [`PixelF32::to_u8`] clamps to 0-255 before truncating.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// Largest 8-bit channel value as float.
pub const MAX_CHANNEL: f32 = 255.0;

/// Factor mapping an 8-bit channel to 0.0-1.0.
pub const CHANNEL_TO_UNIT: f32 = 1.0 / MAX_CHANNEL;

// ============================================================================
// Generic helpers
// ============================================================================

/// Clamp `value` into `[min, max]`.
///
/// Works for any partially ordered type. `min > max` is a logic error.
#[inline]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    assert!(min <= max, "clamp range is inverted");
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation `a + (b - a) * t` with `t` in 0.0-1.0.
#[inline]
pub fn lerp<T>(a: T, b: T, t: f32) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    debug_assert!((0.0..=1.0).contains(&t), "lerp weight out of range");
    a + (b - a) * t
}

/// Largest of three values.
#[inline]
pub fn max3<T: PartialOrd>(a: T, b: T, c: T) -> T {
    let ab = if a > b { a } else { b };
    if ab > c {
        ab
    } else {
        c
    }
}

/// Smallest of three values.
#[inline]
pub fn min3<T: PartialOrd>(a: T, b: T, c: T) -> T {
    let ab = if a < b { a } else { b };
    if ab < c {
        ab
    } else {
        c
    }
}

// ============================================================================
// PixelU8
// ============================================================================

/// RGBA pixel with 8 bits per channel.
///
/// The packed form used for equality and XOR is little-endian: R in the low byte,
/// A in the high byte, independent of host endianness.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelU8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PixelU8 {
    pub const BLACK: PixelU8 = PixelU8::new(0, 0, 0, 255);
    pub const WHITE: PixelU8 = PixelU8::new(255, 255, 255, 255);
    pub const TRANSPARENT: PixelU8 = PixelU8::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque gray pixel.
    #[inline]
    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value, 255)
    }

    /// Pack into a 32-bit word (R lowest byte).
    #[inline]
    pub const fn to_bits(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    /// Unpack a word produced by [`PixelU8::to_bits`].
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        let [r, g, b, a] = bits.to_le_bytes();
        Self::new(r, g, b, a)
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn from_array(channels: [u8; 4]) -> Self {
        Self::new(channels[0], channels[1], channels[2], channels[3])
    }

    /// Color negative; alpha is left alone.
    #[inline]
    pub const fn inverted(self) -> Self {
        Self::new(!self.r, !self.g, !self.b, self.a)
    }

    /// Copy with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }
}

impl From<[u8; 4]> for PixelU8 {
    fn from(channels: [u8; 4]) -> Self {
        Self::from_array(channels)
    }
}

// ============================================================================
// PixelF32
// ============================================================================

/// Four `f32` lanes.
///
/// Lane 0..3 are R, G, B, A for color work, H, S, L, alpha for HSL work and
/// X, Y, Z, W for kernel weights. The accessors only name the lanes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelF32 {
    pub lanes: [f32; 4],
}

impl PixelF32 {
    pub const ZERO: PixelF32 = PixelF32::splat(0.0);
    pub const ONE: PixelF32 = PixelF32::splat(1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { lanes: [x, y, z, w] }
    }

    /// Opaque color (alpha 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same value in every lane.
    #[inline]
    pub const fn splat(value: f32) -> Self {
        Self { lanes: [value; 4] }
    }

    /// 8-bit pixel mapped to 0.0-1.0.
    #[inline]
    pub fn from_u8(pixel: PixelU8) -> Self {
        Self::new(
            pixel.r as f32 * CHANNEL_TO_UNIT,
            pixel.g as f32 * CHANNEL_TO_UNIT,
            pixel.b as f32 * CHANNEL_TO_UNIT,
            pixel.a as f32 * CHANNEL_TO_UNIT,
        )
    }

    /// 8-bit pixel mapped to 0.0-1.0 and multiplied by `weight`.
    #[inline]
    pub fn from_u8_weighted(pixel: PixelU8, weight: f32) -> Self {
        Self::from_u8(pixel) * weight
    }

    /// Back to 8 bits: scale by 255, clamp to 0-255, truncate.
    #[inline]
    pub fn to_u8(self) -> PixelU8 {
        let q = |v: f32| clamp(v * MAX_CHANNEL, 0.0, MAX_CHANNEL) as u8;
        // NaN passes clamp untouched and saturates to 0 in the cast
        PixelU8::new(q(self.lanes[0]), q(self.lanes[1]), q(self.lanes[2]), q(self.lanes[3]))
    }

    // Color view
    #[inline]
    pub fn r(&self) -> f32 {
        self.lanes[0]
    }
    #[inline]
    pub fn g(&self) -> f32 {
        self.lanes[1]
    }
    #[inline]
    pub fn b(&self) -> f32 {
        self.lanes[2]
    }
    #[inline]
    pub fn a(&self) -> f32 {
        self.lanes[3]
    }
    #[inline]
    pub fn set_a(&mut self, a: f32) {
        self.lanes[3] = a;
    }

    // HSL view
    #[inline]
    pub fn h(&self) -> f32 {
        self.lanes[0]
    }
    #[inline]
    pub fn s(&self) -> f32 {
        self.lanes[1]
    }
    #[inline]
    pub fn l(&self) -> f32 {
        self.lanes[2]
    }
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.lanes[3]
    }

    // Vector view
    #[inline]
    pub fn x(&self) -> f32 {
        self.lanes[0]
    }
    #[inline]
    pub fn y(&self) -> f32 {
        self.lanes[1]
    }
    #[inline]
    pub fn z(&self) -> f32 {
        self.lanes[2]
    }
    #[inline]
    pub fn w(&self) -> f32 {
        self.lanes[3]
    }

    /// Sum of the first three lanes.
    #[inline]
    pub fn rgb_sum(&self) -> f32 {
        self.lanes[0] + self.lanes[1] + self.lanes[2]
    }

    /// Lane-wise `self * mul + add`.
    #[inline]
    pub fn mul_add(self, mul: PixelF32, add: PixelF32) -> PixelF32 {
        self.zip(mul, |a, b| a * b) + add
    }

    /// Lane-wise interpolation towards `other`.
    #[inline]
    pub fn lerp(self, other: PixelF32, t: f32) -> PixelF32 {
        lerp(self, other, t)
    }

    #[inline]
    fn map(self, f: impl Fn(f32) -> f32) -> PixelF32 {
        let [x, y, z, w] = self.lanes;
        PixelF32::new(f(x), f(y), f(z), f(w))
    }

    #[inline]
    fn zip(self, other: PixelF32, f: impl Fn(f32, f32) -> f32) -> PixelF32 {
        let [a0, a1, a2, a3] = self.lanes;
        let [b0, b1, b2, b3] = other.lanes;
        PixelF32::new(f(a0, b0), f(a1, b1), f(a2, b2), f(a3, b3))
    }

    /// RGBA -> HSLA.
    ///
    /// Hue comes from `atan2(sqrt(3) * (G - B), 2R - G - B)`, rounded to whole
    /// degrees and mapped to [0, 360). Saturation is 0 for L at 0 or 1.
    pub fn to_hsl(self) -> PixelF32 {
        let (r, g, b) = (self.r(), self.g(), self.b());
        let max = max3(r, g, b);
        let min = min3(r, g, b);

        let l = (max + min) * 0.5;
        let s = if l > 0.0 && l < 1.0 {
            (max - min) / (1.0 - (2.0 * l - 1.0).abs())
        } else {
            0.0
        };
        let mut h = (3.0f32.sqrt() * (g - b)).atan2(2.0 * r - g - b).to_degrees().round();
        if h < 0.0 {
            h += 360.0;
        }

        PixelF32::new(h, s, l, self.a())
    }

    /// HSLA -> RGBA using the six-sector chroma construction.
    pub fn to_rgb(self) -> PixelF32 {
        let (h, s, l) = (self.h(), self.s(), self.l());
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h_prime = h / 60.0;
        let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
        let m = l - c * 0.5;

        let (r, g, b) = if h_prime <= 1.0 {
            (c, x, 0.0)
        } else if h_prime <= 2.0 {
            (x, c, 0.0)
        } else if h_prime <= 3.0 {
            (0.0, c, x)
        } else if h_prime <= 4.0 {
            (0.0, x, c)
        } else if h_prime <= 5.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        PixelF32::new(r + m, g + m, b + m, self.alpha())
    }
}

impl From<PixelU8> for PixelF32 {
    fn from(pixel: PixelU8) -> Self {
        PixelF32::from_u8(pixel)
    }
}

macro_rules! impl_lane_ops {
    ($($op:ident $method:ident $assign:ident $assign_method:ident => $sym:tt),*) => {$(
        impl $op for PixelF32 {
            type Output = PixelF32;
            #[inline]
            fn $method(self, rhs: PixelF32) -> PixelF32 {
                self.zip(rhs, |a, b| a $sym b)
            }
        }

        impl $op<f32> for PixelF32 {
            type Output = PixelF32;
            #[inline]
            fn $method(self, rhs: f32) -> PixelF32 {
                self.map(|a| a $sym rhs)
            }
        }

        impl $assign for PixelF32 {
            #[inline]
            fn $assign_method(&mut self, rhs: PixelF32) {
                *self = *self $sym rhs;
            }
        }

        impl $assign<f32> for PixelF32 {
            #[inline]
            fn $assign_method(&mut self, rhs: f32) {
                *self = *self $sym rhs;
            }
        }
    )*};
}

impl_lane_ops! {
    Add add AddAssign add_assign => +,
    Sub sub SubAssign sub_assign => -,
    Mul mul MulAssign mul_assign => *,
    Div div DivAssign div_assign => /
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // ========================================================================
    // Helpers
    // ========================================================================

    #[test]
    fn test_clamp_and_lerp() {
        assert_eq!(clamp(-3i64, 0, 9), 0);
        assert_eq!(clamp(12i64, 0, 9), 9);
        assert_eq!(clamp(0.5f32, 0.0, 1.0), 0.5);
        assert_abs_diff_eq!(lerp(2.0f32 * 1.0, 4.0, 0.25), 2.5);
        assert_eq!(max3(1, 7, 3), 7);
        assert_eq!(min3(4, 2, 9), 2);
    }

    #[test]
    #[should_panic(expected = "clamp range is inverted")]
    fn test_clamp_inverted_range_panics() {
        clamp(1, 5, 2);
    }

    // ========================================================================
    // PixelU8
    // ========================================================================

    #[test]
    fn test_u8_bits_roundtrip_layout() {
        let p = PixelU8::new(0x11, 0x22, 0x33, 0x44);
        assert_eq!(p.to_bits(), 0x4433_2211);
        assert_eq!(PixelU8::from_bits(0x4433_2211), p);
    }

    #[test]
    fn test_u8_inverted_keeps_alpha() {
        let p = PixelU8::new(10, 200, 0, 77).inverted();
        assert_eq!(p, PixelU8::new(245, 55, 255, 77));
    }

    // ========================================================================
    // PixelF32
    // ========================================================================

    #[test]
    fn test_f32_conversion_clamps() {
        let p = PixelF32::new(-0.5, 0.5, 1.7, 1.0).to_u8();
        assert_eq!(p.r, 0);
        assert_eq!(p.g, 127);
        assert_eq!(p.b, 255);
        assert_eq!(p.a, 255);
        assert_eq!(PixelF32::splat(f32::NAN).to_u8(), PixelU8::TRANSPARENT);
    }

    #[test]
    fn test_f32_arithmetic() {
        let a = PixelF32::new(1.0, 2.0, 3.0, 4.0);
        let b = PixelF32::splat(2.0);
        assert_eq!((a + b).lanes, [3.0, 4.0, 5.0, 6.0]);
        assert_eq!((a - 1.0).lanes, [0.0, 1.0, 2.0, 3.0]);
        assert_eq!((a * b).lanes, [2.0, 4.0, 6.0, 8.0]);
        assert_eq!((a / 2.0).lanes, [0.5, 1.0, 1.5, 2.0]);
        assert_eq!(a.mul_add(b, PixelF32::ONE).lanes, [3.0, 5.0, 7.0, 9.0]);

        let mut c = a;
        c += 1.0;
        c *= b;
        assert_eq!(c.lanes, [4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_f32_lerp_midpoint() {
        let a = PixelF32::ZERO;
        let b = PixelF32::new(1.0, 0.5, 0.0, 1.0);
        assert_eq!(a.lerp(b, 0.5).lanes, [0.5, 0.25, 0.0, 0.5]);
    }

    #[test]
    fn test_hsl_primaries() {
        let red = PixelF32::rgb(1.0, 0.0, 0.0).to_hsl();
        assert_abs_diff_eq!(red.h(), 0.0);
        assert_abs_diff_eq!(red.s(), 1.0);
        assert_abs_diff_eq!(red.l(), 0.5);

        let green = PixelF32::rgb(0.0, 1.0, 0.0).to_hsl();
        assert_abs_diff_eq!(green.h(), 120.0);

        let blue = PixelF32::rgb(0.0, 0.0, 1.0).to_hsl();
        assert_abs_diff_eq!(blue.h(), 240.0);
    }

    #[test]
    fn test_hsl_roundtrip_primaries() {
        for color in [
            PixelF32::rgb(1.0, 0.0, 0.0),
            PixelF32::rgb(0.0, 1.0, 0.0),
            PixelF32::rgb(0.0, 0.0, 1.0),
            PixelF32::new(0.5, 0.5, 0.5, 0.25),
        ] {
            let back = color.to_hsl().to_rgb();
            for i in 0..4 {
                assert_abs_diff_eq!(back.lanes[i], color.lanes[i], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_hsl_white_is_achromatic() {
        let hsl = PixelF32::ONE.to_hsl();
        assert_eq!(hsl.s(), 0.0);
        assert_eq!(hsl.l(), 1.0);
        assert_eq!(hsl.to_rgb().to_u8(), PixelU8::WHITE);
    }
}
