//! Reversible XOR scramble.
//!
//! Each packed pixel is XORed with `column_key ^ row_key ^ state`, where the
//! column and row keys come from a PRNG seeded with the key and `state` is a
//! per-row xorshift32 stream. The keystream depends only on the key and the
//! image size, so scrambling twice with the same key restores the image.
//!
//! The column and row keys come from `rand`'s `StdRng`, whose output is only
//! stable within one `rand` release line; data scrambled by a build using a
//! different line will not unscramble.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::error::{FilterError, FilterResult};
use crate::parallel::executor;
use crate::pixel::PixelU8;
use crate::raster::RasterBuffer;

#[inline]
fn xorshift32(mut x: u32) -> u32 {
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    x
}

/// Scramble (or unscramble) in place with `key`.
///
/// # Arguments
/// * `input` - Image XORed in place; dimensions must match between the two calls
/// * `key` - Any 32-bit key
pub fn xor_scramble(input: &mut RasterBuffer, key: u32) -> FilterResult<()> {
    if input.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    let (width, height) = (input.width(), input.height());
    debug!(width, height, "xor_scramble");

    let mut rng = StdRng::seed_from_u64(key as u64);
    let keys_x: Vec<u32> = (0..width).map(|_| rng.next_u32()).collect();
    let keys_y: Vec<u32> = (0..height).map(|_| rng.next_u32()).collect();
    let key_base = (width as u32).wrapping_shl(16) ^ (height as u32).wrapping_shl(8) ^ key;

    executor().rows(input.pixels_mut(), width, |y, row| {
        let mut state = key_base.rotate_right((y % 32) as u32);
        for (p, &kx) in row.iter_mut().zip(&keys_x) {
            *p = PixelU8::from_bits(p.to_bits() ^ keys_y[y] ^ kx ^ state);
            state = xorshift32(state);
        }
    });

    Ok(())
}
