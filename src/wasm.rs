//! WebAssembly exports for Pixelworks filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Every function
//! takes a flat 4-bytes-per-pixel array plus its dimensions. Streams use the
//! process-wide channel order, RGBA (as found in `ImageData.data`) unless
//! `set_channel_order_wasm` changes it.
//!
//! ## Output Layouts
//!
//! | Function | Output |
//! |----------|--------|
//! | Most filters | RGBA, same size |
//! | `zoom_*` | RGBA, scaled size (query with `zoom_size_wasm`) |
//! | `pixel_to_rgb3x3_wasm` | RGBA, 3x width and height |
//! | `grayscale_wasm`, quantizers | 1 byte per pixel |
//! | `mixed_pictures_wasm` | gray + alpha, 2 bytes per pixel |

use wasm_bindgen::prelude::*;

use crate::config::{self, ChannelOrder};
use crate::filters::{blend, blur, color_adjust, edge, grayscale, scramble, sharpen, stylize, zoom};
use crate::raster::RasterBuffer;

fn load(data: &[u8], width: usize, height: usize) -> Result<RasterBuffer, JsError> {
    Ok(RasterBuffer::from_stream(width, height, data.to_vec())?)
}

fn store(mut buffer: RasterBuffer) -> Vec<u8> {
    buffer.to_stream()
}

/// Select the byte order of every stream passed in or returned: "rgba" or "bgra".
#[wasm_bindgen]
pub fn set_channel_order_wasm(order: &str) -> Result<(), JsError> {
    config::set_channel_order(ChannelOrder::parse(order)?);
    Ok(())
}

// ============================================================================
// Resampling
// ============================================================================

/// Output size of a zoom as `[width, height]`.
#[wasm_bindgen]
pub fn zoom_size_wasm(width: usize, height: usize, magnification: f32) -> Result<Vec<u32>, JsError> {
    let (w, h, _) = zoom::zoom_dimensions(width, height, magnification)?;
    Ok(vec![w as u32, h as u32])
}

/// Edge-adaptive zoom.
///
/// # Arguments
/// * `curve` - "linear", "square" or "quartic"
#[wasm_bindgen]
pub fn zoom_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    magnification: f32,
    threshold: f32,
    curve: &str,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    let curve: zoom::WeightCurve = curve.parse()?;
    Ok(store(zoom::zoom(&mut input, magnification, threshold, curve)?))
}

#[wasm_bindgen]
pub fn zoom_bicubic_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    magnification: f32,
    a: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(store(zoom::zoom_bicubic(&mut input, magnification, a)?))
}

// ============================================================================
// Sharpen
// ============================================================================

#[wasm_bindgen]
pub fn sharpen_laplace_3x3_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    strength: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(store(sharpen::sharpen_laplace_3x3(&mut input, strength)?))
}

#[wasm_bindgen]
pub fn sharpen_gauss_laplace_5x5_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    strength: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(store(sharpen::sharpen_gauss_laplace_5x5(&mut input, strength)?))
}

// ============================================================================
// Color adjustment
// ============================================================================

#[wasm_bindgen]
pub fn aces_tone_mapping_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    exposure: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    color_adjust::aces_tone_mapping(&mut input, exposure)?;
    Ok(store(input))
}

#[wasm_bindgen]
pub fn vividness_wasm(data: &[u8], width: usize, height: usize, ratio: f32) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    color_adjust::vividness(&mut input, ratio)?;
    Ok(store(input))
}

#[wasm_bindgen]
pub fn natural_vividness_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    ratio: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    color_adjust::natural_vividness(&mut input, ratio)?;
    Ok(store(input))
}

#[wasm_bindgen]
pub fn hsl_adjustment_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    hue: f32,
    saturation: f32,
    lightness: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    color_adjust::hsl_adjustment(&mut input, hue, saturation, lightness)?;
    Ok(store(input))
}

#[wasm_bindgen]
pub fn invert_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    color_adjust::invert(&mut input)?;
    Ok(store(input))
}

// ============================================================================
// Grayscale & quantization (1 byte per pixel)
// ============================================================================

#[wasm_bindgen]
pub fn grayscale_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(grayscale::grayscale(&mut input)?.data)
}

#[wasm_bindgen]
pub fn binarization_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    threshold: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(stylize::binarization(&mut input, threshold)?.data)
}

#[wasm_bindgen]
pub fn quaternization_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    threshold: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(stylize::quaternization(&mut input, threshold)?.data)
}

#[wasm_bindgen]
pub fn hexadecimalization_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(stylize::hexadecimalization(&mut input)?.data)
}

// ============================================================================
// Neighborhood filters
// ============================================================================

#[wasm_bindgen]
pub fn sobel_edge_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    threshold_min: f32,
    threshold_max: f32,
    strength: f32,
    invert: bool,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    let params = edge::SobelParams { threshold_min, threshold_max, strength, invert };
    Ok(store(edge::sobel_edge(&mut input, params)?))
}

#[wasm_bindgen]
pub fn surface_blur_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    radius: usize,
    threshold: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(store(blur::surface_blur(&mut input, radius, threshold)?))
}

#[wasm_bindgen]
pub fn mosaic_pixelation_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    side: usize,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    stylize::mosaic_pixelation(&mut input, side)?;
    Ok(store(input))
}

#[wasm_bindgen]
pub fn pixel_to_rgb3x3_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    brightness: f32,
) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    Ok(store(stylize::pixel_to_rgb3x3(&mut input, brightness)?))
}

// ============================================================================
// Compositing & scramble
// ============================================================================

/// Gray + alpha blend over the overlap of both images.
///
/// # Arguments
/// * `policy` - "even", "inside_two_thirds", "outside_two_thirds" or "inside_three_quarters"
#[wasm_bindgen]
pub fn mixed_pictures_wasm(
    outside: &[u8],
    outside_width: usize,
    outside_height: usize,
    inside: &[u8],
    inside_width: usize,
    inside_height: usize,
    policy: &str,
) -> Result<Vec<u8>, JsError> {
    let mut outer = load(outside, outside_width, outside_height)?;
    let mut inner = load(inside, inside_width, inside_height)?;
    let policy: blend::BlendPolicy = policy.parse()?;
    Ok(blend::mixed_pictures(&mut outer, &mut inner, policy)?.data)
}

/// XOR scramble; applying it twice with the same key restores the input.
#[wasm_bindgen]
pub fn xor_scramble_wasm(data: &[u8], width: usize, height: usize, key: u32) -> Result<Vec<u8>, JsError> {
    let mut input = load(data, width, height)?;
    scramble::xor_scramble(&mut input, key)?;
    Ok(store(input))
}
