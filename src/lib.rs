//! Pixelworks
//!
//! Row-parallel image processing on in-memory RGBA rasters: resampling,
//! sharpening, tone and color adjustment, quantization, edge detection,
//! surface blur, pixelation, two-image blending and a reversible XOR scramble.
//!
//! ## Image Format
//! Filters consume [`RasterBuffer`]s holding 8-bit RGBA pixels. A buffer can
//! be built from a flat byte stream (RGBA or BGRA order, see [`ChannelOrder`]),
//! from structured [`PixelU8`]s, or from an `ndarray` of shape `(height, width, 4)`.
//!
//! Single-channel and gray + alpha results come back as [`ChannelImage`]s,
//! which also carry the layout tag a codec needs and can be split into
//! size-bounded row bands for export.
//!
//! ## Parallelism
//! Every filter fans its rows out on a process-wide rayon pool, sized from
//! `PIXELWORKS_THREADS` or the core count (see [`config`]). [`parallel::configure`]
//! resizes it at runtime.
//!
//! ## Bindings
//! - `python` feature: PyO3 module `pixelworks` over numpy `uint8` arrays
//! - `wasm` feature: wasm-bindgen functions over flat RGBA byte slices

pub mod config;
pub mod error;
pub mod filters;
pub mod luma;
pub mod parallel;
pub mod pixel;
pub mod raster;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{ChannelOrder, EngineConfig};
pub use error::{FilterError, FilterResult};
pub use filters::blend::BlendPolicy;
pub use filters::edge::SobelParams;
pub use filters::zoom::WeightCurve;
pub use pixel::{PixelF32, PixelU8};
pub use raster::{ChannelImage, ChannelLayout, PixelView, RasterBuffer};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::FilterError;
    use crate::filters;
    use crate::parallel;
    use crate::raster::{ChannelImage, RasterBuffer};

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    type PyImage<'py> = Bound<'py, PyArray3<u8>>;

    fn load(image: PyReadonlyArray3<'_, u8>) -> PyResult<RasterBuffer> {
        Ok(RasterBuffer::from_array(image.as_array())?)
    }

    fn store_rgba(py: Python<'_>, buffer: RasterBuffer) -> PyResult<PyImage<'_>> {
        Ok(buffer.into_array()?.into_pyarray(py))
    }

    fn store_channels(py: Python<'_>, image: ChannelImage) -> PyResult<PyImage<'_>> {
        Ok(image.into_array()?.into_pyarray(py))
    }

    // ========================================================================
    // Resampling
    // ========================================================================

    /// Edge-adaptive zoom. `curve` is "linear", "square" or "quartic".
    #[pyfunction]
    #[pyo3(signature = (image, magnification, threshold=1.0, curve="square"))]
    pub fn zoom<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        magnification: f32,
        threshold: f32,
        curve: &str,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        let result = filters::zoom::zoom(&mut input, magnification, threshold, curve.parse()?)?;
        store_rgba(py, result)
    }

    /// Bicubic convolution zoom, `a` in [-3, -0.1].
    #[pyfunction]
    #[pyo3(signature = (image, magnification, a=-0.5))]
    pub fn zoom_bicubic<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        magnification: f32,
        a: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_rgba(py, filters::zoom::zoom_bicubic(&mut input, magnification, a)?)
    }

    // ========================================================================
    // Sharpen
    // ========================================================================

    #[pyfunction]
    pub fn sharpen_laplace_3x3<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        strength: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_rgba(py, filters::sharpen::sharpen_laplace_3x3(&mut input, strength)?)
    }

    #[pyfunction]
    pub fn sharpen_gauss_laplace_5x5<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        strength: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_rgba(py, filters::sharpen::sharpen_gauss_laplace_5x5(&mut input, strength)?)
    }

    // ========================================================================
    // Color adjustment (copy, adjust, return)
    // ========================================================================

    #[pyfunction]
    pub fn aces_tone_mapping<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        exposure: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        filters::color_adjust::aces_tone_mapping(&mut input, exposure)?;
        store_rgba(py, input)
    }

    #[pyfunction]
    pub fn vividness<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        ratio: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        filters::color_adjust::vividness(&mut input, ratio)?;
        store_rgba(py, input)
    }

    #[pyfunction]
    pub fn natural_vividness<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        ratio: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        filters::color_adjust::natural_vividness(&mut input, ratio)?;
        store_rgba(py, input)
    }

    #[pyfunction]
    #[pyo3(signature = (image, hue=0.0, saturation=1.0, lightness=1.0))]
    pub fn hsl_adjustment<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        hue: f32,
        saturation: f32,
        lightness: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        filters::color_adjust::hsl_adjustment(&mut input, hue, saturation, lightness)?;
        store_rgba(py, input)
    }

    #[pyfunction]
    pub fn invert<'py>(py: Python<'py>, image: PyReadonlyArray3<'py, u8>) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        filters::color_adjust::invert(&mut input)?;
        store_rgba(py, input)
    }

    // ========================================================================
    // Grayscale & quantization (single-channel output)
    // ========================================================================

    /// Gamma-aware grayscale, shape (H, W, 1).
    #[pyfunction]
    pub fn grayscale<'py>(py: Python<'py>, image: PyReadonlyArray3<'py, u8>) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_channels(py, filters::grayscale::grayscale(&mut input)?)
    }

    /// R, G and B planes, each shape (H, W, 1).
    #[pyfunction]
    pub fn channel_split<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<(PyImage<'py>, PyImage<'py>, PyImage<'py>)> {
        let mut input = load(image)?;
        let [r, g, b] = filters::grayscale::channel_split(&mut input)?;
        Ok((store_channels(py, r)?, store_channels(py, g)?, store_channels(py, b)?))
    }

    #[pyfunction]
    #[pyo3(signature = (image, threshold=0.5))]
    pub fn binarization<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        threshold: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_channels(py, filters::stylize::binarization(&mut input, threshold)?)
    }

    #[pyfunction]
    #[pyo3(signature = (image, threshold=0.5))]
    pub fn quaternization<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        threshold: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_channels(py, filters::stylize::quaternization(&mut input, threshold)?)
    }

    #[pyfunction]
    pub fn hexadecimalization<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_channels(py, filters::stylize::hexadecimalization(&mut input)?)
    }

    // ========================================================================
    // Neighborhood filters
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (image, threshold_min=0.0, threshold_max=1.0, strength=1.0, invert=false))]
    pub fn sobel_edge<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        threshold_min: f32,
        threshold_max: f32,
        strength: f32,
        invert: bool,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        let params = filters::edge::SobelParams { threshold_min, threshold_max, strength, invert };
        store_rgba(py, filters::edge::sobel_edge(&mut input, params)?)
    }

    #[pyfunction]
    pub fn surface_blur<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        radius: usize,
        threshold: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_rgba(py, filters::blur::surface_blur(&mut input, radius, threshold)?)
    }

    #[pyfunction]
    pub fn mosaic_pixelation<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        side: usize,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        filters::stylize::mosaic_pixelation(&mut input, side)?;
        store_rgba(py, input)
    }

    /// 3x3 RGB sub-pixel expansion, shape (3H, 3W, 4).
    #[pyfunction]
    #[pyo3(signature = (image, brightness=0.0))]
    pub fn pixel_to_rgb3x3<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        brightness: f32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        store_rgba(py, filters::stylize::pixel_to_rgb3x3(&mut input, brightness)?)
    }

    // ========================================================================
    // Compositing & scramble
    // ========================================================================

    /// Gray + alpha blend of two images, shape (H, W, 2).
    #[pyfunction]
    #[pyo3(signature = (outside, inside, policy="even"))]
    pub fn mixed_pictures<'py>(
        py: Python<'py>,
        outside: PyReadonlyArray3<'py, u8>,
        inside: PyReadonlyArray3<'py, u8>,
        policy: &str,
    ) -> PyResult<PyImage<'py>> {
        let mut outer = load(outside)?;
        let mut inner = load(inside)?;
        let policy: filters::blend::BlendPolicy = policy.parse()?;
        store_channels(py, filters::blend::mixed_pictures(&mut outer, &mut inner, policy)?)
    }

    /// XOR scramble; calling it again with the same key restores the image.
    #[pyfunction]
    pub fn xor_scramble<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        key: u32,
    ) -> PyResult<PyImage<'py>> {
        let mut input = load(image)?;
        filters::scramble::xor_scramble(&mut input, key)?;
        store_rgba(py, input)
    }

    /// Resize the worker pool.
    #[pyfunction]
    pub fn set_threads(threads: usize) -> PyResult<()> {
        Ok(parallel::set_threads(threads)?)
    }

    #[pymodule]
    pub fn pixelworks(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Resampling
        m.add_function(wrap_pyfunction!(zoom, m)?)?;
        m.add_function(wrap_pyfunction!(zoom_bicubic, m)?)?;

        // Sharpen
        m.add_function(wrap_pyfunction!(sharpen_laplace_3x3, m)?)?;
        m.add_function(wrap_pyfunction!(sharpen_gauss_laplace_5x5, m)?)?;

        // Color adjustment
        m.add_function(wrap_pyfunction!(aces_tone_mapping, m)?)?;
        m.add_function(wrap_pyfunction!(vividness, m)?)?;
        m.add_function(wrap_pyfunction!(natural_vividness, m)?)?;
        m.add_function(wrap_pyfunction!(hsl_adjustment, m)?)?;
        m.add_function(wrap_pyfunction!(invert, m)?)?;

        // Grayscale & quantization
        m.add_function(wrap_pyfunction!(grayscale, m)?)?;
        m.add_function(wrap_pyfunction!(channel_split, m)?)?;
        m.add_function(wrap_pyfunction!(binarization, m)?)?;
        m.add_function(wrap_pyfunction!(quaternization, m)?)?;
        m.add_function(wrap_pyfunction!(hexadecimalization, m)?)?;

        // Neighborhood
        m.add_function(wrap_pyfunction!(sobel_edge, m)?)?;
        m.add_function(wrap_pyfunction!(surface_blur, m)?)?;
        m.add_function(wrap_pyfunction!(mosaic_pixelation, m)?)?;
        m.add_function(wrap_pyfunction!(pixel_to_rgb3x3, m)?)?;

        // Compositing & scramble
        m.add_function(wrap_pyfunction!(mixed_pictures, m)?)?;
        m.add_function(wrap_pyfunction!(xor_scramble, m)?)?;

        // Engine
        m.add_function(wrap_pyfunction!(set_threads, m)?)?;

        Ok(())
    }
}
