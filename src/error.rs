//! Error types for filter operations.

use thiserror::Error;

/// Error type for filter operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A source buffer holds no pixels.
    #[error("input image is empty")]
    EmptyInput,

    /// Requested output geometry cannot be represented.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// An export unit would exceed the addressable size.
    #[error("export needs {required} units of at most {limit} bytes")]
    RangeOverflow {
        /// Number of export units the data has to be split into.
        required: usize,
        /// Byte limit of a single export unit.
        limit: usize,
    },

    /// A byte stream does not match the declared dimensions.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// A scalar parameter is outside its documented range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The worker pool could not be built.
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

impl From<rayon::ThreadPoolBuildError> for FilterError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        FilterError::ThreadPool(err.to_string())
    }
}

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Reject a parameter that is NaN or infinite.
pub(crate) fn ensure_finite(name: &str, value: f32) -> FilterResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FilterError::InvalidParameter(format!("{name} must be finite, got {value}")))
    }
}

/// Reject a parameter outside `[min, max]`.
pub(crate) fn ensure_range(name: &str, value: f32, min: f32, max: f32) -> FilterResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(FilterError::InvalidParameter(format!(
            "{name} must be in [{min}, {max}], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(FilterError::EmptyInput.to_string(), "input image is empty");
        let err = FilterError::RangeOverflow { required: 3, limit: 1024 };
        assert_eq!(err.to_string(), "export needs 3 units of at most 1024 bytes");
    }

    #[test]
    fn test_ensure_helpers() {
        assert!(ensure_finite("x", 1.0).is_ok());
        assert!(ensure_finite("x", f32::NAN).is_err());
        assert!(ensure_range("t", 0.5, 0.0, 1.0).is_ok());
        assert!(ensure_range("t", 1.5, 0.0, 1.0).is_err());
        assert!(ensure_range("t", f32::NAN, 0.0, 1.0).is_err());
    }
}
