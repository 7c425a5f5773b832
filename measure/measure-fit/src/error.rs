//! Error types for box fitting.

use thiserror::Error;

/// Result type alias for fitting operations.
pub type FitResult<T> = Result<T, FitError>;

/// Errors that can occur while fitting a box.
///
/// Thin or flat clouds are not errors: extents below the minimum are clamped.
#[derive(Debug, Error)]
pub enum FitError {
    /// The point cloud has no points.
    #[error("cannot fit a box to an empty point cloud")]
    EmptyCloud,

    /// Invalid fit parameters.
    #[error("invalid fit parameters: {0}")]
    InvalidParams(String),
}

impl FitError {
    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert!(FitError::EmptyCloud.to_string().contains("empty"));
        assert!(
            FitError::invalid_params("tie tolerance must be non-negative")
                .to_string()
                .contains("tie tolerance")
        );
    }
}
