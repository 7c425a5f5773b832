//! Error types for volume refinement.

use thiserror::Error;

/// Result type alias for refinement operations.
pub type RefineResult<T> = Result<T, RefineError>;

/// Errors that can occur during volume refinement.
///
/// A surface that cannot be reconstructed or is too open is not an error;
/// the refined volume simply has no mesh volume.
#[derive(Debug, Error)]
pub enum RefineError {
    /// No captured point lies inside the box.
    #[error("no captured points inside the box")]
    NoPointsInBox,

    /// Invalid refinement parameters.
    #[error("invalid refinement parameters: {0}")]
    InvalidParams(String),
}

impl RefineError {
    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }
}
