//! Error types for box editing.

use thiserror::Error;

/// Result type alias for editing operations.
pub type EditResult<T> = Result<T, EditError>;

/// Errors that can occur while configuring the editor.
///
/// Gestures themselves never fail: a gesture that cannot be applied is
/// reported as an unchanged box.
#[derive(Debug, Error)]
pub enum EditError {
    /// Invalid editing parameters.
    #[error("invalid edit parameters: {0}")]
    InvalidParams(String),
}

impl EditError {
    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }
}
