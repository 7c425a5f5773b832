//! Error types for sensor input validation.

use thiserror::Error;

/// Errors that can occur when validating sensor input.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Buffer size mismatch (e.g., depth buffer does not match width × height).
    #[error("{buffer} buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Name of the offending buffer.
        buffer: &'static str,
        /// Expected buffer size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Camera intrinsics are unusable (non-positive focal length, zero size).
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// A region of interest lies outside the normalized `[0, 1]` image square
    /// or has no area.
    #[error("invalid region of interest: {0}")]
    InvalidRegion(String),

    /// Depth range is empty or inverted.
    #[error("invalid depth range: min {min} m, max {max} m")]
    InvalidDepthRange {
        /// Minimum valid depth in meters.
        min: f32,
        /// Maximum valid depth in meters.
        max: f32,
    },
}

impl SensorError {
    /// Creates a buffer size mismatch error.
    #[must_use]
    pub const fn buffer_mismatch(buffer: &'static str, expected: usize, actual: usize) -> Self {
        Self::BufferSizeMismatch {
            buffer,
            expected,
            actual,
        }
    }

    /// Creates an invalid intrinsics error.
    #[must_use]
    pub fn invalid_intrinsics(details: impl Into<String>) -> Self {
        Self::InvalidIntrinsics(details.into())
    }

    /// Creates an invalid region error.
    #[must_use]
    pub fn invalid_region(details: impl Into<String>) -> Self {
        Self::InvalidRegion(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_buffer_mismatch() {
        let err = SensorError::buffer_mismatch("confidence", 100, 50);
        let msg = format!("{err}");
        assert!(msg.contains("confidence"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn error_invalid_intrinsics() {
        let err = SensorError::invalid_intrinsics("fx must be positive");
        assert!(format!("{err}").contains("fx must be positive"));
    }

    #[test]
    fn error_depth_range() {
        let err = SensorError::InvalidDepthRange { min: 5.0, max: 1.0 };
        let msg = format!("{err}");
        assert!(msg.contains('5'));
        assert!(msg.contains('1'));
    }
}
