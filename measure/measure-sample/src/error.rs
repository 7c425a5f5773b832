//! Error types for point sampling.

use sensor_types::SensorError;
use thiserror::Error;

/// Result type alias for sampling operations.
pub type SampleResult<T> = Result<T, SampleError>;

/// Errors that can occur while sampling observations.
///
/// Too few surviving points is not an error; see
/// [`SampleOutcome::InsufficientData`](crate::SampleOutcome::InsufficientData).
#[derive(Debug, Error)]
pub enum SampleError {
    /// Malformed sensor input.
    #[error("invalid observation: {0}")]
    Sensor(#[from] SensorError),

    /// Invalid sampling parameters.
    #[error("invalid sample parameters: {0}")]
    InvalidParams(String),

    /// No observations were supplied.
    #[error("no observations to sample")]
    NoObservations,
}

impl SampleError {
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
    fn error_from_sensor() {
        let err: SampleError = SensorError::buffer_mismatch("depth", 4, 3).into();
        assert!(err.to_string().contains("invalid observation"));
        assert!(err.to_string().contains("depth buffer"));
    }

    #[test]
    fn error_display() {
        assert!(
            SampleError::invalid_params("stride must be positive")
                .to_string()
                .contains("stride")
        );
        assert_eq!(
            SampleError::NoObservations.to_string(),
            "no observations to sample"
        );
    }
}
