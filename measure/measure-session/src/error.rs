//! Error types for the measurement session.

use measure_edit::EditError;
use measure_fit::FitError;
use measure_refine::RefineError;
use measure_sample::SampleError;
use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while driving a measurement.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A fit is already running for this session.
    #[error("a fit is already in flight")]
    FitInFlight,

    /// The operation needs a measurement and there is none.
    #[error("no measurement in progress")]
    NoMeasurement,

    /// Refinement needs the captured point cloud and it was not retained.
    #[error("measurement {0} has no retained point cloud")]
    NoPointCloud(measure_types::MeasurementId),

    /// Sampling failed on malformed input.
    #[error("sampling failed: {0}")]
    Sample(#[from] SampleError),

    /// Fitting failed.
    #[error("fitting failed: {0}")]
    Fit(#[from] FitError),

    /// Editing parameters were rejected.
    #[error("editing failed: {0}")]
    Edit(#[from] EditError),

    /// Refinement parameters were rejected.
    #[error("refinement failed: {0}")]
    Refine(#[from] RefineError),

    /// Configuration could not be parsed or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use measure_types::MeasurementId;

    #[test]
    fn error_display() {
        assert_eq!(SessionError::FitInFlight.to_string(), "a fit is already in flight");
        assert_eq!(
            SessionError::NoPointCloud(MeasurementId(4)).to_string(),
            "measurement #4 has no retained point cloud"
        );
        let err: SessionError = RefineError::NoPointsInBox.into();
        assert!(err.to_string().contains("no captured points"));
        assert!(SessionError::config("bad json").to_string().contains("bad json"));
    }
}
