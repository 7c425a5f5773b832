//! Fitting parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};

/// Parameters for [`BoxFitter`](crate::BoxFitter).
///
/// # Example
///
/// ```
/// use measure_fit::FitParams;
///
/// let params = FitParams::new().with_tie_tolerance(0.05);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitParams {
    /// Candidates whose footprint area is within this fraction of the minimum
    /// are offered to the orientation policy. Default: 0.03.
    pub tie_tolerance: f64,

    /// A fitted bottom face within this distance of the floor is snapped onto
    /// it (meters). Default: 0.05.
    pub floor_snap_threshold: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            tie_tolerance: 0.03,
            floor_snap_threshold: 0.05,
        }
    }
}

impl FitParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure minimum-area fitting: only exact ties reach the policy.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            tie_tolerance: 0.0,
            ..Self::default()
        }
    }

    /// Sets the relative tie tolerance.
    #[must_use]
    pub const fn with_tie_tolerance(mut self, tolerance: f64) -> Self {
        self.tie_tolerance = tolerance;
        self
    }

    /// Sets the floor snap distance.
    #[must_use]
    pub const fn with_floor_snap_threshold(mut self, threshold: f64) -> Self {
        self.floor_snap_threshold = threshold;
        self
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidParams`] for negative or non-finite values.
    pub fn validate(&self) -> FitResult<()> {
        if !(self.tie_tolerance.is_finite() && self.tie_tolerance >= 0.0) {
            return Err(FitError::invalid_params(format!(
                "tie tolerance must be non-negative, got {}",
                self.tie_tolerance
            )));
        }
        if !(self.floor_snap_threshold.is_finite() && self.floor_snap_threshold >= 0.0) {
            return Err(FitError::invalid_params(format!(
                "floor snap threshold must be non-negative, got {}",
                self.floor_snap_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = FitParams::default();
        assert!((p.tie_tolerance - 0.03).abs() < 1e-12);
        assert!(p.validate().is_ok());
        assert!(FitParams::strict().validate().is_ok());
    }

    #[test]
    fn test_invalid() {
        assert!(FitParams::new().with_tie_tolerance(-0.1).validate().is_err());
        assert!(
            FitParams::new()
                .with_floor_snap_threshold(f64::NAN)
                .validate()
                .is_err()
        );
    }
}
