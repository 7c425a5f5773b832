//! Sampling parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sensor_types::DepthConfidence;

use crate::error::{SampleError, SampleResult};

/// How statistical outliers are rejected after spatial gating.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutlierMethod {
    /// Keep every point.
    None,
    /// Reject points farther than `sigma` standard deviations from the
    /// centroid on any world axis.
    AxisSigma {
        /// Standard deviation multiplier.
        sigma: f64,
    },
    /// Reject points whose mean distance to their `k` nearest neighbours
    /// exceeds the global mean by `std_multiplier` standard deviations.
    Neighborhood {
        /// Number of neighbours.
        k: usize,
        /// Standard deviation multiplier.
        std_multiplier: f64,
    },
}

impl Default for OutlierMethod {
    fn default() -> Self {
        Self::AxisSigma { sigma: 2.5 }
    }
}

/// Parameters for [`PointSampler`](crate::PointSampler).
///
/// # Example
///
/// ```
/// use measure_sample::{OutlierMethod, SampleParams};
///
/// let params = SampleParams::new()
///     .with_stride(2)
///     .with_min_points(50)
///     .with_outlier(OutlierMethod::None);
///
/// assert_eq!(params.stride, 2);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleParams {
    /// Sample every `stride`-th pixel in both directions. Default: 1.
    pub stride: u32,

    /// Pixels below this confidence are treated as invalid. Default: `Medium`.
    pub min_confidence: DepthConfidence,

    /// Points farther than this from the raycast hit are rejected (meters).
    /// `None` disables the gate. Default: 0.6.
    pub raycast_tolerance: Option<f64>,

    /// Statistical outlier rejection. Default: 2.5σ per axis.
    pub outlier: OutlierMethod,

    /// Fewer kept points than this is reported as insufficient data. Default: 20.
    pub min_points: usize,

    /// Neighbours used to estimate the surface normal at the raycast hit. Default: 24.
    pub normal_neighbors: usize,

    /// Produce kept-mask and depth debug images. Default: false.
    pub debug_imagery: bool,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            stride: 1,
            min_confidence: DepthConfidence::Medium,
            raycast_tolerance: Some(0.6),
            outlier: OutlierMethod::default(),
            min_points: 20,
            normal_neighbors: 24,
            debug_imagery: false,
        }
    }
}

impl SampleParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every other pixel, axis σ-clipping.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            stride: 2,
            ..Self::default()
        }
    }

    /// Every pixel, high-confidence only, neighbourhood outlier rejection.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            stride: 1,
            min_confidence: DepthConfidence::High,
            outlier: OutlierMethod::Neighborhood {
                k: 16,
                std_multiplier: 2.0,
            },
            ..Self::default()
        }
    }

    /// Sets the pixel stride.
    #[must_use]
    pub const fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Sets the minimum depth confidence.
    #[must_use]
    pub const fn with_min_confidence(mut self, confidence: DepthConfidence) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Sets the raycast gate radius; `None` disables it.
    #[must_use]
    pub const fn with_raycast_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.raycast_tolerance = tolerance;
        self
    }

    /// Sets the outlier method.
    #[must_use]
    pub const fn with_outlier(mut self, outlier: OutlierMethod) -> Self {
        self.outlier = outlier;
        self
    }

    /// Sets the minimum viable point count.
    #[must_use]
    pub const fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Enables or disables debug imagery.
    #[must_use]
    pub const fn with_debug_imagery(mut self, enabled: bool) -> Self {
        self.debug_imagery = enabled;
        self
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidParams`] for a zero stride, a negative
    /// tolerance or non-positive outlier settings.
    pub fn validate(&self) -> SampleResult<()> {
        if self.stride == 0 {
            return Err(SampleError::invalid_params("stride must be at least 1"));
        }
        if let Some(tol) = self.raycast_tolerance {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(SampleError::invalid_params(format!(
                    "raycast tolerance must be positive, got {tol}"
                )));
            }
        }
        match self.outlier {
            OutlierMethod::AxisSigma { sigma } if sigma <= 0.0 => Err(
                SampleError::invalid_params(format!("sigma must be positive, got {sigma}")),
            ),
            OutlierMethod::Neighborhood { k, std_multiplier } if k == 0 || std_multiplier <= 0.0 => {
                Err(SampleError::invalid_params(format!(
                    "neighbourhood filter needs k > 0 and a positive multiplier, got k={k} multiplier={std_multiplier}"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = SampleParams::default();
        assert_eq!(p.stride, 1);
        assert_eq!(p.min_points, 20);
        assert_eq!(p.min_confidence, DepthConfidence::Medium);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_presets_valid() {
        assert!(SampleParams::fast().validate().is_ok());
        assert!(SampleParams::precise().validate().is_ok());
        assert_eq!(SampleParams::fast().stride, 2);
    }

    #[test]
    fn test_validation() {
        assert!(SampleParams::new().with_stride(0).validate().is_err());
        assert!(
            SampleParams::new()
                .with_raycast_tolerance(Some(-1.0))
                .validate()
                .is_err()
        );
        assert!(
            SampleParams::new()
                .with_outlier(OutlierMethod::AxisSigma { sigma: 0.0 })
                .validate()
                .is_err()
        );
        assert!(
            SampleParams::new()
                .with_outlier(OutlierMethod::Neighborhood {
                    k: 0,
                    std_multiplier: 2.0
                })
                .validate()
                .is_err()
        );
    }
}
