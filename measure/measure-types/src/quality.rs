//! Measurement quality record and its bucketed level.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sensor_types::TrackingState;

/// Bucketed overall quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QualityLevel {
    /// The estimate should be retaken.
    Low,
    /// Usable with some uncertainty.
    Medium,
    /// Reliable.
    High,
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

/// Cut-offs that bucket a [`MeasurementQuality`] into a [`QualityLevel`].
///
/// A measurement is `Low` if any low cut-off is missed or tracking is not
/// available, `High` if every high cut-off is met and tracking is normal,
/// and `Medium` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualityThresholds {
    /// Coverage below this is `Low`.
    pub low_coverage: f32,
    /// Confidence below this is `Low`.
    pub low_confidence: f32,
    /// Point counts below this are `Low`.
    pub low_points: usize,
    /// Coverage at or above this is needed for `High`.
    pub high_coverage: f32,
    /// Confidence at or above this is needed for `High`.
    pub high_confidence: f32,
    /// Point count at or above this is needed for `High`.
    pub high_points: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            low_coverage: 0.4,
            low_confidence: 0.4,
            low_points: 100,
            high_coverage: 0.8,
            high_confidence: 0.75,
            high_points: 500,
        }
    }
}

impl QualityThresholds {
    /// Lenient cut-offs for small or dark objects.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            low_coverage: 0.2,
            low_confidence: 0.25,
            low_points: 40,
            high_coverage: 0.6,
            high_confidence: 0.6,
            high_points: 200,
        }
    }
}

/// How trustworthy a measurement's input data was.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementQuality {
    /// Fraction of selected pixels that had valid depth (0.0 to 1.0).
    pub depth_coverage: f32,
    /// Mean depth-confidence weight over kept points (0.0 to 1.0).
    pub depth_confidence: f32,
    /// Number of points kept after filtering.
    pub point_count: usize,
    /// Tracking state at capture time.
    pub tracking: TrackingState,
    /// Whether tracking was normal at capture time.
    pub normal_tracking: bool,
}

impl MeasurementQuality {
    /// Creates a quality record; `normal_tracking` is derived from `tracking`.
    #[must_use]
    pub fn new(
        depth_coverage: f32,
        depth_confidence: f32,
        point_count: usize,
        tracking: TrackingState,
    ) -> Self {
        Self {
            depth_coverage: depth_coverage.clamp(0.0, 1.0),
            depth_confidence: depth_confidence.clamp(0.0, 1.0),
            point_count,
            tracking,
            normal_tracking: tracking.is_normal(),
        }
    }

    /// Overall level under the given thresholds.
    #[must_use]
    pub fn level_with(&self, t: &QualityThresholds) -> QualityLevel {
        if self.depth_coverage < t.low_coverage
            || self.depth_confidence < t.low_confidence
            || self.point_count < t.low_points
            || !self.tracking.is_available()
        {
            QualityLevel::Low
        } else if self.depth_coverage >= t.high_coverage
            && self.depth_confidence >= t.high_confidence
            && self.point_count >= t.high_points
            && self.normal_tracking
        {
            QualityLevel::High
        } else {
            QualityLevel::Medium
        }
    }

    /// Overall level under [`QualityThresholds::default`].
    #[must_use]
    pub fn level(&self) -> QualityLevel {
        self.level_with(&QualityThresholds::default())
    }
}

impl Default for MeasurementQuality {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0, TrackingState::Normal)
    }
}

impl fmt::Display for MeasurementQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quality {}: coverage {:.0}%, confidence {:.0}%, {} points, tracking {}",
            self.level(),
            self.depth_coverage * 100.0,
            self.depth_confidence * 100.0,
            self.point_count,
            self.tracking
        )
    }
}
