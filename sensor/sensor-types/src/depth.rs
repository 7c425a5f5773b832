//! Depth frames with per-pixel confidence.
//!
//! Depth frames come from time-of-flight or `LiDAR` scanners at a resolution
//! lower than the color camera. Each pixel carries a metric depth along the
//! camera's +Z axis and, optionally, a discrete confidence level.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SensorError;

/// Discrete per-pixel depth confidence reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepthConfidence {
    /// Unreliable depth (edges, specular or dark surfaces).
    Low,
    /// Usable depth with some noise.
    Medium,
    /// Reliable depth.
    #[default]
    High,
}

impl DepthConfidence {
    /// Numeric weight used when averaging confidence over points.
    ///
    /// `Low` = 0.0, `Medium` = 0.5, `High` = 1.0.
    #[must_use]
    pub const fn weight(self) -> f32 {
        match self {
            Self::Low => 0.0,
            Self::Medium => 0.5,
            Self::High => 1.0,
        }
    }

    /// Maps a raw sensor level (0, 1, 2) to a confidence value.
    ///
    /// Levels above 2 saturate to `High`.
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Low,
            1 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// A depth frame in row-major order.
///
/// # Depth Values
///
/// - Depth is stored in meters as `f32`
/// - Invalid pixels are `NaN`, non-positive, or outside `[min_depth, max_depth]`
/// - `depths[y * width + x]`
///
/// # Example
///
/// ```
/// use sensor_types::{DepthConfidence, DepthFrame};
///
/// let frame = DepthFrame::try_new(4, 3, vec![1.0; 12], None).unwrap();
/// assert_eq!(frame.pixel_count(), 12);
/// assert_eq!(frame.confidence_at(0, 0), DepthConfidence::High);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthFrame {
    width: u32,
    height: u32,
    depths: Vec<f32>,
    confidence: Option<Vec<DepthConfidence>>,
    min_depth: f32,
    max_depth: f32,
}

impl DepthFrame {
    /// Default minimum valid depth in meters.
    pub const DEFAULT_MIN_DEPTH: f32 = 0.05;
    /// Default maximum valid depth in meters.
    pub const DEFAULT_MAX_DEPTH: f32 = 5.0;

    /// Creates a validated depth frame.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::BufferSizeMismatch`] if `depths` or
    /// `confidence` does not hold exactly `width * height` entries.
    pub fn try_new(
        width: u32,
        height: u32,
        depths: Vec<f32>,
        confidence: Option<Vec<DepthConfidence>>,
    ) -> Result<Self, SensorError> {
        let expected = width as usize * height as usize;
        if depths.len() != expected {
            return Err(SensorError::buffer_mismatch("depth", expected, depths.len()));
        }
        if let Some(conf) = &confidence {
            if conf.len() != expected {
                return Err(SensorError::buffer_mismatch(
                    "confidence",
                    expected,
                    conf.len(),
                ));
            }
        }
        Ok(Self {
            width,
            height,
            depths,
            confidence,
            min_depth: Self::DEFAULT_MIN_DEPTH,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        })
    }

    /// Sets the valid depth range.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidDepthRange`] if `min` is negative, not
    /// finite, or not below `max`.
    pub fn with_depth_range(mut self, min: f32, max: f32) -> Result<Self, SensorError> {
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && min < max) {
            return Err(SensorError::InvalidDepthRange { min, max });
        }
        self.min_depth = min;
        self.max_depth = max;
        Ok(self)
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the total number of pixels.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Minimum valid depth in meters.
    #[must_use]
    pub const fn min_depth(&self) -> f32 {
        self.min_depth
    }

    /// Maximum valid depth in meters.
    #[must_use]
    pub const fn max_depth(&self) -> f32 {
        self.max_depth
    }

    /// Raw depth buffer.
    #[must_use]
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Returns `true` if the frame carries a confidence buffer.
    #[must_use]
    pub const fn has_confidence(&self) -> bool {
        self.confidence.is_some()
    }

    /// Gets the raw depth at a pixel coordinate.
    ///
    /// Returns `None` if coordinates are out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.depths.get(self.index(x, y)).copied()
    }

    /// Checks if a depth value is valid (finite, positive and within range).
    #[must_use]
    pub fn is_valid_depth(&self, depth: f32) -> bool {
        depth.is_finite() && depth > 0.0 && depth >= self.min_depth && depth <= self.max_depth
    }

    /// Gets the depth at a pixel, returning `None` if invalid.
    #[must_use]
    pub fn get_valid(&self, x: u32, y: u32) -> Option<f32> {
        self.get(x, y).filter(|&d| self.is_valid_depth(d))
    }

    /// Confidence at a pixel. Frames without a confidence buffer report
    /// `High` everywhere.
    #[must_use]
    pub fn confidence_at(&self, x: u32, y: u32) -> DepthConfidence {
        self.confidence
            .as_ref()
            .and_then(|c| c.get(self.index(x, y)).copied())
            .unwrap_or_default()
    }

    /// Fraction of pixels with valid depth (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn valid_fraction(&self) -> f32 {
        if self.depths.is_empty() {
            return 0.0;
        }
        let valid = self
            .depths
            .iter()
            .filter(|&&d| self.is_valid_depth(d))
            .count();
        valid as f32 / self.depths.len() as f32
    }

    const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DepthFrame {
        DepthFrame::try_new(10, 10, vec![1.0f32; 100], None).unwrap()
    }

    #[test]
    fn frame_size_mismatch() {
        let err = DepthFrame::try_new(10, 10, vec![1.0; 99], None).unwrap_err();
        assert!(matches!(
            err,
            SensorError::BufferSizeMismatch {
                buffer: "depth",
                expected: 100,
                actual: 99
            }
        ));

        let err = DepthFrame::try_new(2, 2, vec![1.0; 4], Some(vec![DepthConfidence::Low; 3]))
            .unwrap_err();
        assert!(matches!(
            err,
            SensorError::BufferSizeMismatch {
                buffer: "confidence",
                ..
            }
        ));
    }

    #[test]
    fn frame_get() {
        let frame = sample_frame();
        assert!((frame.get(5, 5).unwrap_or(0.0) - 1.0).abs() < 1e-6);
        assert!(frame.get(100, 100).is_none());
        assert!(frame.get(10, 0).is_none());
    }

    #[test]
    fn frame_validity() {
        let frame = sample_frame();
        assert!(!frame.is_valid_depth(f32::NAN));
        assert!(!frame.is_valid_depth(0.0));
        assert!(!frame.is_valid_depth(0.01)); // Below min
        assert!(!frame.is_valid_depth(15.0)); // Above max
        assert!(frame.is_valid_depth(1.0));
    }

    #[test]
    fn frame_depth_range() {
        let frame = sample_frame().with_depth_range(0.2, 20.0).unwrap();
        assert!(frame.is_valid_depth(15.0));
        assert!(sample_frame().with_depth_range(3.0, 1.0).is_err());
        assert!(sample_frame().with_depth_range(-1.0, 1.0).is_err());
    }

    #[test]
    fn frame_confidence() {
        let mut conf = vec![DepthConfidence::High; 4];
        conf[1] = DepthConfidence::Low;
        let frame = DepthFrame::try_new(2, 2, vec![1.0; 4], Some(conf)).unwrap();

        assert!(frame.has_confidence());
        assert_eq!(frame.confidence_at(0, 0), DepthConfidence::High);
        assert_eq!(frame.confidence_at(1, 0), DepthConfidence::Low);
    }

    #[test]
    fn frame_valid_fraction() {
        let mut depths = vec![1.0f32; 100];
        depths[0] = f32::NAN;
        depths[1] = f32::NAN;
        let frame = DepthFrame::try_new(10, 10, depths, None).unwrap();
        assert!((frame.valid_fraction() - 0.98).abs() < 1e-6);
    }

    #[test]
    fn confidence_weights() {
        assert!((DepthConfidence::Low.weight()).abs() < f32::EPSILON);
        assert!((DepthConfidence::Medium.weight() - 0.5).abs() < f32::EPSILON);
        assert!((DepthConfidence::High.weight() - 1.0).abs() < f32::EPSILON);
        assert_eq!(DepthConfidence::from_level(1), DepthConfidence::Medium);
        assert_eq!(DepthConfidence::from_level(7), DepthConfidence::High);
        assert!(DepthConfidence::Low < DepthConfidence::High);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn confidence_serialization() {
        let json = serde_json::to_string(&DepthConfidence::Medium).ok();
        assert!(json.is_some());
    }
}
