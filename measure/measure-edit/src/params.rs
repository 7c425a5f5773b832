//! Editing parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};

/// Parameters for [`BoxEditor`](crate::BoxEditor).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EditParams {
    /// Face drags changing an extent by less than this are ignored (meters).
    /// Default: 0.0005.
    pub min_length_delta: f64,

    /// Faces whose center projects closer than this to the box center are
    /// seen edge-on and cannot be dragged (pixels). Default: 1.0.
    pub min_screen_distance: f64,

    /// Rotation drags closer than this to the box center are ignored
    /// (pixels). Default: 10.0.
    pub min_rotation_radius: f64,

    /// Multiplier on the rotation angle derived from a drag. Default: 1.0.
    pub rotation_sensitivity: f64,

    /// Fit-to-points considers points up to this far outside the current
    /// box (meters). Default: 0.02.
    pub refit_margin: f64,

    /// Fit-to-points gives up with fewer in-range points than this. Default: 10.
    pub refit_min_points: usize,

    /// Snap-to-floor only acts within this distance of the floor (meters).
    /// Default: 0.05.
    pub floor_snap_threshold: f64,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            min_length_delta: 5e-4,
            min_screen_distance: 1.0,
            min_rotation_radius: 10.0,
            rotation_sensitivity: 1.0,
            refit_margin: 0.02,
            refit_min_points: 10,
            floor_snap_threshold: 0.05,
        }
    }
}

impl EditParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rotation sensitivity.
    #[must_use]
    pub const fn with_rotation_sensitivity(mut self, sensitivity: f64) -> Self {
        self.rotation_sensitivity = sensitivity;
        self
    }

    /// Sets the minimum rotation radius in pixels.
    #[must_use]
    pub const fn with_min_rotation_radius(mut self, radius: f64) -> Self {
        self.min_rotation_radius = radius;
        self
    }

    /// Sets the fit-to-points margin.
    #[must_use]
    pub const fn with_refit_margin(mut self, margin: f64) -> Self {
        self.refit_margin = margin;
        self
    }

    /// Sets the fit-to-points minimum point count.
    #[must_use]
    pub const fn with_refit_min_points(mut self, min_points: usize) -> Self {
        self.refit_min_points = min_points;
        self
    }

    /// Sets the snap-to-floor threshold.
    #[must_use]
    pub const fn with_floor_snap_threshold(mut self, threshold: f64) -> Self {
        self.floor_snap_threshold = threshold;
        self
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidParams`] for negative or non-finite values.
    pub fn validate(&self) -> EditResult<()> {
        let checks = [
            ("min length delta", self.min_length_delta),
            ("min screen distance", self.min_screen_distance),
            ("min rotation radius", self.min_rotation_radius),
            ("refit margin", self.refit_margin),
            ("floor snap threshold", self.floor_snap_threshold),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EditError::invalid_params(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if !(self.rotation_sensitivity.is_finite() && self.rotation_sensitivity > 0.0) {
            return Err(EditError::invalid_params(format!(
                "rotation sensitivity must be positive, got {}",
                self.rotation_sensitivity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(EditParams::default().validate().is_ok());
    }

    #[test]
    fn test_invalid() {
        assert!(EditParams::new().with_refit_margin(-0.1).validate().is_err());
        assert!(
            EditParams::new()
                .with_rotation_sensitivity(0.0)
                .validate()
                .is_err()
        );
    }
}
