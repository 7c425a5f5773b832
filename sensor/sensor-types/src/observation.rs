//! A single capture: everything the sampler needs from one frame.

use nalgebra::Point3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Camera, DepthFrame, SensorError, Selection, TrackingState};

/// One depth capture with its camera, object selection and tracking state.
///
/// # Example
///
/// ```
/// use sensor_types::{Camera, CameraIntrinsics, DepthFrame, Observation, Selection};
/// use nalgebra::Point3;
///
/// let depth = DepthFrame::try_new(32, 24, vec![1.0; 32 * 24], None).unwrap();
/// let camera = Camera::new(CameraIntrinsics::ideal(30.0, 32, 24), Default::default());
///
/// let obs = Observation::new(depth, camera)
///     .with_selection(Selection::Full)
///     .with_raycast_hit(Point3::new(0.0, 0.0, 1.0));
///
/// assert!(obs.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// Capture time in seconds.
    pub timestamp: f64,
    /// Depth frame with optional confidence.
    pub depth: DepthFrame,
    /// Camera with intrinsics at depth resolution.
    pub camera: Camera,
    /// Object selection in normalized image coordinates.
    pub selection: Selection,
    /// World point hit by the user's tap ray, if any.
    pub raycast_hit: Option<Point3<f64>>,
    /// Tracking quality at capture time.
    pub tracking: TrackingState,
}

impl Observation {
    /// Creates an observation of the full frame with normal tracking.
    #[must_use]
    pub fn new(depth: DepthFrame, camera: Camera) -> Self {
        Self {
            timestamp: 0.0,
            depth,
            camera,
            selection: Selection::Full,
            raycast_hit: None,
            tracking: TrackingState::Normal,
        }
    }

    /// Sets the object selection.
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the raycast hit position.
    #[must_use]
    pub fn with_raycast_hit(mut self, hit: Point3<f64>) -> Self {
        self.raycast_hit = Some(hit);
        self
    }

    /// Sets the tracking state.
    #[must_use]
    pub fn with_tracking(mut self, tracking: TrackingState) -> Self {
        self.tracking = tracking;
        self
    }

    /// Sets the capture timestamp in seconds.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Checks that intrinsics are usable and match the depth resolution.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidIntrinsics`] on bad focal lengths or a
    /// resolution mismatch between intrinsics and depth frame.
    pub fn validate(&self) -> Result<(), SensorError> {
        let k = &self.camera.intrinsics;
        k.validate()?;
        if k.width != self.depth.width() || k.height != self.depth.height() {
            return Err(SensorError::invalid_intrinsics(format!(
                "intrinsics are {}x{} but depth frame is {}x{}",
                k.width,
                k.height,
                self.depth.width(),
                self.depth.height()
            )));
        }
        Ok(())
    }
}
