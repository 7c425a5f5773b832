//! Sensor input types for box measurement.
//!
//! This crate provides the raw inputs consumed by the measurement pipeline:
//! - Depth frames with per-pixel confidence from `LiDAR` / time-of-flight sensors
//! - Object selection (segmentation masks, regions of interest)
//! - Pinhole camera intrinsics and camera-to-world poses
//! - Device tracking state
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It does not talk
//! to any device; capture sessions and pose estimation live elsewhere and hand
//! these types across.
//!
//! # Sensor Types
//!
//! - [`DepthFrame`] - Per-pixel metric depth plus [`DepthConfidence`]
//! - [`SegmentationMask`], [`RegionOfInterest`], [`Selection`] - Which pixels are the object
//! - [`CameraIntrinsics`], [`CameraPose`], [`Camera`] - Pixel ↔ world mapping
//! - [`TrackingState`] - Pose quality at capture time
//! - [`Observation`] - One complete capture
//!
//! # Coordinate Frames
//!
//! - World: right-handed, **+Y up**, meters
//! - Camera: `OpenCV` convention, +X right, +Y down, +Z forward
//! - Image: normalized `(u, v)` in `[0, 1]`, origin top-left
//!
//! # Example
//!
//! ```
//! use sensor_types::{Camera, CameraIntrinsics, CameraPose, DepthFrame, Observation};
//! use nalgebra::{Point3, Vector3};
//!
//! let pose = CameraPose::look_at(
//!     Point3::new(0.0, 1.0, -1.0),
//!     Point3::origin(),
//!     Vector3::y(),
//! ).unwrap();
//! let camera = Camera::new(CameraIntrinsics::ideal(200.0, 256, 192), pose);
//! let depth = DepthFrame::try_new(256, 192, vec![1.2; 256 * 192], None).unwrap();
//!
//! let obs = Observation::new(depth, camera);
//! assert!(obs.validate().is_ok());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod camera;
mod depth;
mod error;
mod mask;
mod observation;
mod tracking;

pub use camera::{Camera, CameraIntrinsics, CameraPose};
pub use depth::{DepthConfidence, DepthFrame};
pub use error::SensorError;
pub use mask::{RegionOfInterest, SegmentationMask, Selection};
pub use observation::Observation;
pub use tracking::{LimitedReason, TrackingState};

// Re-export nalgebra types used in the public API
pub use nalgebra::{Isometry3, Point2, Point3, Vector3};
