//! Point sampling and segmentation for box measurement.
//!
//! Converts depth observations (depth + confidence, mask/ROI, camera pose,
//! optional tap raycast hit) into a filtered world-space [`PointCloud`] and a
//! [`MeasurementQuality`] record.
//!
//! # Pipeline
//!
//! 1. Selection gating (mask, ROI, or both) with optional pixel stride
//! 2. Depth validity and confidence gating
//! 3. Unprojection through the camera-to-world pose
//! 4. Raycast-hit distance gate, suppressing background bleed from loose masks
//! 5. Statistical outlier rejection ([`OutlierMethod`])
//!
//! Too few surviving points is a normal outcome
//! ([`SampleOutcome::InsufficientData`]), not an error.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use measure_sample::{PointSampler, SampleOutcome, SampleParams};
//! use sensor_types::{Camera, CameraIntrinsics, DepthFrame, Observation};
//!
//! // A tiny frame cannot produce the 20 points a measurement needs.
//! let depth = DepthFrame::try_new(4, 4, vec![1.0; 16], None).unwrap();
//! let camera = Camera::new(CameraIntrinsics::ideal(4.0, 4, 4), Default::default());
//! let obs = Observation::new(depth, camera);
//!
//! let outcome = PointSampler::default().sample(&obs).unwrap();
//! assert!(matches!(outcome, SampleOutcome::InsufficientData { .. }));
//! ```
//!
//! [`PointCloud`]: measure_types::PointCloud
//! [`MeasurementQuality`]: measure_types::MeasurementQuality

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod debug;
mod error;
mod normal;
pub mod outlier;
mod params;
mod sampler;

pub use error::{SampleError, SampleResult};
pub use normal::estimate_normal;
pub use params::{OutlierMethod, SampleParams};
pub use sampler::{PointSampler, SampleOutcome, SampleReport, SampleStats, sample_points};
