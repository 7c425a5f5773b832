//! Data model for box measurement.
//!
//! This crate provides the value types shared by every stage of the
//! measurement pipeline:
//! - [`OrientedBox`] - Center, half-extents and rotation with derived corners and edges
//! - [`AxisMapping`] - Which local axis is reported as length, width and height
//! - [`MeasurementQuality`] - Coverage, confidence, point count and tracking
//! - [`PointCloud`] - Immutable world-space samples with viewpoint provenance
//! - [`Measurement`] / [`MeasurementResult`] - Scalars and the versioned result record
//! - [`RefinedVolume`] - Voxel and surface volume from background refinement
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. All types are
//! plain values; nothing here performs I/O or spawns work.
//!
//! # Coordinate Frames
//!
//! World space is right-handed with **+Y up**. Boxes produced by the fitter
//! keep their local Y vertical; only yaw is editable.
//!
//! # Example
//!
//! ```
//! use measure_types::{Axis, OrientedBox, MIN_HALF_EXTENT};
//! use nalgebra::{Point3, Vector3};
//!
//! let b = OrientedBox::axis_aligned(Point3::new(0.0, 0.15, 0.0), Vector3::new(0.1, 0.15, 0.05));
//!
//! // Corners are derived, never stored
//! let corners = b.corners();
//! assert_eq!(corners.len(), 8);
//!
//! // Extents never drop below the clamp
//! let flat = b.scale(Axis::Y, 0.0);
//! assert!((flat.half_extent(Axis::Y) - MIN_HALF_EXTENT).abs() < 1e-12);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod axis;
mod debug;
mod measurement;
mod oriented_box;
mod pointcloud;
mod quality;
mod refined;

pub use axis::{Axis, AxisMapping, Dimension};
pub use debug::{DebugImagery, GrayImage};
pub use measurement::{BoxId, Measurement, MeasurementId, MeasurementResult};
pub use oriented_box::{CORNER_SIGNS, EDGE_INDICES, MIN_HALF_EXTENT, OrientedBox};
pub use pointcloud::{CloudPoint, PointCloud};
pub use quality::{MeasurementQuality, QualityLevel, QualityThresholds};
pub use refined::{RefinedVolume, VoxelIndex};

// Re-export nalgebra types used in the public API
pub use nalgebra::{Point3, UnitQuaternion, Vector3};
