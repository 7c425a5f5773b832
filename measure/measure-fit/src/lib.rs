//! Oriented box fitting for box measurement.
//!
//! Fits a gravity-aligned oriented box (rotation about world +Y only) to a
//! sampled [`PointCloud`] and derives the [`Measurement`] scalars from it.
//!
//! # Algorithm
//!
//! 1. Project the cloud onto the ground (XZ) plane and take its convex hull
//! 2. Rotating calipers: every hull edge direction is a candidate yaw
//! 3. Candidates within `tie_tolerance` of the minimum footprint area go to
//!    an [`OrientationPolicy`], which picks one
//! 4. Extents and center from min/max projections on the chosen axes
//! 5. [`AxisMapping`] from the extents: longer horizontal axis is length,
//!    vertical is height
//! 6. Optional snap of the bottom face onto a known floor height
//!
//! [`recalculate`] turns any box (fitted or edited) plus quality and axis
//! mapping back into measurement scalars.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use measure_fit::{BoxFitter, MeasurementMode};
//! use measure_types::{MeasurementQuality, Point3, PointCloud};
//!
//! let cloud: PointCloud = (0..8)
//!     .map(|i| {
//!         let x = if i & 1 == 0 { 0.0 } else { 0.3 };
//!         let y = if i & 2 == 0 { 0.0 } else { 0.1 };
//!         let z = if i & 4 == 0 { 0.0 } else { 0.2 };
//!         Point3::new(x, y, z)
//!     })
//!     .collect();
//!
//! let policy = MeasurementMode::default().policy(None, None);
//! let m = BoxFitter::default()
//!     .fit_measurement(&cloud, policy.as_ref(), MeasurementQuality::default(), None)
//!     .unwrap();
//!
//! assert!((m.length - 0.3).abs() < 1e-9);
//! assert!((m.width - 0.2).abs() < 1e-9);
//! assert!((m.height - 0.1).abs() < 1e-9);
//! ```
//!
//! [`PointCloud`]: measure_types::PointCloud
//! [`Measurement`]: measure_types::Measurement
//! [`AxisMapping`]: measure_types::AxisMapping

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod calipers;
mod error;
mod fit;
mod hull;
mod params;
mod policy;

pub use calipers::{OrientationCandidate, candidate_orientations, evaluate_yaw};
pub use error::{FitError, FitResult};
pub use fit::{BoxFit, BoxFitter, local_bounds, recalculate};
pub use hull::convex_hull;
pub use params::FitParams;
pub use policy::{AlignToNormal, AlignToView, MeasurementMode, MinimumArea, OrientationPolicy};
