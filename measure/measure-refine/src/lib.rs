//! Background volume refinement for settled boxes.
//!
//! Estimates how much of an oriented box is actually filled, in two stages:
//!
//! 1. **Voxel carving**: a cubic grid over the box's local volume. Voxels
//!    holding points are occupied. With at least two distinct viewpoints the
//!    grid starts solid and the space every viewpoint→point ray crosses is
//!    carved away ([`carve`]).
//! 2. **Surface reconstruction**: a [`SurfaceReconstructor`] builds a
//!    triangle mesh from the (thinned) in-box points. When the mesh is closed
//!    enough its signed-tetrahedra volume is reported as well.
//!
//! The result is a [`RefinedVolume`]. Refinement is pure with respect to its
//! inputs; scheduling and staleness handling belong to the caller.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use measure_refine::{RefineParams, VolumeRefiner};
//! use measure_types::{OrientedBox, Point3, PointCloud, Vector3};
//!
//! let obb = OrientedBox::axis_aligned(Point3::new(0.0, 0.1, 0.0), Vector3::new(0.1, 0.1, 0.1));
//! let cloud = PointCloud::from_positions(&[
//!     Point3::new(0.0, 0.15, 0.0),
//!     Point3::new(0.05, 0.05, -0.05),
//! ]);
//!
//! let refined = VolumeRefiner::new(RefineParams::fast())
//!     .unwrap()
//!     .refine(&obb, &cloud)
//!     .unwrap();
//!
//! assert!(!refined.carved);
//! assert_eq!(refined.occupied_count(), 2);
//! ```
//!
//! [`RefinedVolume`]: measure_types::RefinedVolume

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod carve;
mod engine;
mod error;
mod grid;
mod params;
mod reconstruct;
mod traversal;

pub use carve::{CarveStats, carve};
pub use engine::{VolumeRefiner, refine_volume};
pub use error::{RefineError, RefineResult};
pub use grid::BoxGrid;
pub use params::{ReconstructorKind, RefineParams};
pub use reconstruct::{
    AlphaShape, BallPivoting, ReconstructedMesh, SurfaceReconstructor, estimate_normals,
    mean_spacing,
};
pub use traversal::SegmentTraversal;
