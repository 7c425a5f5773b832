//! Refinement parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RefineError, RefineResult};
use crate::reconstruct::{AlphaShape, BallPivoting, SurfaceReconstructor};

/// Which surface reconstructor runs after voxel carving.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReconstructorKind {
    /// Skip surface reconstruction; only the voxel volume is reported.
    None,
    /// Boundary of the α-complex.
    AlphaShape {
        /// Ball radius α in meters. `None` estimates it from point spacing.
        alpha: Option<f64>,
    },
    /// Ball pivoting over estimated outward normals.
    BallPivoting {
        /// Ball radius in meters. `None` estimates it from point spacing.
        radius: Option<f64>,
    },
}

impl Default for ReconstructorKind {
    fn default() -> Self {
        Self::AlphaShape { alpha: None }
    }
}

impl ReconstructorKind {
    /// Builds the reconstructor, or `None` for [`ReconstructorKind::None`].
    #[must_use]
    pub fn build(&self) -> Option<Box<dyn SurfaceReconstructor>> {
        match *self {
            Self::None => None,
            Self::AlphaShape { alpha } => Some(Box::new(AlphaShape::new(alpha))),
            Self::BallPivoting { radius } => Some(Box::new(BallPivoting::new(radius))),
        }
    }
}

/// Parameters for [`VolumeRefiner`](crate::VolumeRefiner).
///
/// # Example
///
/// ```
/// use measure_refine::{ReconstructorKind, RefineParams};
///
/// let params = RefineParams::new()
///     .with_resolution(32)
///     .with_reconstructor(ReconstructorKind::BallPivoting { radius: None });
///
/// assert_eq!(params.resolution, 32);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefineParams {
    /// Voxels along the box's longest local extent. Default: 48.
    pub resolution: u32,

    /// Distinct viewpoints needed before ray carving is attempted. Default: 2.
    pub min_views_for_carving: usize,

    /// Points are voxel-subsampled down to this count before surface
    /// reconstruction. Default: 2500.
    pub max_reconstruction_points: usize,

    /// Largest fraction of boundary edges for which the mesh volume is
    /// still reported. Default: 0.05.
    pub max_open_edge_ratio: f64,

    /// Points up to this far outside the box still count as inside (meters).
    /// Default: 0.01.
    pub point_margin: f64,

    /// Surface reconstruction strategy. Default: alpha shape with auto α.
    pub reconstructor: ReconstructorKind,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            resolution: 48,
            min_views_for_carving: 2,
            max_reconstruction_points: 2500,
            max_open_edge_ratio: 0.05,
            point_margin: 0.01,
            reconstructor: ReconstructorKind::default(),
        }
    }
}

impl RefineParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse grid and no surface reconstruction.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            resolution: 24,
            reconstructor: ReconstructorKind::None,
            ..Self::default()
        }
    }

    /// Fine grid and a larger reconstruction budget.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            resolution: 96,
            max_reconstruction_points: 6000,
            max_open_edge_ratio: 0.02,
            ..Self::default()
        }
    }

    /// Sets the grid resolution.
    #[must_use]
    pub const fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the viewpoint count required for carving.
    #[must_use]
    pub const fn with_min_views_for_carving(mut self, views: usize) -> Self {
        self.min_views_for_carving = views;
        self
    }

    /// Sets the reconstruction point budget.
    #[must_use]
    pub const fn with_max_reconstruction_points(mut self, count: usize) -> Self {
        self.max_reconstruction_points = count;
        self
    }

    /// Sets the tolerated open-edge ratio.
    #[must_use]
    pub const fn with_max_open_edge_ratio(mut self, ratio: f64) -> Self {
        self.max_open_edge_ratio = ratio;
        self
    }

    /// Sets the in-box margin.
    #[must_use]
    pub const fn with_point_margin(mut self, margin: f64) -> Self {
        self.point_margin = margin;
        self
    }

    /// Sets the surface reconstructor.
    #[must_use]
    pub const fn with_reconstructor(mut self, reconstructor: ReconstructorKind) -> Self {
        self.reconstructor = reconstructor;
        self
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParams`] when a value is out of range.
    pub fn validate(&self) -> RefineResult<()> {
        if self.resolution == 0 {
            return Err(RefineError::invalid_params("resolution must be at least 1"));
        }
        if self.min_views_for_carving < 2 {
            return Err(RefineError::invalid_params(
                "carving needs at least two viewpoints",
            ));
        }
        if self.max_reconstruction_points < 4 {
            return Err(RefineError::invalid_params(
                "max_reconstruction_points must be at least 4",
            ));
        }
        if !(0.0..=1.0).contains(&self.max_open_edge_ratio) {
            return Err(RefineError::invalid_params(
                "max_open_edge_ratio must be within [0, 1]",
            ));
        }
        if !self.point_margin.is_finite() || self.point_margin < 0.0 {
            return Err(RefineError::invalid_params(
                "point_margin must be non-negative",
            ));
        }
        match self.reconstructor {
            ReconstructorKind::AlphaShape { alpha: Some(r) }
            | ReconstructorKind::BallPivoting { radius: Some(r) }
                if !(r.is_finite() && r > 0.0) =>
            {
                Err(RefineError::invalid_params(
                    "reconstruction radius must be positive",
                ))
            }
            _ => Ok(()),
        }
    }
}
