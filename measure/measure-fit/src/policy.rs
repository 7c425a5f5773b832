//! Tie-break policies for near-equal candidate orientations.
//!
//! The fitter narrows the caliper candidates to those within the tie
//! tolerance of the minimum area; a policy then picks one of them. Policies
//! never see or alter the area optimisation itself.

use std::fmt;

use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::OrientationCandidate;

/// Chooses one orientation among tied candidates.
pub trait OrientationPolicy: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Index into `candidates` of the preferred orientation.
    ///
    /// `candidates` is never empty. An out-of-range index is treated as 0 by
    /// the fitter.
    fn choose_orientation(&self, candidates: &[OrientationCandidate]) -> usize;
}

/// Picks the smallest ground rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimumArea;

impl OrientationPolicy for MinimumArea {
    fn name(&self) -> &'static str {
        "minimum-area"
    }

    fn choose_orientation(&self, candidates: &[OrientationCandidate]) -> usize {
        smallest_area(candidates)
    }
}

/// Prefers the candidate with a face most squarely along the tap normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignToNormal {
    /// Surface normal at the tap point, world space.
    pub normal: Vector3<f64>,
}

impl AlignToNormal {
    /// Creates the policy for `normal`.
    #[must_use]
    pub const fn new(normal: Vector3<f64>) -> Self {
        Self { normal }
    }
}

impl OrientationPolicy for AlignToNormal {
    fn name(&self) -> &'static str {
        "align-to-normal"
    }

    fn choose_orientation(&self, candidates: &[OrientationCandidate]) -> usize {
        best_aligned(candidates, &self.normal)
    }
}

/// Prefers the candidate with a face turned squarely toward the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignToView {
    /// Camera viewing direction, world space.
    pub direction: Vector3<f64>,
}

impl AlignToView {
    /// Creates the policy for a viewing `direction`.
    #[must_use]
    pub const fn new(direction: Vector3<f64>) -> Self {
        Self { direction }
    }
}

impl OrientationPolicy for AlignToView {
    fn name(&self) -> &'static str {
        "align-to-view"
    }

    fn choose_orientation(&self, candidates: &[OrientationCandidate]) -> usize {
        best_aligned(candidates, &self.direction)
    }
}

/// User-facing measurement mode; builds the matching policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeasurementMode {
    /// Tightest footprint.
    #[default]
    MinimumArea,
    /// Face the surface that was tapped.
    AlignToSurface,
    /// Face the camera.
    AlignToView,
}

impl MeasurementMode {
    /// Builds the policy for this mode.
    ///
    /// Modes whose direction is unavailable fall back to [`MinimumArea`].
    #[must_use]
    pub fn policy(
        self,
        tap_normal: Option<Vector3<f64>>,
        view_direction: Option<Vector3<f64>>,
    ) -> Box<dyn OrientationPolicy> {
        match (self, tap_normal, view_direction) {
            (Self::AlignToSurface, Some(normal), _) => Box::new(AlignToNormal::new(normal)),
            (Self::AlignToView, _, Some(direction)) => Box::new(AlignToView::new(direction)),
            _ => Box::new(MinimumArea),
        }
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumArea => write!(f, "minimum area"),
            Self::AlignToSurface => write!(f, "align to surface"),
            Self::AlignToView => write!(f, "align to view"),
        }
    }
}

fn smallest_area(candidates: &[OrientationCandidate]) -> usize {
    candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.area.total_cmp(&b.area))
        .map_or(0, |(i, _)| i)
}

/// Highest face alignment wins; a vertical direction has no preference.
fn best_aligned(candidates: &[OrientationCandidate], direction: &Vector3<f64>) -> usize {
    let scores: Option<Vec<f64>> = candidates
        .iter()
        .map(|c| c.face_alignment(direction))
        .collect();

    match scores {
        Some(scores) => scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or(0, |(i, _)| i),
        None => smallest_area(candidates),
    }
}
