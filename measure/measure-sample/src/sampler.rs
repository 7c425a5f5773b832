//! Depth + selection → filtered world-space point cloud.
//!
//! # Algorithm
//!
//! For every observation:
//! 1. Walk the depth frame with the configured stride; pixels outside the
//!    selection are skipped, the rest are counted as masked
//! 2. Reject invalid or out-of-range depth and depth below the minimum
//!    confidence; survivors are valid (coverage = valid / masked)
//! 3. Unproject to a world point through the camera pose
//! 4. Reject points farther than the raycast tolerance from the tap hit
//!
//! The surviving points of all observations are then merged and passed
//! through statistical outlier rejection. Fewer than `min_points` kept
//! points yields [`SampleOutcome::InsufficientData`].

use std::fmt;

use measure_types::{CloudPoint, DebugImagery, MeasurementQuality, PointCloud};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use sensor_types::{Observation, TrackingState};
use tracing::{debug, info, warn};

use crate::debug::{KeptPixel, render};
use crate::error::{SampleError, SampleResult};
use crate::normal::estimate_normal;
use crate::outlier::{build_kdtree, outlier_mask};
use crate::SampleParams;

/// Per-stage pixel and point counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    /// Pixels inside the selection.
    pub masked: usize,
    /// Masked pixels with missing or out-of-range depth.
    pub invalid_depth: usize,
    /// Masked pixels below the minimum confidence.
    pub low_confidence: usize,
    /// Valid points rejected by the raycast gate.
    pub far_from_hit: usize,
    /// Points rejected by outlier filtering.
    pub outliers: usize,
    /// Points kept.
    pub kept: usize,
}

impl SampleStats {
    /// Masked pixels that produced valid depth.
    #[must_use]
    pub const fn valid(&self) -> usize {
        self.masked - self.invalid_depth - self.low_confidence
    }

    /// Fraction of masked pixels with valid depth (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f32 {
        if self.masked == 0 {
            return 0.0;
        }
        self.valid() as f32 / self.masked as f32
    }

    fn absorb(&mut self, other: &Self) {
        self.masked += other.masked;
        self.invalid_depth += other.invalid_depth;
        self.low_confidence += other.low_confidence;
        self.far_from_hit += other.far_from_hit;
    }
}

impl fmt::Display for SampleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sampling: {} masked → {} valid ({:.1}% coverage), {} far from hit, {} outliers, {} kept",
            self.masked,
            self.valid(),
            self.coverage() * 100.0,
            self.far_from_hit,
            self.outliers,
            self.kept
        )
    }
}

/// A successful sampling pass.
#[derive(Debug, Clone)]
pub struct SampleReport {
    /// Filtered points with viewpoint provenance.
    pub cloud: PointCloud,
    /// Coverage, confidence, point count and tracking.
    pub quality: MeasurementQuality,
    /// Per-stage counts.
    pub stats: SampleStats,
    /// Raycast hit of the first observation that had one.
    pub raycast_hit: Option<Point3<f64>>,
    /// Unit surface normal at the raycast hit, facing the camera.
    pub tap_normal: Option<Vector3<f64>>,
    /// Camera center of the first observation.
    pub camera_position: Point3<f64>,
    /// Viewing direction of the first observation.
    pub view_direction: Vector3<f64>,
    /// Kept-mask and depth images of the first observation, if requested.
    pub debug: Option<DebugImagery>,
}

/// Result of sampling.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SampleOutcome {
    /// Enough points survived.
    Sampled(SampleReport),
    /// Too few points survived; no box should be produced.
    InsufficientData {
        /// Per-stage counts.
        stats: SampleStats,
        /// Minimum count that was required.
        required: usize,
    },
}

impl SampleOutcome {
    /// Returns the report if sampling succeeded.
    #[must_use]
    pub fn into_report(self) -> Option<SampleReport> {
        match self {
            Self::Sampled(report) => Some(report),
            Self::InsufficientData { .. } => None,
        }
    }

    /// Returns `true` if enough points survived.
    #[must_use]
    pub const fn is_sampled(&self) -> bool {
        matches!(self, Self::Sampled(_))
    }

    /// Per-stage counts.
    #[must_use]
    pub const fn stats(&self) -> &SampleStats {
        match self {
            Self::Sampled(report) => &report.stats,
            Self::InsufficientData { stats, .. } => stats,
        }
    }
}

/// Converts observations into filtered point clouds.
///
/// # Example
///
/// ```
/// use measure_sample::{PointSampler, SampleParams};
///
/// let sampler = PointSampler::new(SampleParams::fast()).unwrap();
/// assert_eq!(sampler.params().stride, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PointSampler {
    params: SampleParams,
}

impl PointSampler {
    /// Creates a sampler with validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidParams`] if `params` fail validation.
    pub fn new(params: SampleParams) -> SampleResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Sampling parameters.
    #[must_use]
    pub const fn params(&self) -> &SampleParams {
        &self.params
    }

    /// Samples a single observation.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Sensor`] for malformed input.
    pub fn sample(&self, observation: &Observation) -> SampleResult<SampleOutcome> {
        self.sample_observations(std::slice::from_ref(observation))
    }

    /// Samples several observations of the same object into one cloud.
    ///
    /// Each observation's camera center becomes a viewpoint of the cloud so
    /// later stages can use multi-view evidence.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::NoObservations`] for an empty slice and
    /// [`SampleError::Sensor`] for malformed input.
    #[allow(clippy::cast_possible_truncation)]
    pub fn sample_observations(&self, observations: &[Observation]) -> SampleResult<SampleOutcome> {
        let Some(first) = observations.first() else {
            return Err(SampleError::NoObservations);
        };
        let params = &self.params;

        info!(
            observations = observations.len(),
            stride = params.stride,
            "Sampling observations"
        );

        let mut stats = SampleStats::default();
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut viewpoints = Vec::with_capacity(observations.len());

        for (view, obs) in observations.iter().enumerate() {
            obs.validate()?;
            viewpoints.push(obs.camera.pose.position());
            let (view_stats, points) = sample_view(obs, view as u32, params);
            debug!(view, %view_stats, "Sampled view");
            stats.absorb(&view_stats);
            candidates.extend(points);
        }

        let positions: Vec<Point3<f64>> = candidates.iter().map(|c| c.point.position).collect();
        let keep = outlier_mask(&positions, &params.outlier);
        let before = candidates.len();
        let kept: Vec<Candidate> = candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(c, k)| k.then_some(c))
            .collect();
        stats.outliers = before - kept.len();
        stats.kept = kept.len();

        if stats.kept < params.min_points {
            warn!(
                kept = stats.kept,
                required = params.min_points,
                "Insufficient points for a measurement"
            );
            return Ok(SampleOutcome::InsufficientData {
                stats,
                required: params.min_points,
            });
        }

        let tracking = observations
            .iter()
            .map(|o| o.tracking)
            .fold(TrackingState::Normal, worse_tracking);

        let points: Vec<CloudPoint> = kept.iter().map(|c| c.point).collect();
        let cloud = PointCloud::new(points, viewpoints);
        let quality = MeasurementQuality::new(
            stats.coverage(),
            cloud.mean_confidence(),
            cloud.len(),
            tracking,
        );

        let hit_view = observations
            .iter()
            .position(|o| o.raycast_hit.is_some());
        let raycast_hit = hit_view.and_then(|i| observations[i].raycast_hit);
        let tap_normal = hit_view.zip(raycast_hit).and_then(|(i, hit)| {
            let kept_positions: Vec<Point3<f64>> = cloud.positions().collect();
            let tree = build_kdtree(&kept_positions);
            let viewer = cloud.viewpoints()[i];
            estimate_normal(&kept_positions, &tree, &hit, &viewer, params.normal_neighbors)
        });

        let debug = params.debug_imagery.then(|| {
            let pixels: Vec<KeptPixel> = kept
                .iter()
                .filter(|c| c.point.view == Some(0))
                .map(|c| c.pixel)
                .collect();
            render(first.depth.width(), first.depth.height(), &pixels)
        });

        info!(
            kept = stats.kept,
            coverage = format!("{:.2}", stats.coverage()),
            confidence = format!("{:.2}", quality.depth_confidence),
            level = %quality.level(),
            "Sampling complete"
        );

        Ok(SampleOutcome::Sampled(SampleReport {
            cloud,
            quality,
            stats,
            raycast_hit,
            tap_normal,
            camera_position: first.camera.pose.position(),
            view_direction: first.camera.pose.forward(),
            debug,
        }))
    }
}

/// Samples one observation with `params`.
///
/// # Errors
///
/// Returns [`SampleError::Sensor`] for malformed input.
pub fn sample_points(observation: &Observation, params: &SampleParams) -> SampleResult<SampleOutcome> {
    PointSampler::new(params.clone())?.sample(observation)
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    point: CloudPoint,
    pixel: KeptPixel,
}

/// Gathers gated points from one observation, rows in parallel.
fn sample_view(obs: &Observation, view: u32, params: &SampleParams) -> (SampleStats, Vec<Candidate>) {
    let frame = &obs.depth;
    let rows: Vec<u32> = (0..frame.height()).step_by(params.stride as usize).collect();

    let per_row: Vec<(SampleStats, Vec<Candidate>)> = rows
        .par_iter()
        .map(|&y| sample_row(obs, view, y, params))
        .collect();

    let mut stats = SampleStats::default();
    let mut points = Vec::new();
    for (row_stats, row_points) in per_row {
        stats.absorb(&row_stats);
        points.extend(row_points);
    }
    (stats, points)
}

fn sample_row(obs: &Observation, view: u32, y: u32, params: &SampleParams) -> (SampleStats, Vec<Candidate>) {
    let frame = &obs.depth;
    let width = f64::from(frame.width());
    let height = f64::from(frame.height());
    let v = (f64::from(y) + 0.5) / height;
    let gate = obs.raycast_hit.zip(params.raycast_tolerance);

    let mut stats = SampleStats::default();
    let mut points = Vec::new();

    for x in (0..frame.width()).step_by(params.stride as usize) {
        let u = (f64::from(x) + 0.5) / width;
        if !obs.selection.contains(u, v) {
            continue;
        }
        stats.masked += 1;

        let Some(depth) = frame.get_valid(x, y) else {
            stats.invalid_depth += 1;
            continue;
        };
        let confidence = frame.confidence_at(x, y);
        if confidence < params.min_confidence {
            stats.low_confidence += 1;
            continue;
        }

        let position = obs.camera.unproject_pixel(x, y, f64::from(depth));
        if let Some((hit, tolerance)) = gate {
            if (position - hit).norm() > tolerance {
                stats.far_from_hit += 1;
                continue;
            }
        }

        points.push(Candidate {
            point: CloudPoint::observed(position, confidence.weight(), view),
            pixel: KeptPixel { x, y, depth },
        });
    }

    (stats, points)
}

const fn tracking_rank(state: TrackingState) -> u8 {
    match state {
        TrackingState::Normal => 0,
        TrackingState::Limited(_) => 1,
        TrackingState::NotAvailable => 2,
    }
}

fn worse_tracking(a: TrackingState, b: TrackingState) -> TrackingState {
    if tracking_rank(b) > tracking_rank(a) { b } else { a }
}
