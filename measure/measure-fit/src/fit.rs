//! Gravity-aligned oriented box fitting.
//!
//! The box is constrained to rotate about world +Y only, so the search is a
//! 2D minimum-area rectangle over the ground projection followed by a
//! vertical min/max.

use measure_types::{
    Axis, AxisMapping, CloudPoint, Dimension, Measurement, MeasurementQuality, OrientedBox,
    PointCloud,
};
use nalgebra::{Point2, UnitQuaternion, Vector3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::calipers::{OrientationCandidate, candidate_orientations};
use crate::error::{FitError, FitResult};
use crate::hull::convex_hull;
use crate::params::FitParams;
use crate::policy::OrientationPolicy;

/// Output of a single fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFit {
    /// The fitted box.
    pub obb: OrientedBox,
    /// Dimension labels derived from the fitted extents.
    pub axis_mapping: AxisMapping,
    /// Orientation the policy chose.
    pub chosen: OrientationCandidate,
    /// Number of caliper candidates evaluated.
    pub candidate_count: usize,
    /// Number of candidates offered to the policy.
    pub tied_count: usize,
    /// Whether the bottom face was snapped to the floor.
    pub floor_snapped: bool,
}

impl BoxFit {
    /// Bundles the fit with `quality` into a [`Measurement`].
    #[must_use]
    pub fn into_measurement(self, quality: MeasurementQuality) -> Measurement {
        recalculate(&self.obb, &quality, &self.axis_mapping)
    }
}

/// Fits gravity-aligned oriented boxes to point clouds.
///
/// # Example
///
/// ```
/// use measure_fit::{BoxFitter, MinimumArea};
/// use measure_types::{Point3, PointCloud};
///
/// let cloud: PointCloud = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(0.4, 0.0, 0.0),
///     Point3::new(0.4, 0.0, 0.2),
///     Point3::new(0.0, 0.3, 0.2),
/// ]
/// .into_iter()
/// .collect();
///
/// let fit = BoxFitter::default().fit(&cloud, &MinimumArea, None).unwrap();
/// let extents = fit.obb.extents();
/// assert!((extents.x - 0.4).abs() < 1e-9);
/// assert!((extents.y - 0.3).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxFitter {
    params: FitParams,
}

impl BoxFitter {
    /// Creates a fitter.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidParams`] if `params` fail validation.
    pub fn new(params: FitParams) -> FitResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Fitting parameters.
    #[must_use]
    pub const fn params(&self) -> &FitParams {
        &self.params
    }

    /// Fits a box to `cloud`.
    ///
    /// `floor_y`, when known, enables snapping the bottom face to the floor.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::EmptyCloud`] if the cloud has no points.
    pub fn fit(
        &self,
        cloud: &PointCloud,
        policy: &dyn OrientationPolicy,
        floor_y: Option<f64>,
    ) -> FitResult<BoxFit> {
        if cloud.is_empty() {
            return Err(FitError::EmptyCloud);
        }

        let ground: Vec<Point2<f64>> = cloud
            .points()
            .iter()
            .map(|p| Point2::new(p.position.x, p.position.z))
            .collect();
        let hull = convex_hull(&ground);
        let candidates = candidate_orientations(&hull);

        let min_area = candidates
            .iter()
            .map(|c| c.area)
            .fold(f64::INFINITY, f64::min);
        let limit = min_area * (1.0 + self.params.tie_tolerance);
        let tied: Vec<OrientationCandidate> = candidates
            .iter()
            .filter(|c| c.area <= limit)
            .copied()
            .collect();

        debug!(
            hull_vertices = hull.len(),
            candidates = candidates.len(),
            tied = tied.len(),
            min_area,
            "Caliper search complete"
        );

        let mut index = policy.choose_orientation(&tied);
        if index >= tied.len() {
            warn!(
                policy = policy.name(),
                index,
                tied = tied.len(),
                "Policy chose an out-of-range candidate, using the first"
            );
            index = 0;
        }
        let Some(&chosen) = tied.get(index) else {
            return Err(FitError::EmptyCloud);
        };

        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), chosen.yaw);
        let (min, max) = local_bounds(cloud.points(), &rotation);
        let mut obb = OrientedBox::from_local_bounds(rotation, &min, &max);
        let axis_mapping = AxisMapping::from_extents(&obb.extents(), Axis::Y);

        let mut floor_snapped = false;
        if let Some(floor) = floor_y {
            let snapped = obb.extend_bottom_to_floor(floor, self.params.floor_snap_threshold);
            floor_snapped = snapped != obb;
            obb = snapped;
        }

        info!(
            points = cloud.len(),
            policy = policy.name(),
            yaw_deg = chosen.yaw.to_degrees(),
            length = obb.half_extent(axis_mapping.axis(Dimension::Length)) * 2.0,
            width = obb.half_extent(axis_mapping.axis(Dimension::Width)) * 2.0,
            height = obb.half_extent(axis_mapping.axis(Dimension::Height)) * 2.0,
            floor_snapped,
            "Box fitted"
        );

        Ok(BoxFit {
            obb,
            axis_mapping,
            chosen,
            candidate_count: candidates.len(),
            tied_count: tied.len(),
            floor_snapped,
        })
    }

    /// Fits a box and derives the measurement scalars in one step.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::EmptyCloud`] if the cloud has no points.
    pub fn fit_measurement(
        &self,
        cloud: &PointCloud,
        policy: &dyn OrientationPolicy,
        quality: MeasurementQuality,
        floor_y: Option<f64>,
    ) -> FitResult<Measurement> {
        Ok(self.fit(cloud, policy, floor_y)?.into_measurement(quality))
    }
}

/// Min/max of `points` expressed on the axes of `rotation`.
///
/// Returns zero bounds for an empty slice.
#[must_use]
pub fn local_bounds(
    points: &[CloudPoint],
    rotation: &UnitQuaternion<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    if points.is_empty() {
        return (Vector3::zeros(), Vector3::zeros());
    }

    let inverse = rotation.inverse();
    let empty = || {
        (
            Vector3::repeat(f64::INFINITY),
            Vector3::repeat(f64::NEG_INFINITY),
        )
    };

    points
        .par_iter()
        .fold(empty, |(lo, hi), p| {
            let local = inverse * p.position.coords;
            (lo.inf(&local), hi.sup(&local))
        })
        .reduce(empty, |(lo_a, hi_a), (lo_b, hi_b)| {
            (lo_a.inf(&lo_b), hi_a.sup(&hi_b))
        })
}

/// Derives the measurement scalars from a box.
///
/// Pure: the same inputs always produce the same output, so calling it on
/// its own output's box and mapping is a no-op.
///
/// # Example
///
/// ```
/// use measure_fit::recalculate;
/// use measure_types::{AxisMapping, MeasurementQuality, OrientedBox, Point3, Vector3};
///
/// let obb = OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.1, 0.15, 0.05));
/// let m = recalculate(&obb, &MeasurementQuality::default(), &AxisMapping::default());
/// assert!((m.length - 0.2).abs() < 1e-12);
/// assert!((m.height - 0.3).abs() < 1e-12);
/// assert!((m.width - 0.1).abs() < 1e-12);
/// ```
#[must_use]
pub fn recalculate(
    obb: &OrientedBox,
    quality: &MeasurementQuality,
    axis_mapping: &AxisMapping,
) -> Measurement {
    let extents = obb.extents();
    Measurement {
        obb: *obb,
        quality: *quality,
        axis_mapping: *axis_mapping,
        length: extents[axis_mapping.length.index()],
        width: extents[axis_mapping.width.index()],
        height: extents[axis_mapping.height.index()],
        volume: obb.volume(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MinimumArea;
    use approx::assert_relative_eq;
    use measure_types::{MIN_HALF_EXTENT, Point3};

    #[derive(Debug)]
    struct OutOfRange;

    impl OrientationPolicy for OutOfRange {
        fn name(&self) -> &'static str {
            "out-of-range"
        }

        fn choose_orientation(&self, candidates: &[OrientationCandidate]) -> usize {
            candidates.len() + 3
        }
    }

    fn corners(center: Point3<f64>, half: Vector3<f64>, yaw: f64) -> PointCloud {
        OrientedBox::from_yaw(center, half, yaw)
            .corners()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_empty_cloud() {
        let err = BoxFitter::default()
            .fit(&PointCloud::default(), &MinimumArea, None)
            .unwrap_err();
        assert!(matches!(err, FitError::EmptyCloud));
    }

    #[test]
    fn test_invalid_params() {
        assert!(BoxFitter::new(FitParams::new().with_tie_tolerance(-1.0)).is_err());
    }

    #[test]
    fn test_fit_rotated_corners() {
        let half = Vector3::new(0.3, 0.1, 0.2);
        let cloud = corners(Point3::new(1.0, 0.5, -2.0), half, 0.4);
        let fit = BoxFitter::default().fit(&cloud, &MinimumArea, None).unwrap();

        assert_relative_eq!(fit.obb.volume(), 8.0 * 0.3 * 0.1 * 0.2, epsilon = 1e-9);
        assert_relative_eq!(fit.obb.center(), Point3::new(1.0, 0.5, -2.0), epsilon = 1e-9);
        assert_eq!(fit.axis_mapping.height, Axis::Y);
        let m = fit.into_measurement(MeasurementQuality::default());
        assert_relative_eq!(m.length, 0.6, epsilon = 1e-9);
        assert_relative_eq!(m.width, 0.4, epsilon = 1e-9);
        assert_relative_eq!(m.height, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_single_point_is_clamped() {
        let cloud: PointCloud = std::iter::once(Point3::new(0.0, 1.0, 0.0)).collect();
        let fit = BoxFitter::default().fit(&cloud, &MinimumArea, None).unwrap();
        for i in 0..3 {
            assert_relative_eq!(fit.obb.half_extents()[i], MIN_HALF_EXTENT);
        }
        assert_eq!(fit.candidate_count, 1);
    }

    #[test]
    fn test_out_of_range_policy_falls_back() {
        let cloud = corners(Point3::origin(), Vector3::new(0.2, 0.1, 0.1), 0.2);
        let fit = BoxFitter::default().fit(&cloud, &OutOfRange, None).unwrap();
        assert_relative_eq!(fit.obb.volume(), 8.0 * 0.2 * 0.1 * 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_floor_snap() {
        // Bottom at 0.03, floor at 0.
        let cloud = corners(Point3::new(0.0, 0.13, 0.0), Vector3::new(0.1, 0.1, 0.1), 0.0);
        let fit = BoxFitter::default()
            .fit(&cloud, &MinimumArea, Some(0.0))
            .unwrap();
        assert!(fit.floor_snapped);
        assert_relative_eq!(fit.obb.bottom_y(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(fit.obb.top_y(), 0.23, epsilon = 1e-9);

        let far = BoxFitter::default()
            .fit(&cloud, &MinimumArea, Some(-0.5))
            .unwrap();
        assert!(!far.floor_snapped);
    }

    #[test]
    fn test_recalculate_idempotent() {
        let obb = OrientedBox::from_yaw(Point3::new(0.1, 0.2, 0.3), Vector3::new(0.1, 0.2, 0.05), 1.1);
        let mapping = AxisMapping::from_extents(&obb.extents(), Axis::Y);
        let quality = MeasurementQuality::default();
        let first = recalculate(&obb, &quality, &mapping);
        let second = recalculate(&first.obb, &first.quality, &first.axis_mapping);
        assert_eq!(first, second);
    }

    #[test]
    fn test_local_bounds_empty() {
        let (lo, hi) = local_bounds(&[], &UnitQuaternion::identity());
        assert_eq!(lo, hi);
    }
}
