//! Refinement pipeline: carve the grid, then reconstruct a surface.

use std::time::Instant;

use measure_types::{CloudPoint, OrientedBox, PointCloud, RefinedVolume};
use nalgebra::Point3;
use tracing::{debug, info};

use crate::carve::carve;
use crate::error::{RefineError, RefineResult};
use crate::grid::BoxGrid;
use crate::params::RefineParams;

/// Refines the volume of a settled box from its captured point cloud.
///
/// # Example
///
/// ```
/// use measure_refine::{RefineParams, VolumeRefiner};
/// use measure_types::{OrientedBox, Point3, PointCloud, Vector3};
///
/// let obb = OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.1, 0.1, 0.1));
/// let cloud = PointCloud::from_positions(&[Point3::new(0.0, 0.05, 0.02)]);
///
/// let refiner = VolumeRefiner::new(RefineParams::fast()).unwrap();
/// let refined = refiner.refine(&obb, &cloud).unwrap();
/// assert_eq!(refined.occupied_count(), 1);
/// assert!(refined.mesh_volume.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VolumeRefiner {
    params: RefineParams,
}

impl VolumeRefiner {
    /// Creates a refiner with validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParams`] if the parameters are invalid.
    pub fn new(params: RefineParams) -> RefineResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &RefineParams {
        &self.params
    }

    /// Computes the refined volume of `obb` from the points of `cloud`
    /// inside it.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::NoPointsInBox`] if no point lies inside the
    /// box (within the configured margin). A surface that cannot be built
    /// or is too open only leaves `mesh_volume` empty.
    pub fn refine(&self, obb: &OrientedBox, cloud: &PointCloud) -> RefineResult<RefinedVolume> {
        let started = Instant::now();
        let params = &self.params;

        let inside: Vec<CloudPoint> = cloud
            .points()
            .iter()
            .filter(|p| obb.contains(&p.position, params.point_margin))
            .copied()
            .collect();
        if inside.is_empty() {
            debug!(cloud = cloud.len(), "No points inside box");
            return Err(RefineError::NoPointsInBox);
        }

        let mut grid = BoxGrid::new(obb, params.resolution);
        let stats = carve(&mut grid, cloud, &inside, params.min_views_for_carving);
        let voxel_volume = grid.occupied_volume();

        let mut mesh_volume = None;
        let mut reconstructor_name = None;
        if let Some(reconstructor) = params.reconstructor.build() {
            let positions = thin(&inside, grid.voxel_size(), params.max_reconstruction_points);
            reconstructor_name = Some(reconstructor.name().to_string());
            match reconstructor.reconstruct(&positions) {
                Some(mesh) => {
                    let open_ratio = mesh.open_edge_ratio();
                    if open_ratio <= params.max_open_edge_ratio {
                        mesh_volume = Some(mesh.volume());
                    } else {
                        debug!(
                            open_ratio,
                            max = params.max_open_edge_ratio,
                            "Surface too open for a volume"
                        );
                    }
                }
                None => debug!(
                    reconstructor = reconstructor.name(),
                    points = positions.len(),
                    "No surface reconstructed"
                ),
            }
        }

        let refined = RefinedVolume {
            voxel_size: grid.voxel_size(),
            grid_origin: grid.origin(),
            grid_dims: grid.dims(),
            occupied: grid.occupied(),
            voxel_volume,
            carved: stats.carved,
            mesh_volume,
            reconstructor: reconstructor_name,
            processing_time: started.elapsed(),
        };

        info!(
            points = inside.len(),
            views = stats.views,
            voxels = refined.occupied_count(),
            voxel_volume,
            mesh_volume = ?refined.mesh_volume,
            carved = refined.carved,
            time_ms = refined.processing_time.as_secs_f64() * 1000.0,
            "Volume refined"
        );

        Ok(refined)
    }
}

/// Refines `obb` against `cloud` with the given parameters.
///
/// # Errors
///
/// Returns [`RefineError::InvalidParams`] for invalid parameters and
/// [`RefineError::NoPointsInBox`] when the box holds no points.
pub fn refine_volume(
    obb: &OrientedBox,
    cloud: &PointCloud,
    params: &RefineParams,
) -> RefineResult<RefinedVolume> {
    VolumeRefiner::new(params.clone())?.refine(obb, cloud)
}

/// Voxel-subsamples `points` until at most `budget` remain, starting from
/// half the grid's voxel size and growing it geometrically.
fn thin(points: &[CloudPoint], voxel_size: f64, budget: usize) -> Vec<Point3<f64>> {
    if points.len() <= budget {
        return points.iter().map(|p| p.position).collect();
    }
    let cloud: PointCloud = points.iter().map(|p| p.position).collect();
    let mut size = voxel_size * 0.5;
    let mut thinned = cloud.downsample(size);
    for _ in 0..32 {
        if thinned.len() <= budget {
            break;
        }
        size *= 1.5;
        thinned = cloud.downsample(size);
    }
    thinned.positions().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ReconstructorKind;
    use nalgebra::Vector3;

    fn cube() -> OrientedBox {
        OrientedBox::axis_aligned(Point3::new(0.0, 0.1, 0.0), Vector3::new(0.1, 0.1, 0.1))
    }

    #[test]
    fn empty_box_is_an_error() {
        let cloud = PointCloud::from_positions(&[Point3::new(1.0, 1.0, 1.0)]);
        let err = VolumeRefiner::default().refine(&cube(), &cloud).unwrap_err();
        assert!(matches!(err, RefineError::NoPointsInBox));
    }

    #[test]
    fn margin_admits_points_just_outside() {
        let cloud = PointCloud::from_positions(&[Point3::new(0.105, 0.1, 0.0)]);
        let refiner = VolumeRefiner::new(RefineParams::fast()).unwrap();
        assert!(refiner.refine(&cube(), &cloud).is_ok());
        let strict = VolumeRefiner::new(RefineParams::fast().with_point_margin(0.0)).unwrap();
        assert!(strict.refine(&cube(), &cloud).is_err());
    }

    #[test]
    fn reconstructor_name_recorded() {
        let cloud = PointCloud::from_positions(&[
            Point3::new(0.01, 0.1, 0.02),
            Point3::new(0.03, 0.12, 0.0),
        ]);
        let params = RefineParams::new().with_reconstructor(ReconstructorKind::AlphaShape { alpha: None });
        let refined = refine_volume(&cube(), &cloud, &params).unwrap();
        assert_eq!(refined.reconstructor.as_deref(), Some("alpha-shape"));
        assert!(refined.mesh_volume.is_none());
        assert_eq!(refined.grid_dims, [48, 48, 48]);
    }

    #[test]
    fn thinning_respects_budget() {
        let points: Vec<CloudPoint> = (0..5000)
            .map(|i| {
                let t = f64::from(i) * 0.001;
                CloudPoint::new(Point3::new(t.sin() * 0.1, t * 0.02, t.cos() * 0.1))
            })
            .collect();
        let thinned = thin(&points, 0.002, 1000);
        assert!(thinned.len() <= 1000);
        assert!(!thinned.is_empty());
        assert_eq!(thin(&points[..10], 0.002, 1000).len(), 10);
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(VolumeRefiner::new(RefineParams::new().with_resolution(0)).is_err());
    }
}
