//! Voxel carving.
//!
//! With enough distinct viewpoints the grid starts solid and every voxel a
//! viewpoint→point ray crosses before reaching the point is observed empty.
//! Voxels holding a point always stay occupied. With a single view the grid
//! only marks voxels that hold points.

use std::collections::BTreeSet;

use measure_types::{CloudPoint, PointCloud};
use rayon::prelude::*;
use tracing::debug;

use crate::grid::BoxGrid;
use crate::traversal::SegmentTraversal;

/// Summary of one carving pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarveStats {
    /// Distinct viewpoints among the carved points.
    pub views: usize,
    /// Voxels that hold at least one point.
    pub point_voxels: usize,
    /// Voxels removed by ray carving.
    pub carved_voxels: usize,
    /// Whether ray carving ran.
    pub carved: bool,
}

/// Marks `grid` from `points`, carving along viewpoint rays when at least
/// `min_views` distinct viewpoints are available in `cloud`.
///
/// Points whose view is unknown contribute occupancy but no rays.
pub fn carve(
    grid: &mut BoxGrid,
    cloud: &PointCloud,
    points: &[CloudPoint],
    min_views: usize,
) -> CarveStats {
    let point_voxels: BTreeSet<_> = points.iter().map(|p| grid.voxel_of(&p.position)).collect();
    let views: BTreeSet<u32> = points
        .iter()
        .filter(|p| cloud.viewpoint_of(p).is_some())
        .filter_map(|p| p.view)
        .collect();

    let mut stats = CarveStats {
        views: views.len(),
        point_voxels: point_voxels.len(),
        ..CarveStats::default()
    };

    if views.len() < min_views.max(2) {
        grid.fill(false);
        for &index in &point_voxels {
            grid.set(index, true);
        }
        debug!(
            views = stats.views,
            point_voxels = stats.point_voxels,
            "Too few views to carve, marking point voxels"
        );
        return stats;
    }

    let shared: &BoxGrid = grid;
    let dims = shared.dims();
    let len = shared.len();
    let seen = points
        .par_iter()
        .fold(
            || vec![false; len],
            |mut seen, point| {
                let Some(eye) = cloud.viewpoint_of(point) else {
                    return seen;
                };
                let target = shared.voxel_of(&point.position);
                let ray = SegmentTraversal::new(
                    shared.to_grid(&eye),
                    shared.to_grid(&point.position),
                    dims,
                );
                for index in ray {
                    if index == target {
                        break;
                    }
                    if let Some(flag) = shared.linear_index(index).and_then(|i| seen.get_mut(i)) {
                        *flag = true;
                    }
                }
                seen
            },
        )
        .reduce(
            || vec![false; len],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x |= y;
                }
                a
            },
        );

    grid.fill(true);
    for index in grid.all_indices() {
        let observed_empty = grid
            .linear_index(index)
            .and_then(|i| seen.get(i))
            .copied()
            .unwrap_or(false);
        if observed_empty && !point_voxels.contains(&index) {
            grid.set(index, false);
            stats.carved_voxels += 1;
        }
    }
    stats.carved = true;

    debug!(
        views = stats.views,
        point_voxels = stats.point_voxels,
        carved_voxels = stats.carved_voxels,
        "Carved voxel grid"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use measure_types::{OrientedBox, VoxelIndex};
    use nalgebra::{Point3, Vector3};

    fn slab() -> OrientedBox {
        OrientedBox::axis_aligned(Point3::new(0.0, 0.5, 0.0), Vector3::new(0.5, 0.5, 0.5))
    }

    /// Points on the plane y = 0.25 seen from far above.
    fn floor_cloud(views: &[Point3<f64>]) -> (PointCloud, Vec<CloudPoint>) {
        let mut points = Vec::new();
        for i in 0..20 {
            for k in 0..20 {
                let x = -0.475 + 0.05 * i as f64;
                let z = -0.475 + 0.05 * k as f64;
                #[allow(clippy::cast_possible_truncation)]
                let view = ((i + k) % views.len()) as u32;
                points.push(CloudPoint::observed(Point3::new(x, 0.25, z), 1.0, view));
            }
        }
        let cloud = PointCloud::new(points.clone(), views.to_vec());
        (cloud, points)
    }

    #[test]
    fn single_view_marks_points_only() {
        let (cloud, points) = floor_cloud(&[Point3::new(0.0, 100.0, 0.0)]);
        let mut grid = BoxGrid::new(&slab(), 10);
        let stats = carve(&mut grid, &cloud, &points, 2);
        assert!(!stats.carved);
        assert_eq!(stats.views, 1);
        assert_eq!(grid.occupied_count(), stats.point_voxels);
        assert_eq!(grid.occupied_count(), 100);
    }

    #[test]
    fn two_views_carve_space_above_surface() {
        let (cloud, points) = floor_cloud(&[Point3::new(0.0, 100.0, 0.0), Point3::new(0.1, 100.0, 0.1)]);
        let mut grid = BoxGrid::new(&slab(), 10);
        let stats = carve(&mut grid, &cloud, &points, 2);
        assert!(stats.carved);
        assert_eq!(stats.views, 2);

        // Layers above the surface are carved, layers below stay solid.
        for y in 3..10 {
            assert!(!grid.is_occupied(VoxelIndex::new(5, y, 5)));
        }
        for y in 0..3 {
            assert!(grid.is_occupied(VoxelIndex::new(5, y, 5)));
        }
        assert_eq!(grid.occupied_count(), 300);
    }

    #[test]
    fn points_without_viewpoints_do_not_count_as_views() {
        let points: Vec<CloudPoint> = (0..10)
            .map(|i| CloudPoint::new(Point3::new(0.01 * f64::from(i), 0.5, 0.0)))
            .collect();
        let cloud = PointCloud::new(points.clone(), Vec::new());
        let mut grid = BoxGrid::new(&slab(), 10);
        let stats = carve(&mut grid, &cloud, &points, 2);
        assert_eq!(stats.views, 0);
        assert!(!stats.carved);
        assert!(grid.occupied_count() >= 1);
    }
}
