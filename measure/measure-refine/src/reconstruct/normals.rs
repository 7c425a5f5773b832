//! Outward normals for reconstruction.

use kiddo::KdTree;
use measure_sample::estimate_normal;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// Estimates a PCA normal for every point from its `k` nearest neighbours,
/// oriented away from the cloud centroid.
///
/// Entries are `None` where the neighbourhood is degenerate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_normals(
    points: &[Point3<f64>],
    kdtree: &KdTree<f64, 3>,
    k: usize,
) -> Vec<Option<Vector3<f64>>> {
    if points.is_empty() {
        return Vec::new();
    }
    let centroid = Point3::from(
        points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / points.len() as f64,
    );

    points
        .par_iter()
        .map(|p| {
            // Looking back from outside puts the normal on the far side of the centroid.
            let outward = p + (p - centroid);
            estimate_normal(points, kdtree, p, &outward, k)
        })
        .collect()
}
