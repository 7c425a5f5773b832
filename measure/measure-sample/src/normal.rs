//! Surface normal at the tap point.
//!
//! The normal is estimated with PCA over the nearest kept points: it is the
//! eigenvector of the neighbourhood covariance with the smallest eigenvalue,
//! flipped to face the camera.

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

/// Estimates the unit surface normal around `at` from its `k` nearest points.
///
/// The result points toward `viewer`. Returns `None` when fewer than three
/// neighbours exist or the neighbourhood is degenerate (collinear).
#[must_use]
pub fn estimate_normal(
    points: &[Point3<f64>],
    kdtree: &KdTree<f64, 3>,
    at: &Point3<f64>,
    viewer: &Point3<f64>,
    k: usize,
) -> Option<Vector3<f64>> {
    let neighbors = kdtree.nearest_n::<SquaredEuclidean>(&[at.x, at.y, at.z], k);
    if neighbors.len() < 3 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    let neighborhood: Vec<Point3<f64>> = neighbors
        .iter()
        .filter_map(|n| points.get(n.item as usize).copied())
        .collect();

    let centroid: Vector3<f64> = neighborhood.iter().map(|p| p.coords).sum();
    #[allow(clippy::cast_precision_loss)]
    let centroid = centroid / neighborhood.len() as f64;

    let mut cov = Matrix3::zeros();
    for p in &neighborhood {
        let diff = p.coords - centroid;
        cov += diff * diff.transpose();
    }

    let eigen = SymmetricEigen::new(cov);
    let values = eigen.eigenvalues;

    // Smallest eigenvalue index
    let min_idx = if values[0] <= values[1] && values[0] <= values[2] {
        0
    } else if values[1] <= values[2] {
        1
    } else {
        2
    };

    // A line of points has two vanishing eigenvalues and no defined normal.
    let mut sorted = [values[0], values[1], values[2]];
    sorted.sort_by(f64::total_cmp);
    if sorted[1] <= 1e-12 * sorted[2].max(f64::MIN_POSITIVE) {
        return None;
    }

    let column = eigen.eigenvectors.column(min_idx);
    let normal = Vector3::new(column[0], column[1], column[2]).try_normalize(1e-10)?;

    if normal.dot(&(viewer - at)) < 0.0 {
        Some(-normal)
    } else {
        Some(normal)
    }
}
