//! Statistical outlier rejection for sampled points.
//!
//! Two filters are available:
//! - Per-axis σ-clipping about the centroid. Cheap, good at removing stray
//!   background pixels that survived the mask.
//! - k-nearest-neighbour mean distance. For each point, find the k nearest
//!   neighbours and compute the mean distance; remove points where the mean
//!   exceeds `global_mean + std_multiplier * std_dev`.
//!
//! Both return a keep mask aligned with the input slice.

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::OutlierMethod;

/// Computes which points survive `method`.
#[must_use]
pub fn outlier_mask(points: &[Point3<f64>], method: &OutlierMethod) -> Vec<bool> {
    match *method {
        OutlierMethod::None => vec![true; points.len()],
        OutlierMethod::AxisSigma { sigma } => axis_sigma_mask(points, sigma),
        OutlierMethod::Neighborhood { k, std_multiplier } => {
            neighborhood_mask(points, k, std_multiplier)
        }
    }
}

/// Rejects points beyond `sigma` standard deviations from the centroid on any axis.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn axis_sigma_mask(points: &[Point3<f64>], sigma: f64) -> Vec<bool> {
    if points.len() < 3 {
        return vec![true; points.len()];
    }

    let n = points.len() as f64;
    let mean: Vector3<f64> = points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n;
    let variance: Vector3<f64> = points
        .iter()
        .map(|p| (p.coords - mean).component_mul(&(p.coords - mean)))
        .sum::<Vector3<f64>>()
        / n;
    let limit = variance.map(f64::sqrt) * sigma;

    points
        .iter()
        .map(|p| {
            let d = p.coords - mean;
            (0..3).all(|i| limit[i] <= 0.0 || d[i].abs() <= limit[i])
        })
        .collect()
}

/// Rejects points whose mean k-neighbour distance is statistically large.
///
/// Clouds with `k` or fewer points are returned untouched.
#[must_use]
pub fn neighborhood_mask(points: &[Point3<f64>], k: usize, std_multiplier: f64) -> Vec<bool> {
    if points.len() <= k {
        return vec![true; points.len()];
    }

    let kdtree = build_kdtree(points);

    // Mean distance to k neighbours for each point (parallel)
    let mean_distances: Vec<f64> = points
        .par_iter()
        .map(|p| {
            let neighbors = kdtree.nearest_n::<SquaredEuclidean>(&[p.x, p.y, p.z], k + 1);

            // Skip the first neighbour (self)
            let sum: f64 = neighbors.iter().skip(1).map(|n| n.distance.sqrt()).sum();

            #[allow(clippy::cast_precision_loss)]
            let mean = if neighbors.len() > 1 {
                sum / (neighbors.len() - 1) as f64
            } else {
                0.0
            };
            mean
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let global_mean = mean_distances.iter().sum::<f64>() / mean_distances.len() as f64;

    #[allow(clippy::cast_precision_loss)]
    let variance = mean_distances
        .iter()
        .map(|d| (d - global_mean).powi(2))
        .sum::<f64>()
        / mean_distances.len() as f64;

    let threshold = std_multiplier.mul_add(variance.sqrt(), global_mean);

    mean_distances.iter().map(|&d| d <= threshold).collect()
}

/// Builds a kd-tree over `points`, items are slice indices.
#[must_use]
pub fn build_kdtree(points: &[Point3<f64>]) -> KdTree<f64, 3> {
    let mut kdtree: KdTree<f64, 3> = KdTree::new();
    for (i, p) in points.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let idx = i as u64;
        kdtree.add(&[p.x, p.y, p.z], idx);
    }
    kdtree
}
