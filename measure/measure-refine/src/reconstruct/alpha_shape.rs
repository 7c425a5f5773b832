//! Alpha shape surface.
//!
//! Candidate triangles are drawn from each point's nearest neighbours. A
//! triangle whose circumradius is at most α has two α-balls touching its
//! corners, one on each side. It lies on the boundary of the α-shape when
//! exactly one of those balls is empty; it is then wound to face the empty
//! side so the surface is oriented outward.

use std::collections::BTreeSet;

use kiddo::SquaredEuclidean;
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::debug;

use super::{ReconstructedMesh, SurfaceReconstructor, ball_centers, ball_is_empty, build_kdtree, mean_spacing};

/// Neighbours per point used to form candidate triangles.
const CANDIDATE_NEIGHBORS: usize = 20;

/// α-shape reconstructor.
///
/// # Example
///
/// ```
/// use measure_refine::{AlphaShape, SurfaceReconstructor};
///
/// let shape = AlphaShape::new(Some(0.05));
/// assert_eq!(shape.name(), "alpha-shape");
/// assert!(shape.reconstruct(&[]).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlphaShape {
    alpha: Option<f64>,
}

impl AlphaShape {
    /// Creates an alpha shape with a fixed α, or auto-estimated when `None`.
    #[must_use]
    pub const fn new(alpha: Option<f64>) -> Self {
        Self { alpha }
    }

    /// α used for `points`: the configured value, otherwise the larger of
    /// three mean point spacings and half the bounding-box diagonal.
    #[must_use]
    pub fn alpha_for(&self, points: &[Point3<f64>]) -> Option<f64> {
        if let Some(alpha) = self.alpha {
            return Some(alpha);
        }
        let spacing = mean_spacing(points)?;
        let (lo, hi) = points.iter().fold(
            (Point3::from([f64::INFINITY; 3]), Point3::from([f64::NEG_INFINITY; 3])),
            |(lo, hi), p| (lo.inf(p), hi.sup(p)),
        );
        Some((3.0 * spacing).max(0.5 * (hi - lo).norm()))
    }
}

impl SurfaceReconstructor for AlphaShape {
    fn name(&self) -> &'static str {
        "alpha-shape"
    }

    #[allow(clippy::cast_possible_truncation)]
    fn reconstruct(&self, points: &[Point3<f64>]) -> Option<ReconstructedMesh> {
        if points.len() < 4 {
            return None;
        }
        let alpha = self.alpha_for(points)?;
        let kdtree = build_kdtree(points);

        let mut candidates: BTreeSet<[u32; 3]> = BTreeSet::new();
        for (i, p) in points.iter().enumerate() {
            let neighbors: Vec<u32> = kdtree
                .nearest_n::<SquaredEuclidean>(&[p.x, p.y, p.z], CANDIDATE_NEIGHBORS + 1)
                .iter()
                .map(|n| n.item as u32)
                .filter(|&j| j as usize != i)
                .collect();
            for (a, &j) in neighbors.iter().enumerate() {
                for &k in &neighbors[a + 1..] {
                    let mut tri = [i as u32, j, k];
                    tri.sort_unstable();
                    candidates.insert(tri);
                }
            }
        }
        let candidates: Vec<[u32; 3]> = candidates.into_iter().collect();

        let faces: Vec<[u32; 3]> = candidates
            .par_iter()
            .filter_map(|&[a, b, c]| {
                let (p0, p1, p2) = (
                    points.get(a as usize)?,
                    points.get(b as usize)?,
                    points.get(c as usize)?,
                );
                let (front, back, _) = ball_centers(p0, p1, p2, alpha)?;
                match (
                    ball_is_empty(&kdtree, &front, alpha),
                    ball_is_empty(&kdtree, &back, alpha),
                ) {
                    (true, false) => Some([a, b, c]),
                    (false, true) => Some([a, c, b]),
                    _ => None,
                }
            })
            .collect();

        debug!(
            points = points.len(),
            alpha,
            candidates = candidates.len(),
            triangles = faces.len(),
            "Alpha shape extracted"
        );

        if faces.is_empty() {
            return None;
        }
        Some(ReconstructedMesh::new(points.to_vec(), faces))
    }
}
