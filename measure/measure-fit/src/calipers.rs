//! Rotating-calipers search for the minimum-area ground rectangle.
//!
//! The minimum-area rectangle enclosing a convex polygon has one side
//! collinear with a polygon edge, so every hull edge direction is a
//! candidate yaw. Rectangles repeat every 90°, so yaws are reduced to
//! `[0, π/2)`.
//!
//! Ground coordinates are world `(x, z)`. A box with yaw `θ` (rotation
//! about +Y) has its local X axis along `(cos θ, -sin θ)` and its local Z
//! axis along `(sin θ, cos θ)` in those coordinates.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point2, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One candidate box orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientationCandidate {
    /// Rotation about world +Y in radians, in `[0, π/2)`.
    pub yaw: f64,
    /// Area of the enclosing ground rectangle, square meters.
    pub area: f64,
    /// Rectangle extent along the local X axis.
    pub extent_x: f64,
    /// Rectangle extent along the local Z axis.
    pub extent_z: f64,
}

impl OrientationCandidate {
    /// Local X axis as a world-space unit vector.
    #[must_use]
    pub fn axis_x(&self) -> Vector3<f64> {
        Vector3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Local Z axis as a world-space unit vector.
    #[must_use]
    pub fn axis_z(&self) -> Vector3<f64> {
        Vector3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// How squarely a box face points along `direction`, in `[0, 1]`.
    ///
    /// Only the horizontal part of `direction` is considered; `None` if it
    /// has no horizontal part.
    #[must_use]
    pub fn face_alignment(&self, direction: &Vector3<f64>) -> Option<f64> {
        let horizontal = Vector3::new(direction.x, 0.0, direction.z).try_normalize(1e-9)?;
        Some(
            horizontal
                .dot(&self.axis_x())
                .abs()
                .max(horizontal.dot(&self.axis_z()).abs()),
        )
    }
}

/// Evaluates the enclosing rectangle of `hull` for one yaw.
#[must_use]
pub fn evaluate_yaw(hull: &[Point2<f64>], yaw: f64) -> OrientationCandidate {
    let (s, c) = yaw.sin_cos();
    let mut min_u = f64::INFINITY;
    let mut max_u = f64::NEG_INFINITY;
    let mut min_w = f64::INFINITY;
    let mut max_w = f64::NEG_INFINITY;

    for p in hull {
        let u = p.x.mul_add(c, -(p.y * s));
        let w = p.x.mul_add(s, p.y * c);
        min_u = min_u.min(u);
        max_u = max_u.max(u);
        min_w = min_w.min(w);
        max_w = max_w.max(w);
    }

    if hull.is_empty() {
        return OrientationCandidate {
            yaw,
            area: 0.0,
            extent_x: 0.0,
            extent_z: 0.0,
        };
    }

    let extent_x = max_u - min_u;
    let extent_z = max_w - min_w;
    OrientationCandidate {
        yaw,
        area: extent_x * extent_z,
        extent_x,
        extent_z,
    }
}

/// Produces one candidate per distinct hull edge direction.
///
/// Hulls with fewer than two vertices yield a single axis-aligned candidate.
/// Candidates are sorted by yaw.
#[must_use]
pub fn candidate_orientations(hull: &[Point2<f64>]) -> Vec<OrientationCandidate> {
    if hull.len() < 2 {
        return vec![evaluate_yaw(hull, 0.0)];
    }

    let mut yaws: Vec<f64> = (0..hull.len())
        .filter_map(|i| {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            let d = b - a;
            if d.norm_squared() < 1e-24 {
                return None;
            }
            Some(edge_yaw(d.x, d.y))
        })
        .collect();

    yaws.sort_by(f64::total_cmp);
    yaws.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    // 0 and π/2 - ε describe the same rectangle.
    if yaws.len() > 1 {
        if let (Some(&first), Some(&last)) = (yaws.first(), yaws.last()) {
            if FRAC_PI_2 - last + first < 1e-9 {
                yaws.pop();
            }
        }
    }

    yaws.into_iter().map(|yaw| evaluate_yaw(hull, yaw)).collect()
}

/// Yaw in `[0, π/2)` whose local X axis is parallel to ground direction `(dx, dz)`.
fn edge_yaw(dx: f64, dz: f64) -> f64 {
    let yaw = (-dz).atan2(dx).rem_euclid(FRAC_PI_2);
    // Directions a hair short of a quarter turn are axis-aligned.
    if FRAC_PI_2 - yaw < 1e-12 { 0.0 } else { yaw }
}
