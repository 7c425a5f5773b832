//! World-space point clouds sampled from depth observations.
//!
//! A [`PointCloud`] is built once by the sampler and then shared read-only
//! (behind an `Arc`) by the fitter, the box editor and volume refinement.
//!
//! # Example
//!
//! ```
//! use measure_types::PointCloud;
//! use nalgebra::Point3;
//!
//! let cloud = PointCloud::from_positions(&[
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ]);
//!
//! assert_eq!(cloud.len(), 3);
//! assert_eq!(cloud.view_count(), 0);
//! ```

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A sampled point with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CloudPoint {
    /// World-space position in meters.
    pub position: Point3<f64>,
    /// Depth confidence weight (0.0 to 1.0).
    pub confidence: f32,
    /// Index into [`PointCloud::viewpoints`] of the camera that saw this point.
    pub view: Option<u32>,
}

impl CloudPoint {
    /// Creates a fully confident point with no viewpoint.
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            confidence: 1.0,
            view: None,
        }
    }

    /// Creates a point observed from viewpoint `view`.
    #[must_use]
    pub const fn observed(position: Point3<f64>, confidence: f32, view: u32) -> Self {
        Self {
            position,
            confidence,
            view: Some(view),
        }
    }
}

/// Immutable set of world-space points plus the camera centers that observed them.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointCloud {
    points: Vec<CloudPoint>,
    viewpoints: Vec<Point3<f64>>,
}

impl PointCloud {
    /// Creates a cloud from points and the viewpoints they reference.
    ///
    /// Points whose `view` index has no matching viewpoint lose their view.
    #[must_use]
    pub fn new(mut points: Vec<CloudPoint>, viewpoints: Vec<Point3<f64>>) -> Self {
        let n = viewpoints.len();
        for p in &mut points {
            if p.view.is_some_and(|v| v as usize >= n) {
                p.view = None;
            }
        }
        Self { points, viewpoints }
    }

    /// Creates a cloud of fully confident points without viewpoints.
    #[must_use]
    pub fn from_positions(positions: &[Point3<f64>]) -> Self {
        Self {
            points: positions.iter().copied().map(CloudPoint::new).collect(),
            viewpoints: Vec::new(),
        }
    }

    /// Concatenates clouds, re-indexing viewpoints so provenance is preserved.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge<'a>(clouds: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut merged = Self::default();
        for cloud in clouds {
            let offset = merged.viewpoints.len() as u32;
            merged.viewpoints.extend_from_slice(&cloud.viewpoints);
            merged.points.extend(cloud.points.iter().map(|p| CloudPoint {
                view: p.view.map(|v| v + offset),
                ..*p
            }));
        }
        merged
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points.
    #[must_use]
    pub fn points(&self) -> &[CloudPoint] {
        &self.points
    }

    /// Iterator over point positions.
    pub fn positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.points.iter().map(|p| p.position)
    }

    /// Camera centers, indexed by [`CloudPoint::view`].
    #[must_use]
    pub fn viewpoints(&self) -> &[Point3<f64>] {
        &self.viewpoints
    }

    /// Number of distinct viewpoints referenced by at least one point.
    #[must_use]
    pub fn view_count(&self) -> usize {
        let mut seen = vec![false; self.viewpoints.len()];
        for v in self.points.iter().filter_map(|p| p.view) {
            if let Some(flag) = seen.get_mut(v as usize) {
                *flag = true;
            }
        }
        seen.into_iter().filter(|&s| s).count()
    }

    /// Viewpoint position for a point, if known.
    #[must_use]
    pub fn viewpoint_of(&self, point: &CloudPoint) -> Option<Point3<f64>> {
        point
            .view
            .and_then(|v| self.viewpoints.get(v as usize))
            .copied()
    }

    /// Centroid of all points, or `None` if empty.
    #[must_use]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }

        let sum: Vector3<f64> = self.points.iter().map(|p| p.position.coords).sum();

        #[allow(clippy::cast_precision_loss)]
        let centroid = sum / self.points.len() as f64;

        Some(Point3::from(centroid))
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` if empty.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.points.first()?.position;
        let mut min = first;
        let mut max = first;

        for point in &self.points[1..] {
            let p = &point.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Mean confidence weight, or 0 if empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_confidence(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.points.iter().map(|p| p.confidence).sum();
        sum / self.points.len() as f32
    }

    /// Returns the points accepted by `keep`, sharing this cloud's viewpoints.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&CloudPoint) -> bool) -> Self {
        Self {
            points: self.points.iter().filter(|p| keep(p)).copied().collect(),
            viewpoints: self.viewpoints.clone(),
        }
    }

    /// Downsamples using voxel grid filtering.
    ///
    /// Points are grouped into cubic voxels of `voxel_size`, and each voxel is
    /// represented by the centroid of its points. The representative keeps the
    /// mean confidence and the view of the first point in the voxel. Output
    /// order is deterministic.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn downsample(&self, voxel_size: f64) -> Self {
        if self.points.is_empty() || voxel_size <= 0.0 {
            return self.clone();
        }

        // Map voxel indices to accumulated point data
        let mut voxels: BTreeMap<(i64, i64, i64), (Vector3<f64>, f32, usize, Option<u32>)> =
            BTreeMap::new();

        for point in &self.points {
            let key = (
                (point.position.x / voxel_size).floor() as i64,
                (point.position.y / voxel_size).floor() as i64,
                (point.position.z / voxel_size).floor() as i64,
            );
            let entry = voxels
                .entry(key)
                .or_insert((Vector3::zeros(), 0.0, 0, point.view));
            entry.0 += point.position.coords;
            entry.1 += point.confidence;
            entry.2 += 1;
        }

        let points = voxels
            .into_values()
            .map(|(sum, conf, count, view)| CloudPoint {
                position: Point3::from(sum / count as f64),
                confidence: conf / count as f32,
                view,
            })
            .collect();

        Self {
            points,
            viewpoints: self.viewpoints.clone(),
        }
    }
}

impl FromIterator<CloudPoint> for PointCloud {
    fn from_iter<I: IntoIterator<Item = CloudPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
            viewpoints: Vec::new(),
        }
    }
}

impl FromIterator<Point3<f64>> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        iter.into_iter().map(CloudPoint::new).collect()
    }
}
