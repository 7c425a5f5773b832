//! Output of background volume refinement.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use nalgebra::Point3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integer index of a voxel in a refinement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelIndex {
    /// Index along the grid's first axis.
    pub x: u32,
    /// Index along the grid's second axis.
    pub y: u32,
    /// Index along the grid's third axis.
    pub z: u32,
}

impl VoxelIndex {
    /// Creates a voxel index.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Refined volume estimate for one settled box.
///
/// The grid is laid out in the box's local frame: `grid_origin` is the
/// world position of the grid's minimum corner and voxel `(i, j, k)` spans
/// `[i, i+1] × [j, j+1] × [k, k+1]` voxel sizes along the box's local axes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefinedVolume {
    /// Edge length of each cubic voxel in meters.
    pub voxel_size: f64,
    /// World position of the grid's minimum corner.
    pub grid_origin: Point3<f64>,
    /// Number of voxels along each local axis.
    pub grid_dims: [u32; 3],
    /// Indices of occupied voxels.
    pub occupied: BTreeSet<VoxelIndex>,
    /// Volume of the occupied voxels clipped to the box, in cubic meters.
    pub voxel_volume: f64,
    /// Whether multi-view carving removed observed-empty space.
    pub carved: bool,
    /// Volume enclosed by the reconstructed surface, if it was closed enough.
    pub mesh_volume: Option<f64>,
    /// Name of the surface reconstructor that ran, if any.
    pub reconstructor: Option<String>,
    /// Wall-clock time spent refining.
    pub processing_time: Duration,
}

impl RefinedVolume {
    /// Best available volume: the surface-mesh volume when present,
    /// otherwise the voxel volume.
    #[must_use]
    pub fn best_volume(&self) -> f64 {
        self.mesh_volume.unwrap_or(self.voxel_volume)
    }

    /// Number of occupied voxels.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }
}

impl fmt::Display for RefinedVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Refined volume: {:.6} m³ voxel ({} voxels of {:.4} m{})",
            self.voxel_volume,
            self.occupied.len(),
            self.voxel_size,
            if self.carved { ", carved" } else { "" }
        )?;
        if let (Some(v), Some(name)) = (self.mesh_volume, &self.reconstructor) {
            write!(f, ", {v:.6} m³ {name} mesh")?;
        }
        write!(f, " in {:?}", self.processing_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RefinedVolume {
        RefinedVolume {
            voxel_size: 0.01,
            grid_origin: Point3::origin(),
            grid_dims: [2, 2, 2],
            occupied: [VoxelIndex::new(0, 0, 0), VoxelIndex::new(1, 0, 0)]
                .into_iter()
                .collect(),
            voxel_volume: 2e-6,
            carved: true,
            mesh_volume: None,
            reconstructor: None,
            processing_time: Duration::from_millis(12),
        }
    }

    #[test]
    fn best_volume_prefers_mesh() {
        let mut r = sample();
        assert!((r.best_volume() - 2e-6).abs() < 1e-15);
        r.mesh_volume = Some(3e-6);
        assert!((r.best_volume() - 3e-6).abs() < 1e-15);
    }

    #[test]
    fn display() {
        let mut r = sample();
        assert!(r.to_string().contains("carved"));
        r.mesh_volume = Some(3e-6);
        r.reconstructor = Some("alpha-shape".to_string());
        assert!(r.to_string().contains("alpha-shape"));
        assert_eq!(r.occupied_count(), 2);
    }
}
