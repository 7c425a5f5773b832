//! Dense occupancy grid laid out in a box's local frame.

use std::collections::BTreeSet;

use measure_types::{OrientedBox, VoxelIndex};
use nalgebra::{Point3, Vector3};

/// Dense boolean voxel grid covering an oriented box.
///
/// Voxels are cubic. The longest local extent is split into `resolution`
/// voxels and the other axes get as many voxels as needed to cover the
/// box, so the grid may overhang the box by less than one voxel on the
/// positive side of the shorter axes. Volumes only count the part of each
/// voxel that lies inside the box.
///
/// # Example
///
/// ```
/// use measure_refine::BoxGrid;
/// use measure_types::{OrientedBox, Point3, Vector3};
///
/// let obb = OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.2, 0.1, 0.05));
/// let grid = BoxGrid::new(&obb, 40);
///
/// assert_eq!(grid.dims(), [40, 20, 10]);
/// assert!((grid.voxel_size() - 0.01).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct BoxGrid {
    obb: OrientedBox,
    voxel_size: f64,
    dims: [u32; 3],
    cells: Vec<bool>,
}

impl BoxGrid {
    /// Creates an empty grid over `obb` with `resolution` voxels along its
    /// longest extent. A resolution of zero is treated as one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(obb: &OrientedBox, resolution: u32) -> Self {
        let resolution = resolution.max(1);
        let extents = obb.extents();
        let longest = extents.max();
        let voxel_size = longest / f64::from(resolution);

        let cover = |extent: f64| -> u32 {
            // Absorb float noise so an exact multiple does not gain a voxel.
            let n = (extent / voxel_size - 1e-9).ceil();
            (n.max(1.0) as u32).min(resolution)
        };
        let dims = [cover(extents.x), cover(extents.y), cover(extents.z)];
        let len = dims.iter().map(|&d| d as usize).product();

        Self {
            obb: *obb,
            voxel_size,
            dims,
            cells: vec![false; len],
        }
    }

    /// Box the grid covers.
    #[must_use]
    pub const fn obb(&self) -> &OrientedBox {
        &self.obb
    }

    /// Voxel edge length in meters.
    #[must_use]
    pub const fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Volume of a single voxel in cubic meters.
    #[must_use]
    pub fn voxel_volume(&self) -> f64 {
        self.voxel_size.powi(3)
    }

    /// Voxel counts along the box's local x, y and z axes.
    #[must_use]
    pub const fn dims(&self) -> [u32; 3] {
        self.dims
    }

    /// Total number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the grid has no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// World position of the grid's minimum corner.
    #[must_use]
    pub fn origin(&self) -> Point3<f64> {
        self.obb.local_to_world(&Point3::from(-self.obb.half_extents()))
    }

    /// Continuous grid coordinates of a world point (voxel units from the
    /// minimum corner, not clamped).
    #[must_use]
    pub fn to_grid(&self, world: &Point3<f64>) -> Vector3<f64> {
        let local = self.obb.world_to_local(world);
        (local.coords + self.obb.half_extents()) / self.voxel_size
    }

    /// Voxel containing a world point, clamped onto the grid.
    ///
    /// Points slightly outside the box land in the nearest boundary voxel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn voxel_of(&self, world: &Point3<f64>) -> VoxelIndex {
        let g = self.to_grid(world);
        let clamp = |v: f64, dim: u32| -> u32 {
            let max = f64::from(dim - 1);
            v.floor().clamp(0.0, max) as u32
        };
        VoxelIndex::new(
            clamp(g.x, self.dims[0]),
            clamp(g.y, self.dims[1]),
            clamp(g.z, self.dims[2]),
        )
    }

    /// World position of a voxel's center.
    #[must_use]
    pub fn voxel_center(&self, index: VoxelIndex) -> Point3<f64> {
        let local = Point3::new(
            (f64::from(index.x) + 0.5) * self.voxel_size,
            (f64::from(index.y) + 0.5) * self.voxel_size,
            (f64::from(index.z) + 0.5) * self.voxel_size,
        ) - self.obb.half_extents();
        self.obb.local_to_world(&local)
    }

    pub(crate) fn linear_index(&self, index: VoxelIndex) -> Option<usize> {
        let [nx, ny, nz] = self.dims;
        if index.x >= nx || index.y >= ny || index.z >= nz {
            return None;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        Some(index.x as usize + nx * (index.y as usize + ny * index.z as usize))
    }

    /// Returns `true` if the voxel is occupied. Out-of-grid indices are empty.
    #[must_use]
    pub fn is_occupied(&self, index: VoxelIndex) -> bool {
        self.linear_index(index)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Sets a voxel's state. Out-of-grid indices are ignored.
    pub fn set(&mut self, index: VoxelIndex, occupied: bool) {
        if let Some(cell) = self.linear_index(index).and_then(|i| self.cells.get_mut(i)) {
            *cell = occupied;
        }
    }

    /// Sets every voxel to the same state.
    pub fn fill(&mut self, occupied: bool) {
        self.cells.fill(occupied);
    }

    /// Number of occupied voxels.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Share of a voxel's volume that lies inside the box, in `[0, 1]`.
    ///
    /// Below one only for the overhanging last layer of the shorter axes.
    /// Out-of-grid indices give zero.
    #[must_use]
    pub fn inside_fraction(&self, index: VoxelIndex) -> f64 {
        if self.linear_index(index).is_none() {
            return 0.0;
        }
        let extents = self.obb.extents();
        [index.x, index.y, index.z]
            .iter()
            .zip(extents.iter())
            .map(|(&i, &extent)| {
                let remaining = extent - f64::from(i) * self.voxel_size;
                (remaining / self.voxel_size).clamp(0.0, 1.0)
            })
            .product()
    }

    /// Volume of the occupied voxels, clipped to the box.
    ///
    /// Never exceeds the box volume.
    #[must_use]
    pub fn occupied_volume(&self) -> f64 {
        let fraction: f64 = self
            .all_indices()
            .filter(|&index| self.is_occupied(index))
            .map(|index| self.inside_fraction(index))
            .sum();
        fraction * self.voxel_volume()
    }

    /// Every voxel index, x varying fastest.
    pub(crate) fn all_indices(&self) -> impl Iterator<Item = VoxelIndex> + use<> {
        let [nx, ny, nz] = self.dims;
        (0..nz).flat_map(move |z| {
            (0..ny).flat_map(move |y| (0..nx).map(move |x| VoxelIndex::new(x, y, z)))
        })
    }

    /// Indices of all occupied voxels.
    #[must_use]
    pub fn occupied(&self) -> BTreeSet<VoxelIndex> {
        self.all_indices()
            .filter(|&index| self.is_occupied(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> OrientedBox {
        OrientedBox::from_yaw(Point3::new(1.0, 0.5, -2.0), Vector3::new(0.5, 0.25, 0.125), 0.7)
    }

    #[test]
    fn dims_follow_longest_extent() {
        let grid = BoxGrid::new(&unit_box(), 8);
        assert_eq!(grid.dims(), [8, 4, 2]);
        assert_eq!(grid.len(), 64);
        assert_relative_eq!(grid.voxel_size(), 0.125, epsilon = 1e-12);
    }

    #[test]
    fn origin_is_min_corner() {
        let obb = unit_box();
        let grid = BoxGrid::new(&obb, 8);
        let g = grid.to_grid(&grid.origin());
        assert_relative_eq!(g.norm(), 0.0, epsilon = 1e-9);
        let far = obb.local_to_world(&Point3::from(obb.half_extents()));
        let g = grid.to_grid(&far);
        assert_relative_eq!(g.x, 8.0, epsilon = 1e-9);
        assert_relative_eq!(g.y, 4.0, epsilon = 1e-9);
        assert_relative_eq!(g.z, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn voxel_of_center_roundtrip() {
        let grid = BoxGrid::new(&unit_box(), 8);
        let index = VoxelIndex::new(5, 1, 1);
        assert_eq!(grid.voxel_of(&grid.voxel_center(index)), index);
    }

    #[test]
    fn voxel_of_clamps_outside_points() {
        let obb = unit_box();
        let grid = BoxGrid::new(&obb, 8);
        let outside = obb.local_to_world(&Point3::new(0.51, -0.3, 0.01));
        assert_eq!(grid.voxel_of(&outside), VoxelIndex::new(7, 0, 1));
    }

    #[test]
    fn set_fill_and_count() {
        let mut grid = BoxGrid::new(&unit_box(), 8);
        grid.set(VoxelIndex::new(0, 0, 0), true);
        grid.set(VoxelIndex::new(7, 3, 1), true);
        grid.set(VoxelIndex::new(9, 0, 0), true);
        assert_eq!(grid.occupied_count(), 2);
        assert_relative_eq!(grid.occupied_volume(), 2.0 * 0.125f64.powi(3), epsilon = 1e-15);
        assert!(grid.occupied().contains(&VoxelIndex::new(7, 3, 1)));

        grid.fill(true);
        assert_eq!(grid.occupied_count(), 64);
        assert!(!grid.is_occupied(VoxelIndex::new(8, 0, 0)));
    }

    #[test]
    fn full_grid_volume_is_box_volume() {
        // Extents that are not whole multiples of the voxel size.
        let obb = OrientedBox::from_yaw(
            Point3::new(0.3, 0.06, 0.1),
            Vector3::new(0.1, 0.0615, 0.0505),
            0.3,
        );
        let mut grid = BoxGrid::new(&obb, 48);
        assert_eq!(grid.dims(), [48, 30, 25]);
        grid.fill(true);
        assert!(grid.occupied_count() as f64 * grid.voxel_volume() > obb.volume());
        assert_relative_eq!(grid.occupied_volume(), obb.volume(), max_relative = 1e-9);
    }

    #[test]
    fn inside_fraction_of_overhanging_layer() {
        let obb = OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.5, 0.3, 0.5));
        let grid = BoxGrid::new(&obb, 4);
        // y extent 0.6 over 0.25 voxels: last layer holds 0.1 of 0.25.
        assert_eq!(grid.dims(), [4, 3, 4]);
        assert_relative_eq!(grid.inside_fraction(VoxelIndex::new(0, 0, 0)), 1.0);
        assert_relative_eq!(grid.inside_fraction(VoxelIndex::new(3, 2, 3)), 0.4, epsilon = 1e-12);
        assert_relative_eq!(grid.inside_fraction(VoxelIndex::new(0, 3, 0)), 0.0);
    }

    #[test]
    fn degenerate_axis_gets_one_voxel() {
        let obb = OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.1, 0.1, 0.0025));
        let grid = BoxGrid::new(&obb, 20);
        assert_eq!(grid.dims()[2], 1);
    }
}
