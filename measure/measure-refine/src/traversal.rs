//! Voxel traversal along a line segment.
//!
//! Amanatides & Woo DDA in grid units: the segment is first clipped to the
//! grid's extent, then the traversal repeatedly steps across whichever
//! voxel boundary the segment reaches first.

use measure_types::VoxelIndex;
use nalgebra::Vector3;

/// Iterator over the voxels a segment passes through, in order from its
/// start to its end.
///
/// Coordinates are continuous grid coordinates (voxel units measured from
/// the grid's minimum corner). Portions of the segment outside
/// `[0, dims]` are skipped.
///
/// # Example
///
/// ```
/// use measure_refine::SegmentTraversal;
/// use measure_types::{Vector3, VoxelIndex};
///
/// let visited: Vec<VoxelIndex> = SegmentTraversal::new(
///     Vector3::new(-3.0, 0.5, 0.5),
///     Vector3::new(2.5, 0.5, 0.5),
///     [4, 1, 1],
/// )
/// .collect();
///
/// assert_eq!(visited.len(), 3);
/// assert_eq!(visited[2], VoxelIndex::new(2, 0, 0));
/// ```
#[derive(Debug, Clone)]
pub struct SegmentTraversal {
    current: [i64; 3],
    step: [i64; 3],
    t_max: Vector3<f64>,
    t_delta: Vector3<f64>,
    t_exit: f64,
    dims: [u32; 3],
    remaining: usize,
}

impl SegmentTraversal {
    /// Creates a traversal from `from` to `to` over a grid of `dims` voxels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(from: Vector3<f64>, to: Vector3<f64>, dims: [u32; 3]) -> Self {
        let direction = to - from;
        let mut traversal = Self {
            current: [0; 3],
            step: [0; 3],
            t_max: Vector3::repeat(f64::INFINITY),
            t_delta: Vector3::repeat(f64::INFINITY),
            t_exit: 1.0,
            dims,
            remaining: 0,
        };

        let Some((t_enter, t_exit)) = clip_to_grid(&from, &direction, dims) else {
            return traversal;
        };
        traversal.t_exit = t_exit;

        let entry = from + direction * t_enter;
        for axis in 0..3 {
            let max = i64::from(dims[axis]) - 1;
            let cell = (entry[axis].floor() as i64).clamp(0, max);
            traversal.current[axis] = cell;

            let d = direction[axis];
            if d > 0.0 {
                traversal.step[axis] = 1;
                traversal.t_max[axis] = ((cell + 1) as f64 - from[axis]) / d;
                traversal.t_delta[axis] = 1.0 / d;
            } else if d < 0.0 {
                traversal.step[axis] = -1;
                traversal.t_max[axis] = (cell as f64 - from[axis]) / d;
                traversal.t_delta[axis] = -1.0 / d;
            }
        }

        // A segment visits at most one voxel per boundary crossing plus one.
        traversal.remaining = dims.iter().map(|&d| d as usize).sum::<usize>() + 1;
        traversal
    }

    fn in_grid(&self) -> bool {
        self.current
            .iter()
            .zip(self.dims)
            .all(|(&c, d)| c >= 0 && c < i64::from(d))
    }
}

impl Iterator for SegmentTraversal {
    type Item = VoxelIndex;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn next(&mut self) -> Option<VoxelIndex> {
        if self.remaining == 0 || !self.in_grid() {
            return None;
        }
        self.remaining -= 1;

        let visited = VoxelIndex::new(
            self.current[0] as u32,
            self.current[1] as u32,
            self.current[2] as u32,
        );

        let axis = self.t_max.imin();
        if self.t_max[axis] > self.t_exit {
            self.remaining = 0;
        } else {
            self.current[axis] += self.step[axis];
            self.t_max[axis] += self.t_delta[axis];
        }

        Some(visited)
    }
}

/// Parametric range `[t_enter, t_exit] ⊆ [0, 1]` of the segment inside the
/// grid box `[0, dims]`, or `None` if it misses the grid.
fn clip_to_grid(from: &Vector3<f64>, direction: &Vector3<f64>, dims: [u32; 3]) -> Option<(f64, f64)> {
    let mut t_enter = 0.0_f64;
    let mut t_exit = 1.0_f64;
    for axis in 0..3 {
        let hi = f64::from(dims[axis]);
        let d = direction[axis];
        if d.abs() < 1e-15 {
            if from[axis] < 0.0 || from[axis] > hi {
                return None;
            }
            continue;
        }
        let a = -from[axis] / d;
        let b = (hi - from[axis]) / d;
        t_enter = t_enter.max(a.min(b));
        t_exit = t_exit.min(a.max(b));
    }
    (t_enter <= t_exit).then_some((t_enter, t_exit))
}
