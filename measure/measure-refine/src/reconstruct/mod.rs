//! Surface reconstruction from unorganized points.
//!
//! Reconstructors turn the in-box points into a triangle mesh whose enclosed
//! volume refines the voxel estimate. Callers only see the
//! [`SurfaceReconstructor`] trait.

mod alpha_shape;
mod ball_pivoting;
mod normals;

use std::fmt::Debug;

use hashbrown::HashMap;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Vector3};

pub use alpha_shape::AlphaShape;
pub use ball_pivoting::BallPivoting;
pub use normals::estimate_normals;

/// Strategy that reconstructs a surface from points.
pub trait SurfaceReconstructor: Send + Sync + Debug {
    /// Short stable name, recorded in the refined volume.
    fn name(&self) -> &'static str;

    /// Reconstructs a triangle mesh, or `None` if no surface could be built.
    fn reconstruct(&self, points: &[Point3<f64>]) -> Option<ReconstructedMesh>;
}

/// Indexed triangle mesh produced by a [`SurfaceReconstructor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructedMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Triangles as vertex indices, counter-clockwise seen from outside.
    pub faces: Vec<[u32; 3]>,
}

impl ReconstructedMesh {
    /// Creates a mesh from vertices and faces.
    #[must_use]
    pub const fn new(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn triangle(&self, face: [u32; 3]) -> Option<[Point3<f64>; 3]> {
        Some([
            *self.vertices.get(face[0] as usize)?,
            *self.vertices.get(face[1] as usize)?,
            *self.vertices.get(face[2] as usize)?,
        ])
    }

    /// Sum of signed tetrahedron volumes spanned by each triangle and the
    /// vertex centroid. Positive for outward-facing winding.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn signed_volume(&self) -> f64 {
        if self.vertices.is_empty() {
            return 0.0;
        }
        let centroid: Vector3<f64> =
            self.vertices.iter().map(|v| v.coords).sum::<Vector3<f64>>() / self.vertices.len() as f64;

        let mut volume = 0.0;
        for &face in &self.faces {
            let Some([a, b, c]) = self.triangle(face) else {
                continue;
            };
            let v0 = a.coords - centroid;
            let v1 = b.coords - centroid;
            let v2 = c.coords - centroid;
            let cross = Vector3::new(
                v1.y.mul_add(v2.z, -(v1.z * v2.y)),
                v1.z.mul_add(v2.x, -(v1.x * v2.z)),
                v1.x.mul_add(v2.y, -(v1.y * v2.x)),
            );
            volume += v0.z.mul_add(cross.z, v0.x.mul_add(cross.x, v0.y * cross.y));
        }
        volume / 6.0
    }

    /// Absolute enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Total triangle area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.faces
            .iter()
            .filter_map(|&f| self.triangle(f))
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() * 0.5)
            .sum()
    }

    fn edge_use_counts(&self) -> HashMap<(u32, u32), usize> {
        let mut counts = HashMap::new();
        for &[a, b, c] in &self.faces {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *counts.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_use_counts().len()
    }

    /// Number of edges used by exactly one triangle.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_use_counts().values().filter(|&&n| n == 1).count()
    }

    /// Fraction of edges on the boundary; `1.0` for an empty mesh.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn open_edge_ratio(&self) -> f64 {
        let counts = self.edge_use_counts();
        if counts.is_empty() {
            return 1.0;
        }
        let open = counts.values().filter(|&&n| n == 1).count();
        open as f64 / counts.len() as f64
    }

    /// Returns `true` if every edge is shared by at least two triangles.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.is_empty() && self.boundary_edge_count() == 0
    }
}

/// Circle through three points: center, squared radius and the unit normal
/// of the triangle `(p0, p1, p2)` by the right-hand rule.
///
/// Returns `None` for (near-)collinear points.
pub(crate) fn circumcircle(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Option<(Point3<f64>, f64, Vector3<f64>)> {
    let a = p1 - p0;
    let b = p2 - p0;
    let axb = a.cross(&b);
    let denom = 2.0 * axb.norm_squared();
    if denom <= 1e-20 * a.norm_squared() * b.norm_squared() {
        return None;
    }
    let offset = (b * a.norm_squared() - a * b.norm_squared()).cross(&axb) / denom;
    let normal = axb.normalize();
    Some((p0 + offset, offset.norm_squared(), normal))
}

/// Centers of the two balls of `radius` whose surfaces pass through the
/// triangle's corners: first on the side of the triangle normal, then on
/// the opposite side. `None` when the circumradius exceeds `radius`.
pub(crate) fn ball_centers(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    radius: f64,
) -> Option<(Point3<f64>, Point3<f64>, Vector3<f64>)> {
    let (center, r_sq, normal) = circumcircle(p0, p1, p2)?;
    let h_sq = radius * radius - r_sq;
    if h_sq < 0.0 {
        return None;
    }
    let h = h_sq.sqrt();
    Some((center + normal * h, center - normal * h, normal))
}

/// Returns `true` if no point lies strictly inside the ball, allowing a
/// small relative tolerance for the points that define it.
pub(crate) fn ball_is_empty(kdtree: &KdTree<f64, 3>, center: &Point3<f64>, radius: f64) -> bool {
    let nearest = kdtree.nearest_one::<SquaredEuclidean>(&[center.x, center.y, center.z]);
    nearest.distance.sqrt() >= radius * (1.0 - 1e-9)
}

/// Builds a kd-tree over `points`, each keyed by its index.
pub(crate) fn build_kdtree(points: &[Point3<f64>]) -> KdTree<f64, 3> {
    let mut kdtree: KdTree<f64, 3> = KdTree::new();
    for (i, p) in points.iter().enumerate() {
        kdtree.add(&[p.x, p.y, p.z], i as u64);
    }
    kdtree
}

/// Mean distance from each point to its nearest neighbour.
///
/// Returns `None` for fewer than two points or when every point coincides.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_spacing(points: &[Point3<f64>]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let kdtree = build_kdtree(points);
    let total: f64 = points
        .iter()
        .filter_map(|p| {
            kdtree
                .nearest_n::<SquaredEuclidean>(&[p.x, p.y, p.z], 2)
                .get(1)
                .map(|n| n.distance.sqrt())
        })
        .sum();
    let spacing = total / points.len() as f64;
    (spacing > 0.0).then_some(spacing)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use nalgebra::{Point3, Rotation3, Vector3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Six faces of a cube of side `side`, each stratified `n × n` with
    /// jitter inside each cell, then tilted off the world axes.
    pub(crate) fn sampled_cube_surface(side: f64, n: u32, seed: u64) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let tilt = Rotation3::from_euler_angles(0.3, 0.5, 0.2);
        let h = side / 2.0;
        let cell = side / f64::from(n);
        let mut points = Vec::new();
        for axis in 0..3 {
            for sign in [-1.0, 1.0] {
                for i in 0..n {
                    for j in 0..n {
                        let u = -h + cell * (f64::from(i) + rng.gen_range(0.1..0.9));
                        let v = -h + cell * (f64::from(j) + rng.gen_range(0.1..0.9));
                        let mut p = Vector3::zeros();
                        p[axis] = sign * h;
                        p[(axis + 1) % 3] = u;
                        p[(axis + 2) % 3] = v;
                        points.push(Point3::from(tilt * p));
                    }
                }
            }
        }
        points
    }

    /// `n` points spread evenly over a sphere centered at the origin.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn fibonacci_sphere(n: usize, radius: f64) -> Vec<Point3<f64>> {
        let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        (0..n)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
                let r = (1.0 - y * y).sqrt();
                let theta = golden * i as f64;
                Point3::new(r * theta.cos(), y, r * theta.sin()) * radius
            })
            .collect()
    }
}
