//! Ball pivoting surface.
//!
//! A ball of fixed radius rests on a seed triangle and pivots around each
//! edge of the growing front until it touches another point, which forms
//! the next triangle. When the front is exhausted a new seed is searched
//! among the unused points.
//!
//! Front edges are directed: edge `a → b` belongs to an outward wound
//! triangle `(a, b, c)`, and the triangle found by pivoting over it is
//! `(b, a, k)`, so neighbouring triangles always share an edge in opposite
//! directions.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use hashbrown::HashSet;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use super::{
    ReconstructedMesh, SurfaceReconstructor, ball_centers, ball_is_empty, build_kdtree,
    estimate_normals, mean_spacing,
};

/// Neighbours used for PCA normals.
const NORMAL_NEIGHBORS: usize = 12;

/// Neighbours tried as seed triangle corners.
const SEED_NEIGHBORS: usize = 12;

/// Ball pivoting reconstructor.
///
/// # Example
///
/// ```
/// use measure_refine::{BallPivoting, SurfaceReconstructor};
///
/// let bpa = BallPivoting::new(None);
/// assert_eq!(bpa.name(), "ball-pivoting");
/// assert!(bpa.reconstruct(&[]).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BallPivoting {
    radius: Option<f64>,
}

impl BallPivoting {
    /// Creates a reconstructor with a fixed ball radius, or auto-estimated
    /// when `None`.
    #[must_use]
    pub const fn new(radius: Option<f64>) -> Self {
        Self { radius }
    }

    /// Ball radius used for `points`: the configured value, otherwise twice
    /// the mean point spacing.
    #[must_use]
    pub fn radius_for(&self, points: &[Point3<f64>]) -> Option<f64> {
        match self.radius {
            Some(r) => Some(r),
            None => mean_spacing(points).map(|s| 2.0 * s),
        }
    }
}

impl SurfaceReconstructor for BallPivoting {
    fn name(&self) -> &'static str {
        "ball-pivoting"
    }

    fn reconstruct(&self, points: &[Point3<f64>]) -> Option<ReconstructedMesh> {
        if points.len() < 3 {
            return None;
        }
        let radius = self.radius_for(points)?;
        let kdtree = build_kdtree(points);
        let normals = estimate_normals(points, &kdtree, NORMAL_NEIGHBORS);

        let mut pivoter = Pivoter::new(points, &normals, &kdtree, radius);
        pivoter.run();

        debug!(
            points = points.len(),
            radius,
            triangles = pivoter.faces.len(),
            seeds = pivoter.seeds,
            "Ball pivoting finished"
        );

        if pivoter.faces.is_empty() {
            return None;
        }
        Some(ReconstructedMesh::new(points.to_vec(), pivoter.faces))
    }
}

/// Directed front edge `from → to` of a triangle whose third corner is
/// `opposite`, with the ball resting at `center`.
#[derive(Debug, Clone, Copy)]
struct FrontEdge {
    from: u32,
    to: u32,
    opposite: u32,
    center: Point3<f64>,
}

struct Pivoter<'a> {
    points: &'a [Point3<f64>],
    normals: &'a [Option<Vector3<f64>>],
    kdtree: &'a KdTree<f64, 3>,
    radius: f64,
    faces: Vec<[u32; 3]>,
    face_keys: HashSet<[u32; 3]>,
    directed: HashSet<(u32, u32)>,
    used: Vec<bool>,
    front: VecDeque<FrontEdge>,
    next_seed: usize,
    seeds: usize,
}

impl<'a> Pivoter<'a> {
    fn new(
        points: &'a [Point3<f64>],
        normals: &'a [Option<Vector3<f64>>],
        kdtree: &'a KdTree<f64, 3>,
        radius: f64,
    ) -> Self {
        Self {
            points,
            normals,
            kdtree,
            radius,
            faces: Vec::new(),
            face_keys: HashSet::new(),
            directed: HashSet::new(),
            used: vec![false; points.len()],
            front: VecDeque::new(),
            next_seed: 0,
            seeds: 0,
        }
    }

    fn point(&self, i: u32) -> Option<Point3<f64>> {
        self.points.get(i as usize).copied()
    }

    fn normal(&self, i: u32) -> Option<Vector3<f64>> {
        self.normals.get(i as usize).copied().flatten()
    }

    /// A triangle may not repeat another one or reuse a directed edge,
    /// which keeps every edge on at most two consistently wound triangles.
    fn can_add(&self, [a, b, c]: [u32; 3]) -> bool {
        let mut key = [a, b, c];
        key.sort_unstable();
        !self.face_keys.contains(&key)
            && [(a, b), (b, c), (c, a)]
                .iter()
                .all(|e| !self.directed.contains(e))
    }

    fn add_triangle(&mut self, tri: [u32; 3], center: Point3<f64>) {
        let [a, b, c] = tri;
        let mut key = tri;
        key.sort_unstable();
        self.face_keys.insert(key);
        self.faces.push(tri);
        for v in tri {
            if let Some(flag) = self.used.get_mut(v as usize) {
                *flag = true;
            }
        }
        for (from, to, opposite) in [(a, b, c), (b, c, a), (c, a, b)] {
            self.directed.insert((from, to));
            self.front.push_back(FrontEdge {
                from,
                to,
                opposite,
                center,
            });
        }
    }

    fn run(&mut self) {
        let max_steps = self.points.len().saturating_mul(20);
        let mut steps = 0;
        loop {
            while let Some(edge) = self.front.pop_front() {
                steps += 1;
                if steps > max_steps {
                    return;
                }
                // Already closed from the other side.
                if self.directed.contains(&(edge.to, edge.from)) {
                    continue;
                }
                if let Some((k, center)) = self.pivot(&edge) {
                    self.add_triangle([edge.to, edge.from, k], center);
                }
            }
            if !self.seed() {
                return;
            }
        }
    }

    /// Finds and adds a triangle among unused points; `false` when none is left.
    #[allow(clippy::cast_possible_truncation)]
    fn seed(&mut self) -> bool {
        let r = self.radius;
        while self.next_seed < self.points.len() {
            let i = self.next_seed as u32;
            self.next_seed += 1;
            let (Some(p), Some(n)) = (self.point(i), self.normal(i)) else {
                continue;
            };
            if self.used[i as usize] {
                continue;
            }

            let neighbors: Vec<u32> = self
                .kdtree
                .within::<SquaredEuclidean>(&[p.x, p.y, p.z], 4.0 * r * r)
                .iter()
                .map(|nb| nb.item as u32)
                .filter(|&j| j != i && !self.used[j as usize] && self.normal(j).is_some())
                .take(SEED_NEIGHBORS)
                .collect();

            for (s, &j) in neighbors.iter().enumerate() {
                for &k in &neighbors[s + 1..] {
                    let (Some(pj), Some(pk)) = (self.point(j), self.point(k)) else {
                        continue;
                    };
                    let (j, k, pj, pk) = if (pj - p).cross(&(pk - p)).dot(&n) < 0.0 {
                        (k, j, pk, pj)
                    } else {
                        (j, k, pj, pk)
                    };
                    let Some((center, _, face_normal)) = ball_centers(&p, &pj, &pk, r) else {
                        continue;
                    };
                    let agrees = [j, k]
                        .iter()
                        .all(|&v| self.normal(v).is_some_and(|nv| nv.dot(&face_normal) > 0.0));
                    if agrees && ball_is_empty(self.kdtree, &center, r) && self.can_add([i, j, k]) {
                        self.seeds += 1;
                        self.add_triangle([i, j, k], center);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Rolls the ball over `edge` and returns the first point it touches
    /// together with the ball's new center.
    #[allow(clippy::cast_possible_truncation)]
    fn pivot(&self, edge: &FrontEdge) -> Option<(u32, Point3<f64>)> {
        let r = self.radius;
        let a = self.point(edge.from)?;
        let b = self.point(edge.to)?;
        let c = self.point(edge.opposite)?;
        let axis = (b - a).try_normalize(1e-12)?;
        let mid = Point3::from((a.coords + b.coords) * 0.5);
        let old_normal = (b - a).cross(&(c - a)).try_normalize(1e-18)?;
        let away = axis.cross(&old_normal);
        let from_dir = edge.center - mid;

        let mut candidates: Vec<(f64, u32, Point3<f64>)> = self
            .kdtree
            .within::<SquaredEuclidean>(&[mid.x, mid.y, mid.z], 4.0 * r * r)
            .iter()
            .map(|nb| nb.item as u32)
            .filter(|&k| k != edge.from && k != edge.to && k != edge.opposite)
            .filter_map(|k| {
                let pk = self.point(k)?;
                let (center, _, face_normal) = ball_centers(&b, &a, &pk, r)?;
                if self.normal(k).is_some_and(|nk| nk.dot(&face_normal) <= 0.0) {
                    return None;
                }
                let to_dir = center - mid;
                let mut angle = axis
                    .dot(&from_dir.cross(&to_dir))
                    .atan2(from_dir.dot(&to_dir))
                    .rem_euclid(TAU);
                if angle < 1e-9 || TAU - angle < 1e-9 {
                    // Same ball: only points beyond the edge continue the surface.
                    if (pk - mid).dot(&away) <= 0.0 {
                        return None;
                    }
                    angle = 0.0;
                }
                Some((angle, k, center))
            })
            .collect();
        candidates.sort_by(|x, y| x.0.total_cmp(&y.0));

        let (_, k, center) = candidates
            .into_iter()
            .find(|(_, _, center)| ball_is_empty(self.kdtree, center, r))?;
        self.can_add([edge.to, edge.from, k]).then_some((k, center))
    }
}
