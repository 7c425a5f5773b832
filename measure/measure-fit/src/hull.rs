//! 2D convex hull of the ground-plane projection.

use nalgebra::Point2;

/// Computes the convex hull of `points` with Andrew's monotone chain.
///
/// Returns hull vertices in counter-clockwise order without repeating the
/// first vertex. Collinear boundary points are dropped. Inputs with fewer
/// than three distinct points return those distinct points.
///
/// # Example
///
/// ```
/// use measure_fit::convex_hull;
/// use nalgebra::Point2;
///
/// let hull = convex_hull(&[
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(0.5, 0.2),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ]);
/// assert_eq!(hull.len(), 4);
/// ```
#[must_use]
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted: Vec<Point2<f64>> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(sorted.len() * 2);

    // Lower hull
    for p in &sorted {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }

    // Upper hull
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }

    hull.pop();
    hull
}

/// z-component of `(a - o) × (b - o)`; positive for a left turn.
fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x).mul_add(b.y - o.y, -((a.y - o.y) * (b.x - o.x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_area(poly: &[Point2<f64>]) -> f64 {
        let n = poly.len();
        (0..n)
            .map(|i| {
                let a = poly[i];
                let b = poly[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }

    #[test]
    fn test_square_with_interior() {
        let mut pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        pts.push(Point2::new(1.0, 1.0));
        pts.push(Point2::new(1.0, 0.0)); // collinear on an edge
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!((signed_area(&hull) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(convex_hull(&[]).is_empty());
        assert_eq!(convex_hull(&[Point2::new(1.0, 1.0); 5]).len(), 1);

        let line: Vec<_> = (0..5).map(|i| Point2::new(f64::from(i), 0.0)).collect();
        let hull = convex_hull(&line);
        assert_eq!(hull.len(), 2);
    }

    #[test]
    fn test_ignores_non_finite() {
        let hull = convex_hull(&[
            Point2::new(0.0, 0.0),
            Point2::new(f64::NAN, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]);
        assert_eq!(hull.len(), 3);
    }
}
