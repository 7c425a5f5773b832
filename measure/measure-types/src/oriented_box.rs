//! Oriented box primitive.
//!
//! An [`OrientedBox`] stores only its center, half-extents and rotation.
//! Corners, edges, faces and volume are derived on demand so they can never
//! drift out of sync with the stored state. Every mutator returns a new box.

use std::fmt;

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Axis;

/// Smallest allowed half-extent in meters (5 mm full extent).
pub const MIN_HALF_EXTENT: f64 = 0.0025;

/// Sign pattern of the eight corners in local coordinates.
///
/// Corners 0-3 are the `-Z` face, 4-7 the `+Z` face, each wound
/// `(-,-) (+,-) (+,+) (-,+)` in X/Y.
pub const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Corner index pairs of the twelve edges.
pub const EDGE_INDICES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Box defined by center, three half-extents and a rotation.
///
/// Half-extents are always at least [`MIN_HALF_EXTENT`]; constructors and
/// mutators clamp rather than reject, so thin objects never fail to produce
/// a box.
///
/// # Example
///
/// ```
/// use measure_types::{Axis, OrientedBox};
/// use nalgebra::{Point3, Vector3};
///
/// let b = OrientedBox::from_yaw(
///     Point3::new(0.0, 0.5, 0.0),
///     Vector3::new(0.2, 0.5, 0.1),
///     std::f64::consts::FRAC_PI_4,
/// );
///
/// assert!((b.volume() - 0.08).abs() < 1e-12);
/// assert!((b.bottom_y() - 0.0).abs() < 1e-12);
///
/// let taller = b.scale(Axis::Y, 2.0);
/// assert!((taller.extents().y - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientedBox {
    center: Point3<f64>,
    half_extents: Vector3<f64>,
    rotation: UnitQuaternion<f64>,
}

impl OrientedBox {
    /// Creates a box, clamping each half-extent to [`MIN_HALF_EXTENT`].
    #[must_use]
    pub fn new(
        center: Point3<f64>,
        half_extents: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self {
            center,
            half_extents: clamp_half_extents(half_extents),
            rotation,
        }
    }

    /// Creates a box rotated about world +Y by `yaw` radians.
    #[must_use]
    pub fn from_yaw(center: Point3<f64>, half_extents: Vector3<f64>, yaw: f64) -> Self {
        Self::new(center, half_extents, yaw_rotation(yaw))
    }

    /// Creates an axis-aligned box.
    #[must_use]
    pub fn axis_aligned(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self::new(center, half_extents, UnitQuaternion::identity())
    }

    /// Creates the box spanning `[min, max]` in the rotated frame.
    ///
    /// `min` and `max` are coordinates of points expressed on the rotated
    /// axes (`rotation⁻¹ * p` for a world point `p`).
    #[must_use]
    pub fn from_local_bounds(
        rotation: UnitQuaternion<f64>,
        min: &Vector3<f64>,
        max: &Vector3<f64>,
    ) -> Self {
        let mid = (min + max) / 2.0;
        let half = (max - min) / 2.0;
        Self::new(Point3::from(rotation * mid), half, rotation)
    }

    /// Center in world coordinates.
    #[must_use]
    pub const fn center(&self) -> Point3<f64> {
        self.center
    }

    /// Half-extents along the local axes.
    #[must_use]
    pub const fn half_extents(&self) -> Vector3<f64> {
        self.half_extents
    }

    /// Half-extent along one local axis.
    #[must_use]
    pub fn half_extent(&self, axis: Axis) -> f64 {
        self.half_extents[axis.index()]
    }

    /// Full extents (2 × half-extents).
    #[must_use]
    pub fn extents(&self) -> Vector3<f64> {
        self.half_extents * 2.0
    }

    /// Local-to-world rotation.
    #[must_use]
    pub const fn rotation(&self) -> UnitQuaternion<f64> {
        self.rotation
    }

    /// Rotation about world +Y in radians, in `(-π, π]`.
    ///
    /// Only meaningful for boxes whose local Y is vertical.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        let x = self.rotation * Vector3::x();
        (-x.z).atan2(x.x)
    }

    /// Volume in cubic meters.
    #[must_use]
    pub fn volume(&self) -> f64 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }

    /// Maps a local point to world coordinates (rotation, then translation).
    #[must_use]
    pub fn local_to_world(&self, local: &Point3<f64>) -> Point3<f64> {
        self.center + self.rotation * local.coords
    }

    /// Maps a world point into the box's local frame.
    #[must_use]
    pub fn world_to_local(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse_transform_vector(&(*world - self.center)))
    }

    /// The three local axes as world-space unit vectors.
    #[must_use]
    pub fn local_axes(&self) -> [Vector3<f64>; 3] {
        [
            self.rotation * Vector3::x(),
            self.rotation * Vector3::y(),
            self.rotation * Vector3::z(),
        ]
    }

    /// World-space unit vector of one local axis.
    #[must_use]
    pub fn axis_direction(&self, axis: Axis) -> Vector3<f64> {
        self.rotation * axis.unit()
    }

    /// The eight corners in world coordinates, ordered as [`CORNER_SIGNS`].
    #[must_use]
    pub fn corners(&self) -> [Point3<f64>; 8] {
        CORNER_SIGNS.map(|s| {
            let local = Point3::new(
                s[0] * self.half_extents.x,
                s[1] * self.half_extents.y,
                s[2] * self.half_extents.z,
            );
            self.local_to_world(&local)
        })
    }

    /// The twelve edges as `(start, end)` world points.
    #[must_use]
    pub fn edges(&self) -> [(Point3<f64>, Point3<f64>); 12] {
        let corners = self.corners();
        EDGE_INDICES.map(|(a, b)| (corners[a], corners[b]))
    }

    /// Center of the face on `axis` at the positive (`positive == true`) or
    /// negative side, in world coordinates.
    #[must_use]
    pub fn face_center(&self, axis: Axis, positive: bool) -> Point3<f64> {
        let sign = if positive { 1.0 } else { -1.0 };
        self.center + self.axis_direction(axis) * (sign * self.half_extent(axis))
    }

    /// Returns `true` if `point` lies inside the box grown by `margin` on every side.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>, margin: f64) -> bool {
        let local = self.world_to_local(point);
        (0..3).all(|i| local[i].abs() <= self.half_extents[i] + margin)
    }

    /// Local axis most closely aligned with world +Y.
    #[must_use]
    pub fn vertical_axis(&self) -> Axis {
        let axes = self.local_axes();
        let mut best = Axis::Y;
        let mut best_dot = axes[1].y.abs();
        for axis in [Axis::X, Axis::Z] {
            let d = axes[axis.index()].y.abs();
            if d > best_dot {
                best = axis;
                best_dot = d;
            }
        }
        best
    }

    /// Lowest world Y reached by the box.
    #[must_use]
    pub fn bottom_y(&self) -> f64 {
        self.center.y - self.world_half_height()
    }

    /// Highest world Y reached by the box.
    #[must_use]
    pub fn top_y(&self) -> f64 {
        self.center.y + self.world_half_height()
    }

    /// Moves the box by `delta`.
    #[must_use]
    pub fn translate(&self, delta: &Vector3<f64>) -> Self {
        Self {
            center: self.center + *delta,
            ..*self
        }
    }

    /// Scales one half-extent by `factor` about the center, clamped to the minimum.
    #[must_use]
    pub fn scale(&self, axis: Axis, factor: f64) -> Self {
        self.with_half_extent(axis, self.half_extent(axis) * factor)
    }

    /// Replaces one half-extent, clamped to the minimum. The center is unchanged.
    #[must_use]
    pub fn with_half_extent(&self, axis: Axis, half_extent: f64) -> Self {
        let mut half = self.half_extents;
        half[axis.index()] = half_extent;
        Self::new(self.center, half, self.rotation)
    }

    /// Changes the full extent along `axis` by `delta`, moving only the face
    /// on the `positive` side.
    ///
    /// The opposite face stays fixed in world space, including when the
    /// extent hits the minimum clamp.
    #[must_use]
    pub fn resize_face(&self, axis: Axis, positive: bool, delta: f64) -> Self {
        let old = self.half_extent(axis);
        let new = (old + delta / 2.0).max(MIN_HALF_EXTENT);
        let sign = if positive { 1.0 } else { -1.0 };
        let shift = self.axis_direction(axis) * (sign * (new - old));
        let mut half = self.half_extents;
        half[axis.index()] = new;
        Self::new(self.center + shift, half, self.rotation)
    }

    /// Rotates the box about the world vertical through its center.
    ///
    /// Positive angles turn counter-clockwise when seen from above.
    #[must_use]
    pub fn rotate_around_y(&self, angle: f64) -> Self {
        Self {
            rotation: yaw_rotation(angle) * self.rotation,
            ..*self
        }
    }

    /// Snaps the bottom face onto a floor plane at `floor_y`.
    ///
    /// If the bottom is within `threshold` of the floor (above or below), the
    /// vertical extent changes so the bottom lands on the floor while the top
    /// face stays where it is. Otherwise the box is returned unchanged.
    #[must_use]
    pub fn extend_bottom_to_floor(&self, floor_y: f64, threshold: f64) -> Self {
        let gap = self.bottom_y() - floor_y;
        if gap.abs() > threshold || gap.abs() < f64::EPSILON {
            return *self;
        }

        let axis = self.vertical_axis();
        let alignment = self.axis_direction(axis).y.abs();
        if alignment < 1e-9 {
            return *self;
        }

        let top = self.top_y();
        let mut half = self.half_extents;
        half[axis.index()] = (half[axis.index()] + gap / (2.0 * alignment)).max(MIN_HALF_EXTENT);

        let mut snapped = Self::new(self.center, half, self.rotation);
        snapped.center.y = top - snapped.world_half_height();
        snapped
    }

    fn world_half_height(&self) -> f64 {
        let axes = self.local_axes();
        (0..3)
            .map(|i| axes[i].y.abs() * self.half_extents[i])
            .sum()
    }
}

impl Default for OrientedBox {
    /// A 10 cm cube at the origin.
    fn default() -> Self {
        Self::axis_aligned(Point3::origin(), Vector3::repeat(0.05))
    }
}

impl fmt::Display for OrientedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.extents();
        write!(
            f,
            "OrientedBox(center=({:.3}, {:.3}, {:.3}), extents={:.3}×{:.3}×{:.3} m, yaw={:.1}°)",
            self.center.x,
            self.center.y,
            self.center.z,
            e.x,
            e.y,
            e.z,
            self.yaw().to_degrees()
        )
    }
}

fn yaw_rotation(angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Unit::new_unchecked(Vector3::y()), angle)
}

fn clamp_half_extents(half: Vector3<f64>) -> Vector3<f64> {
    half.map(|h| if h.is_nan() { MIN_HALF_EXTENT } else { h.max(MIN_HALF_EXTENT) })
}
