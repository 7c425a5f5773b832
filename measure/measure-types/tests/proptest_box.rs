//! Property-based tests for the oriented box primitive.
//!
//! Run with: cargo test -p measure-types -- proptest

use measure_types::{Axis, CORNER_SIGNS, MIN_HALF_EXTENT, OrientedBox};
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-5.0..5.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Half-extents that may fall below the clamp.
fn arb_half_extents() -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(-0.1..2.0f64).prop_map(|[x, y, z]| Vector3::new(x, y, z))
}

fn arb_box() -> impl Strategy<Value = OrientedBox> {
    (arb_point(), arb_half_extents(), -10.0..10.0f64)
        .prop_map(|(c, h, yaw)| OrientedBox::from_yaw(c, h, yaw))
}

fn arb_axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Every extent respects the clamp.
    #[test]
    fn extents_never_below_minimum(b in arb_box(), axis in arb_axis(), factor in -2.0..2.0f64) {
        for i in 0..3 {
            prop_assert!(b.half_extents()[i] >= MIN_HALF_EXTENT);
        }
        let scaled = b.scale(axis, factor);
        prop_assert!(scaled.half_extent(axis) >= MIN_HALF_EXTENT);
    }

    /// Corner `i` is the local point with the documented sign pattern.
    #[test]
    fn corners_follow_sign_pattern(b in arb_box()) {
        let h = b.half_extents();
        for (corner, s) in b.corners().iter().zip(CORNER_SIGNS.iter()) {
            let expected = b.local_to_world(&Point3::new(s[0] * h.x, s[1] * h.y, s[2] * h.z));
            prop_assert!((corner - expected).norm() < 1e-9);
        }
    }

    /// Local/world transforms invert each other.
    #[test]
    fn local_world_round_trip(b in arb_box(), p in arb_point()) {
        let back = b.local_to_world(&b.world_to_local(&p));
        prop_assert!((back - p).norm() < 1e-9);
    }

    /// Yaw rotation keeps the vertical axis, center and extents.
    #[test]
    fn yaw_preserves_shape(b in arb_box(), angle in -7.0..7.0f64) {
        let r = b.rotate_around_y(angle);
        prop_assert!((r.center() - b.center()).norm() < 1e-12);
        prop_assert!((r.half_extents() - b.half_extents()).norm() < 1e-12);
        prop_assert!((r.local_axes()[1] - Vector3::y()).norm() < 1e-9);
        prop_assert!((r.volume() - b.volume()).abs() < 1e-9);
    }

    /// Resizing a face never moves the opposite face.
    #[test]
    fn resize_pins_opposite_face(b in arb_box(), axis in arb_axis(), positive in any::<bool>(), delta in -3.0..3.0f64) {
        let fixed = b.face_center(axis, !positive);
        let r = b.resize_face(axis, positive, delta);
        prop_assert!((r.face_center(axis, !positive) - fixed).norm() < 1e-9);
    }

    /// Floor snap either leaves the box alone or lands the bottom on the floor
    /// with the top unchanged.
    #[test]
    fn floor_snap_keeps_top(b in arb_box(), floor in -5.0..5.0f64, threshold in 0.0..1.0f64) {
        let s = b.extend_bottom_to_floor(floor, threshold);
        prop_assert!((s.top_y() - b.top_y()).abs() < 1e-9);
        let landed = (s.bottom_y() - floor).abs() < 1e-9;
        let untouched = s == b;
        prop_assert!(landed || untouched || s.half_extent(Axis::Y) <= MIN_HALF_EXTENT + 1e-12);
    }
}
