//! The box editing service.
//!
//! Every operation takes a box and returns a new one; the editor itself
//! holds nothing but its parameters, so one instance can serve any number of
//! measurements from any thread.

use measure_fit::local_bounds;
use measure_types::{CloudPoint, OrientedBox, PointCloud};
use nalgebra::{Point2, Vector2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EditResult;
use crate::handle::FaceHandle;
use crate::params::EditParams;
use crate::projector::ScreenProjector;

/// A user gesture, in screen space where applicable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Gesture {
    /// Drag one face by a screen delta (pixels).
    DragFace {
        /// Face being dragged.
        handle: FaceHandle,
        /// Touch motion since the previous event, pixels.
        delta: Vector2<f64>,
    },
    /// Twist the box about the vertical through its center.
    Rotate {
        /// Touch position before the motion, pixels.
        touch: Point2<f64>,
        /// Touch motion since the previous event, pixels.
        delta: Vector2<f64>,
    },
    /// Shrink-wrap the box around the captured points.
    FitToPoints,
    /// Drop the bottom face onto a detected floor.
    SnapToFloor {
        /// World height of the floor plane.
        floor_y: f64,
    },
}

/// Result of applying one edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditOutcome {
    /// The box after the edit; the input box when nothing changed.
    pub obb: OrientedBox,
    /// `false` when the edit was below the noise threshold or not applicable.
    pub did_change: bool,
}

impl EditOutcome {
    /// An edit that left `obb` as it was.
    #[must_use]
    pub const fn unchanged(obb: OrientedBox) -> Self {
        Self {
            obb,
            did_change: false,
        }
    }

    /// `after`, flagged as a change if it differs from `before`.
    #[must_use]
    pub fn compare(before: &OrientedBox, after: OrientedBox) -> Self {
        Self {
            did_change: after != *before,
            obb: after,
        }
    }
}

/// Stateless editor for oriented boxes.
///
/// # Example
///
/// ```
/// use measure_edit::{BoxEditor, FaceHandle, FnProjector};
/// use measure_types::{Axis, OrientedBox, Point3, Vector3};
/// use nalgebra::{Point2, Vector2};
///
/// // Top-down view, 1000 px per meter.
/// let view = FnProjector(|p: &Point3<f64>| Some(Point2::new(p.x * 1000.0, p.z * 1000.0)));
/// let obb = OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.1, 0.1, 0.1));
///
/// let out = BoxEditor::default().drag_face(
///     &obb,
///     FaceHandle::new(Axis::X, true),
///     Vector2::new(20.0, 0.0),
///     &view,
/// );
/// assert!(out.did_change);
/// assert!((out.obb.extents().x - 0.22).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxEditor {
    params: EditParams,
}

impl BoxEditor {
    /// Creates an editor.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidParams`](crate::EditError::InvalidParams)
    /// if `params` fail validation.
    pub fn new(params: EditParams) -> EditResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Editing parameters.
    #[must_use]
    pub const fn params(&self) -> &EditParams {
        &self.params
    }

    /// Applies any gesture.
    ///
    /// `cloud` is only read by [`Gesture::FitToPoints`].
    #[must_use]
    pub fn apply(
        &self,
        obb: &OrientedBox,
        gesture: &Gesture,
        projector: &dyn ScreenProjector,
        cloud: Option<&PointCloud>,
    ) -> EditOutcome {
        match *gesture {
            Gesture::DragFace { handle, delta } => self.drag_face(obb, handle, delta, projector),
            Gesture::Rotate { touch, delta } => self.drag_rotation(obb, touch, delta, projector),
            Gesture::FitToPoints => cloud
                .and_then(|c| self.fit_to_points(obb, c))
                .map_or_else(|| EditOutcome::unchanged(*obb), |b| EditOutcome::compare(obb, b)),
            Gesture::SnapToFloor { floor_y } => self.snap_to_floor(obb, floor_y),
        }
    }

    /// Moves one face along its axis by a screen-space drag.
    ///
    /// The drag is projected on the on-screen direction from the box center
    /// to the face center and converted to meters with the ratio of the
    /// face's half-extent to that on-screen distance. Dragging outward grows
    /// the box; the opposite face never moves.
    #[must_use]
    pub fn drag_face(
        &self,
        obb: &OrientedBox,
        handle: FaceHandle,
        delta: Vector2<f64>,
        projector: &dyn ScreenProjector,
    ) -> EditOutcome {
        let Some(outward) = self.screen_outward(obb, handle, projector) else {
            debug!(%handle, "Face is off screen or edge-on, drag ignored");
            return EditOutcome::unchanged(*obb);
        };

        let distance = outward.norm();
        let meters_per_pixel = obb.half_extent(handle.axis) / distance;
        let world_delta = delta.dot(&(outward / distance)) * meters_per_pixel;

        if world_delta.abs() < self.params.min_length_delta {
            return EditOutcome::unchanged(*obb);
        }

        let resized = obb.resize_face(handle.axis, handle.positive, world_delta);
        debug!(%handle, world_delta, "Face dragged");
        EditOutcome::compare(obb, resized)
    }

    /// Turns the box about the world vertical by a screen-space drag.
    ///
    /// The angle is the drag's component along the clockwise tangent at the
    /// touch point divided by the touch's distance from the projected box
    /// center. Clockwise motion on screen turns the box clockwise seen from
    /// above (negative yaw). Touches within `min_rotation_radius` of the
    /// center are ignored.
    #[must_use]
    pub fn drag_rotation(
        &self,
        obb: &OrientedBox,
        touch: Point2<f64>,
        delta: Vector2<f64>,
        projector: &dyn ScreenProjector,
    ) -> EditOutcome {
        let Some(center) = projector.project(&obb.center()) else {
            return EditOutcome::unchanged(*obb);
        };

        let radial = touch - center;
        let radius = radial.norm();
        if radius <= self.params.min_rotation_radius {
            debug!(radius, "Rotation grab too close to center, ignored");
            return EditOutcome::unchanged(*obb);
        }

        // Screen +y points down, so this tangent turns clockwise on screen.
        let clockwise = Vector2::new(-radial.y, radial.x) / radius;
        let angle = delta.dot(&clockwise) / radius * self.params.rotation_sensitivity;
        if angle.abs() < f64::EPSILON {
            return EditOutcome::unchanged(*obb);
        }

        debug!(angle_deg = -angle.to_degrees(), "Box rotated");
        EditOutcome::compare(obb, obb.rotate_around_y(-angle))
    }

    /// Re-derives tight extents from `cloud`, keeping the box orientation.
    ///
    /// Only points inside the current box grown by `refit_margin` count.
    /// Returns `None` with fewer than `refit_min_points` such points.
    #[must_use]
    pub fn fit_to_points(&self, obb: &OrientedBox, cloud: &PointCloud) -> Option<OrientedBox> {
        let in_range: Vec<CloudPoint> = cloud
            .points()
            .iter()
            .filter(|p| obb.contains(&p.position, self.params.refit_margin))
            .copied()
            .collect();

        if in_range.len() < self.params.refit_min_points {
            debug!(
                in_range = in_range.len(),
                required = self.params.refit_min_points,
                "Too few points near the box to refit"
            );
            return None;
        }

        let rotation = obb.rotation();
        let (min, max) = local_bounds(&in_range, &rotation);
        let refit = OrientedBox::from_local_bounds(rotation, &min, &max);

        info!(
            points = in_range.len(),
            before_volume = obb.volume(),
            after_volume = refit.volume(),
            "Box fitted to points"
        );
        Some(refit)
    }

    /// Snaps the bottom face to `floor_y` when within the snap threshold.
    #[must_use]
    pub fn snap_to_floor(&self, obb: &OrientedBox, floor_y: f64) -> EditOutcome {
        let snapped = obb.extend_bottom_to_floor(floor_y, self.params.floor_snap_threshold);
        EditOutcome::compare(obb, snapped)
    }

    /// Screen vector from the projected box center to the projected face
    /// center; `None` if either is off screen or the face is edge-on.
    fn screen_outward(
        &self,
        obb: &OrientedBox,
        handle: FaceHandle,
        projector: &dyn ScreenProjector,
    ) -> Option<Vector2<f64>> {
        let center = projector.project(&obb.center())?;
        let face = projector.project(&handle.center_on(obb))?;
        let outward = face - center;
        (outward.norm() >= self.params.min_screen_distance.max(f64::EPSILON)).then_some(outward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnProjector;
    use approx::assert_relative_eq;
    use measure_types::{Axis, MIN_HALF_EXTENT};
    use nalgebra::{Point3, Vector3};

    fn top_down(p: &Point3<f64>) -> Option<Point2<f64>> {
        Some(Point2::new(p.x * 1000.0, p.z * 1000.0))
    }

    fn unit_box() -> OrientedBox {
        OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.1, 0.1, 0.05))
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let obb = unit_box();
        let out = BoxEditor::default().drag_face(
            &obb,
            FaceHandle::new(Axis::X, true),
            Vector2::zeros(),
            &FnProjector(top_down),
        );
        assert!(!out.did_change);
        assert_eq!(out.obb, obb);
    }

    #[test]
    fn test_outward_drag_grows_and_pins_opposite() {
        let obb = unit_box();
        let editor = BoxEditor::default();
        let view = FnProjector(top_down);

        let out = editor.drag_face(&obb, FaceHandle::new(Axis::Z, false), Vector2::new(0.0, -10.0), &view);
        assert!(out.did_change);
        assert_relative_eq!(out.obb.extents().z, 0.11, epsilon = 1e-9);
        assert_relative_eq!(
            out.obb.face_center(Axis::Z, true),
            obb.face_center(Axis::Z, true),
            epsilon = 1e-12
        );

        let inward = editor.drag_face(&obb, FaceHandle::new(Axis::Z, false), Vector2::new(0.0, 10.0), &view);
        assert_relative_eq!(inward.obb.extents().z, 0.09, epsilon = 1e-9);
    }

    #[test]
    fn test_tangential_drag_ignored() {
        let obb = unit_box();
        let out = BoxEditor::default().drag_face(
            &obb,
            FaceHandle::new(Axis::X, true),
            Vector2::new(0.0, 30.0),
            &FnProjector(top_down),
        );
        assert!(!out.did_change);
    }

    #[test]
    fn test_edge_on_face_ignored() {
        // Vertical faces project onto the center in a top-down view.
        let obb = unit_box();
        let out = BoxEditor::default().drag_face(
            &obb,
            FaceHandle::new(Axis::Y, true),
            Vector2::new(30.0, 30.0),
            &FnProjector(top_down),
        );
        assert!(!out.did_change);
    }

    #[test]
    fn test_clamped_drag_keeps_opposite_face() {
        let obb = unit_box();
        let out = BoxEditor::default().drag_face(
            &obb,
            FaceHandle::new(Axis::X, true),
            Vector2::new(-500.0, 0.0),
            &FnProjector(top_down),
        );
        assert_relative_eq!(out.obb.half_extent(Axis::X), MIN_HALF_EXTENT);
        assert_relative_eq!(
            out.obb.face_center(Axis::X, false),
            obb.face_center(Axis::X, false),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_clockwise_drag_is_negative_yaw() {
        let obb = unit_box();
        let out = BoxEditor::default().drag_rotation(
            &obb,
            Point2::new(100.0, 0.0),
            Vector2::new(0.0, 10.0),
            &FnProjector(top_down),
        );
        assert!(out.did_change);
        assert_relative_eq!(out.obb.yaw(), -0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_near_center_ignored() {
        let obb = unit_box();
        let out = BoxEditor::default().drag_rotation(
            &obb,
            Point2::new(5.0, 0.0),
            Vector2::new(0.0, 10.0),
            &FnProjector(top_down),
        );
        assert!(!out.did_change);
    }

    #[test]
    fn test_fit_to_points() {
        let obb = unit_box();
        let mut points: Vec<Point3<f64>> = (0..20)
            .map(|i| {
                let t = f64::from(i) / 19.0;
                Point3::new(-0.05 + 0.1 * t, -0.02 + 0.04 * t, 0.03 * (t - 0.5))
            })
            .collect();
        points.push(Point3::new(5.0, 0.0, 0.0));
        let cloud: PointCloud = points.into_iter().collect();

        let refit = BoxEditor::default().fit_to_points(&obb, &cloud).unwrap();
        assert_relative_eq!(refit.extents().x, 0.1, epsilon = 1e-9);
        assert_relative_eq!(refit.extents().y, 0.04, epsilon = 1e-9);
        assert_relative_eq!(refit.extents().z, 0.03, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_to_points_too_few() {
        let obb = unit_box();
        let cloud: PointCloud = std::iter::once(Point3::origin()).collect();
        let editor = BoxEditor::default();
        assert!(editor.fit_to_points(&obb, &cloud).is_none());
        let out = editor.apply(&obb, &Gesture::FitToPoints, &FnProjector(top_down), Some(&cloud));
        assert!(!out.did_change);
    }

    #[test]
    fn test_snap_to_floor() {
        let obb = OrientedBox::axis_aligned(Point3::new(0.0, 0.13, 0.0), Vector3::new(0.1, 0.1, 0.1));
        let editor = BoxEditor::default();
        let out = editor.apply(
            &obb,
            &Gesture::SnapToFloor { floor_y: 0.0 },
            &FnProjector(top_down),
            None,
        );
        assert!(out.did_change);
        assert_relative_eq!(out.obb.bottom_y(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.obb.top_y(), 0.23, epsilon = 1e-12);

        assert!(!editor.snap_to_floor(&obb, -1.0).did_change);
    }
}
