//! World-to-screen projection supplied by the caller.

use nalgebra::{Point2, Point3};
use sensor_types::Camera;

/// Projects world points to screen pixels.
///
/// Screen coordinates follow image convention: +x right, +y down.
pub trait ScreenProjector {
    /// Pixel position of `world`, or `None` if it is not in front of the
    /// viewer.
    fn project(&self, world: &Point3<f64>) -> Option<Point2<f64>>;
}

impl ScreenProjector for Camera {
    fn project(&self, world: &Point3<f64>) -> Option<Point2<f64>> {
        Self::project(self, world)
    }
}

/// Adapts a closure into a [`ScreenProjector`].
///
/// # Example
///
/// ```
/// use measure_edit::{FnProjector, ScreenProjector};
/// use nalgebra::{Point2, Point3};
///
/// // Top-down orthographic view, 1000 px per meter.
/// let top_down = FnProjector(|p: &Point3<f64>| Some(Point2::new(p.x * 1000.0, p.z * 1000.0)));
/// assert_eq!(top_down.project(&Point3::new(0.1, 5.0, 0.2)), Some(Point2::new(100.0, 200.0)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnProjector<F>(pub F);

impl<F> ScreenProjector for FnProjector<F>
where
    F: Fn(&Point3<f64>) -> Option<Point2<f64>>,
{
    fn project(&self, world: &Point3<f64>) -> Option<Point2<f64>> {
        (self.0)(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use sensor_types::{CameraIntrinsics, CameraPose};

    #[test]
    fn test_camera_projector() {
        let pose = CameraPose::look_at(
            Point3::new(0.0, 1.0, -1.0),
            Point3::origin(),
            Vector3::y(),
        )
        .unwrap();
        let camera = Camera::new(CameraIntrinsics::ideal(500.0, 640, 480), pose);
        let projector: &dyn ScreenProjector = &camera;

        let center = projector.project(&Point3::origin()).unwrap();
        assert!((center.x - 320.0).abs() < 1e-6);
        assert!((center.y - 240.0).abs() < 1e-6);
        assert!(projector.project(&Point3::new(0.0, 2.0, -2.0)).is_none());
    }
}
