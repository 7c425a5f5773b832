//! Camera geometry: pinhole intrinsics and camera-to-world pose.
//!
//! Camera coordinates follow the `OpenCV` convention: +X right, +Y down,
//! +Z forward (into the scene). World coordinates are right-handed with +Y up.

use nalgebra::{Isometry3, Matrix3, Point2, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SensorError;

/// Camera intrinsic parameters (pinhole model, no distortion).
///
/// Projects a camera-frame point `[X, Y, Z]` to pixel coordinates:
/// ```text
/// u = fx * X/Z + cx
/// v = fy * Y/Z + cy
/// ```
///
/// Depth maps are usually captured at a lower resolution than the color
/// image; use [`CameraIntrinsics::scaled_to`] to match the depth buffer.
///
/// # Example
///
/// ```
/// use sensor_types::CameraIntrinsics;
///
/// let color = CameraIntrinsics::new(1500.0, 1500.0, 960.0, 720.0, 1920, 1440);
/// let depth = color.scaled_to(256, 192);
///
/// assert!((depth.fx - 200.0).abs() < 1e-9);
/// assert!((depth.cx - 128.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    /// Focal length in pixels (x direction).
    pub fx: f64,
    /// Focal length in pixels (y direction).
    pub fy: f64,
    /// Principal point x-coordinate in pixels.
    pub cx: f64,
    /// Principal point y-coordinate in pixels.
    pub cy: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl CameraIntrinsics {
    /// Creates new camera intrinsics.
    #[must_use]
    pub const fn new(fx: f64, fy: f64, cx: f64, cy: f64, width: u32, height: u32) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
        }
    }

    /// Creates intrinsics for an ideal pinhole camera centered in the image.
    #[must_use]
    pub fn ideal(focal_length: f64, width: u32, height: u32) -> Self {
        Self {
            fx: focal_length,
            fy: focal_length,
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
            width,
            height,
        }
    }

    /// Rescales the intrinsics to a different image resolution.
    #[must_use]
    pub fn scaled_to(&self, width: u32, height: u32) -> Self {
        let sx = f64::from(width) / f64::from(self.width.max(1));
        let sy = f64::from(height) / f64::from(self.height.max(1));
        Self {
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
            width,
            height,
        }
    }

    /// Checks that focal lengths are positive and the image is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidIntrinsics`] describing the first problem found.
    pub fn validate(&self) -> Result<(), SensorError> {
        if !(self.fx.is_finite() && self.fx > 0.0 && self.fy.is_finite() && self.fy > 0.0) {
            return Err(SensorError::invalid_intrinsics(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(SensorError::invalid_intrinsics(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Projects a camera-frame point to pixel coordinates.
    ///
    /// Returns `None` if the point is behind the camera (Z <= 0).
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Option<Point2<f64>> {
        if point.z <= 0.0 {
            return None;
        }
        Some(Point2::new(
            self.fx.mul_add(point.x / point.z, self.cx),
            self.fy.mul_add(point.y / point.z, self.cy),
        ))
    }

    /// Unprojects a pixel with metric depth (distance along +Z) to a
    /// camera-frame point.
    #[must_use]
    pub fn unproject(&self, pixel: Point2<f64>, depth: f64) -> Point3<f64> {
        let x_norm = (pixel.x - self.cx) / self.fx;
        let y_norm = (pixel.y - self.cy) / self.fy;
        Point3::new(x_norm * depth, y_norm * depth, depth)
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::ideal(200.0, 256, 192)
    }
}

/// Camera-to-world rigid transform.
///
/// # Example
///
/// ```
/// use sensor_types::CameraPose;
/// use nalgebra::{Point3, Vector3};
///
/// // Camera one meter above the origin looking straight down.
/// let pose = CameraPose::look_at(
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::origin(),
///     Vector3::z(),
/// ).unwrap();
///
/// let forward = pose.forward();
/// assert!((forward.y + 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraPose {
    /// Transform from camera coordinates to world coordinates.
    pub camera_to_world: Isometry3<f64>,
}

impl CameraPose {
    /// Wraps a camera-to-world isometry.
    #[must_use]
    pub const fn new(camera_to_world: Isometry3<f64>) -> Self {
        Self { camera_to_world }
    }

    /// Camera at the world origin, looking down world +Z with image +Y
    /// pointing down world -Y.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Isometry3::identity())
    }

    /// Builds a pose for a camera at `eye` looking toward `target`.
    ///
    /// `up` is the world direction that should appear "up" in the image.
    /// Returns `None` when `eye == target` or `up` is parallel to the view
    /// direction.
    #[must_use]
    pub fn look_at(eye: Point3<f64>, target: Point3<f64>, up: Vector3<f64>) -> Option<Self> {
        let forward = (target - eye).try_normalize(1e-12)?;
        let right = forward.cross(&up).try_normalize(1e-12)?;
        let down = forward.cross(&right);

        let basis = Matrix3::from_columns(&[right, down, forward]);
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
        Some(Self::new(Isometry3::from_parts(
            Translation3::from(eye.coords),
            rotation,
        )))
    }

    /// Camera center in world coordinates.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        Point3::from(self.camera_to_world.translation.vector)
    }

    /// Viewing direction (+Z of the camera) in world coordinates.
    #[must_use]
    pub fn forward(&self) -> Vector3<f64> {
        self.camera_to_world.rotation * Vector3::z()
    }

    /// Maps a camera-frame point to world coordinates.
    #[must_use]
    pub fn to_world(&self, point: &Point3<f64>) -> Point3<f64> {
        self.camera_to_world * point
    }

    /// Maps a world point to camera coordinates.
    #[must_use]
    pub fn to_camera(&self, point: &Point3<f64>) -> Point3<f64> {
        self.camera_to_world.inverse_transform_point(point)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Intrinsics plus pose: everything needed to move between pixels and the world.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Camera {
    /// Pinhole intrinsics at the resolution of the buffer being sampled.
    pub intrinsics: CameraIntrinsics,
    /// Camera-to-world pose.
    pub pose: CameraPose,
}

impl Camera {
    /// Creates a camera from intrinsics and pose.
    #[must_use]
    pub const fn new(intrinsics: CameraIntrinsics, pose: CameraPose) -> Self {
        Self { intrinsics, pose }
    }

    /// Unprojects pixel `(x, y)` at metric depth to a world point.
    #[must_use]
    pub fn unproject_pixel(&self, x: u32, y: u32, depth: f64) -> Point3<f64> {
        let local = self
            .intrinsics
            .unproject(Point2::new(f64::from(x), f64::from(y)), depth);
        self.pose.to_world(&local)
    }

    /// Projects a world point to pixel coordinates.
    ///
    /// Returns `None` if the point is behind the camera.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Option<Point2<f64>> {
        self.intrinsics.project(&self.pose.to_camera(point))
    }

    /// World-space direction of the ray through pixel `(x, y)`, scaled so
    /// that its camera-frame Z component is 1 (parameter == depth).
    #[must_use]
    pub fn pixel_ray(&self, x: f64, y: f64) -> Vector3<f64> {
        let local = self.intrinsics.unproject(Point2::new(x, y), 1.0);
        self.pose.camera_to_world.rotation * local.coords
    }
}
