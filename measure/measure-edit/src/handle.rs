//! Face handles.

use std::fmt;

use measure_types::{Axis, OrientedBox};
use nalgebra::Point3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the six box faces a user can drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaceHandle {
    /// Local axis the face is perpendicular to.
    pub axis: Axis,
    /// `true` for the face on the positive side of the axis.
    pub positive: bool,
}

impl FaceHandle {
    /// Creates a handle.
    #[must_use]
    pub const fn new(axis: Axis, positive: bool) -> Self {
        Self { axis, positive }
    }

    /// All six faces, `+x -x +y -y +z -z`.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::new(Axis::X, true),
            Self::new(Axis::X, false),
            Self::new(Axis::Y, true),
            Self::new(Axis::Y, false),
            Self::new(Axis::Z, true),
            Self::new(Axis::Z, false),
        ]
    }

    /// The face on the other side of the box.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::new(self.axis, !self.positive)
    }

    /// World position of the face center on `obb`.
    #[must_use]
    pub fn center_on(self, obb: &OrientedBox) -> Point3<f64> {
        obb.face_center(self.axis, self.positive)
    }
}

impl fmt::Display for FaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.positive { '+' } else { '-' };
        write!(f, "{sign}{}", self.axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_distinct() {
        let set: HashSet<_> = FaceHandle::all().into_iter().collect();
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn test_opposite() {
        let h = FaceHandle::new(Axis::Z, true);
        assert_eq!(h.opposite(), FaceHandle::new(Axis::Z, false));
        assert_eq!(h.opposite().opposite(), h);
    }

    #[test]
    fn test_display() {
        assert_eq!(FaceHandle::new(Axis::Y, false).to_string(), "-y");
    }
}
