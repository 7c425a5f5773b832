//! Local box axes and the fixed assignment of dimension labels to them.

use std::fmt;

use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the three local axes of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Local X.
    X,
    /// Local Y (vertical for fitted boxes).
    Y,
    /// Local Z.
    Z,
}

impl Axis {
    /// All three axes in index order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Component index (0, 1, 2).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Unit vector along this axis in local coordinates.
    #[must_use]
    pub fn unit(self) -> Vector3<f64> {
        match self {
            Self::X => Vector3::x(),
            Self::Y => Vector3::y(),
            Self::Z => Vector3::z(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        };
        f.write_str(name)
    }
}

/// A reported box dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dimension {
    /// Longest horizontal extent at fit time.
    Length,
    /// Remaining horizontal extent.
    Width,
    /// Vertical extent.
    Height,
}

/// Which local axis carries each reported dimension.
///
/// Chosen once when a box is first fitted and carried unchanged through every
/// edit and re-fit, so that a box rotated by 90° keeps its labels.
///
/// # Example
///
/// ```
/// use measure_types::{Axis, AxisMapping};
/// use nalgebra::Vector3;
///
/// // Horizontal Z is longer than horizontal X.
/// let mapping = AxisMapping::from_extents(&Vector3::new(0.1, 0.15, 0.2), Axis::Y);
/// assert_eq!(mapping.length, Axis::Z);
/// assert_eq!(mapping.width, Axis::X);
/// assert_eq!(mapping.height, Axis::Y);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisMapping {
    /// Axis reported as length.
    pub length: Axis,
    /// Axis reported as width.
    pub width: Axis,
    /// Axis reported as height.
    pub height: Axis,
}

impl AxisMapping {
    /// Derives a mapping from box extents.
    ///
    /// `vertical` becomes height; the longer of the two remaining axes becomes
    /// length. Equal horizontal extents resolve to the lower axis index.
    #[must_use]
    pub fn from_extents(extents: &Vector3<f64>, vertical: Axis) -> Self {
        let mut horizontal = Axis::ALL.into_iter().filter(|&a| a != vertical);
        // `ALL` has three entries and exactly one is filtered out.
        let a = horizontal.next().unwrap_or(Axis::X);
        let b = horizontal.next().unwrap_or(Axis::Z);

        let (length, width) = if extents[b.index()] > extents[a.index()] {
            (b, a)
        } else {
            (a, b)
        };

        Self {
            length,
            width,
            height: vertical,
        }
    }

    /// Axis carrying `dimension`.
    #[must_use]
    pub const fn axis(&self, dimension: Dimension) -> Axis {
        match dimension {
            Dimension::Length => self.length,
            Dimension::Width => self.width,
            Dimension::Height => self.height,
        }
    }

    /// Dimension carried by `axis`.
    #[must_use]
    pub fn dimension(&self, axis: Axis) -> Dimension {
        if axis == self.length {
            Dimension::Length
        } else if axis == self.width {
            Dimension::Width
        } else {
            Dimension::Height
        }
    }

    /// Returns `true` if every axis appears exactly once.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.length != self.width && self.width != self.height && self.length != self.height
    }
}

impl Default for AxisMapping {
    /// Length on X, width on Z, height on Y.
    fn default() -> Self {
        Self {
            length: Axis::X,
            width: Axis::Z,
            height: Axis::Y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_index_and_unit() {
        for axis in Axis::ALL {
            assert!((axis.unit()[axis.index()] - 1.0).abs() < f64::EPSILON);
        }
        assert_eq!(Axis::Z.to_string(), "z");
    }

    #[test]
    fn mapping_longest_horizontal_is_length() {
        let m = AxisMapping::from_extents(&Vector3::new(0.3, 0.05, 0.1), Axis::Y);
        assert_eq!(m.length, Axis::X);
        assert_eq!(m.width, Axis::Z);
        assert_eq!(m.height, Axis::Y);
        assert!(m.is_valid());
    }

    #[test]
    fn mapping_ignores_vertical_size() {
        // Tall box: vertical is longest but still maps to height.
        let m = AxisMapping::from_extents(&Vector3::new(0.1, 0.9, 0.2), Axis::Y);
        assert_eq!(m.height, Axis::Y);
        assert_eq!(m.length, Axis::Z);
    }

    #[test]
    fn mapping_tie_prefers_lower_index() {
        let m = AxisMapping::from_extents(&Vector3::new(0.2, 0.1, 0.2), Axis::Y);
        assert_eq!(m.length, Axis::X);
    }

    #[test]
    fn mapping_lookup() {
        let m = AxisMapping::default();
        assert_eq!(m.axis(Dimension::Width), Axis::Z);
        assert_eq!(m.dimension(Axis::Y), Dimension::Height);
        assert_eq!(m.dimension(m.axis(Dimension::Length)), Dimension::Length);
    }
}
