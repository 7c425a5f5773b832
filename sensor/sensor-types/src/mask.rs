//! Object selection in image space: segmentation masks and regions of interest.
//!
//! Both are addressed with normalized image coordinates `(u, v)` in `[0, 1]`
//! so that a mask produced at color resolution can gate a lower resolution
//! depth frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SensorError;

/// A binary segmentation mask. Non-zero pixels belong to the object.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl SegmentationMask {
    /// Creates a validated mask in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::BufferSizeMismatch`] if `data` does not hold
    /// `width * height` bytes.
    pub fn try_new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, SensorError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(SensorError::buffer_mismatch("mask", expected, data.len()));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a mask by evaluating `f(x, y)` for every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(u8::from(f(x, y)));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Mask width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if pixel `(x, y)` is set. Out-of-bounds pixels are unset.
    #[must_use]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .is_some_and(|&v| v != 0)
    }

    /// Samples the mask at normalized coordinates (nearest neighbour).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn contains_normalized(&self, u: f64, v: f64) -> bool {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return false;
        }
        let x = ((u * f64::from(self.width)) as u32).min(self.width.saturating_sub(1));
        let y = ((v * f64::from(self.height)) as u32).min(self.height.saturating_sub(1));
        self.is_set(x, y)
    }

    /// Number of set pixels.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Axis-aligned rectangle in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionOfInterest {
    /// Left edge (inclusive), `[0, 1]`.
    pub u_min: f64,
    /// Top edge (inclusive), `[0, 1]`.
    pub v_min: f64,
    /// Right edge (inclusive), `[0, 1]`.
    pub u_max: f64,
    /// Bottom edge (inclusive), `[0, 1]`.
    pub v_max: f64,
}

impl RegionOfInterest {
    /// Creates a validated region.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidRegion`] if the region is empty or
    /// leaves the unit square.
    pub fn try_new(u_min: f64, v_min: f64, u_max: f64, v_max: f64) -> Result<Self, SensorError> {
        let unit = 0.0..=1.0;
        if ![u_min, v_min, u_max, v_max].iter().all(|c| unit.contains(c)) {
            return Err(SensorError::invalid_region(format!(
                "bounds must lie in [0, 1], got ({u_min}, {v_min})..({u_max}, {v_max})"
            )));
        }
        if u_min >= u_max || v_min >= v_max {
            return Err(SensorError::invalid_region(format!(
                "region has no area: ({u_min}, {v_min})..({u_max}, {v_max})"
            )));
        }
        Ok(Self {
            u_min,
            v_min,
            u_max,
            v_max,
        })
    }

    /// The whole image.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            u_min: 0.0,
            v_min: 0.0,
            u_max: 1.0,
            v_max: 1.0,
        }
    }

    /// A square region of half-size `half` around `(u, v)`, clipped to the image.
    #[must_use]
    pub fn around(u: f64, v: f64, half: f64) -> Self {
        Self {
            u_min: (u - half).clamp(0.0, 1.0),
            v_min: (v - half).clamp(0.0, 1.0),
            u_max: (u + half).clamp(0.0, 1.0),
            v_max: (v + half).clamp(0.0, 1.0),
        }
    }

    /// Returns `true` if `(u, v)` lies inside the region.
    #[must_use]
    pub fn contains(&self, u: f64, v: f64) -> bool {
        u >= self.u_min && u <= self.u_max && v >= self.v_min && v <= self.v_max
    }
}

/// Which pixels of a frame belong to the object being measured.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Selection {
    /// Every pixel.
    #[default]
    Full,
    /// Pixels set in the mask.
    Mask(SegmentationMask),
    /// Pixels inside the region.
    Roi(RegionOfInterest),
    /// Pixels set in the mask and inside the region.
    MaskWithinRoi(SegmentationMask, RegionOfInterest),
}

impl Selection {
    /// Returns `true` if the normalized coordinate is selected.
    #[must_use]
    pub fn contains(&self, u: f64, v: f64) -> bool {
        match self {
            Self::Full => (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v),
            Self::Mask(mask) => mask.contains_normalized(u, v),
            Self::Roi(roi) => roi.contains(u, v),
            Self::MaskWithinRoi(mask, roi) => roi.contains(u, v) && mask.contains_normalized(u, v),
        }
    }
}
