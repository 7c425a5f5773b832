//! Diagnostic images produced by the sampler.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 8-bit single-channel image in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrayImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel values, `pixels[y * width + x]`.
    pub pixels: Vec<u8>,
}

impl GrayImage {
    /// Creates a black image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Pixel value, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Sets a pixel; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        if let Some(p) = self
            .pixels
            .get_mut(y as usize * self.width as usize + x as usize)
        {
            *p = value;
        }
    }

    /// Number of non-zero pixels.
    #[must_use]
    pub fn nonzero_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }
}

/// Kept-pixel mask and normalized depth at depth resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebugImagery {
    /// 255 where a pixel produced a kept point, 0 elsewhere.
    pub kept_mask: GrayImage,
    /// Sampled depth of kept pixels scaled to 1..=255 (near = bright).
    pub depth: GrayImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_image_access() {
        let mut img = GrayImage::new(4, 3);
        img.set(3, 2, 200);
        img.set(9, 9, 1);
        assert_eq!(img.get(3, 2), Some(200));
        assert_eq!(img.get(4, 0), None);
        assert_eq!(img.nonzero_count(), 1);
    }
}
