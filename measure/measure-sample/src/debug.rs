//! Debug imagery of the sampled pixels.

use measure_types::{DebugImagery, GrayImage};

/// A pixel that produced a kept point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeptPixel {
    pub x: u32,
    pub y: u32,
    pub depth: f32,
}

/// Renders kept pixels into a mask image and a normalized depth image.
///
/// Depth is scaled so the nearest kept pixel is 255 and the farthest is 1;
/// pixels without a kept point stay 0.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn render(width: u32, height: u32, kept: &[KeptPixel]) -> DebugImagery {
    let mut mask = GrayImage::new(width, height);
    let mut depth = GrayImage::new(width, height);

    let (near, far) = kept.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.depth), hi.max(p.depth))
    });
    let span = (far - near).max(f32::EPSILON);

    for p in kept {
        mask.set(p.x, p.y, 255);
        let t = ((p.depth - near) / span).clamp(0.0, 1.0);
        let value = 254.0f32.mul_add(-t, 255.0).round() as u8;
        depth.set(p.x, p.y, value.max(1));
    }

    DebugImagery {
        kept_mask: mask,
        depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_scales_depth() {
        let kept = [
            KeptPixel {
                x: 0,
                y: 0,
                depth: 1.0,
            },
            KeptPixel {
                x: 1,
                y: 0,
                depth: 2.0,
            },
        ];
        let img = render(3, 2, &kept);
        assert_eq!(img.kept_mask.nonzero_count(), 2);
        assert_eq!(img.depth.get(0, 0), Some(255));
        assert_eq!(img.depth.get(1, 0), Some(1));
        assert_eq!(img.depth.get(2, 1), Some(0));
    }

    #[test]
    fn render_empty() {
        let img = render(2, 2, &[]);
        assert_eq!(img.kept_mask.nonzero_count(), 0);
    }
}
