// THEORY:
// The `TextureRegion` is the fingerprint primitive. It is a "dumb" data
// container for a rectangular block of RGBA pixels cut out of a skin
// texture, plus the one comparison the engine needs: what fraction of
// corresponding pixels are exactly equal.
//
// Key architectural principles:
// 1.  **Fixed Geometry**: Every region is sampled from the same rectangle
//     (16x8 at (8,0) by default, the top face of a 64x64 head skin), so two
//     regions are comparable pixel-for-pixel without any alignment step.
// 2.  **Exact Equality**: A pixel pair matches only if all four channels are
//     identical. There is no distance metric or tolerance; the threshold on
//     the *count* of equal pixels is the only fuzziness.
// 3.  **Small and Owned**: A region is 128 pixels. It is cheap to clone and
//     store, which is what lets reference fingerprints be cached for the
//     lifetime of the process while the full candidate image is discarded.

use crate::error::ResolveError;
use image::{Rgba, RgbaImage};

/// Rectangle within a texture, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A sampled block of RGBA pixels, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRegion {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba<u8>>,
}

impl TextureRegion {
    /// Cuts `rect` out of `image`. Fails if the image does not fully contain it.
    pub fn sample(image: &RgbaImage, rect: RegionRect) -> Result<Self, ResolveError> {
        let fits_x = rect.x.checked_add(rect.width).is_some_and(|end| end <= image.width());
        let fits_y = rect.y.checked_add(rect.height).is_some_and(|end| end <= image.height());
        if !fits_x || !fits_y {
            return Err(ResolveError::RegionOutOfBounds {
                width: image.width(),
                height: image.height(),
            });
        }

        let mut pixels = Vec::with_capacity((rect.width * rect.height) as usize);
        for y in 0..rect.height {
            for x in 0..rect.width {
                pixels.push(*image.get_pixel(rect.x + x, rect.y + y));
            }
        }

        Ok(Self {
            width: rect.width,
            height: rect.height,
            pixels,
        })
    }

    /// Percentage (0..=100) of pixel pairs that are exactly equal.
    /// `None` when the regions have different shapes or are empty.
    pub fn similarity(&self, other: &TextureRegion) -> Option<f64> {
        if self.width != other.width
            || self.height != other.height
            || self.pixels.len() != other.pixels.len()
            || self.pixels.is_empty()
        {
            return None;
        }

        let matching = self
            .pixels
            .iter()
            .zip(other.pixels.iter())
            .filter(|(a, b)| a == b)
            .count();

        Some(matching as f64 / self.pixels.len() as f64 * 100.0)
    }

    /// True when at least `threshold_percent` of pixels are equal.
    pub fn matches(&self, other: &TextureRegion, threshold_percent: f64) -> bool {
        self.similarity(other)
            .is_some_and(|similarity| similarity >= threshold_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD_TOP: RegionRect = RegionRect {
        x: 8,
        y: 0,
        width: 16,
        height: 8,
    };

    fn checkerboard(seed: u8) -> RgbaImage {
        RgbaImage::from_fn(64, 64, |x, y| {
            let v = (x as u8).wrapping_mul(7) ^ (y as u8).wrapping_mul(13) ^ seed;
            Rgba([v, v.wrapping_add(40), v.wrapping_add(90), 255])
        })
    }

    /// Repaints the first `count` pixels of the head-top region.
    fn repaint(image: &mut RgbaImage, count: u32) {
        for i in 0..count {
            let x = HEAD_TOP.x + i % HEAD_TOP.width;
            let y = HEAD_TOP.y + i / HEAD_TOP.width;
            let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
            image.put_pixel(x, y, Rgba([r ^ 0xFF, g, b, a]));
        }
    }

    #[test]
    fn identical_images_match_fully() {
        let image = checkerboard(3);
        let a = TextureRegion::sample(&image, HEAD_TOP).unwrap();
        let b = TextureRegion::sample(&image, HEAD_TOP).unwrap();
        assert_eq!(a.similarity(&b), Some(100.0));
        assert!(a.matches(&b, 95.0));
    }

    #[test]
    fn comparison_is_symmetric() {
        let reference = checkerboard(3);
        let mut candidate = checkerboard(3);
        repaint(&mut candidate, 9);

        let a = TextureRegion::sample(&reference, HEAD_TOP).unwrap();
        let b = TextureRegion::sample(&candidate, HEAD_TOP).unwrap();
        assert_eq!(a.similarity(&b), b.similarity(&a));
        assert_eq!(a.matches(&b, 95.0), b.matches(&a, 95.0));
    }

    #[test]
    fn threshold_boundary() {
        let reference = checkerboard(11);
        let ref_region = TextureRegion::sample(&reference, HEAD_TOP).unwrap();

        // 6 of 128 differ: 95.3% equal.
        let mut close = checkerboard(11);
        repaint(&mut close, 6);
        let close = TextureRegion::sample(&close, HEAD_TOP).unwrap();
        assert!(close.matches(&ref_region, 95.0));

        // 7 of 128 differ: 94.5% equal.
        let mut far = checkerboard(11);
        repaint(&mut far, 7);
        let far = TextureRegion::sample(&far, HEAD_TOP).unwrap();
        assert!(!far.matches(&ref_region, 95.0));
    }

    #[test]
    fn fully_different_region_never_matches() {
        let reference = checkerboard(5);
        let mut candidate = checkerboard(5);
        repaint(&mut candidate, 128);

        let a = TextureRegion::sample(&reference, HEAD_TOP).unwrap();
        let b = TextureRegion::sample(&candidate, HEAD_TOP).unwrap();
        assert_eq!(a.similarity(&b), Some(0.0));
        assert!(!b.matches(&a, 95.0));
    }

    #[test]
    fn pixels_outside_region_are_ignored() {
        let reference = checkerboard(1);
        let mut candidate = checkerboard(1);
        for x in 0..64 {
            candidate.put_pixel(x, 40, Rgba([0, 0, 0, 0]));
        }
        let a = TextureRegion::sample(&reference, HEAD_TOP).unwrap();
        let b = TextureRegion::sample(&candidate, HEAD_TOP).unwrap();
        assert_eq!(a.similarity(&b), Some(100.0));
    }

    #[test]
    fn alpha_channel_participates_in_equality() {
        let reference = checkerboard(2);
        let mut candidate = checkerboard(2);
        for x in HEAD_TOP.x..HEAD_TOP.x + HEAD_TOP.width {
            let Rgba([r, g, b, _]) = *candidate.get_pixel(x, 0);
            candidate.put_pixel(x, 0, Rgba([r, g, b, 0]));
        }
        let a = TextureRegion::sample(&reference, HEAD_TOP).unwrap();
        let b = TextureRegion::sample(&candidate, HEAD_TOP).unwrap();
        assert_eq!(a.similarity(&b), Some(87.5));
    }

    #[test]
    fn too_small_texture_is_rejected() {
        let tiny = RgbaImage::new(16, 8);
        let err = TextureRegion::sample(&tiny, HEAD_TOP).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::RegionOutOfBounds {
                width: 16,
                height: 8
            }
        ));
    }

    #[test]
    fn mismatched_shapes_do_not_compare() {
        let image = checkerboard(0);
        let a = TextureRegion::sample(&image, HEAD_TOP).unwrap();
        let b = TextureRegion::sample(
            &image,
            RegionRect {
                x: 0,
                y: 0,
                width: 8,
                height: 8,
            },
        )
        .unwrap();
        assert_eq!(a.similarity(&b), None);
        assert!(!a.matches(&b, 0.0));
    }
}
