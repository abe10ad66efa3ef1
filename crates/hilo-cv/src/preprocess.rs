//! Frame preparation: colour frame to binary card mask.
//!
//! Card faces are bright against the table felt, so a grayscale conversion,
//! a light Gaussian blur and a fixed global threshold are enough to isolate
//! them. The tunables live in the config and never change at runtime.

use image::{GrayImage, RgbImage, imageops};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

/// Single-channel mask: 255 where the frame is card-bright, 0 elsewhere.
pub type BinaryMask = GrayImage;

/// Mask extraction tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Gaussian smoothing strength applied before thresholding.
    pub blur_sigma: f32,
    /// Global intensity cut-off. Card faces sit well above table felt.
    pub threshold: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            threshold: 150,
        }
    }
}

/// Convert a captured frame into a binary mask for contour segmentation.
///
/// A zero-sized frame yields a zero-sized mask; segmentation then finds
/// nothing, which is a normal outcome rather than an error.
pub fn prepare(frame: &RgbImage, config: &PreprocessConfig) -> BinaryMask {
    if frame.width() == 0 || frame.height() == 0 {
        return GrayImage::new(0, 0);
    }
    let gray = imageops::grayscale(frame);
    let blurred = if config.blur_sigma > 0.0 {
        gaussian_blur_f32(&gray, config.blur_sigma)
    } else {
        gray
    };
    threshold(&blurred, config.threshold, ThresholdType::Binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame_with_bright_patch(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (20..60).contains(&x) && (20..60).contains(&y) {
                Rgb([230, 230, 230])
            } else {
                Rgb([20, 60, 30])
            }
        })
    }

    #[test]
    fn bright_patch_survives_thresholding() {
        let mask = prepare(&frame_with_bright_patch(100, 100), &PreprocessConfig::default());
        assert_eq!(mask.dimensions(), (100, 100));
        // Patch interior is solid foreground, felt is background.
        assert_eq!(mask.get_pixel(40, 40).0[0], 255);
        assert_eq!(mask.get_pixel(5, 5).0[0], 0);
        assert_eq!(mask.get_pixel(90, 90).0[0], 0);
    }

    #[test]
    fn dark_frame_yields_empty_mask() {
        let frame = RgbImage::from_pixel(50, 50, Rgb([25, 55, 35]));
        let mask = prepare(&frame, &PreprocessConfig::default());
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn empty_frame_yields_empty_mask() {
        let mask = prepare(&RgbImage::new(0, 0), &PreprocessConfig::default());
        assert_eq!(mask.dimensions(), (0, 0));
    }

    #[test]
    fn zero_sigma_skips_the_blur() {
        let config = PreprocessConfig {
            blur_sigma: 0.0,
            threshold: 150,
        };
        let mask = prepare(&frame_with_bright_patch(100, 100), &config);
        // Without smoothing the patch boundary is pixel-exact.
        assert_eq!(mask.get_pixel(20, 20).0[0], 255);
        assert_eq!(mask.get_pixel(19, 20).0[0], 0);
    }
}
