//! Color / monochrome classification
//!
//! Decides which cleaning recipe an image gets. In `Auto` mode the decision
//! is driven by the mean HSL saturation of the normalized pixels: scans of
//! pencil or ink line art sit near zero, while colored artwork scores well
//! above the cutoff. Forced modes bypass the measurement entirely.
//!
//! Classification is a pure function of the pixel data and the mode, so
//! repeated runs always take the same path.

use clap::ValueEnum;
use image::RgbImage;
use serde::Deserialize;

/// Mean-saturation cutoff separating color from monochrome content.
/// Above this fraction the image is treated as color.
pub const SATURATION_CUTOFF: f32 = 0.05;

/// Which cleaning recipe to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Measure saturation and pick the recipe per image.
    #[default]
    Auto,
    /// Force the posterize-then-threshold color path.
    Color,
    /// Force the plain threshold path.
    #[value(name = "bw")]
    #[serde(rename = "bw")]
    BlackWhite,
}

/// Result of classifying one image. Ephemeral: computed per file, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_color: bool,
    /// Mean HSL saturation over all pixels, 0.0-1.0.
    pub saturation: f32,
}

/// HSL saturation of a single pixel.
fn hsl_saturation(pixel: [u8; 3]) -> f32 {
    let r = f32::from(pixel[0]) / 255.0;
    let g = f32::from(pixel[1]) / 255.0;
    let b = f32::from(pixel[2]) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;
    if chroma == 0.0 {
        return 0.0;
    }
    let lightness = (max + min) / 2.0;
    let denom = 1.0 - (2.0 * lightness - 1.0).abs();
    if denom <= f32::EPSILON {
        0.0
    } else {
        chroma / denom
    }
}

/// Mean HSL saturation over every pixel. A blank image scores 0.0, so a
/// uniform raster always classifies as monochrome (no false positive from
/// noise).
pub fn mean_saturation(image: &RgbImage) -> f32 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = image
        .pixels()
        .map(|p| f64::from(hsl_saturation(p.0)))
        .sum();
    (sum / count as f64) as f32
}

/// Classify a normalized image under the given mode.
pub fn classify(image: &RgbImage, mode: ProcessingMode) -> Classification {
    let saturation = mean_saturation(image);
    let is_color = match mode {
        ProcessingMode::Color => true,
        ProcessingMode::BlackWhite => false,
        ProcessingMode::Auto => saturation > SATURATION_CUTOFF,
    };
    Classification {
        is_color,
        saturation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_uniform_gray_is_monochrome() {
        let image = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));
        let result = classify(&image, ProcessingMode::Auto);
        assert!(!result.is_color);
        assert_eq!(result.saturation, 0.0);
    }

    #[test]
    fn test_saturated_image_is_color() {
        let image = RgbImage::from_pixel(8, 8, Rgb([200, 40, 40]));
        let result = classify(&image, ProcessingMode::Auto);
        assert!(result.is_color);
        assert!(result.saturation > SATURATION_CUTOFF);
    }

    #[test]
    fn test_forced_modes_ignore_pixels() {
        let gray = RgbImage::from_pixel(4, 4, Rgb([90, 90, 90]));
        assert!(classify(&gray, ProcessingMode::Color).is_color);

        let red = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        assert!(!classify(&red, ProcessingMode::BlackWhite).is_color);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let mut image = RgbImage::new(16, 16);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 13) as u8, (y * 9) as u8, 100]);
        }
        let first = classify(&image, ProcessingMode::Auto);
        let second = classify(&image, ProcessingMode::Auto);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_image_is_monochrome() {
        let image = RgbImage::new(0, 0);
        let result = classify(&image, ProcessingMode::Auto);
        assert!(!result.is_color);
    }

    #[test]
    fn test_hsl_saturation_extremes() {
        assert_eq!(hsl_saturation([0, 0, 0]), 0.0);
        assert_eq!(hsl_saturation([255, 255, 255]), 0.0);
        assert!((hsl_saturation([255, 0, 0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_black_lines_on_white_stay_monochrome() {
        // Anti-aliased grayscale line art: plenty of tonal variation but
        // no chroma at all.
        let mut image = RgbImage::from_pixel(16, 16, Rgb([250, 250, 250]));
        for x in 0..16 {
            image.put_pixel(x, 8, Rgb([10, 10, 10]));
            image.put_pixel(x, 7, Rgb([120, 120, 120]));
        }
        let result = classify(&image, ProcessingMode::Auto);
        assert!(!result.is_color);
    }
}
