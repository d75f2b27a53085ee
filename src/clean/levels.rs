//! Tonal normalization (auto-leveling)
//!
//! Stretches the luminance histogram so the configured low/high percentile
//! bounds map to full black and white. Fixes "muddy" scans where the darkest
//! ink is not quite black and the paper is not quite white, which would
//! otherwise shift the threshold stage.
//!
//! The percentile cuts are computed from a 256-bucket luminance histogram
//! and the same linear stretch is applied to every channel, so hue is
//! preserved for the classifier downstream.

use image::{Rgb, RgbImage};

use crate::config::LevelRange;

const HISTOGRAM_BUCKETS: usize = 256;

/// Rec. 601 luma, the same weighting [`image::imageops::grayscale`] uses.
fn luminance(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)).round() as u8
}

/// Smallest intensity whose cumulative histogram count reaches the given
/// percentile. Percentile 0 lands on the first occupied bucket, 100 on the
/// last.
fn percentile_cut(histogram: &[u64; HISTOGRAM_BUCKETS], total: u64, percent: u8) -> u8 {
    let target = (u64::from(percent) * total).div_ceil(100).max(1);
    let mut cumulative = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return value as u8;
        }
    }
    (HISTOGRAM_BUCKETS - 1) as u8
}

/// Contrast-stretch an image so the luminance percentiles in `levels` map
/// to 0 and 255.
///
/// Pure: returns a new buffer, the input is untouched. A degenerate
/// histogram (uniform image, or bounds collapsing onto one value) returns
/// the input unchanged rather than dividing by zero.
pub fn auto_level(image: &RgbImage, levels: LevelRange) -> RgbImage {
    let total = u64::from(image.width()) * u64::from(image.height());
    if total == 0 {
        return image.clone();
    }

    let mut histogram = [0u64; HISTOGRAM_BUCKETS];
    for pixel in image.pixels() {
        histogram[usize::from(luminance(pixel))] += 1;
    }

    let low_cut = percentile_cut(&histogram, total, levels.low);
    let high_cut = percentile_cut(&histogram, total, levels.high);
    if high_cut <= low_cut {
        return image.clone();
    }

    let low = f32::from(low_cut);
    let range = f32::from(high_cut) - low;
    let stretch =
        |v: u8| -> u8 { (((f32::from(v) - low) * 255.0 / range).round()).clamp(0.0, 255.0) as u8 };

    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel.0 = [stretch(pixel.0[0]), stretch(pixel.0[1]), stretch(pixel.0[2])];
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(dark: u8, light: u8) -> RgbImage {
        let mut image = RgbImage::new(4, 2);
        for (x, _, pixel) in image.enumerate_pixels_mut() {
            let v = if x < 2 { dark } else { light };
            *pixel = Rgb([v, v, v]);
        }
        image
    }

    #[test]
    fn test_full_range_stretch() {
        let image = two_tone(50, 200);
        let leveled = auto_level(&image, LevelRange { low: 0, high: 100 });
        assert_eq!(leveled.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(leveled.get_pixel(3, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_uniform_image_is_unchanged() {
        let image = RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]));
        let leveled = auto_level(&image, LevelRange { low: 0, high: 80 });
        assert_eq!(leveled.as_raw(), image.as_raw());
    }

    #[test]
    fn test_input_is_untouched() {
        let image = two_tone(10, 240);
        let before = image.as_raw().clone();
        let _ = auto_level(&image, LevelRange { low: 0, high: 100 });
        assert_eq!(image.as_raw(), &before);
    }

    #[test]
    fn test_high_percentile_clips_to_white() {
        // Values 20, 100, 100, 220. With high = 75 the cut lands on 100,
        // so everything at or above it saturates to white.
        let mut image = RgbImage::from_pixel(4, 1, Rgb([100, 100, 100]));
        image.put_pixel(0, 0, Rgb([20, 20, 20]));
        image.put_pixel(3, 0, Rgb([220, 220, 220]));
        let leveled = auto_level(&image, LevelRange { low: 0, high: 75 });
        assert_eq!(leveled.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(leveled.get_pixel(3, 0).0, [255, 255, 255]);
        // low = 0 pins the darkest bucket to black.
        assert_eq!(leveled.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_zero_area_image() {
        let image = RgbImage::new(0, 0);
        let leveled = auto_level(&image, LevelRange { low: 0, high: 80 });
        assert_eq!(leveled.width(), 0);
    }

    #[test]
    fn test_percentile_cut_bounds() {
        let mut histogram = [0u64; HISTOGRAM_BUCKETS];
        histogram[30] = 10;
        histogram[200] = 10;
        assert_eq!(percentile_cut(&histogram, 20, 0), 30);
        assert_eq!(percentile_cut(&histogram, 20, 50), 30);
        assert_eq!(percentile_cut(&histogram, 20, 51), 200);
        assert_eq!(percentile_cut(&histogram, 20, 100), 200);
    }
}
