//! Posterization and thresholding
//!
//! The final flattening stages of the cleaning chain:
//!
//! - [`posterize`] reduces a color image to a bounded palette via median-cut
//!   quantization (no dithering, so the output stays deterministic and edges
//!   stay solid).
//! - [`threshold`] binarizes a grayscale image at a fixed brightness
//!   percentage. Output pixels are exactly 0 or 255.

use image::{GrayImage, Luma, RgbImage};

/// Binarize at `threshold_percent` of full brightness.
///
/// Pixels below the cutoff become black; pixels at or above it become white
/// (the exact boundary goes to white). No intermediate gray survives.
pub fn threshold(image: &GrayImage, threshold_percent: u8) -> GrayImage {
    let cutoff = (f32::from(threshold_percent) / 100.0 * 255.0).round() as u8;
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        *pixel = if pixel.0[0] >= cutoff {
            Luma([255])
        } else {
            Luma([0])
        };
    }
    output
}

/// Reduce an image to at most `colors` distinct colors with median-cut
/// quantization.
///
/// Every pixel is mapped to the nearest palette entry; no dithering. The
/// split order, medians, and nearest-match ties are all resolved
/// deterministically, so identical inputs quantize identically.
pub fn posterize(image: &RgbImage, colors: u32) -> RgbImage {
    let pixels: Vec<[u8; 3]> = image.pixels().map(|p| p.0).collect();
    if pixels.is_empty() {
        return image.clone();
    }

    let palette = median_cut(pixels, colors.max(2) as usize);
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel.0 = nearest(&palette, pixel.0);
    }
    output
}

/// Channel with the widest value range in a box, and that range.
fn widest_channel(pixels: &[[u8; 3]]) -> (usize, u8) {
    let mut best = (0usize, 0u8);
    for channel in 0..3 {
        let min = pixels.iter().map(|p| p[channel]).min().unwrap_or(0);
        let max = pixels.iter().map(|p| p[channel]).max().unwrap_or(0);
        let range = max - min;
        if range > best.1 {
            best = (channel, range);
        }
    }
    best
}

fn box_average(pixels: &[[u8; 3]]) -> [u8; 3] {
    let len = pixels.len() as u64;
    let mut sums = [0u64; 3];
    for p in pixels {
        sums[0] += u64::from(p[0]);
        sums[1] += u64::from(p[1]);
        sums[2] += u64::from(p[2]);
    }
    [
        (sums[0] / len) as u8,
        (sums[1] / len) as u8,
        (sums[2] / len) as u8,
    ]
}

/// Standard median-cut: repeatedly split the box with the widest channel
/// range at its median until `colors` boxes exist, then average each box.
fn median_cut(pixels: Vec<[u8; 3]>, colors: usize) -> Vec<[u8; 3]> {
    let mut boxes: Vec<Vec<[u8; 3]>> = vec![pixels];

    while boxes.len() < colors {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.len() > 1)
            .map(|(i, b)| {
                let (channel, range) = widest_channel(b);
                (i, channel, range)
            })
            .max_by_key(|&(_, _, range)| range);

        // No splittable box left (fewer distinct colors than requested).
        let Some((index, channel, range)) = candidate else {
            break;
        };
        if range == 0 {
            break;
        }

        let mut target = boxes.swap_remove(index);
        target.sort_unstable_by_key(|p| p[channel]);
        let right = target.split_off(target.len() / 2);
        boxes.push(target);
        boxes.push(right);
    }

    boxes.iter().map(|b| box_average(b)).collect()
}

/// Nearest palette entry by squared RGB distance; ties resolve to a fixed
/// entry, so mapping stays deterministic.
fn nearest(palette: &[[u8; 3]], pixel: [u8; 3]) -> [u8; 3] {
    let distance = |entry: [u8; 3]| -> u32 {
        entry
            .iter()
            .zip(pixel.iter())
            .map(|(&a, &b)| {
                let d = i32::from(a) - i32::from(b);
                (d * d) as u32
            })
            .sum()
    };
    palette
        .iter()
        .copied()
        .min_by_key(|&entry| distance(entry))
        .unwrap_or(pixel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::collections::HashSet;

    fn distinct_colors(image: &RgbImage) -> usize {
        image
            .pixels()
            .map(|p| p.0)
            .collect::<HashSet<_>>()
            .len()
    }

    #[test]
    fn test_threshold_boundary_at_60_percent() {
        // 60% of 255 rounds to 153. 59% brightness (150) is black,
        // 61% (156) is white, and exactly 153 ties to white.
        let mut image = GrayImage::new(3, 1);
        image.put_pixel(0, 0, Luma([150]));
        image.put_pixel(1, 0, Luma([153]));
        image.put_pixel(2, 0, Luma([156]));

        let result = threshold(&image, 60);
        assert_eq!(result.get_pixel(0, 0).0, [0]);
        assert_eq!(result.get_pixel(1, 0).0, [255]);
        assert_eq!(result.get_pixel(2, 0).0, [255]);
    }

    #[test]
    fn test_threshold_output_is_two_level() {
        let mut image = GrayImage::new(16, 16);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Luma([(x * 16 + y) as u8]);
        }
        let result = threshold(&image, 65);
        assert!(result.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_threshold_extremes() {
        let image = GrayImage::from_pixel(2, 2, Luma([200]));
        // 0% cutoff: everything is at or above 0, all white.
        assert!(threshold(&image, 0).pixels().all(|p| p.0[0] == 255));
        // 100% cutoff: only pure 255 stays white.
        assert!(threshold(&image, 100).pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_posterize_bounds_palette() {
        let mut image = RgbImage::new(32, 32);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8]);
        }
        assert!(distinct_colors(&image) > 8);

        let quantized = posterize(&image, 8);
        assert!(distinct_colors(&quantized) <= 8);
    }

    #[test]
    fn test_posterize_palette_is_adaptive_not_uniform() {
        // A red-dominated gradient: median cut spends its palette on the
        // axis with the most variation, so a single channel may hold more
        // levels than a fixed per-channel grid would, while the total
        // palette stays bounded.
        let mut image = RgbImage::new(32, 32);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 8) as u8, (y / 16 * 40) as u8, 0]);
        }
        let quantized = posterize(&image, 8);
        let red_levels: HashSet<u8> = quantized.pixels().map(|p| p.0[0]).collect();
        assert!(red_levels.len() > 2);
        assert!(distinct_colors(&quantized) <= 8);
    }

    #[test]
    fn test_posterize_two_colors() {
        let mut image = RgbImage::new(8, 8);
        for (x, _, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 30) as u8, 0, 0]);
        }
        let quantized = posterize(&image, 2);
        assert!(distinct_colors(&quantized) <= 2);
    }

    #[test]
    fn test_posterize_uniform_image_is_stable() {
        let image = RgbImage::from_pixel(4, 4, Rgb([70, 130, 200]));
        let quantized = posterize(&image, 8);
        assert_eq!(quantized.as_raw(), image.as_raw());
    }

    #[test]
    fn test_posterize_is_deterministic() {
        let mut image = RgbImage::new(20, 20);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 12) as u8, (y * 12) as u8, 128]);
        }
        let first = posterize(&image, 8);
        let second = posterize(&image, 8);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_posterize_empty_image() {
        let image = RgbImage::new(0, 0);
        let quantized = posterize(&image, 8);
        assert_eq!(quantized.width(), 0);
    }
}
