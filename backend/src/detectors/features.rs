use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::gradients::sobel_gradients;
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashMap;

/// Lesions smaller than this (in pixels) are treated as sensor noise.
const MIN_SPOT_AREA: u32 = 4;

/// Gradient magnitude above which a pixel counts as an edge.
const EDGE_THRESHOLD: u16 = 128;

/// Hue/saturation/value statistics over the whole frame. Hue uses the
/// OpenCV-style 0..180 scale so the rule thresholds match the field data
/// they were tuned against.
#[derive(Debug, Clone, Copy)]
pub struct ColorStats {
    pub dominant_hue: f64,
    pub mean_saturation: f64,
    pub mean_value: f64,
}

/// Numeric signals feeding the disease rule generators and the severity
/// estimator. Pixel counts from the source heuristics are expressed as
/// ratios of the frame so thresholds hold at any resolution.
#[derive(Debug, Clone, Copy)]
pub struct DiseaseFeatures {
    pub spot_count: usize,
    pub avg_spot_area: f64,
    pub affected_area_ratio: f64,
    pub yellow_ratio: f64,
    pub brown_ratio: f64,
    pub white_ratio: f64,
    pub dark_ratio: f64,
    /// Standard deviation of the grayscale frame.
    pub texture_contrast: f64,
    pub edge_density: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureStats {
    pub variance: f64,
    pub edge_density: f64,
}

pub fn color_stats(image: &DynamicImage) -> ColorStats {
    let rgb = image.to_rgb8();
    let total = (rgb.width() * rgb.height()).max(1) as f64;

    let mut hue_histogram = [0u32; 181];
    let mut saturation_sum = 0.0;
    let mut value_sum = 0.0;
    for pixel in rgb.pixels() {
        let (h, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);
        hue_histogram[(h as usize).min(180)] += 1;
        saturation_sum += s;
        value_sum += v;
    }

    let dominant_hue = hue_histogram
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .map(|(bin, _)| bin as f64)
        .unwrap_or(0.0);

    ColorStats {
        dominant_hue,
        mean_saturation: saturation_sum / total,
        mean_value: value_sum / total,
    }
}

pub fn texture_stats(image: &DynamicImage) -> TextureStats {
    let gray = image.to_luma8();
    TextureStats {
        variance: gray_variance(&gray),
        edge_density: edge_density(&gray),
    }
}

pub fn disease_features(image: &DynamicImage) -> DiseaseFeatures {
    let rgb = image.to_rgb8();
    let gray = image.to_luma8();
    let total = (rgb.width() * rgb.height()).max(1) as f64;

    let mut yellow = 0u32;
    let mut brown = 0u32;
    let mut white = 0u32;
    let mut dark = 0u32;
    for pixel in rgb.pixels() {
        let (h, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);
        if (25.0..=35.0).contains(&h) && s > 50.0 {
            yellow += 1;
        }
        if (10.0..=20.0).contains(&h) && s > 50.0 {
            brown += 1;
        }
        if v > 200.0 {
            white += 1;
        }
        if v < 50.0 {
            dark += 1;
        }
    }

    let (spot_count, affected_pixels) = detect_spots(&gray);
    let variance = gray_variance(&gray);

    DiseaseFeatures {
        spot_count,
        avg_spot_area: affected_pixels as f64 / spot_count.max(1) as f64,
        affected_area_ratio: affected_pixels as f64 / total,
        yellow_ratio: yellow as f64 / total,
        brown_ratio: brown as f64 / total,
        white_ratio: white as f64 / total,
        dark_ratio: dark as f64 / total,
        texture_contrast: variance.sqrt(),
        edge_density: edge_density(&gray),
    }
}

/// Fraction of pixels matching an HSV predicate. Used by the visual
/// severity signal, which counts disease-colored pixels directly.
pub fn hsv_ratio(image: &DynamicImage, predicate: impl Fn(f64, f64, f64) -> bool) -> f64 {
    let rgb = image.to_rgb8();
    let total = (rgb.width() * rgb.height()).max(1) as f64;
    let matching = rgb
        .pixels()
        .filter(|p| {
            let (h, s, v) = rgb_to_hsv(p.0[0], p.0[1], p.0[2]);
            predicate(h, s, v)
        })
        .count();
    matching as f64 / total
}

/// Binarizes at the Otsu level and labels the dark connected components;
/// lesions read darker than healthy tissue.
fn detect_spots(gray: &GrayImage) -> (usize, u32) {
    let threshold = otsu_level(gray);
    let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] < threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    let labelled = connected_components(&mask, Connectivity::Four, Luma([0u8]));
    let mut areas: HashMap<u32, u32> = HashMap::new();
    for label in labelled.pixels() {
        if label.0[0] != 0 {
            *areas.entry(label.0[0]).or_insert(0) += 1;
        }
    }

    let mut count = 0usize;
    let mut affected = 0u32;
    for area in areas.values() {
        if *area >= MIN_SPOT_AREA {
            count += 1;
            affected += *area;
        }
    }
    (count, affected)
}

fn gray_variance(gray: &GrayImage) -> f64 {
    let total = (gray.width() * gray.height()).max(1) as f64;
    let mean = gray.pixels().map(|p| p.0[0] as f64).sum::<f64>() / total;
    gray.pixels()
        .map(|p| {
            let d = p.0[0] as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / total
}

fn edge_density(gray: &GrayImage) -> f64 {
    let gradients = sobel_gradients(gray);
    let total = (gradients.width() * gradients.height()).max(1) as f64;
    let edges = gradients
        .pixels()
        .filter(|p| p.0[0] > EDGE_THRESHOLD)
        .count();
    edges as f64 / total
}

/// RGB to HSV with hue on the OpenCV 0..180 scale and saturation/value
/// on 0..255.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue_degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue_degrees / 2.0, saturation * 255.0, max * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, image::Rgb([r, g, b])))
    }

    #[test]
    fn hsv_of_pure_colors() {
        let (h, s, v) = rgb_to_hsv(255, 0, 0);
        assert_eq!(h, 0.0);
        assert_eq!(s, 255.0);
        assert_eq!(v, 255.0);

        let (h, _, _) = rgb_to_hsv(0, 255, 0);
        assert_eq!(h, 60.0);

        let (h, _, _) = rgb_to_hsv(0, 0, 255);
        assert_eq!(h, 120.0);
    }

    #[test]
    fn color_stats_on_solid_green() {
        let stats = color_stats(&solid(0, 200, 0));
        assert_eq!(stats.dominant_hue, 60.0);
        assert!(stats.mean_saturation > 200.0);
    }

    #[test]
    fn uniform_frame_has_no_texture() {
        let stats = texture_stats(&solid(120, 120, 120));
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.edge_density, 0.0);
    }

    #[test]
    fn white_ratio_sees_bright_pixels() {
        let features = disease_features(&solid(230, 230, 230));
        assert_eq!(features.white_ratio, 1.0);
        assert_eq!(features.dark_ratio, 0.0);
    }

    #[test]
    fn dark_patch_is_detected_as_spot() {
        let mut img = RgbImage::from_pixel(64, 64, image::Rgb([200, 200, 200]));
        for y in 10..20 {
            for x in 10..20 {
                img.put_pixel(x, y, image::Rgb([20, 20, 20]));
            }
        }
        let features = disease_features(&DynamicImage::ImageRgb8(img));
        assert_eq!(features.spot_count, 1);
        assert!(features.affected_area_ratio > 0.0);
    }

    #[test]
    fn hsv_ratio_matches_predicate() {
        let ratio = hsv_ratio(&solid(230, 230, 230), |_, _, v| v > 180.0);
        assert_eq!(ratio, 1.0);
        let ratio = hsv_ratio(&solid(10, 10, 10), |_, _, v| v > 180.0);
        assert_eq!(ratio, 0.0);
    }
}
