//! Image preparation for OCR
//!
//! Loads an image file, downscales it to a bounded size and applies the
//! contrast and sharpness enhancements that help the detector on scanned
//! pages with washed-out lettering.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ImageSettings;

/// Load an image file and prepare it for recognition
pub fn load_for_ocr(path: &Path, settings: &ImageSettings) -> Result<RgbImage> {
    info!("Loading image: {:?}", path);
    let img = image::open(path)
        .with_context(|| format!("Failed to load image: {:?}", path))?
        .to_rgb8();

    Ok(prepare(img, settings))
}

/// Downscale and enhance an RGB image
pub fn prepare(img: RgbImage, settings: &ImageSettings) -> RgbImage {
    let (width, height) = img.dimensions();
    debug!("Original: {}x{}", width, height);

    let mut img = downscale(img, settings.max_dimension);

    if (settings.contrast - 1.0).abs() > 0.01 {
        apply_contrast(&mut img, settings.contrast);
    }

    if (settings.sharpness - 1.0).abs() > 0.01 {
        img = apply_sharpness(&img, settings.sharpness);
    }

    debug!("Image optimization completed");
    img
}

/// Shrink so the longest side is at most `max_dimension`, keeping aspect ratio
fn downscale(img: RgbImage, max_dimension: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return img;
    }

    let ratio = (max_dimension as f32 / width as f32).min(max_dimension as f32 / height as f32);
    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    info!("Resized to: {}x{}", new_width, new_height);
    image::imageops::resize(&img, new_width, new_height, FilterType::Lanczos3)
}

/// Scale each channel's distance from the mean luminance by `factor`
fn apply_contrast(img: &mut RgbImage, factor: f32) {
    let pixel_count = (img.width() as u64 * img.height() as u64).max(1);
    let luminance_sum: f64 = img
        .pixels()
        .map(|p| luminance(p.0) as f64)
        .sum();
    let mean = (luminance_sum / pixel_count as f64 + 0.5).floor() as f32;

    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let val = pixel.0[c] as f32;
            pixel.0[c] = (mean + (val - mean) * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Blend away from a 3x3 smoothed copy; border pixels are left untouched
fn apply_sharpness(img: &RgbImage, factor: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    let mut result = img.clone();
    if w < 3 || h < 3 {
        return result;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            for c in 0..3 {
                let mut sum = 0.0;
                for dy in 0..3 {
                    for dx in 0..3 {
                        let weight = if dx == 1 && dy == 1 { 5.0 } else { 1.0 };
                        sum += weight * img.get_pixel(x + dx - 1, y + dy - 1).0[c] as f32;
                    }
                }
                let smooth = sum / 13.0;
                let original = img.get_pixel(x, y).0[c] as f32;
                let sharpened = smooth + (original - smooth) * factor;
                result.get_pixel_mut(x, y).0[c] = sharpened.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    result
}

fn luminance(rgb: [u8; 3]) -> f32 {
    0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_small_image_not_resized() {
        let img = RgbImage::new(640, 480);
        let out = downscale(img, 1200);
        assert_eq!(out.dimensions(), (640, 480));
    }

    #[test]
    fn test_large_image_keeps_aspect_ratio() {
        let img = RgbImage::new(2400, 1200);
        let out = downscale(img, 1200);
        assert_eq!(out.dimensions(), (1200, 600));

        let tall = RgbImage::new(300, 3000);
        let out = downscale(tall, 1200);
        assert_eq!(out.dimensions(), (120, 1200));
    }

    #[test]
    fn test_contrast_spreads_around_mean() {
        // Mean luminance of the two gray pixels is 128
        let mut img = RgbImage::from_raw(2, 1, vec![100, 100, 100, 156, 156, 156]).unwrap();
        apply_contrast(&mut img, 2.0);
        assert_eq!(img.get_pixel(0, 0), &Rgb([72, 72, 72]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([184, 184, 184]));
    }

    #[test]
    fn test_contrast_clamps() {
        let mut img = RgbImage::from_raw(2, 1, vec![0, 0, 0, 255, 255, 255]).unwrap();
        apply_contrast(&mut img, 3.0);
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_sharpness_flat_image_unchanged() {
        let img = RgbImage::from_pixel(5, 5, Rgb([90, 120, 200]));
        let out = apply_sharpness(&img, 1.4);
        assert_eq!(out, img);
    }

    #[test]
    fn test_sharpness_boosts_center_spike() {
        let mut img = RgbImage::from_pixel(3, 3, Rgb([100, 100, 100]));
        img.put_pixel(1, 1, Rgb([200, 200, 200]));
        let out = apply_sharpness(&img, 2.0);
        // smooth = (8*100 + 5*200) / 13 = 138.46; 138.46 + 61.54 * 2 = 261.5 -> 255
        assert_eq!(out.get_pixel(1, 1), &Rgb([255, 255, 255]));
        // borders untouched
        assert_eq!(out.get_pixel(0, 0), &Rgb([100, 100, 100]));
    }

    #[test]
    fn test_prepare_identity_settings() {
        let img = RgbImage::from_fn(4, 4, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 7]));
        let settings = ImageSettings {
            max_dimension: 1200,
            contrast: 1.0,
            sharpness: 1.0,
        };
        assert_eq!(prepare(img.clone(), &settings), img);
    }

    #[test]
    fn test_load_for_ocr_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbImage::from_pixel(8, 6, Rgb([10, 20, 30])).save(&path).unwrap();

        let img = load_for_ocr(&path, &ImageSettings::default()).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
    }

    #[test]
    fn test_load_for_ocr_missing_file() {
        let result = load_for_ocr(Path::new("/nonexistent/page.png"), &ImageSettings::default());
        assert!(result.is_err());
    }
}
