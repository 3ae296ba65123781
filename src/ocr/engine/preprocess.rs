use image::{DynamicImage, GrayImage};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdMethod {
    /// Otsu level from the histogram; `base` is used when the page is a single
    /// intensity and Otsu has nothing to split.
    Otsu { base: u8 },
    Fixed(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    pub scale: f32,
    pub blur_sigma: Option<f32>,
    pub threshold: ThresholdMethod,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            scale: 1.75,
            blur_sigma: Some(1.1),
            threshold: ThresholdMethod::Otsu { base: 150 },
        }
    }
}

/// Grayscale, resize, optional blur, binarize. Output pixels are 0 or 255.
pub fn normalize_page(image: &DynamicImage, options: &NormalizeOptions) -> GrayImage {
    let luma = to_luma(image);
    let (width, height) = luma.dimensions();

    let resized = if (options.scale - 1.0).abs() > f32::EPSILON {
        image::imageops::resize(
            &luma,
            scaled(width, options.scale),
            scaled(height, options.scale),
            image::imageops::FilterType::Triangle,
        )
    } else {
        luma
    };

    let smoothed = match options.blur_sigma {
        Some(sigma) if sigma > 0.0 => gaussian_blur_f32(&resized, sigma),
        _ => resized,
    };

    let threshold = resolve_threshold(&smoothed, options.threshold);
    binarize(&smoothed, threshold)
}

/// Alpha is composited over white before the luma conversion.
pub fn to_luma(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut luma = GrayImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let r = (r as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        let g = (g as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        let b = (b as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        let value = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8;
        luma.put_pixel(x, y, image::Luma([value]));
    }
    luma
}

fn scaled(value: u32, scale: f32) -> u32 {
    ((value as f32 * scale) as u32).max(1)
}

fn resolve_threshold(image: &GrayImage, method: ThresholdMethod) -> u8 {
    match method {
        ThresholdMethod::Fixed(cutoff) => cutoff,
        ThresholdMethod::Otsu { base } => {
            let mut min = u8::MAX;
            let mut max = u8::MIN;
            for pixel in image.pixels() {
                min = min.min(pixel[0]);
                max = max.max(pixel[0]);
            }
            if max <= min {
                base
            } else {
                otsu_level(image)
            }
        }
    }
}

fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }
    output
}
