use image::{DynamicImage, imageops::FilterType};

use crate::ocr::{BBoxPx, clamp_bbox, to_luma};

/// Cuts the word box out of the page; `None` if the box misses the page.
pub(crate) fn crop_word(page: &DynamicImage, bbox: &BBoxPx) -> Option<DynamicImage> {
    let bbox = clamp_bbox(bbox, page.width(), page.height())?;
    Some(page.crop_imm(bbox.x, bbox.y, bbox.w, bbox.h))
}

/// Grayscale, `size`×`size`, scaled to `[0, 1]`, flattened row by row.
pub fn word_features(crop: &DynamicImage, size: u32) -> Vec<f32> {
    let luma = to_luma(crop);
    let resized = image::imageops::resize(&luma, size, size, FilterType::Triangle);
    resized
        .pixels()
        .map(|pixel| pixel[0] as f32 / 255.0)
        .collect()
}
