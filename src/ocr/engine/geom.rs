use crate::ocr::{BBoxPx, RecognizedWord};

/// Maps boxes found on a page resized by `scale` back to page pixels.
pub fn scale_words(words: Vec<RecognizedWord>, scale: f32) -> Vec<RecognizedWord> {
    if scale <= 0.0 || (scale - 1.0).abs() <= f32::EPSILON {
        return words;
    }
    words
        .into_iter()
        .map(|mut word| {
            word.bbox = scale_bbox(&word.bbox, scale);
            word
        })
        .collect()
}

fn scale_bbox(bbox: &BBoxPx, scale: f32) -> BBoxPx {
    let down = |value: u32| (value as f32 / scale).round() as u32;
    BBoxPx {
        x: down(bbox.x),
        y: down(bbox.y),
        w: down(bbox.w),
        h: down(bbox.h),
    }
}

/// Intersects a box with the page; `None` when nothing is left.
pub(crate) fn clamp_bbox(bbox: &BBoxPx, width: u32, height: u32) -> Option<BBoxPx> {
    if bbox.x >= width || bbox.y >= height {
        return None;
    }
    let w = bbox.w.min(width - bbox.x);
    let h = bbox.h.min(height - bbox.y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(BBoxPx {
        x: bbox.x,
        y: bbox.y,
        w,
        h,
    })
}
