use image::GrayImage;
use imageproc::edges::canny;
use tracing::debug;

use crate::ocr::LayoutMode;

#[derive(Debug, Clone, PartialEq)]
pub struct ModeOptions {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Pages with more edge pixels than this are treated as tables.
    pub edge_threshold: usize,
}

impl Default for ModeOptions {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            edge_threshold: 5000,
        }
    }
}

/// Expects the un-resized, un-binarized grayscale page. Dense prose can be
/// reported as tabular; callers accept that.
pub fn select_layout_mode(gray: &GrayImage, options: &ModeOptions) -> LayoutMode {
    let edges = canny(gray, options.canny_low, options.canny_high);
    let edge_pixels = edges.pixels().filter(|pixel| pixel[0] > 0).count();
    let mode = if edge_pixels > options.edge_threshold {
        LayoutMode::Tabular
    } else {
        LayoutMode::FlowingText
    };
    debug!(edge_pixels, mode = mode.as_str(), "layout mode selected");
    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checkerboard(size: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn blank_page_is_flowing_text() {
        let blank = GrayImage::from_pixel(120, 120, Luma([255]));
        assert_eq!(
            select_layout_mode(&blank, &ModeOptions::default()),
            LayoutMode::FlowingText
        );
    }

    #[test]
    fn grid_page_is_tabular() {
        let options = ModeOptions {
            edge_threshold: 100,
            ..ModeOptions::default()
        };
        assert_eq!(
            select_layout_mode(&checkerboard(120, 10), &options),
            LayoutMode::Tabular
        );
    }

    #[test]
    fn tabular_and_text_use_different_modes() {
        assert_ne!(LayoutMode::Tabular.psm(), LayoutMode::FlowingText.psm());
    }
}
