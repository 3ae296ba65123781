mod engine;

use image::GrayImage;

use crate::error::OcrError;

pub(crate) use engine::clamp_bbox;
pub use engine::{
    ModeOptions, NormalizeOptions, TesseractEngine, ThresholdMethod, assemble_text,
    list_tesseract_languages, normalize_page, scale_words, select_layout_mode, to_luma,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BBoxPx {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecognizedWord {
    pub text: String,
    /// 0-100; Tesseract reports -1 for rows that carry no recognized word.
    pub confidence: f32,
    pub bbox: BBoxPx,
}

/// Page segmentation mode handed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    FlowingText,
    Tabular,
    UniformBlock,
}

impl LayoutMode {
    pub fn psm(&self) -> u32 {
        match self {
            LayoutMode::FlowingText => 3,
            LayoutMode::Tabular => 4,
            LayoutMode::UniformBlock => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::FlowingText => "flowing-text",
            LayoutMode::Tabular => "tabular",
            LayoutMode::UniformBlock => "uniform-block",
        }
    }
}

/// "Detect text" capability. Implementations block until the engine answers.
pub trait OcrEngine: Send + Sync {
    fn detect_words(
        &self,
        image: &GrayImage,
        mode: LayoutMode,
    ) -> Result<Vec<RecognizedWord>, OcrError>;
}
