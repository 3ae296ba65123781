//! Font detection on the first recognized word of a source.
//!
//! The classifier itself is an opaque collaborator behind [`FontClassifier`];
//! this module only prepares its single input vector and maps the class index
//! it returns to a [`FontLabel`].

mod features;
mod svm;

use std::path::Path;
use tracing::{debug, info};

use crate::error::{ClassificationError, PipelineError};
use crate::ocr::{LayoutMode, OcrEngine, to_luma};
use crate::source::{PageSelection, RasterPage, load_pages_from_path};

pub use features::word_features;
pub use svm::LinearSvmModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FontLabel {
    KhmerOs,
    KhmerOsBattambang,
    KhmerOsSiemreap,
}

impl FontLabel {
    pub const ALL: [FontLabel; 3] = [
        FontLabel::KhmerOs,
        FontLabel::KhmerOsBattambang,
        FontLabel::KhmerOsSiemreap,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            FontLabel::KhmerOs => "Khmer OS",
            FontLabel::KhmerOsBattambang => "Khmer OS Battambang",
            FontLabel::KhmerOsSiemreap => "Khmer OS Siemreap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontDetection {
    Detected(FontLabel),
    /// No word was found to classify.
    Undetected,
}

impl FontDetection {
    pub fn label(&self) -> Option<FontLabel> {
        match self {
            FontDetection::Detected(label) => Some(*label),
            FontDetection::Undetected => None,
        }
    }
}

/// "Classify font" capability: one feature vector in, one class index out.
pub trait FontClassifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<usize, ClassificationError>;
}

/// Classifies the font of the first non-empty word the engine reports on `page`.
pub fn detect_font(
    page: &RasterPage,
    engine: &dyn OcrEngine,
    classifier: &dyn FontClassifier,
    crop_size: u32,
) -> Result<FontDetection, PipelineError> {
    let gray = to_luma(&page.image);
    let words = engine.detect_words(&gray, LayoutMode::UniformBlock)?;
    let Some(first) = words.iter().find(|word| !word.text.trim().is_empty()) else {
        debug!(page = page.index, "no word to classify");
        return Ok(FontDetection::Undetected);
    };
    let Some(crop) = features::crop_word(&page.image, &first.bbox) else {
        debug!(page = page.index, bbox = ?first.bbox, "first word box is off the page");
        return Ok(FontDetection::Undetected);
    };

    let vector = word_features(&crop, crop_size);
    let index = classifier.predict(&vector)?;
    let label = FontLabel::from_index(index).ok_or(ClassificationError::UnknownClass(index))?;
    info!(word = %first.text.trim(), font = label.name(), "font detected");
    Ok(FontDetection::Detected(label))
}

/// Rasterizes only the first page of `path` and runs [`detect_font`] on it.
pub fn detect_font_in_file(
    path: &Path,
    engine: &dyn OcrEngine,
    classifier: &dyn FontClassifier,
    crop_size: u32,
    pdf_dpi: u32,
) -> Result<FontDetection, PipelineError> {
    let pages = load_pages_from_path(path, PageSelection::First, pdf_dpi)?;
    match pages.first() {
        Some(page) => detect_font(page, engine, classifier, crop_size),
        None => Ok(FontDetection::Undetected),
    }
}
