use std::path::PathBuf;
use std::sync::Arc;

use crate::document::OutputStore;
use crate::font::FontClassifier;
use crate::ocr::OcrEngine;
use crate::pipeline::PipelineOptions;

/// Built once at start-up and shared read-only by every request.
pub(crate) struct ServerState {
    pub(crate) options: PipelineOptions,
    pub(crate) engine: Arc<dyn OcrEngine>,
    pub(crate) classifier: Option<Arc<dyn FontClassifier>>,
    pub(crate) store: OutputStore,
    pub(crate) upload_dir: PathBuf,
    pub(crate) font_crop_size: u32,
}
