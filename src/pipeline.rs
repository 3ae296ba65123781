use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::data::SourceKind;
use crate::document::{OutputDocument, OutputStore, RunStyle, StoredOutput};
use crate::error::{ConversionError, OcrError, PipelineError};
use crate::ocr::{
    ModeOptions, NormalizeOptions, OcrEngine, assemble_text, normalize_page, scale_words,
    select_layout_mode, to_luma,
};
use crate::source::{PageSelection, RasterPage, load_pages};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub normalize: NormalizeOptions,
    pub mode: ModeOptions,
    pub style: RunStyle,
    pub page_separator: bool,
    pub pdf_dpi: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            mode: ModeOptions::default(),
            style: RunStyle::default(),
            page_separator: false,
            pdf_dpi: 200,
        }
    }
}

/// Result of a stored OCR run.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    pub output: StoredOutput,
    pub pages: usize,
    pub text: String,
}

/// Outcome of one input file of a directory run.
#[derive(Debug)]
pub struct BatchEntry {
    pub source: PathBuf,
    pub result: Result<OcrOutcome, PipelineError>,
}

/// Sequential page pipeline: normalize, pick a layout mode, OCR, assemble.
pub struct OcrPipeline<'a> {
    engine: &'a dyn OcrEngine,
    options: &'a PipelineOptions,
}

impl<'a> OcrPipeline<'a> {
    pub fn new(engine: &'a dyn OcrEngine, options: &'a PipelineOptions) -> Self {
        Self { engine, options }
    }

    /// Recognized text of one page, ready to become a paragraph.
    #[instrument(level = "debug", skip_all, fields(page = page.index))]
    pub fn process_page(&self, page: &RasterPage) -> Result<String, OcrError> {
        let gray = to_luma(&page.image);
        let mode = select_layout_mode(&gray, &self.options.mode);
        let normalized = normalize_page(&page.image, &self.options.normalize);

        let words = self.engine.detect_words(&normalized, mode)?;
        let words = scale_words(words, self.options.normalize.scale);
        let text = assemble_text(&words);
        debug!(
            words = words.len(),
            chars = text.chars().count(),
            mode = mode.as_str(),
            "page recognized"
        );
        Ok(text)
    }

    /// One paragraph per page, in page order. The first failing page aborts
    /// the whole document.
    pub fn process_pages<I>(&self, pages: I) -> Result<OutputDocument, PipelineError>
    where
        I: IntoIterator<Item = RasterPage>,
    {
        let mut document = OutputDocument::new(self.options.style.clone());
        for (position, page) in pages.into_iter().enumerate() {
            if position > 0 && self.options.page_separator {
                document.push_separator();
            }
            let text = self.process_page(&page)?;
            document.push_page_text(text);
        }
        Ok(document)
    }

    pub fn process_file(&self, path: &Path) -> Result<OutputDocument, PipelineError> {
        let kind = SourceKind::from_path(path)?;
        let pages = load_pages(path, kind, PageSelection::All, self.options.pdf_dpi)?;
        self.process_pages(pages)
    }

    /// OCRs `path` and stores the document under a fresh name. Nothing is
    /// written unless every page succeeded.
    pub fn run_file(
        &self,
        path: &Path,
        source_name: &str,
        store: &OutputStore,
    ) -> Result<OcrOutcome, PipelineError> {
        let document = self.process_file(path)?;
        self.store_document(document, source_name, store)
    }

    /// Same as [`run_file`](Self::run_file) for pages that are already rasterized.
    pub fn run_pages<I>(
        &self,
        pages: I,
        source_name: &str,
        store: &OutputStore,
    ) -> Result<OcrOutcome, PipelineError>
    where
        I: IntoIterator<Item = RasterPage>,
    {
        let document = self.process_pages(pages)?;
        self.store_document(document, source_name, store)
    }

    /// One document per supported file directly inside `dir`, in file-name
    /// order. A failing file does not stop the others; other entries are
    /// skipped.
    pub fn run_directory(
        &self,
        dir: &Path,
        store: &OutputStore,
    ) -> Result<Vec<BatchEntry>, PipelineError> {
        let mut inputs = Vec::new();
        for entry in fs::read_dir(dir).map_err(ConversionError::from)? {
            let path = entry.map_err(ConversionError::from)?.path();
            if path.is_file() && SourceKind::from_path(&path).is_ok() {
                inputs.push(path);
            } else {
                debug!(path = %path.display(), "skipped");
            }
        }
        inputs.sort();
        info!(dir = %dir.display(), files = inputs.len(), "batch started");

        let entries = inputs
            .into_iter()
            .map(|source| {
                let name = source
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("document")
                    .to_string();
                let result = self.run_file(&source, &name, store);
                if let Err(err) = &result {
                    warn!(source = %name, error = %err, "batch entry failed");
                }
                BatchEntry { source, result }
            })
            .collect();
        Ok(entries)
    }

    fn store_document(
        &self,
        document: OutputDocument,
        source_name: &str,
        store: &OutputStore,
    ) -> Result<OcrOutcome, PipelineError> {
        let output = store.save(&document, source_name)?;
        info!(
            source = %source_name,
            pages = document.paragraph_count(),
            output = %output.file_name,
            "ocr finished"
        );
        Ok(OcrOutcome {
            pages: document.paragraph_count(),
            text: document.plain_text(),
            output,
        })
    }
}
