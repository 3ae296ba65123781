use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod data;
pub mod document;
pub mod error;
pub mod font;
pub mod logging;
pub mod ocr;
pub mod pipeline;
pub mod server;
pub mod settings;
pub mod source;

#[cfg(test)]
mod test_util;

pub use document::{OutputDocument, OutputStore, RunStyle, StoredOutput};
pub use error::{ClassificationError, ConversionError, DocumentError, OcrError, PipelineError};
pub use font::{FontClassifier, FontDetection, FontLabel, LinearSvmModel};
pub use ocr::{LayoutMode, OcrEngine, RecognizedWord, TesseractEngine};
pub use pipeline::{BatchEntry, OcrOutcome, OcrPipeline, PipelineOptions};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub data: Option<String>,
    pub detect_font: bool,
    pub output_dir: Option<String>,
    pub font_model: Option<String>,
    pub settings_path: Option<String>,
    pub show_ocr_languages: bool,
    pub server: Option<String>,
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(dir) = config.output_dir.as_deref() {
        settings.server_output_dir = dir.to_string();
    }

    if config.show_ocr_languages {
        let languages = ocr::list_tesseract_languages()?;
        return Ok(languages.join("\n"));
    }

    let model_path = config
        .font_model
        .clone()
        .or_else(|| settings.font_model_path.clone());

    if let Some(addr) = config.server.clone() {
        let classifier = match model_path.as_deref() {
            Some(path) => Some(load_classifier(Path::new(path))?),
            None => None,
        };
        server::run_server(settings, addr, classifier).await?;
        return Ok(String::new());
    }

    let data = config
        .data
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("--data is required (or use --server / --show-ocr-languages)"))?;
    let path = PathBuf::from(data);
    if !path.exists() {
        return Err(anyhow!("input not found: {}", path.display()));
    }
    let engine = TesseractEngine::new(&settings.ocr_languages)?;

    if path.is_dir() {
        if config.detect_font {
            return Err(anyhow!("--detect-font needs a single file, not a directory"));
        }
        return tokio::task::spawn_blocking(move || ocr_directory(&path, &engine, &settings))
            .await
            .with_context(|| "batch ocr task failed")?;
    }

    if config.detect_font {
        let model_path = model_path.ok_or(ClassificationError::ModelMissing)?;
        let classifier = load_classifier(Path::new(&model_path))?;
        let detection = tokio::task::spawn_blocking(move || {
            font::detect_font_in_file(
                &path,
                &engine,
                classifier.as_ref(),
                settings.font_crop_size,
                settings.pdf_dpi,
            )
        })
        .await
        .with_context(|| "font detection task failed")??;
        return Ok(match detection.label() {
            Some(label) => label.name().to_string(),
            None => "no word detected".to_string(),
        });
    }

    tokio::task::spawn_blocking(move || ocr_file(&path, &engine, &settings))
        .await
        .with_context(|| "ocr task failed")?
}

/// Loads the font model once; the returned handle is shared read-only.
pub fn load_classifier(path: &Path) -> Result<Arc<dyn FontClassifier>> {
    let model = LinearSvmModel::load(path)?;
    Ok(Arc::new(model))
}

fn ocr_directory(dir: &Path, engine: &dyn OcrEngine, settings: &settings::Settings) -> Result<String> {
    let store = OutputStore::new(&settings.server_output_dir)?;
    let options = settings.pipeline_options();
    let entries = OcrPipeline::new(engine, &options).run_directory(dir, &store)?;
    Ok(format_batch(&entries))
}

fn format_batch(entries: &[BatchEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    let mut failed = 0;
    for entry in entries {
        let source = entry.source.display();
        match &entry.result {
            Ok(outcome) => lines.push(format!(
                "{} -> {} ({} page(s))",
                source,
                outcome.output.path.display(),
                outcome.pages
            )),
            Err(err) => {
                failed += 1;
                lines.push(format!("{} failed: {}", source, err));
            }
        }
    }
    lines.push(format!(
        "{} file(s) processed, {} failed",
        entries.len(),
        failed
    ));
    lines.join("\n")
}

fn ocr_file(path: &Path, engine: &dyn OcrEngine, settings: &settings::Settings) -> Result<String> {
    let store = OutputStore::new(&settings.server_output_dir)?;
    let options = settings.pipeline_options();
    let source_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    let outcome = OcrPipeline::new(engine, &options).run_file(path, source_name, &store)?;

    let bytes = std::fs::read(&outcome.output.path)
        .with_context(|| format!("failed to read {}", outcome.output.path.display()))?;
    let paragraphs = document::read_docx_paragraphs(&bytes)?;
    let mut output = format!("saved: {}\n", outcome.output.path.display());
    output.push_str(&paragraphs.join("\n"));
    Ok(output)
}
