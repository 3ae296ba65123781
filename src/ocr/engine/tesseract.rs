use image::GrayImage;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::ocr::{LayoutMode, OcrEngine, RecognizedWord};

use super::parse::parse_tsv_words;

pub fn list_tesseract_languages() -> Result<Vec<String>, OcrError> {
    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .map_err(OcrError::Spawn)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::Engine(format!(
            "tesseract --list-langs failed: {}",
            stderr.trim()
        )));
    }
    // Older builds print the list on stderr.
    let stdout = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).to_string()
    };
    let mut langs = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let value = line.trim();
        if !value.is_empty() {
            langs.push(value.to_string());
        }
    }
    Ok(langs)
}

/// Runs the `tesseract` binary once per page with a fixed language list.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    languages: String,
}

impl TesseractEngine {
    /// Checks the requested languages against the installed packs.
    pub fn new(languages: &str) -> Result<Self, OcrError> {
        let languages = match list_tesseract_languages() {
            Ok(available) => select_languages(languages, &available)?,
            Err(err) => {
                debug!(error = %err, "could not list tesseract languages");
                validate_requested(languages)?
            }
        };
        Ok(Self { languages })
    }

    /// Uses the language list as given, without asking tesseract.
    pub fn with_languages(languages: &str) -> Result<Self, OcrError> {
        Ok(Self {
            languages: validate_requested(languages)?,
        })
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }
}

impl OcrEngine for TesseractEngine {
    fn detect_words(
        &self,
        image: &GrayImage,
        mode: LayoutMode,
    ) -> Result<Vec<RecognizedWord>, OcrError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("khmer-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .map_err(|err| OcrError::Output(format!("failed to write temp image: {}", err)))?;
        tmp.flush()?;

        let tsv = run_tesseract_tsv(tmp.path(), &self.languages, mode.psm())?;
        let words = parse_tsv_words(&tsv)?;
        debug!(
            words = words.len(),
            psm = mode.psm(),
            languages = %self.languages,
            "tesseract finished"
        );
        Ok(words)
    }
}

fn validate_requested(requested: &str) -> Result<String, OcrError> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(OcrError::Languages {
            missing: "(none requested)".to_string(),
            available: String::new(),
        });
    }
    Ok(trimmed.to_string())
}

fn select_languages(requested: &str, available: &[String]) -> Result<String, OcrError> {
    let trimmed = validate_requested(requested)?;

    let mut chosen = Vec::new();
    let mut missing = Vec::new();
    for raw in trimmed.split(['+', ',', ' ']) {
        let lang = raw.trim();
        if lang.is_empty() {
            continue;
        }
        if available.iter().any(|value| value == lang) {
            chosen.push(lang.to_string());
        } else {
            missing.push(lang.to_string());
        }
    }

    if chosen.is_empty() || !missing.is_empty() {
        warn!(
            missing = %missing.join(", "),
            available = %available.join(", "),
            "ocr language(s) not available"
        );
        return Err(OcrError::Languages {
            missing: missing.join(", "),
            available: available.join(", "),
        });
    }

    Ok(chosen.join("+"))
}

fn run_tesseract_tsv(path: &Path, languages: &str, psm: u32) -> Result<String, OcrError> {
    let output = Command::new("tesseract")
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(languages)
        .arg("--psm")
        .arg(psm.to_string())
        .arg("tsv")
        .output()
        .map_err(OcrError::Spawn)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::Engine(stderr.trim().to_string()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed(langs: &[&str]) -> Vec<String> {
        langs.iter().map(|lang| lang.to_string()).collect()
    }

    #[test]
    fn keeps_available_languages_in_order() {
        let available = installed(&["eng", "khm", "osd"]);
        assert_eq!(select_languages("khm+eng", &available).unwrap(), "khm+eng");
        assert_eq!(select_languages("khm, eng", &available).unwrap(), "khm+eng");
    }

    #[test]
    fn missing_khmer_pack_is_an_error() {
        let available = installed(&["eng", "osd"]);
        let err = select_languages("khm+eng", &available).unwrap_err();
        match err {
            OcrError::Languages { missing, available } => {
                assert_eq!(missing, "khm");
                assert_eq!(available, "eng, osd");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(select_languages("khm, fra", &installed(&["khm"])).is_err());
    }

    #[test]
    fn fails_when_nothing_is_installed() {
        let available = installed(&["eng"]);
        let err = select_languages("khm", &available).unwrap_err();
        assert!(matches!(err, OcrError::Languages { .. }));
        assert!(err.to_string().contains("khm"));
    }

    #[test]
    fn empty_language_list_is_rejected() {
        assert!(TesseractEngine::with_languages("  ").is_err());
        let engine = TesseractEngine::with_languages(" khm+eng ").unwrap();
        assert_eq!(engine.languages(), "khm+eng");
    }
}
