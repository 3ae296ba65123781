use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::RunStyle;
use crate::ocr::{ModeOptions, NormalizeOptions, ThresholdMethod};
use crate::pipeline::PipelineOptions;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub ocr_languages: String,
    pub ocr_scale: f32,
    pub ocr_blur: bool,
    pub ocr_blur_sigma: f32,
    pub ocr_otsu: bool,
    pub ocr_base_threshold: u8,
    pub ocr_edge_threshold: usize,
    pub ocr_canny_low: f32,
    pub ocr_canny_high: f32,
    pub pdf_dpi: u32,
    pub document_font_name: String,
    pub document_font_size: f32,
    pub document_font_color: String,
    pub document_page_separator: bool,
    pub font_model_path: Option<String>,
    pub font_crop_size: u32,
    pub server_upload_dir: String,
    pub server_output_dir: String,
    pub server_max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr_languages: "khm+eng".to_string(),
            ocr_scale: 1.75,
            ocr_blur: true,
            ocr_blur_sigma: 1.1,
            ocr_otsu: true,
            ocr_base_threshold: 150,
            ocr_edge_threshold: 5000,
            ocr_canny_low: 50.0,
            ocr_canny_high: 150.0,
            pdf_dpi: 200,
            document_font_name: "Khmer OS Battambang".to_string(),
            document_font_size: 12.0,
            document_font_color: "000000".to_string(),
            document_page_separator: false,
            font_model_path: None,
            font_crop_size: 64,
            server_upload_dir: "uploads".to_string(),
            server_output_dir: "document_output".to_string(),
            server_max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    ocr: Option<OcrSettings>,
    document: Option<DocumentSettings>,
    font: Option<FontSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    languages: Option<String>,
    scale: Option<f32>,
    blur: Option<bool>,
    blur_sigma: Option<f32>,
    otsu: Option<bool>,
    base_threshold: Option<u8>,
    edge_threshold: Option<usize>,
    canny_low: Option<f32>,
    canny_high: Option<f32>,
    pdf_dpi: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentSettings {
    font_name: Option<String>,
    font_size: Option<f32>,
    font_color: Option<String>,
    page_separator: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    model_path: Option<String>,
    crop_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    upload_dir: Option<String>,
    output_dir: Option<String>,
    max_upload_bytes: Option<usize>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings.merge_str(DEFAULT_SETTINGS_TOML, "embedded settings.toml")?;
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge_str(&content, &path.display().to_string())?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            scale: self.ocr_scale,
            blur_sigma: self.ocr_blur.then_some(self.ocr_blur_sigma),
            threshold: if self.ocr_otsu {
                ThresholdMethod::Otsu {
                    base: self.ocr_base_threshold,
                }
            } else {
                ThresholdMethod::Fixed(self.ocr_base_threshold)
            },
        }
    }

    pub fn mode_options(&self) -> ModeOptions {
        ModeOptions {
            canny_low: self.ocr_canny_low,
            canny_high: self.ocr_canny_high,
            edge_threshold: self.ocr_edge_threshold,
        }
    }

    pub fn run_style(&self) -> RunStyle {
        RunStyle {
            font_name: self.document_font_name.clone(),
            size_pt: self.document_font_size,
            color: self.document_font_color.clone(),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            normalize: self.normalize_options(),
            mode: self.mode_options(),
            style: self.run_style(),
            page_separator: self.document_page_separator,
            pdf_dpi: self.pdf_dpi,
        }
    }

    fn merge_str(&mut self, content: &str, origin: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)
            .with_context(|| format!("failed to parse settings: {}", origin))?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr_languages = languages;
                }
            }
            if let Some(scale) = ocr.scale {
                if scale > 0.0 {
                    self.ocr_scale = scale;
                }
            }
            if let Some(blur) = ocr.blur {
                self.ocr_blur = blur;
            }
            if let Some(sigma) = ocr.blur_sigma {
                if sigma > 0.0 {
                    self.ocr_blur_sigma = sigma;
                }
            }
            if let Some(otsu) = ocr.otsu {
                self.ocr_otsu = otsu;
            }
            if let Some(threshold) = ocr.base_threshold {
                self.ocr_base_threshold = threshold;
            }
            if let Some(threshold) = ocr.edge_threshold {
                self.ocr_edge_threshold = threshold;
            }
            if let Some(low) = ocr.canny_low {
                self.ocr_canny_low = low;
            }
            if let Some(high) = ocr.canny_high {
                self.ocr_canny_high = high;
            }
            if let Some(dpi) = ocr.pdf_dpi {
                if dpi > 0 {
                    self.pdf_dpi = dpi;
                }
            }
        }
        if let Some(document) = incoming.document {
            if let Some(name) = document.font_name {
                if !name.trim().is_empty() {
                    self.document_font_name = name;
                }
            }
            if let Some(size) = document.font_size {
                if size > 0.0 {
                    self.document_font_size = size;
                }
            }
            if let Some(color) = document.font_color {
                let color = color.trim().trim_start_matches('#');
                if !color.is_empty() {
                    self.document_font_color = color.to_string();
                }
            }
            if let Some(separator) = document.page_separator {
                self.document_page_separator = separator;
            }
        }
        if let Some(font) = incoming.font {
            if let Some(path) = font.model_path {
                if !path.trim().is_empty() {
                    self.font_model_path = Some(path);
                }
            }
            if let Some(size) = font.crop_size {
                if size > 0 {
                    self.font_crop_size = size;
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(dir) = server.upload_dir {
                if !dir.trim().is_empty() {
                    self.server_upload_dir = dir;
                }
            }
            if let Some(dir) = server.output_dir {
                if !dir.trim().is_empty() {
                    self.server_output_dir = dir;
                }
            }
            if let Some(limit) = server.max_upload_bytes {
                if limit > 0 {
                    self.server_max_upload_bytes = limit;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".khmer-ocr-rust"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn embedded_defaults_match_struct_defaults() {
        let mut settings = Settings::default();
        settings
            .merge_str(DEFAULT_SETTINGS_TOML, "embedded")
            .expect("parse defaults");
        assert_eq!(settings.ocr_languages, "khm+eng");
        assert_eq!(settings.ocr_scale, 1.75);
        assert_eq!(settings.ocr_base_threshold, 150);
        assert_eq!(settings.ocr_edge_threshold, 5000);
        assert_eq!(settings.document_font_name, "Khmer OS Battambang");
        assert_eq!(settings.font_crop_size, 64);
        assert!(settings.font_model_path.is_none());
    }

    #[test]
    fn later_files_override_fields() {
        with_temp_home(|home| {
            let extra = home.join("extra.toml");
            fs::write(
                &extra,
                "[ocr]\nscale = 2.0\nblur = false\n\n[document]\nfont_color = \"#112233\"\npage_separator = true\n",
            )
            .expect("write extra");

            let settings = load_settings(Some(&extra)).expect("load settings");
            assert_eq!(settings.ocr_scale, 2.0);
            assert!(!settings.ocr_blur);
            assert_eq!(settings.document_font_color, "112233");
            assert!(settings.document_page_separator);
            assert_eq!(settings.ocr_languages, "khm+eng");

            let options = settings.normalize_options();
            assert!(options.blur_sigma.is_none());
            assert!(home.join(".khmer-ocr-rust").join("settings.toml").exists());
        });
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        with_temp_home(|home| {
            let missing = home.join("nope.toml");
            assert!(load_settings(Some(&missing)).is_err());
        });
    }
}
