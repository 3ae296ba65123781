use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;
use tracing::debug;

use crate::error::ConversionError;

use super::PageSelection;
use super::command::PdfRenderer;

/// Rasterizes a PDF with mutool (preferred) or pdftoppm and returns the
/// rendered pages as decoded images, in page order.
pub(super) fn render_pdf_pages(
    pdf_path: &Path,
    selection: PageSelection,
    dpi: u32,
) -> Result<Vec<image::DynamicImage>, ConversionError> {
    let dir = tempdir()?;
    let dpi = dpi.to_string();

    let Some((renderer, program)) = PdfRenderer::detect() else {
        return Err(ConversionError::Render(
            "pdf rendering requires mutool or pdftoppm (install mupdf or poppler)".to_string(),
        ));
    };
    let mut command = Command::new(&program);
    match renderer {
        PdfRenderer::Mutool => {
            command
                .arg("draw")
                .arg("-q")
                .arg("-r")
                .arg(&dpi)
                .arg("-o")
                .arg(dir.path().join("page-%04d.png"))
                .arg(pdf_path);
            if selection == PageSelection::First {
                command.arg("1");
            }
        }
        PdfRenderer::Pdftoppm => {
            command.arg("-png").arg("-r").arg(&dpi);
            if selection == PageSelection::First {
                command.arg("-f").arg("1").arg("-l").arg("1");
            }
            command.arg(pdf_path).arg(dir.path().join("page"));
        }
    }
    run_renderer(renderer.program(), &mut command)?;

    let paths = rendered_page_paths(dir.path())?;
    debug!(pages = paths.len(), path = %pdf_path.display(), "pdf rendered");

    let mut pages = Vec::with_capacity(paths.len());
    for path in paths {
        let image = image::open(&path).map_err(|err| ConversionError::Decode {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        pages.push(image);
    }
    Ok(pages)
}

fn run_renderer(name: &str, command: &mut Command) -> Result<(), ConversionError> {
    let output = command
        .output()
        .map_err(|err| ConversionError::Render(format!("failed to run {}: {}", name, err)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConversionError::Render(format!(
            "{} failed: {}",
            name,
            stderr.trim()
        )));
    }
    Ok(())
}

fn rendered_page_paths(dir: &Path) -> Result<Vec<PathBuf>, ConversionError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("page"))
                .unwrap_or(false)
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
        })
        .collect();
    // Both renderers zero-pad page numbers, so name order is page order.
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::pdf::{pdf_with_bars, renderer_installed};

    fn dark_pixels(image: &image::DynamicImage) -> usize {
        image.to_luma8().pixels().filter(|pixel| pixel[0] < 128).count()
    }

    #[test]
    fn renders_every_page_in_order() {
        if !renderer_installed() {
            return;
        }
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("three.pdf");
        fs::write(&path, pdf_with_bars(&[20, 40, 60])).expect("write pdf");

        let pages = render_pdf_pages(&path, PageSelection::All, 72).expect("render");
        assert_eq!(pages.len(), 3);
        let ink: Vec<usize> = pages.iter().map(dark_pixels).collect();
        assert!(ink[0] > 0 && ink[0] < ink[1] && ink[1] < ink[2], "ink per page: {ink:?}");
    }

    #[test]
    fn first_selection_renders_one_page() {
        if !renderer_installed() {
            return;
        }
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("three.pdf");
        fs::write(&path, pdf_with_bars(&[60, 20, 40])).expect("write pdf");

        let all = render_pdf_pages(&path, PageSelection::All, 72).expect("render all");
        let first = render_pdf_pages(&path, PageSelection::First, 72).expect("render first");
        assert_eq!(first.len(), 1);
        assert_eq!(dark_pixels(&first[0]), dark_pixels(&all[0]));
    }

    #[test]
    fn rendered_pages_are_sorted_and_filtered() {
        let dir = tempdir().expect("tempdir");
        for name in ["page-0002.png", "page-0010.png", "page-0001.png", "input.pdf", "page.txt"] {
            fs::write(dir.path().join(name), b"x").expect("write");
        }
        let paths = rendered_page_paths(dir.path()).expect("list pages");
        let names: Vec<_> = paths
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();
        assert_eq!(names, vec!["page-0001.png", "page-0002.png", "page-0010.png"]);
    }
}
