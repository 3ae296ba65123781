pub(crate) mod command;
mod pdf;

use image::DynamicImage;
use std::path::Path;
use tracing::info;

use crate::data::SourceKind;
use crate::error::ConversionError;

/// One rasterized page and its 1-based position in the source.
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub index: usize,
    pub image: DynamicImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    All,
    First,
}

/// Turns an image or PDF into raster pages, in page order.
pub fn load_pages(
    path: &Path,
    kind: SourceKind,
    selection: PageSelection,
    dpi: u32,
) -> Result<Vec<RasterPage>, ConversionError> {
    let images = match kind {
        SourceKind::Image => {
            let image = image::open(path).map_err(|err| ConversionError::Decode {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
            vec![image]
        }
        SourceKind::Pdf => pdf::render_pdf_pages(path, selection, dpi)?,
    };

    if images.is_empty() {
        return Err(ConversionError::NoPages(path.display().to_string()));
    }

    let pages: Vec<RasterPage> = images
        .into_iter()
        .enumerate()
        .map(|(idx, image)| RasterPage {
            index: idx + 1,
            image,
        })
        .collect();
    info!(pages = pages.len(), path = %path.display(), "source rasterized");
    Ok(pages)
}

/// Same as [`load_pages`] with the kind taken from the file extension.
pub fn load_pages_from_path(
    path: &Path,
    selection: PageSelection,
    dpi: u32,
) -> Result<Vec<RasterPage>, ConversionError> {
    let kind = SourceKind::from_path(path)?;
    load_pages(path, kind, selection, dpi)
}
