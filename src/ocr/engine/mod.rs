mod geom;
mod mode;
mod parse;
mod preprocess;
mod tesseract;
mod text;

pub(crate) use geom::clamp_bbox;
pub use geom::scale_words;
pub use mode::{ModeOptions, select_layout_mode};
pub use preprocess::{NormalizeOptions, ThresholdMethod, normalize_page, to_luma};
pub use tesseract::{TesseractEngine, list_tesseract_languages};
pub use text::assemble_text;
