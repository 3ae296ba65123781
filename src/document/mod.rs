mod docx;
mod store;

pub use docx::{read_docx_paragraphs, write_docx};
pub use store::{OutputStore, StoredOutput};

use crate::error::DocumentError;

#[derive(Debug, Clone, PartialEq)]
pub struct RunStyle {
    pub font_name: String,
    pub size_pt: f32,
    /// Hex RGB without `#`.
    pub color: String,
}

impl Default for RunStyle {
    fn default() -> Self {
        Self {
            font_name: "Khmer OS Battambang".to_string(),
            size_pt: 12.0,
            color: "000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph { text: String, style: RunStyle },
    Separator,
}

/// In-memory document; paragraphs are kept in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    style: RunStyle,
    blocks: Vec<Block>,
}

impl OutputDocument {
    pub fn new(style: RunStyle) -> Self {
        Self {
            style,
            blocks: Vec::new(),
        }
    }

    pub fn push_page_text(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph {
            text: text.into(),
            style: self.style.clone(),
        });
    }

    /// Blank paragraph between pages; not counted as content.
    pub fn push_separator(&mut self) {
        self.blocks.push(Block::Separator);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph { text, .. } => Some(text.as_str()),
            Block::Separator => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs().collect::<Vec<_>>().join("\n")
    }

    pub fn to_docx_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        write_docx(self)
    }
}
