use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::data::{DOCX_EXTENSION, sanitize_stem};
use crate::error::DocumentError;

use super::OutputDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOutput {
    pub id: Uuid,
    pub file_name: String,
    pub path: PathBuf,
}

/// Output directory where every saved document gets a name no other request
/// can produce.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serializes first, then writes through a temp file in the same
    /// directory, so a failed save never leaves a partial document behind.
    pub fn save(
        &self,
        document: &OutputDocument,
        source_name: &str,
    ) -> Result<StoredOutput, DocumentError> {
        let bytes = document.to_docx_bytes()?;
        let id = Uuid::new_v4();
        let file_name = format!("{}-{}.{}", sanitize_stem(source_name), id, DOCX_EXTENSION);
        let path = self.dir.join(&file_name);

        let mut tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|err| DocumentError::Io(err.error))?;

        info!(file = %file_name, paragraphs = document.paragraph_count(), "document stored");
        Ok(StoredOutput {
            id,
            file_name,
            path,
        })
    }

    /// Looks up a stored document by the file name returned from [`save`](Self::save).
    pub fn resolve(&self, file_name: &str) -> Result<Option<PathBuf>, DocumentError> {
        let candidate = Path::new(file_name);
        let plain = candidate.file_name().and_then(|name| name.to_str()) == Some(file_name);
        let is_docx = candidate
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(DOCX_EXTENSION))
            .unwrap_or(false);
        if !plain || !is_docx || file_name.starts_with('.') {
            return Err(DocumentError::InvalidName(file_name.to_string()));
        }
        let path = self.dir.join(file_name);
        Ok(path.is_file().then_some(path))
    }
}
