use thiserror::Error;

/// The input could not be turned into raster pages.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("failed to decode image {path}: {message}")]
    Decode { path: String, message: String },
    #[error("failed to render pdf: {0}")]
    Render(String),
    #[error("no pages found in {0}")]
    NoPages(String),
    #[error("i/o error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to run tesseract (is it installed?): {0}")]
    Spawn(std::io::Error),
    #[error("tesseract failed: {0}")]
    Engine(String),
    #[error("ocr language(s) not available: {missing} (available: {available})")]
    Languages { missing: String, available: String },
    #[error("unusable ocr output: {0}")]
    Output(String),
    #[error("i/o error during ocr: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("font model is not loaded")]
    ModelMissing,
    #[error("failed to load font model {path}: {message}")]
    ModelLoad { path: String, message: String },
    #[error("feature vector has {actual} values, model expects {expected}")]
    FeatureLength { expected: usize, actual: usize },
    #[error("classifier returned unknown class index {0}")]
    UnknownClass(usize),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to write document xml: {0}")]
    Xml(String),
    #[error("failed to build document package: {0}")]
    Package(String),
    #[error("invalid output name: {0}")]
    InvalidName(String),
    #[error("i/o error while storing document: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that aborts a request. Partial output is discarded by the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Conversion(_) => "conversion",
            PipelineError::Ocr(_) => "ocr",
            PipelineError::Classification(_) => "classification",
            PipelineError::Document(_) => "document",
        }
    }
}
