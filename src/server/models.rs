use serde::{Deserialize, Serialize};

/// Uploaded file, base64 encoded, with its original name (used for the
/// extension check and the output name).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct UploadRequest {
    pub(crate) data_base64: Option<String>,
    pub(crate) data_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OcrResponse {
    pub(crate) id: String,
    pub(crate) file_name: String,
    pub(crate) download: String,
    pub(crate) pages: usize,
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetectResponse {
    pub(crate) detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) font: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    pub(crate) kind: String,
}
