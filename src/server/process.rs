use axum::http::StatusCode;
use tracing::{info, warn};

use crate::error::{ClassificationError, PipelineError};
use crate::font::{FontDetection, detect_font_in_file};
use crate::pipeline::OcrPipeline;

use super::models::{DetectResponse, OcrResponse};
use super::state::ServerState;
use super::util::{Upload, write_upload};

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "request",
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "request",
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::Conversion(_) => StatusCode::BAD_REQUEST,
            PipelineError::Classification(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Ocr(_) | PipelineError::Document(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub(crate) fn ocr_request(state: &ServerState, upload: Upload) -> Result<OcrResponse, ServerError> {
    let file = write_upload(&upload, &state.upload_dir)?;

    let pipeline = OcrPipeline::new(state.engine.as_ref(), &state.options);
    let outcome = pipeline
        .run_file(file.path(), &upload.name, &state.store)
        .map_err(|err| {
            warn!(source = %upload.name, error = %err, "ocr request failed");
            ServerError::from(err)
        })?;
    info!(source = %upload.name, output = %outcome.output.file_name, "ocr request served");

    Ok(OcrResponse {
        id: outcome.output.id.to_string(),
        download: format!("/download/{}", outcome.output.file_name),
        file_name: outcome.output.file_name,
        pages: outcome.pages,
        text: outcome.text,
    })
}

pub(crate) fn detect_request(
    state: &ServerState,
    upload: Upload,
) -> Result<DetectResponse, ServerError> {
    let Some(classifier) = state.classifier.as_deref() else {
        return Err(PipelineError::from(ClassificationError::ModelMissing).into());
    };
    let file = write_upload(&upload, &state.upload_dir)?;

    let detection = detect_font_in_file(
        file.path(),
        state.engine.as_ref(),
        classifier,
        state.font_crop_size,
        state.options.pdf_dpi,
    )?;
    Ok(match detection {
        FontDetection::Detected(label) => DetectResponse {
            detected: true,
            font: Some(label.name().to_string()),
        },
        FontDetection::Undetected => DetectResponse {
            detected: false,
            font: None,
        },
    })
}
