use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path as RoutePath, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::data::DOCX_MIME;
use crate::document::OutputStore;
use crate::font::FontClassifier;
use crate::ocr::TesseractEngine;
use crate::settings::Settings;

use super::models::{DetectResponse, ErrorResponse, OcrResponse, UploadRequest};
use super::process::{ServerError, detect_request, ocr_request};
use super::state::ServerState;
use super::util::{Upload, decode_upload, read_multipart_upload, request_body_limit};

type HandlerError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(
    settings: Settings,
    addr: String,
    classifier: Option<Arc<dyn FontClassifier>>,
) -> Result<()> {
    let engine = TesseractEngine::new(&settings.ocr_languages)?;
    let store = OutputStore::new(&settings.server_output_dir)?;
    let body_limit = request_body_limit(settings.server_max_upload_bytes);
    let state = Arc::new(ServerState {
        options: settings.pipeline_options(),
        engine: Arc::new(engine),
        classifier,
        store,
        upload_dir: PathBuf::from(&settings.server_upload_dir),
        font_crop_size: settings.font_crop_size,
    });
    let app = router(state, body_limit);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!(addr = %addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<ServerState>, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ocr", post(ocr))
        .route("/detect", post(detect))
        .route("/download/:file_name", get(download))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

fn error_response(err: ServerError) -> HandlerError {
    (
        err.status,
        Json(ErrorResponse {
            error: err.message,
            kind: err.kind.to_string(),
        }),
    )
}

/// Runs the synchronous pipeline off the async workers.
async fn run_blocking<T, F>(state: Arc<ServerState>, work: F) -> Result<T, HandlerError>
where
    T: Send + 'static,
    F: FnOnce(&ServerState) -> Result<T, ServerError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(state.as_ref()))
        .await
        .map_err(|err| error_response(ServerError::internal(format!("server task failed: {}", err))))?
        .map_err(error_response)
}

/// Accepts either a `multipart/form-data` body with a `file` part or a JSON
/// `{data_base64, data_name}` body.
async fn read_upload(state: &Arc<ServerState>, request: Request<Body>) -> Result<Upload, HandlerError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().starts_with("multipart/form-data"))
        .unwrap_or(false);
    let upload = if is_multipart {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|err| error_response(ServerError::bad_request(err.body_text())))?;
        read_multipart_upload(multipart).await
    } else {
        let Json(payload) = Json::<UploadRequest>::from_request(request, state)
            .await
            .map_err(|err| error_response(ServerError::bad_request(err.body_text())))?;
        decode_upload(payload)
    };
    upload.map_err(error_response)
}

async fn ocr(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Result<Json<OcrResponse>, HandlerError> {
    let upload = read_upload(&state, request).await?;
    run_blocking(state, move |state| ocr_request(state, upload))
        .await
        .map(Json)
}

async fn detect(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Result<Json<DetectResponse>, HandlerError> {
    let upload = read_upload(&state, request).await?;
    run_blocking(state, move |state| detect_request(state, upload))
        .await
        .map(Json)
}

async fn download(
    State(state): State<Arc<ServerState>>,
    RoutePath(file_name): RoutePath<String>,
) -> Result<Response<Body>, HandlerError> {
    let path = state
        .store
        .resolve(&file_name)
        .map_err(|err| error_response(ServerError::bad_request(err.to_string())))?
        .ok_or_else(|| error_response(ServerError::not_found(format!("{} not found", file_name))))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|err| error_response(ServerError::internal(err.to_string())))?;

    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DOCX_MIME));
    let disposition = format!("attachment; filename=\"{}\"", file_name);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}
