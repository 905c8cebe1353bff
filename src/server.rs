//! HTTP surface: `POST /extract` and `GET /health`.
//!
//! The handler is the single boundary where every failure is turned into a
//! response. Each error variant maps to one intentional status:
//!
//! | Failure | Status | Body |
//! |---------|--------|------|
//! | no `file` field / not multipart | 400 | `{"error": "No file uploaded"}` |
//! | malformed multipart stream | 400 | `{"error": "Malformed multipart body"}` |
//! | upload over `max_upload_bytes` | 413 | `{"error": "File too large"}` |
//! | parse / render / OCR failure, blank text | 400 | `{"error": "Could not extract text"}` |
//! | pdfium unavailable, worker panic | 500 | `{"error": "Text extraction engine unavailable"}` |
//! | model call failed | 502 | `{"error": "Model request failed"}` |
//!
//! The specific cause behind a 400 "Could not extract text" is only in the logs.

use crate::config::{CorsPolicy, HttpConfig};
use crate::error::{ExtractError, ModelError};
use crate::extract::TextExtractor;
use crate::pipeline::llm::{request_structured_data, StructuredDataModel};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Name of the multipart field carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// Shared per-process state: the two pipeline components.
///
/// Constructed once at startup from explicit configuration; handlers only
/// read it.
#[derive(Clone)]
pub struct AppState {
    extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn StructuredDataModel>,
}

impl AppState {
    pub fn new(extractor: Arc<dyn TextExtractor>, model: Arc<dyn StructuredDataModel>) -> Self {
        Self { extractor, model }
    }
}

/// Failures of a single `/extract` request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no '{FILE_FIELD}' field in the request")]
    MissingFile,

    #[error("unreadable multipart body: {detail}")]
    InvalidUpload { status: StatusCode, detail: String },

    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("document yielded no text")]
    EmptyText,

    #[error("model request failed: {0}")]
    Model(#[from] ModelError),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidUpload {
            status: e.status(),
            detail: e.body_text(),
        }
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "No file uploaded"),
            ApiError::InvalidUpload { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large")
            }
            ApiError::InvalidUpload { .. } => (StatusCode::BAD_REQUEST, "Malformed multipart body"),
            ApiError::Extraction(e) if e.is_server_fault() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Text extraction engine unavailable",
            ),
            ApiError::Extraction(_) | ApiError::EmptyText => {
                (StatusCode::BAD_REQUEST, "Could not extract text")
            }
            ApiError::Model(_) => (StatusCode::BAD_GATEWAY, "Model request failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("{} → {}", self, status);
        } else {
            warn!("{} → {}", self, status);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the application router with CORS, tracing and upload-size layers.
pub fn router(state: AppState, http: &HttpConfig) -> Router {
    Router::new()
        .route("/extract", post(extract))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(http.max_upload_bytes))
        .layer(cors_layer(http))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Translate the configured [`CorsPolicy`] into a tower-http layer.
pub fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    match http.cors_policy() {
        CorsPolicy::AnyOrigin => {
            info!("CORS: any origin allowed");
            base.allow_origin(Any)
        }
        CorsPolicy::AllowList(origins) => {
            if origins.is_empty() {
                warn!("CORS: no origins configured, cross-origin requests will be refused");
            }
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("CORS: ignoring invalid origin '{}'", origin);
                        None
                    }
                })
                .collect();
            info!("CORS: {} allowed origin(s)", values.len());
            base.allow_origin(values)
        }
    }
}

/// `POST /extract`: PDF upload in, model JSON out.
async fn extract(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // A body that is not multipart has no file field either.
    let mut multipart = multipart.map_err(|_| ApiError::MissingFile)?;
    let bytes = read_file_field(&mut multipart).await?;
    info!("Received upload: {} bytes", bytes.len());

    let text = state.extractor.extract(bytes).await?;
    if text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }

    let content = request_structured_data(state.model.as_ref(), &text).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        content,
    )
        .into_response())
}

/// Find the `file` field and read its bytes, skipping any other fields.
async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field.bytes().await?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::MissingFile)
}

/// `GET /health`: liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;

    #[test]
    fn extraction_failures_collapse_to_one_client_message() {
        let parse = ApiError::Extraction(ExtractError::DocumentParse {
            detail: "bad xref".into(),
        });
        let ocr = ApiError::Extraction(ExtractError::Ocr {
            page: 1,
            source: OcrError::Recognize("boom".into()),
        });
        for e in [parse, ocr, ApiError::EmptyText] {
            assert_eq!(
                e.status_and_message(),
                (StatusCode::BAD_REQUEST, "Could not extract text")
            );
        }
    }

    #[test]
    fn engine_and_model_failures_are_server_side() {
        let engine = ApiError::Extraction(ExtractError::EngineUnavailable("dlopen".into()));
        assert_eq!(engine.status_and_message().0, StatusCode::INTERNAL_SERVER_ERROR);

        let model = ApiError::Model(ModelError::Request {
            message: "timeout".into(),
        });
        assert_eq!(model.status_and_message().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn oversized_upload_keeps_413() {
        let e = ApiError::InvalidUpload {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            detail: "length limit exceeded".into(),
        };
        assert_eq!(
            e.status_and_message(),
            (StatusCode::PAYLOAD_TOO_LARGE, "File too large")
        );
    }

    #[test]
    fn missing_file_message() {
        assert_eq!(
            ApiError::MissingFile.status_and_message(),
            (StatusCode::BAD_REQUEST, "No file uploaded")
        );
    }
}
