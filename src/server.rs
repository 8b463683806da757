// 🌐 HTTP API - Extraction over axum
// Routes are built here so the binary and tests share them

use crate::aggregator::BatchReport;
use crate::classifier::PatternClassifier;
use crate::codes::{Category, ExtractionResult};
use crate::config::ExtractorConfig;
use crate::descriptions::DescriptionTable;
use crate::document::{AutoSource, RawDocument};
use crate::export::{encode, EXPORT_FILE_NAME, EXPORT_MIME_TYPE};
use crate::report::ReportView;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Uploads larger than this are rejected before decoding
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<DescriptionTable>,
    pub config: ExtractorConfig,
}

impl AppState {
    pub fn new(table: Arc<DescriptionTable>, config: ExtractorConfig) -> Self {
        AppState { table, config }
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// GET /api/describe/:code body; `category` is null for non-code tokens
#[derive(Debug, Clone, Serialize)]
pub struct CodeLookup {
    pub code: String,
    pub category: Option<Category>,
    pub description: String,
}

/// One named text document in a JSON request
#[derive(Debug, Clone, Deserialize)]
pub struct TextDocument {
    pub name: String,
    pub text: String,
}

/// POST /api/extract body
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRequest {
    pub documents: Vec<TextDocument>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/describe/:code - Description lookup
async fn describe_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let code = code.trim().to_string();
    let category = PatternClassifier::with_mode(state.config.boundary_mode)
        .categories_of(&code)
        .first()
        .copied();

    Json(ApiResponse::ok(CodeLookup {
        description: state.table.describe(&code).to_string(),
        code,
        category,
    }))
}

/// POST /api/extract - Classify already-decoded text documents
async fn extract_texts(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> impl IntoResponse {
    let report = run_texts(&state, &request);
    Json(ApiResponse::ok(ReportView::new(&report, &state.table)))
}

/// POST /api/export - Combined codes as a CSV attachment
async fn export_csv(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Response {
    let report = run_texts(&state, &request);
    csv_response(&report.combined)
}

/// POST /api/upload - Multipart files decoded by extension
async fn upload_documents(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut documents = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field
                    .file_name()
                    .or_else(|| field.name())
                    .unwrap_or("document")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => documents.push(RawDocument::new(name, bytes.to_vec())),
                    Err(e) => {
                        tracing::warn!(document = %name, "Failed to read upload bytes: {e}");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read {}: {}", name, e),
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed multipart request: {e}");
                return error_response(StatusCode::BAD_REQUEST, e.to_string());
            }
        }
    }

    if documents.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No files uploaded");
    }

    match state.config.aggregator().extract_documents(&AutoSource, &documents) {
        Ok(report) => Json(ApiResponse::ok(ReportView::new(&report, &state.table))).into_response(),
        Err(e) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Error processing files: {}", e),
        ),
    }
}

fn run_texts(state: &AppState, request: &ExtractRequest) -> BatchReport {
    let documents: Vec<(&str, &str)> = request
        .documents
        .iter()
        .map(|d| (d.name.as_str(), d.text.as_str()))
        .collect();

    state.config.aggregator().extract_texts(&documents)
}

fn csv_response(result: &ExtractionResult) -> Response {
    match encode(result) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, EXPORT_MIME_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode export: {e:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/describe/:code", get(describe_code))
        .route("/extract", post(extract_texts))
        .route("/export", post(export_csv))
        .route("/upload", post(upload_documents))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================
