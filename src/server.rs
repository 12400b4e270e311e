//! HTTP surface for the extraction pipeline.

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::narrative::narrative_for;
use crate::pipeline::IncidentExtractor;
use crate::record::IncidentRecord;

/// Dashcam stills are a few MB; leave room for full-resolution photos.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<IncidentExtractor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
struct ExtractQuery {
    narrative: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub record: IncidentRecord,
    pub narrative: Option<&'static str>,
}

/// Upload an image and extract the incident record.
async fn extract_image(
    State(state): State<AppState>,
    Query(query): Query<ExtractQuery>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, (StatusCode, String)> {
    let mut filename = String::new();
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = upload_name(field.file_name());
            file_data = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e)))?
                .to_vec();
            break;
        }
    }

    if file_data.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }

    info!("Received image: {} ({} bytes)", filename, file_data.len());

    let record = extract_upload(&state.extractor, &filename, &file_data)
        .await
        .map_err(|e| {
            error!("Extraction failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Extraction failed: {}", e))
        })?;

    let narrative = if query.narrative.unwrap_or(false) {
        record.incident_type.map(narrative_for)
    } else {
        None
    };

    Ok(Json(ExtractResponse { record, narrative }))
}

/// Final path component of the client's file name. The timestamp cascade
/// reads the name, so it is kept when safe.
fn upload_name(client_name: Option<&str>) -> String {
    client_name
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("upload.jpg")
        .to_string()
}

/// Write the upload into a scratch directory and run the pipeline on it.
async fn extract_upload(
    extractor: &IncidentExtractor,
    filename: &str,
    data: &[u8],
) -> anyhow::Result<IncidentRecord> {
    let dir = tempfile::tempdir().context("failed to create scratch directory")?;
    let path = dir.path().join(filename);
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("failed to store upload {}", path.display()))?;

    let record = extractor.extract(&path).await?;
    Ok(record)
}
