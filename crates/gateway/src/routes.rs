use crate::{
    error::ApiError,
    report::render_report,
    state::AppState,
    store::StoredAnalysis,
    upload::{extension, sanitize_filename},
};
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use detection::{DetectionAdapter, DetectionResult};
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "detector": state.adapter.detector_name(),
    }))
}

struct Upload {
    filename: String,
    data: Bytes,
}

/// Pull the `image` field out of the form, ignoring any others.
async fn read_image_field(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(Upload { filename, data }));
    }
    Ok(None)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::Multipart(e.body_text())
    }
}

pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let start = Instant::now();
    let max_size = state.config.max_image_size;

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > max_size) {
        return Err(ApiError::PayloadTooLarge);
    }

    let upload = read_image_field(&mut multipart)
        .await?
        .ok_or(ApiError::MissingImage)?;

    let filename = sanitize_filename(&upload.filename);
    if filename.is_empty() {
        return Err(ApiError::EmptyFilename);
    }

    let ext = extension(&filename)
        .filter(|ext| state.config.is_allowed_extension(ext))
        .ok_or(ApiError::UnsupportedType)?;

    if upload.data.len() > max_size {
        return Err(ApiError::PayloadTooLarge);
    }

    let request_id = Uuid::new_v4();
    tracing::info!(
        request_id = %request_id,
        filename = %filename,
        bytes = upload.data.len(),
        "Analyzing upload"
    );

    let overlay_name = format!("{}.png", Uuid::new_v4().simple());
    let overlay_path = state.config.overlay_dir().join(&overlay_name);

    let adapter = Arc::clone(&state.adapter);
    let upload_dir = state.config.upload_dir.clone();
    let overlay_target = overlay_path.clone();
    let result = tokio::task::spawn_blocking(move || {
        run_detection(&adapter, &upload_dir, &ext, &upload.data, overlay_target)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("detection task failed: {}", e)))??;

    let mut body = serde_json::to_value(&result)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if result.overlay_path.is_some() {
        body["overlay_url"] = json!(format!("/static/overlays/{}", overlay_name));
    }

    state.store.insert(
        request_id,
        StoredAnalysis::new(body.clone(), result.overlay_path.clone()),
    );

    let elapsed = start.elapsed().as_secs_f64();
    state.metrics.record_analysis(result.mode.as_str(), elapsed);
    tracing::info!(
        request_id = %request_id,
        mode = result.mode.as_str(),
        detections = result.detections.len(),
        total_ms = elapsed * 1000.0,
        "Analysis complete"
    );

    Ok(Json(json!({
        "ok": true,
        "request_id": request_id.to_string(),
        "result": body,
        "report_url": format!("/report?request_id={}", request_id),
    })))
}

/// Spool the upload to a temp file and run the adapter on it.
/// The temp file is removed when this returns.
fn run_detection(
    adapter: &DetectionAdapter,
    upload_dir: &std::path::Path,
    ext: &str,
    data: &[u8],
    overlay_path: PathBuf,
) -> Result<DetectionResult, ApiError> {
    std::fs::create_dir_all(upload_dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(&format!(".{}", ext))
        .tempfile_in(upload_dir)?;
    temp.write_all(data)?;
    temp.flush()?;

    Ok(adapter.detect(temp.path(), Some(&overlay_path))?)
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub request_id: Option<String>,
}

pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let request_id = query
        .request_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .ok_or(ApiError::InvalidRequestId)?;

    let analysis = state.store.get(&request_id).ok_or(ApiError::NotFound)?;

    let pdf = tokio::task::spawn_blocking(move || {
        render_report(&analysis.result, analysis.overlay_path.as_deref())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("report task failed: {}", e)))??;

    tracing::info!(request_id = %request_id, bytes = pdf.len(), "Report rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"report_{}.pdf\"", request_id.simple()),
            ),
        ],
        pdf,
    )
        .into_response())
}
