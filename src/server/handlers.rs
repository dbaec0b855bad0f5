//! HTTPハンドラー

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::output::ArtifactKind;
use crate::security::{validate_filename, validate_upload_size};
use crate::store::StoredReport;
use crate::types::ProcessingReport;

/// アップロード成功時のレスポンス
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub original_filename: String,
    pub pdf_download: String,
    pub excel_download: String,
    pub status: &'static str,
    pub message: String,
    pub data: ProcessingReport,
}

/// Handler: GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Excel Processing API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handler: GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handler: POST /api/upload
///
/// 最初のファイルフィールドを検証し、ブロッキングスレッドで処理します。
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        ApiError::BadRequest(format!("Expected a multipart/form-data upload: {}", rejection))
    })?;

    let (filename, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|err| multipart_error(err.status(), err.body_text()))?
            .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        validate_filename(&filename)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|err| multipart_error(err.status(), err.body_text()))?;
        break (filename, bytes);
    };

    validate_upload_size(bytes.len() as u64, state.max_upload_bytes).map_err(|_| {
        ApiError::PayloadTooLarge(format!(
            "File too large: {} bytes (max: {} bytes)",
            bytes.len(),
            state.max_upload_bytes
        ))
    })?;

    info!(filename = %filename, size = bytes.len(), "processing upload");

    let processor = state.processor.clone();
    let input = bytes.to_vec();
    let outcome = tokio::time::timeout(
        state.timeout,
        tokio::task::spawn_blocking(move || processor.process_bytes(input)),
    )
    .await;

    let report = match outcome {
        Ok(Ok(result)) => result?,
        Ok(Err(join_error)) => {
            return Err(ApiError::Internal(format!(
                "Processing task failed: {}",
                join_error
            )));
        }
        Err(_elapsed) => return Err(ApiError::Timeout(state.timeout.as_secs())),
    };

    let file_id = state
        .store
        .insert(StoredReport::new(report.clone(), filename.clone()))
        .to_string();
    info!(file_id = %file_id, "upload processed");

    Ok(Json(UploadResponse {
        pdf_download: format!("/api/download/{}", ArtifactKind::Pdf.file_name(&file_id)),
        excel_download: format!("/api/download/{}", ArtifactKind::Excel.file_name(&file_id)),
        file_id,
        original_filename: filename,
        status: "success",
        message: "File processed successfully".to_string(),
        data: report,
    }))
}

/// Handler: GET /api/download/:filename
///
/// `<file_id>_processed.pdf` または `<file_id>_processed.xlsx` を受け付けます。
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (file_id, kind) = parse_download_name(&filename)
        .ok_or_else(|| ApiError::NotFound(format!("File not found: {}", filename)))?;

    let stored = state.store.get(&file_id).ok_or_else(|| {
        warn!(file_id = %file_id, "download requested for unknown or expired report");
        ApiError::NotFound("File not found or expired".to_string())
    })?;

    let bytes = tokio::task::spawn_blocking(move || {
        kind.render(&stored.report, &stored.original_filename)
    })
    .await
    .map_err(|join_error| ApiError::Internal(format!("Rendering task failed: {}", join_error)))??;

    info!(file_id = %file_id, kind = kind.extension(), size = bytes.len(), "artifact rendered");

    Ok((
        [
            (header::CONTENT_TYPE, kind.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// `<uuid>_processed.<ext>` を分解する
fn parse_download_name(filename: &str) -> Option<(Uuid, ArtifactKind)> {
    let (stem, extension) = filename.rsplit_once('.')?;
    let kind = ArtifactKind::from_extension(extension)?;
    let id = stem.strip_suffix("_processed")?;
    let id = Uuid::parse_str(id).ok()?;
    Some((id, kind))
}

fn multipart_error(status: StatusCode, message: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_name() {
        let id = Uuid::new_v4();

        assert_eq!(
            parse_download_name(&format!("{}_processed.pdf", id)),
            Some((id, ArtifactKind::Pdf))
        );
        assert_eq!(
            parse_download_name(&format!("{}_processed.xlsx", id)),
            Some((id, ArtifactKind::Excel))
        );
        assert_eq!(parse_download_name(&format!("{}_processed.csv", id)), None);
        assert_eq!(parse_download_name(&format!("{}.pdf", id)), None);
        assert_eq!(parse_download_name("not-a-uuid_processed.pdf"), None);
    }
}
