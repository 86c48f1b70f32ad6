//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::resume::analysis::{analyze_resume, SkillRatings};
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const DEFAULT_MIME_TYPE: &str = "application/pdf";

struct UploadedFile {
    mime_type: String,
    bytes: Bytes,
}

/// POST /api/v1/resume/analyze
///
/// Multipart upload with a single `resume` field. Returns skill ratings; an
/// unusable model answer yields the fallback ratings rather than an error.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SkillRatings>, AppError> {
    let file = read_resume_field(multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No resume file provided".to_string()))?;

    info!(
        "Analyzing resume ({} bytes, {})",
        file.bytes.len(),
        file.mime_type
    );

    let ratings = analyze_resume(&state.llm, &file.mime_type, &file.bytes).await?;
    Ok(Json(ratings))
}

async fn read_resume_field(mut multipart: Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let mime_type = field
            .content_type()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read resume upload: {e}")))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadedFile { mime_type, bytes }));
    }
    Ok(None)
}
