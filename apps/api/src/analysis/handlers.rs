//! Axum route handlers for the skill-gap API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::pdf;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub match_score: f64,
    pub user_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// Fields of the multipart analyze form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    file: Option<Bytes>,
    role: Option<String>,
    manual_skills: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, AppError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => form.file = Some(field.bytes().await?),
            Some("role") => form.role = Some(field.text().await?),
            Some("manual_skills") => form.manual_skills = Some(field.text().await?),
            other => warn!("Ignoring unexpected form field {other:?}"),
        }
    }

    Ok(form)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/roles
///
/// Role names in catalog order, for the client's role picker.
pub async fn handle_list_roles(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.roles.names())
}

/// POST /api/analyze
///
/// Multipart form: `role` (required), plus either a resume PDF in `file` or a
/// comma-separated `manual_skills` string. A non-empty file takes precedence.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let form = read_form(multipart).await?;

    let role_name = form
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::Validation("role is required".to_string()))?;

    let role = state
        .roles
        .get(role_name)
        .ok_or_else(|| AppError::Validation(format!("Unknown role: {role_name}")))?;

    let user_skills = match form.file.filter(|f| !f.is_empty()) {
        Some(pdf_bytes) => {
            let text = pdf::extract_text(pdf_bytes).await?;
            state.extractor.extract(&text)?
        }
        None => state
            .normalizer
            .parse_manual_skills(form.manual_skills.as_deref().unwrap_or_default()),
    };

    let result = state.scorer.score(&user_skills, &role.skills).await?;

    info!(
        "Analyzed '{}': {} user skills, score {}, {} missing",
        role.name,
        user_skills.len(),
        result.score,
        result.missing.len()
    );

    Ok(Json(AnalyzeResponse {
        match_score: result.score,
        user_skills,
        missing_skills: result.missing,
    }))
}
