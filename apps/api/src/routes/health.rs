use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the size of the loaded vocabulary and role catalog.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "skillgap",
        "vocabulary_size": state.normalizer.vocabulary().len(),
        "roles": state.roles.len(),
        "embedding_backend": state.scorer.backend(),
    }))
}
