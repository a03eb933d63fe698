use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::error::AppError;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Readiness includes a database round trip, so a wedged pool reports
/// unready instead of ok.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.store.get_partner(i64::MAX).await?;
    Ok(Json(serde_json::json!({"status": "ready"})))
}
