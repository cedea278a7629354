use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::state::AppState;

/// GET /health
///
/// Liveness probe. Verifies the database connection is usable.
pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    curio_db::health_check(&state.pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
