use axum::routing::get;
use axum::Router;

use crate::handlers::health;
use crate::state::AppState;

/// Top-level health route, mounted outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health::health))
}
