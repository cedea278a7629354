pub mod edits;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/edits", edits::router())
}
