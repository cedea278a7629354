use std::sync::Arc;

use curio_edits::EditService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: curio_db::DbPool,
    /// Server configuration (JWT settings, moderation tunables).
    pub config: Arc<ServerConfig>,
    /// Edit workflow service (proposal, voting, application).
    pub edits: Arc<EditService>,
}
