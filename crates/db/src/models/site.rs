//! Site rows. Sites qualify the URLs attached to entities.

use serde::Serialize;
use sqlx::FromRow;

use curio_core::types::{Id, Timestamp};

/// A row from the `sites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Site {
    pub id: Id,
    pub name: String,
    pub url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
