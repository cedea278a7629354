//! Tag rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use curio_core::types::{Id, Timestamp};

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a tag.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTag {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}
