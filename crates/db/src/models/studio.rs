//! Studio rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use curio_core::types::{Id, Timestamp};

/// A row from the `studios` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Studio {
    pub id: Id,
    pub name: String,
    pub parent_studio_id: Option<Id>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a studio.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudio {
    pub id: Id,
    pub name: String,
    pub parent_studio_id: Option<Id>,
}
