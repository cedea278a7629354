//! Image rows.

use serde::Serialize;
use sqlx::FromRow;

use curio_core::types::{Id, Timestamp};

/// A row from the `images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: Id,
    pub url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: Timestamp,
}
