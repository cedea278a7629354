//! Performer rows and relation rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use curio_core::types::{Id, Timestamp};

/// A row from the `performers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Performer {
    pub id: Id,
    pub name: String,
    pub disambiguation: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub country: Option<String>,
    pub career_start_year: Option<i32>,
    pub career_end_year: Option<i32>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a performer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePerformer {
    pub id: Id,
    pub name: String,
    pub disambiguation: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub country: Option<String>,
    pub career_start_year: Option<i32>,
    pub career_end_year: Option<i32>,
}

/// A row from `performer_urls` (and the studio/scene equivalents).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EntityUrl {
    pub site_id: Id,
    pub url: String,
}

/// A row from `performer_tattoos` or `performer_piercings`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EntityBodyModification {
    pub location: String,
    pub description: Option<String>,
}
