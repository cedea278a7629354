//! Scene rows and relation rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use curio_core::types::{Id, Timestamp};

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scene {
    pub id: Id,
    pub title: Option<String>,
    pub details: Option<String>,
    pub date: Option<String>,
    pub studio_id: Option<Id>,
    pub duration: Option<i32>,
    pub director: Option<String>,
    pub code: Option<String>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a scene.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateScene {
    pub id: Id,
    pub title: Option<String>,
    pub details: Option<String>,
    pub date: Option<String>,
    pub studio_id: Option<Id>,
    pub duration: Option<i32>,
    pub director: Option<String>,
    pub code: Option<String>,
}

/// A row from `scene_performers`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenePerformer {
    pub performer_id: Id,
    pub alias: Option<String>,
}
