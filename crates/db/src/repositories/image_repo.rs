//! Repository for the `images` table.

use sqlx::PgConnection;

use curio_core::types::Id;

use crate::models::image::Image;

/// Read operations for images. Images are managed elsewhere; the edit
/// workflow only needs to validate and link them.
pub struct ImageRepo;

impl ImageRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Image>, sqlx::Error> {
        sqlx::query_as::<_, Image>(
            "SELECT id, url, width, height, created_at FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn exists(conn: &mut PgConnection, id: Id) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM images WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
    }
}
