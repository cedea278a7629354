//! Repository for the `sites` table.

use sqlx::PgConnection;

use curio_core::types::Id;

use crate::models::site::Site;

/// Read operations for sites. URL inputs reference a site by id.
pub struct SiteRepo;

impl SiteRepo {
    pub async fn find_by_id(conn: &mut PgConnection, id: Id) -> Result<Option<Site>, sqlx::Error> {
        sqlx::query_as::<_, Site>(
            "SELECT id, name, url, created_at, updated_at FROM sites WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn exists(conn: &mut PgConnection, id: Id) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sites WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
    }
}
