//! Repository for the `studios` table and its relation tables.

use sqlx::PgConnection;

use curio_core::types::Id;

use crate::models::performer::EntityUrl;
use crate::models::studio::{CreateStudio, Studio};

/// Column list for studios queries.
const STUDIO_COLUMNS: &str = "id, name, parent_studio_id, deleted, created_at, updated_at";

/// Provides CRUD and merge plumbing for studios.
pub struct StudioRepo;

impl StudioRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateStudio,
    ) -> Result<Studio, sqlx::Error> {
        let query = format!(
            "INSERT INTO studios (id, name, parent_studio_id)
             VALUES ($1, $2, $3)
             RETURNING {STUDIO_COLUMNS}"
        );
        sqlx::query_as::<_, Studio>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(input.parent_studio_id)
            .fetch_one(conn)
            .await
    }

    /// Find by id, including soft-deleted rows.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Studio>, sqlx::Error> {
        let query = format!("SELECT {STUDIO_COLUMNS} FROM studios WHERE id = $1");
        sqlx::query_as::<_, Studio>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find by id, excluding soft-deleted rows.
    pub async fn find_live(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Studio>, sqlx::Error> {
        let query = format!("SELECT {STUDIO_COLUMNS} FROM studios WHERE id = $1 AND NOT deleted");
        sqlx::query_as::<_, Studio>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Resolve an id through the redirect table if it was merged away.
    pub async fn find_with_redirect(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Studio>, sqlx::Error> {
        sqlx::query_as::<_, Studio>(
            "SELECT id, name, parent_studio_id, deleted, created_at, updated_at
             FROM studios WHERE id = $1 AND NOT deleted
             UNION
             SELECT s.id, s.name, s.parent_studio_id, s.deleted, s.created_at, s.updated_at
             FROM studio_redirects r
             JOIN studios s ON s.id = r.target_id
             WHERE r.source_id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: Id,
        name: &str,
        parent_studio_id: Option<Id>,
    ) -> Result<Studio, sqlx::Error> {
        let query = format!(
            "UPDATE studios SET name = $2, parent_studio_id = $3, updated_at = now()
             WHERE id = $1
             RETURNING {STUDIO_COLUMNS}"
        );
        sqlx::query_as::<_, Studio>(&query)
            .bind(id)
            .bind(name)
            .bind(parent_studio_id)
            .fetch_one(conn)
            .await
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Id) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE studios SET deleted = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- aliases ---

    pub async fn list_aliases(
        conn: &mut PgConnection,
        studio_id: Id,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT alias FROM studio_aliases WHERE studio_id = $1 ORDER BY alias")
            .bind(studio_id)
            .fetch_all(conn)
            .await
    }

    pub async fn add_alias(
        conn: &mut PgConnection,
        studio_id: Id,
        alias: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO studio_aliases (studio_id, alias) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(studio_id)
        .bind(alias)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_alias(
        conn: &mut PgConnection,
        studio_id: Id,
        alias: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM studio_aliases WHERE studio_id = $1 AND alias = $2")
            .bind(studio_id)
            .bind(alias)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- urls ---

    pub async fn list_urls(
        conn: &mut PgConnection,
        studio_id: Id,
    ) -> Result<Vec<EntityUrl>, sqlx::Error> {
        sqlx::query_as::<_, EntityUrl>(
            "SELECT site_id, url FROM studio_urls WHERE studio_id = $1 ORDER BY url",
        )
        .bind(studio_id)
        .fetch_all(conn)
        .await
    }

    pub async fn add_url(
        conn: &mut PgConnection,
        studio_id: Id,
        site_id: Id,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO studio_urls (studio_id, site_id, url) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(studio_id)
        .bind(site_id)
        .bind(url)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_url(
        conn: &mut PgConnection,
        studio_id: Id,
        site_id: Id,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM studio_urls WHERE studio_id = $1 AND site_id = $2 AND url = $3")
            .bind(studio_id)
            .bind(site_id)
            .bind(url)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- images ---

    pub async fn list_image_ids(
        conn: &mut PgConnection,
        studio_id: Id,
    ) -> Result<Vec<Id>, sqlx::Error> {
        sqlx::query_scalar("SELECT image_id FROM studio_images WHERE studio_id = $1")
            .bind(studio_id)
            .fetch_all(conn)
            .await
    }

    pub async fn add_image(
        conn: &mut PgConnection,
        studio_id: Id,
        image_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO studio_images (studio_id, image_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(studio_id)
        .bind(image_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_image(
        conn: &mut PgConnection,
        studio_id: Id,
        image_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM studio_images WHERE studio_id = $1 AND image_id = $2")
            .bind(studio_id)
            .bind(image_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- merge plumbing ---

    pub async fn create_redirect(
        conn: &mut PgConnection,
        source_id: Id,
        target_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO studio_redirects (source_id, target_id) VALUES ($1, $2)")
            .bind(source_id)
            .bind(target_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn repoint_redirects(
        conn: &mut PgConnection,
        old_target: Id,
        new_target: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE studio_redirects SET target_id = $2 WHERE target_id = $1")
            .bind(old_target)
            .bind(new_target)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Move scenes from a merged-away or destroyed studio. `to_studio`
    /// is `None` on destroy, leaving the scenes studioless.
    pub async fn reassign_scenes(
        conn: &mut PgConnection,
        from_studio: Id,
        to_studio: Option<Id>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE scenes SET studio_id = $2, updated_at = now() WHERE studio_id = $1")
            .bind(from_studio)
            .bind(to_studio)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Re-parent child studios of a deleted or merged-away studio.
    pub async fn reassign_children(
        conn: &mut PgConnection,
        from_parent: Id,
        to_parent: Option<Id>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE studios SET parent_studio_id = $2, updated_at = now()
             WHERE parent_studio_id = $1",
        )
        .bind(from_parent)
        .bind(to_parent)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Drop all favorites of a destroyed studio.
    pub async fn delete_favorites(
        conn: &mut PgConnection,
        studio_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM studio_favorites WHERE studio_id = $1")
            .bind(studio_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Move favorites from a merged-away studio to the target, dropping
    /// duplicates.
    pub async fn reassign_favorites(
        conn: &mut PgConnection,
        from_studio: Id,
        to_studio: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE studio_favorites SET studio_id = $2
             WHERE studio_id = $1
               AND user_id NOT IN
                   (SELECT user_id FROM studio_favorites WHERE studio_id = $2)",
        )
        .bind(from_studio)
        .bind(to_studio)
        .execute(&mut *conn)
        .await?;
        sqlx::query("DELETE FROM studio_favorites WHERE studio_id = $1")
            .bind(from_studio)
            .execute(conn)
            .await?;
        Ok(())
    }
}
