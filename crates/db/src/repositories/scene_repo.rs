//! Repository for the `scenes` table and its relation tables.

use sqlx::PgConnection;

use curio_core::types::Id;

use crate::models::performer::EntityUrl;
use crate::models::scene::{CreateScene, Scene, ScenePerformer};

/// Column list for scenes queries.
const SCENE_COLUMNS: &str = "id, title, details, date, studio_id, duration, director, code, \
    deleted, created_at, updated_at";

/// Provides CRUD and merge plumbing for scenes.
pub struct SceneRepo;

impl SceneRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateScene,
    ) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes (id, title, details, date, studio_id, duration, director, code)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {SCENE_COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(input.id)
            .bind(&input.title)
            .bind(&input.details)
            .bind(&input.date)
            .bind(input.studio_id)
            .bind(input.duration)
            .bind(&input.director)
            .bind(&input.code)
            .fetch_one(conn)
            .await
    }

    /// Find by id, including soft-deleted rows.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {SCENE_COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find by id, excluding soft-deleted rows.
    pub async fn find_live(conn: &mut PgConnection, id: Id) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {SCENE_COLUMNS} FROM scenes WHERE id = $1 AND NOT deleted");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Resolve an id through the redirect table if it was merged away.
    pub async fn find_with_redirect(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Scene>, sqlx::Error> {
        sqlx::query_as::<_, Scene>(
            "SELECT id, title, details, date, studio_id, duration, director, code,
                    deleted, created_at, updated_at
             FROM scenes WHERE id = $1 AND NOT deleted
             UNION
             SELECT s.id, s.title, s.details, s.date, s.studio_id, s.duration, s.director,
                    s.code, s.deleted, s.created_at, s.updated_at
             FROM scene_redirects r
             JOIN scenes s ON s.id = r.target_id
             WHERE r.source_id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Overwrite all mutable columns from the given struct.
    pub async fn update(conn: &mut PgConnection, scene: &Scene) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "UPDATE scenes SET
                title = $2, details = $3, date = $4, studio_id = $5, duration = $6,
                director = $7, code = $8, updated_at = now()
             WHERE id = $1
             RETURNING {SCENE_COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(scene.id)
            .bind(&scene.title)
            .bind(&scene.details)
            .bind(&scene.date)
            .bind(scene.studio_id)
            .bind(scene.duration)
            .bind(&scene.director)
            .bind(&scene.code)
            .fetch_one(conn)
            .await
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Id) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE scenes SET deleted = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- urls ---

    pub async fn list_urls(
        conn: &mut PgConnection,
        scene_id: Id,
    ) -> Result<Vec<EntityUrl>, sqlx::Error> {
        sqlx::query_as::<_, EntityUrl>(
            "SELECT site_id, url FROM scene_urls WHERE scene_id = $1 ORDER BY url",
        )
        .bind(scene_id)
        .fetch_all(conn)
        .await
    }

    pub async fn add_url(
        conn: &mut PgConnection,
        scene_id: Id,
        site_id: Id,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scene_urls (scene_id, site_id, url) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(scene_id)
        .bind(site_id)
        .bind(url)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_url(
        conn: &mut PgConnection,
        scene_id: Id,
        site_id: Id,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_urls WHERE scene_id = $1 AND site_id = $2 AND url = $3")
            .bind(scene_id)
            .bind(site_id)
            .bind(url)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- tags ---

    pub async fn list_tag_ids(
        conn: &mut PgConnection,
        scene_id: Id,
    ) -> Result<Vec<Id>, sqlx::Error> {
        sqlx::query_scalar("SELECT tag_id FROM scene_tags WHERE scene_id = $1")
            .bind(scene_id)
            .fetch_all(conn)
            .await
    }

    pub async fn add_tag(
        conn: &mut PgConnection,
        scene_id: Id,
        tag_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scene_tags (scene_id, tag_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(scene_id)
        .bind(tag_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_tag(
        conn: &mut PgConnection,
        scene_id: Id,
        tag_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_tags WHERE scene_id = $1 AND tag_id = $2")
            .bind(scene_id)
            .bind(tag_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- images ---

    pub async fn list_image_ids(
        conn: &mut PgConnection,
        scene_id: Id,
    ) -> Result<Vec<Id>, sqlx::Error> {
        sqlx::query_scalar("SELECT image_id FROM scene_images WHERE scene_id = $1")
            .bind(scene_id)
            .fetch_all(conn)
            .await
    }

    pub async fn add_image(
        conn: &mut PgConnection,
        scene_id: Id,
        image_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scene_images (scene_id, image_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(scene_id)
        .bind(image_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_image(
        conn: &mut PgConnection,
        scene_id: Id,
        image_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_images WHERE scene_id = $1 AND image_id = $2")
            .bind(scene_id)
            .bind(image_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- performer credits ---

    pub async fn list_performers(
        conn: &mut PgConnection,
        scene_id: Id,
    ) -> Result<Vec<ScenePerformer>, sqlx::Error> {
        sqlx::query_as::<_, ScenePerformer>(
            "SELECT performer_id, alias FROM scene_performers WHERE scene_id = $1",
        )
        .bind(scene_id)
        .fetch_all(conn)
        .await
    }

    pub async fn add_performer(
        conn: &mut PgConnection,
        scene_id: Id,
        performer_id: Id,
        alias: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scene_performers (scene_id, performer_id, alias) VALUES ($1, $2, $3)
             ON CONFLICT (scene_id, performer_id) DO UPDATE SET alias = $3",
        )
        .bind(scene_id)
        .bind(performer_id)
        .bind(alias)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_performer(
        conn: &mut PgConnection,
        scene_id: Id,
        performer_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_performers WHERE scene_id = $1 AND performer_id = $2")
            .bind(scene_id)
            .bind(performer_id)
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
        sqlx::query("INSERT INTO scene_redirects (source_id, target_id) VALUES ($1, $2)")
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
        sqlx::query("UPDATE scene_redirects SET target_id = $2 WHERE target_id = $1")
            .bind(old_target)
            .bind(new_target)
            .execute(conn)
            .await?;
        Ok(())
    }
}
