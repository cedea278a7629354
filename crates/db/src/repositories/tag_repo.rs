//! Repository for the `tags` table and its alias and redirect tables.

use sqlx::PgConnection;

use curio_core::types::Id;

use crate::models::tag::{CreateTag, Tag};

/// Column list for tags queries.
const TAG_COLUMNS: &str = "id, name, description, deleted, created_at, updated_at";

/// Provides CRUD and merge plumbing for tags.
pub struct TagRepo;

impl TagRepo {
    pub async fn create(conn: &mut PgConnection, input: &CreateTag) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (id, name, description)
             VALUES ($1, $2, $3)
             RETURNING {TAG_COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(conn)
            .await
    }

    /// Find by id, including soft-deleted rows.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find by id, excluding soft-deleted rows.
    pub async fn find_live(conn: &mut PgConnection, id: Id) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1 AND NOT deleted");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Resolve an id that may belong to a merged-away tag: returns the
    /// live row for the id itself, or the redirect target if the id was
    /// absorbed by a merge.
    pub async fn find_with_redirect(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, name, description, deleted, created_at, updated_at
             FROM tags WHERE id = $1 AND NOT deleted
             UNION
             SELECT t.id, t.name, t.description, t.deleted, t.created_at, t.updated_at
             FROM tag_redirects r
             JOIN tags t ON t.id = r.target_id
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
        description: Option<&str>,
    ) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET name = $2, description = $3, updated_at = now()
             WHERE id = $1
             RETURNING {TAG_COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(name)
            .bind(description)
            .fetch_one(conn)
            .await
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Id) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tags SET deleted = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- aliases ---

    pub async fn list_aliases(
        conn: &mut PgConnection,
        tag_id: Id,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT alias FROM tag_aliases WHERE tag_id = $1 ORDER BY alias")
            .bind(tag_id)
            .fetch_all(conn)
            .await
    }

    pub async fn add_alias(
        conn: &mut PgConnection,
        tag_id: Id,
        alias: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tag_aliases (tag_id, alias) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(tag_id)
        .bind(alias)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_alias(
        conn: &mut PgConnection,
        tag_id: Id,
        alias: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tag_aliases WHERE tag_id = $1 AND alias = $2")
            .bind(tag_id)
            .bind(alias)
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
        sqlx::query("INSERT INTO tag_redirects (source_id, target_id) VALUES ($1, $2)")
            .bind(source_id)
            .bind(target_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Re-point redirects at a merged-away tag to the merge target, so
    /// chains stay one hop deep.
    pub async fn repoint_redirects(
        conn: &mut PgConnection,
        old_target: Id,
        new_target: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tag_redirects SET target_id = $2 WHERE target_id = $1")
            .bind(old_target)
            .bind(new_target)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Drop all scene links for a destroyed tag.
    pub async fn delete_scene_tags(conn: &mut PgConnection, tag_id: Id) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_tags WHERE tag_id = $1")
            .bind(tag_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Move scene links from a merged-away tag to the target. Scenes
    /// already linked to the target keep their existing row.
    pub async fn reassign_scene_tags(
        conn: &mut PgConnection,
        from_tag: Id,
        to_tag: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE scene_tags SET tag_id = $2
             WHERE tag_id = $1
               AND scene_id NOT IN (SELECT scene_id FROM scene_tags WHERE tag_id = $2)",
        )
        .bind(from_tag)
        .bind(to_tag)
        .execute(&mut *conn)
        .await?;
        sqlx::query("DELETE FROM scene_tags WHERE tag_id = $1")
            .bind(from_tag)
            .execute(conn)
            .await?;
        Ok(())
    }
}
