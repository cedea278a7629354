//! Repository for the `performers` table and its relation tables.

use sqlx::PgConnection;

use curio_core::types::Id;

use crate::models::performer::{
    CreatePerformer, EntityBodyModification, EntityUrl, Performer,
};

/// Column list for performers queries.
const PERFORMER_COLUMNS: &str = "id, name, disambiguation, gender, birthdate, country, \
    career_start_year, career_end_year, deleted, created_at, updated_at";

/// Provides CRUD and merge plumbing for performers.
pub struct PerformerRepo;

impl PerformerRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreatePerformer,
    ) -> Result<Performer, sqlx::Error> {
        let query = format!(
            "INSERT INTO performers
                (id, name, disambiguation, gender, birthdate, country,
                 career_start_year, career_end_year)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PERFORMER_COLUMNS}"
        );
        sqlx::query_as::<_, Performer>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.disambiguation)
            .bind(&input.gender)
            .bind(&input.birthdate)
            .bind(&input.country)
            .bind(input.career_start_year)
            .bind(input.career_end_year)
            .fetch_one(conn)
            .await
    }

    /// Find by id, including soft-deleted rows.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Performer>, sqlx::Error> {
        let query = format!("SELECT {PERFORMER_COLUMNS} FROM performers WHERE id = $1");
        sqlx::query_as::<_, Performer>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find by id, excluding soft-deleted rows.
    pub async fn find_live(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Performer>, sqlx::Error> {
        let query =
            format!("SELECT {PERFORMER_COLUMNS} FROM performers WHERE id = $1 AND NOT deleted");
        sqlx::query_as::<_, Performer>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Resolve an id through the redirect table if it was merged away.
    pub async fn find_with_redirect(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Performer>, sqlx::Error> {
        sqlx::query_as::<_, Performer>(
            "SELECT id, name, disambiguation, gender, birthdate, country,
                    career_start_year, career_end_year, deleted, created_at, updated_at
             FROM performers WHERE id = $1 AND NOT deleted
             UNION
             SELECT p.id, p.name, p.disambiguation, p.gender, p.birthdate, p.country,
                    p.career_start_year, p.career_end_year, p.deleted, p.created_at, p.updated_at
             FROM performer_redirects r
             JOIN performers p ON p.id = r.target_id
             WHERE r.source_id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Overwrite all mutable columns from the given struct.
    pub async fn update(
        conn: &mut PgConnection,
        performer: &Performer,
    ) -> Result<Performer, sqlx::Error> {
        let query = format!(
            "UPDATE performers SET
                name = $2, disambiguation = $3, gender = $4, birthdate = $5,
                country = $6, career_start_year = $7, career_end_year = $8,
                updated_at = now()
             WHERE id = $1
             RETURNING {PERFORMER_COLUMNS}"
        );
        sqlx::query_as::<_, Performer>(&query)
            .bind(performer.id)
            .bind(&performer.name)
            .bind(&performer.disambiguation)
            .bind(&performer.gender)
            .bind(&performer.birthdate)
            .bind(&performer.country)
            .bind(performer.career_start_year)
            .bind(performer.career_end_year)
            .fetch_one(conn)
            .await
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Id) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE performers SET deleted = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- aliases ---

    pub async fn list_aliases(
        conn: &mut PgConnection,
        performer_id: Id,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT alias FROM performer_aliases WHERE performer_id = $1 ORDER BY alias",
        )
        .bind(performer_id)
        .fetch_all(conn)
        .await
    }

    pub async fn add_alias(
        conn: &mut PgConnection,
        performer_id: Id,
        alias: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO performer_aliases (performer_id, alias) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(performer_id)
        .bind(alias)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_alias(
        conn: &mut PgConnection,
        performer_id: Id,
        alias: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM performer_aliases WHERE performer_id = $1 AND alias = $2")
            .bind(performer_id)
            .bind(alias)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- urls ---

    pub async fn list_urls(
        conn: &mut PgConnection,
        performer_id: Id,
    ) -> Result<Vec<EntityUrl>, sqlx::Error> {
        sqlx::query_as::<_, EntityUrl>(
            "SELECT site_id, url FROM performer_urls WHERE performer_id = $1 ORDER BY url",
        )
        .bind(performer_id)
        .fetch_all(conn)
        .await
    }

    pub async fn add_url(
        conn: &mut PgConnection,
        performer_id: Id,
        site_id: Id,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO performer_urls (performer_id, site_id, url) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(performer_id)
        .bind(site_id)
        .bind(url)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_url(
        conn: &mut PgConnection,
        performer_id: Id,
        site_id: Id,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "DELETE FROM performer_urls
             WHERE performer_id = $1 AND site_id = $2 AND url = $3",
        )
        .bind(performer_id)
        .bind(site_id)
        .bind(url)
        .execute(conn)
        .await?;
        Ok(())
    }

    // --- tattoos and piercings ---
    //
    // The two tables are identical in shape; `table` is one of the two
    // fixed names, never caller input.

    pub async fn list_body_modifications(
        conn: &mut PgConnection,
        table: BodyModTable,
        performer_id: Id,
    ) -> Result<Vec<EntityBodyModification>, sqlx::Error> {
        let query = format!(
            "SELECT location, description FROM {} WHERE performer_id = $1 ORDER BY location",
            table.name()
        );
        sqlx::query_as::<_, EntityBodyModification>(&query)
            .bind(performer_id)
            .fetch_all(conn)
            .await
    }

    pub async fn upsert_body_modification(
        conn: &mut PgConnection,
        table: BodyModTable,
        performer_id: Id,
        location: &str,
        description: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (performer_id, location, description) VALUES ($1, $2, $3)
             ON CONFLICT (performer_id, location) DO UPDATE SET description = $3",
            table.name()
        );
        sqlx::query(&query)
            .bind(performer_id)
            .bind(location)
            .bind(description)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn remove_body_modification(
        conn: &mut PgConnection,
        table: BodyModTable,
        performer_id: Id,
        location: &str,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "DELETE FROM {} WHERE performer_id = $1 AND location = $2",
            table.name()
        );
        sqlx::query(&query)
            .bind(performer_id)
            .bind(location)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- images ---

    pub async fn list_image_ids(
        conn: &mut PgConnection,
        performer_id: Id,
    ) -> Result<Vec<Id>, sqlx::Error> {
        sqlx::query_scalar("SELECT image_id FROM performer_images WHERE performer_id = $1")
            .bind(performer_id)
            .fetch_all(conn)
            .await
    }

    pub async fn add_image(
        conn: &mut PgConnection,
        performer_id: Id,
        image_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO performer_images (performer_id, image_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(performer_id)
        .bind(image_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn remove_image(
        conn: &mut PgConnection,
        performer_id: Id,
        image_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM performer_images WHERE performer_id = $1 AND image_id = $2")
            .bind(performer_id)
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
        sqlx::query("INSERT INTO performer_redirects (source_id, target_id) VALUES ($1, $2)")
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
        sqlx::query("UPDATE performer_redirects SET target_id = $2 WHERE target_id = $1")
            .bind(old_target)
            .bind(new_target)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Move scene credits from a merged-away performer to the target.
    /// Scenes already crediting the target keep their existing row. When
    /// `alias_stamp` is given, moved credits with no alias get the
    /// source performer's name so the original billing stays visible.
    pub async fn reassign_scene_performers(
        conn: &mut PgConnection,
        from_performer: Id,
        to_performer: Id,
        alias_stamp: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE scene_performers SET performer_id = $2, alias = COALESCE(alias, $3)
             WHERE performer_id = $1
               AND scene_id NOT IN
                   (SELECT scene_id FROM scene_performers WHERE performer_id = $2)",
        )
        .bind(from_performer)
        .bind(to_performer)
        .bind(alias_stamp)
        .execute(&mut *conn)
        .await?;
        sqlx::query("DELETE FROM scene_performers WHERE performer_id = $1")
            .bind(from_performer)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Stamp a name onto existing unaliased scene credits. Used when a
    /// rename carries the old name forward.
    pub async fn stamp_scene_performer_alias(
        conn: &mut PgConnection,
        performer_id: Id,
        alias: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE scene_performers SET alias = $2
             WHERE performer_id = $1 AND (alias IS NULL OR alias = '')",
        )
        .bind(performer_id)
        .bind(alias)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Drop all scene credits for a destroyed performer.
    pub async fn delete_scene_performers(
        conn: &mut PgConnection,
        performer_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_performers WHERE performer_id = $1")
            .bind(performer_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Drop all favorites of a destroyed performer.
    pub async fn delete_favorites(
        conn: &mut PgConnection,
        performer_id: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM performer_favorites WHERE performer_id = $1")
            .bind(performer_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Move favorites from a merged-away performer to the target,
    /// dropping duplicates.
    pub async fn reassign_favorites(
        conn: &mut PgConnection,
        from_performer: Id,
        to_performer: Id,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE performer_favorites SET performer_id = $2
             WHERE performer_id = $1
               AND user_id NOT IN
                   (SELECT user_id FROM performer_favorites WHERE performer_id = $2)",
        )
        .bind(from_performer)
        .bind(to_performer)
        .execute(&mut *conn)
        .await?;
        sqlx::query("DELETE FROM performer_favorites WHERE performer_id = $1")
            .bind(from_performer)
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// The two body-modification tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyModTable {
    Tattoos,
    Piercings,
}

impl BodyModTable {
    fn name(&self) -> &'static str {
        match self {
            Self::Tattoos => "performer_tattoos",
            Self::Piercings => "performer_piercings",
        }
    }
}
