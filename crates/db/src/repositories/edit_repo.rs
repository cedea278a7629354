//! Repository for the `edits` table plus votes, comments, and the
//! per-entity link tables.

use sqlx::PgConnection;

use curio_core::edit::{EditStatus, TargetType, VoteType};
use curio_core::types::{Id, Timestamp};

use crate::models::edit::{CreateEdit, Edit, EditComment, EditVote};

/// Column list for edits queries.
const EDIT_COLUMNS: &str = "id, user_id, target_type, operation, status, bot, data, applied, \
    update_count, created_at, updated_at, closed_at";

/// Provides CRUD for edits and their votes and comments.
pub struct EditRepo;

impl EditRepo {
    pub async fn create(conn: &mut PgConnection, input: &CreateEdit) -> Result<Edit, sqlx::Error> {
        let query = format!(
            "INSERT INTO edits (id, user_id, target_type, operation, bot, data)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {EDIT_COLUMNS}"
        );
        sqlx::query_as::<_, Edit>(&query)
            .bind(input.id)
            .bind(input.user_id)
            .bind(input.target_type.as_str())
            .bind(input.operation.as_str())
            .bind(input.bot)
            .bind(&input.data)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Id) -> Result<Option<Edit>, sqlx::Error> {
        let query = format!("SELECT {EDIT_COLUMNS} FROM edits WHERE id = $1");
        sqlx::query_as::<_, Edit>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find by id and take a row lock for the rest of the transaction.
    /// Vote resolution and apply serialize on this lock so two callers
    /// cannot both move the same edit out of PENDING.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Id,
    ) -> Result<Option<Edit>, sqlx::Error> {
        let query = format!("SELECT {EDIT_COLUMNS} FROM edits WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Edit>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Replace the payload of a pending edit and bump its update count.
    pub async fn update_data(
        conn: &mut PgConnection,
        id: Id,
        data: &serde_json::Value,
    ) -> Result<Edit, sqlx::Error> {
        let query = format!(
            "UPDATE edits
             SET data = $2, update_count = update_count + 1, updated_at = now()
             WHERE id = $1
             RETURNING {EDIT_COLUMNS}"
        );
        sqlx::query_as::<_, Edit>(&query)
            .bind(id)
            .bind(data)
            .fetch_one(conn)
            .await
    }

    /// Move a pending edit to a new status. Terminal statuses also set
    /// `closed_at`. Returns `None` when the edit has already left
    /// PENDING, so a racing transition fails instead of overwriting the
    /// earlier one.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Id,
        status: EditStatus,
    ) -> Result<Option<Edit>, sqlx::Error> {
        let query = format!(
            "UPDATE edits
             SET status = $2,
                 closed_at = CASE WHEN $3 THEN now() ELSE closed_at END,
                 updated_at = now()
             WHERE id = $1 AND status = 'PENDING'
             RETURNING {EDIT_COLUMNS}"
        );
        sqlx::query_as::<_, Edit>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(status.is_terminal())
            .fetch_optional(conn)
            .await
    }

    pub async fn mark_applied(conn: &mut PgConnection, id: Id) -> Result<Edit, sqlx::Error> {
        let query = format!(
            "UPDATE edits SET applied = TRUE, updated_at = now()
             WHERE id = $1
             RETURNING {EDIT_COLUMNS}"
        );
        sqlx::query_as::<_, Edit>(&query)
            .bind(id)
            .fetch_one(conn)
            .await
    }

    /// Pending edits created before the cutoff, oldest first. Drives
    /// both the expiry sweep and the destructive grace-period re-check.
    pub async fn list_pending_created_before(
        conn: &mut PgConnection,
        cutoff: Timestamp,
    ) -> Result<Vec<Edit>, sqlx::Error> {
        let query = format!(
            "SELECT {EDIT_COLUMNS} FROM edits
             WHERE status = 'PENDING' AND created_at < $1
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Edit>(&query)
            .bind(cutoff)
            .fetch_all(conn)
            .await
    }

    /// Applied, accepted edits by one user. Drives vote-right promotion.
    pub async fn count_applied_by_user(
        conn: &mut PgConnection,
        user_id: Id,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM edits
             WHERE user_id = $1 AND applied
               AND status IN ('ACCEPTED', 'IMMEDIATE_ACCEPTED')",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    // --- entity links ---

    /// Link an edit to an entity row. One row per target and per merge
    /// source; CREATE edits gain their link at apply time.
    pub async fn link_entity(
        conn: &mut PgConnection,
        edit_id: Id,
        target_type: TargetType,
        entity_id: Id,
    ) -> Result<(), sqlx::Error> {
        let query = match target_type {
            TargetType::Tag => {
                "INSERT INTO edit_tags (edit_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING"
            }
            TargetType::Performer => {
                "INSERT INTO edit_performers (edit_id, performer_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING"
            }
            TargetType::Studio => {
                "INSERT INTO edit_studios (edit_id, studio_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING"
            }
            TargetType::Scene => {
                "INSERT INTO edit_scenes (edit_id, scene_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING"
            }
        };
        sqlx::query(query)
            .bind(edit_id)
            .bind(entity_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Remove every entity link for an edit. Amendments drop the old
    /// links before re-linking, so a retargeted edit carries exactly one
    /// set of link rows.
    pub async fn unlink_entities(
        conn: &mut PgConnection,
        edit_id: Id,
        target_type: TargetType,
    ) -> Result<(), sqlx::Error> {
        let query = match target_type {
            TargetType::Tag => "DELETE FROM edit_tags WHERE edit_id = $1",
            TargetType::Performer => "DELETE FROM edit_performers WHERE edit_id = $1",
            TargetType::Studio => "DELETE FROM edit_studios WHERE edit_id = $1",
            TargetType::Scene => "DELETE FROM edit_scenes WHERE edit_id = $1",
        };
        sqlx::query(query).bind(edit_id).execute(conn).await?;
        Ok(())
    }

    /// Ids of all entities linked to an edit. For MODIFY and DESTROY
    /// this is the target alone; for MERGE it is the target plus every
    /// source.
    pub async fn list_linked_ids(
        conn: &mut PgConnection,
        edit_id: Id,
        target_type: TargetType,
    ) -> Result<Vec<Id>, sqlx::Error> {
        let query = match target_type {
            TargetType::Tag => "SELECT tag_id FROM edit_tags WHERE edit_id = $1",
            TargetType::Performer => "SELECT performer_id FROM edit_performers WHERE edit_id = $1",
            TargetType::Studio => "SELECT studio_id FROM edit_studios WHERE edit_id = $1",
            TargetType::Scene => "SELECT scene_id FROM edit_scenes WHERE edit_id = $1",
        };
        sqlx::query_scalar(query).bind(edit_id).fetch_all(conn).await
    }

    /// All edits linked to an entity, newest first.
    pub async fn list_for_entity(
        conn: &mut PgConnection,
        target_type: TargetType,
        entity_id: Id,
    ) -> Result<Vec<Edit>, sqlx::Error> {
        let join = match target_type {
            TargetType::Tag => "edit_tags l ON l.edit_id = e.id AND l.tag_id = $1",
            TargetType::Performer => "edit_performers l ON l.edit_id = e.id AND l.performer_id = $1",
            TargetType::Studio => "edit_studios l ON l.edit_id = e.id AND l.studio_id = $1",
            TargetType::Scene => "edit_scenes l ON l.edit_id = e.id AND l.scene_id = $1",
        };
        let query = format!(
            "SELECT e.id, e.user_id, e.target_type, e.operation, e.status, e.bot, e.data,
                    e.applied, e.update_count, e.created_at, e.updated_at, e.closed_at
             FROM edits e
             JOIN {join}
             ORDER BY e.created_at DESC"
        );
        sqlx::query_as::<_, Edit>(&query)
            .bind(entity_id)
            .fetch_all(conn)
            .await
    }

    // --- votes ---

    /// Insert or replace a user's vote. Re-voting overwrites the
    /// previous row in place.
    pub async fn upsert_vote(
        conn: &mut PgConnection,
        edit_id: Id,
        user_id: Id,
        vote: VoteType,
    ) -> Result<EditVote, sqlx::Error> {
        sqlx::query_as::<_, EditVote>(
            "INSERT INTO edit_votes (edit_id, user_id, vote)
             VALUES ($1, $2, $3)
             ON CONFLICT (edit_id, user_id) DO UPDATE SET vote = $3, created_at = now()
             RETURNING edit_id, user_id, vote, created_at",
        )
        .bind(edit_id)
        .bind(user_id)
        .bind(vote.as_str())
        .fetch_one(conn)
        .await
    }

    pub async fn list_votes(
        conn: &mut PgConnection,
        edit_id: Id,
    ) -> Result<Vec<EditVote>, sqlx::Error> {
        sqlx::query_as::<_, EditVote>(
            "SELECT edit_id, user_id, vote, created_at
             FROM edit_votes WHERE edit_id = $1
             ORDER BY created_at ASC",
        )
        .bind(edit_id)
        .fetch_all(conn)
        .await
    }

    /// Clear all votes. Used when a pending edit's payload changes.
    pub async fn reset_votes(conn: &mut PgConnection, edit_id: Id) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM edit_votes WHERE edit_id = $1")
            .bind(edit_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // --- comments ---

    pub async fn create_comment(
        conn: &mut PgConnection,
        id: Id,
        edit_id: Id,
        user_id: Id,
        text: &str,
    ) -> Result<EditComment, sqlx::Error> {
        sqlx::query_as::<_, EditComment>(
            "INSERT INTO edit_comments (id, edit_id, user_id, text)
             VALUES ($1, $2, $3, $4)
             RETURNING id, edit_id, user_id, text, created_at",
        )
        .bind(id)
        .bind(edit_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(conn)
        .await
    }

    pub async fn list_comments(
        conn: &mut PgConnection,
        edit_id: Id,
    ) -> Result<Vec<EditComment>, sqlx::Error> {
        sqlx::query_as::<_, EditComment>(
            "SELECT id, edit_id, user_id, text, created_at
             FROM edit_comments WHERE edit_id = $1
             ORDER BY created_at ASC",
        )
        .bind(edit_id)
        .fetch_all(conn)
        .await
    }
}
