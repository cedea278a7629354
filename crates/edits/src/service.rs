//! The edit service: proposal, voting, application, and the sweep.
//!
//! Every mutating operation here runs in one transaction, taking a row
//! lock on the edit before changing its state. An edit therefore moves
//! out of PENDING exactly once, no matter how many voters or sweeps
//! race on it.

use chrono::Utc;
use sqlx::PgConnection;

use curio_core::edit::{EditStatus, Operation, TargetType, VoteType};
use curio_core::error::CoreError;
use curio_core::types::{new_id, Id};
use curio_core::voting::{self, VoteOutcome, VoteTally, VotingPolicy};
use curio_db::models::edit::{CreateEdit, Edit, EditComment, EditVote};
use curio_db::repositories::EditRepo;
use curio_db::DbPool;

use crate::error::EditError;
use crate::input::{EditInput, PerformerEditInput, SceneEditInput, StudioEditInput, TagEditInput};
use crate::mutator::BuiltEdit;
use crate::performer::PerformerProcessor;
use crate::promotion::{self, PromotionHandle};
use crate::scene::SceneProcessor;
use crate::studio::StudioProcessor;
use crate::tag::TagProcessor;
use crate::user::EditUser;
use crate::validate;

/// Moderation tunables.
#[derive(Debug, Clone)]
pub struct ModerationPolicy {
    pub voting: VotingPolicy,
    /// How many times a creator may amend a pending edit.
    pub edit_update_limit: i32,
    /// Applied edits needed to earn the vote role.
    pub vote_promotion_threshold: i64,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            voting: VotingPolicy::default(),
            edit_update_limit: 1,
            vote_promotion_threshold: 10,
        }
    }
}

pub struct EditService {
    pool: DbPool,
    policy: ModerationPolicy,
    /// Author of failure comments.
    system_user_id: Id,
    promotion: Option<PromotionHandle>,
}

impl EditService {
    pub fn new(pool: DbPool, policy: ModerationPolicy, system_user_id: Id) -> Self {
        Self {
            pool,
            policy,
            system_user_id,
            promotion: None,
        }
    }

    /// Route promotion checks through a background worker instead of
    /// running them inline.
    pub fn with_promotion(mut self, handle: PromotionHandle) -> Self {
        self.promotion = Some(handle);
        self
    }

    pub fn policy(&self) -> &ModerationPolicy {
        &self.policy
    }

    // --- proposal ---

    pub async fn tag_edit(
        &self,
        user: &EditUser,
        input: &TagEditInput,
    ) -> Result<Edit, EditError> {
        self.check_bot(user, input.edit.bot)?;
        let mut tx = self.pool.begin().await?;
        let built = TagProcessor::build(&mut *tx, input).await?;
        let edit = self
            .insert_edit(&mut *tx, user, TargetType::Tag, &input.edit, built)
            .await?;
        tx.commit().await?;
        tracing::info!(edit_id = %edit.id, operation = %edit.operation, "tag edit created");
        Ok(edit)
    }

    pub async fn performer_edit(
        &self,
        user: &EditUser,
        input: &PerformerEditInput,
    ) -> Result<Edit, EditError> {
        self.check_bot(user, input.edit.bot)?;
        let mut tx = self.pool.begin().await?;
        let built = PerformerProcessor::build(&mut *tx, input).await?;
        let edit = self
            .insert_edit(&mut *tx, user, TargetType::Performer, &input.edit, built)
            .await?;
        tx.commit().await?;
        tracing::info!(edit_id = %edit.id, operation = %edit.operation, "performer edit created");
        Ok(edit)
    }

    pub async fn studio_edit(
        &self,
        user: &EditUser,
        input: &StudioEditInput,
    ) -> Result<Edit, EditError> {
        self.check_bot(user, input.edit.bot)?;
        let mut tx = self.pool.begin().await?;
        let built = StudioProcessor::build(&mut *tx, input).await?;
        let edit = self
            .insert_edit(&mut *tx, user, TargetType::Studio, &input.edit, built)
            .await?;
        tx.commit().await?;
        tracing::info!(edit_id = %edit.id, operation = %edit.operation, "studio edit created");
        Ok(edit)
    }

    pub async fn scene_edit(
        &self,
        user: &EditUser,
        input: &SceneEditInput,
    ) -> Result<Edit, EditError> {
        self.check_bot(user, input.edit.bot)?;
        let mut tx = self.pool.begin().await?;
        let built = SceneProcessor::build(&mut *tx, input).await?;
        let edit = self
            .insert_edit(&mut *tx, user, TargetType::Scene, &input.edit, built)
            .await?;
        tx.commit().await?;
        tracing::info!(edit_id = %edit.id, operation = %edit.operation, "scene edit created");
        Ok(edit)
    }

    // --- amendment ---

    pub async fn tag_edit_update(
        &self,
        user: &EditUser,
        edit_id: Id,
        input: &TagEditInput,
    ) -> Result<Edit, EditError> {
        let mut tx = self.pool.begin().await?;
        let edit = self
            .lock_for_update(&mut *tx, user, edit_id, TargetType::Tag, input.edit.operation)
            .await?;
        let built = TagProcessor::build(&mut *tx, input).await?;
        let edit = self.replace_edit_data(&mut *tx, &edit, built).await?;
        tx.commit().await?;
        Ok(edit)
    }

    pub async fn performer_edit_update(
        &self,
        user: &EditUser,
        edit_id: Id,
        input: &PerformerEditInput,
    ) -> Result<Edit, EditError> {
        let mut tx = self.pool.begin().await?;
        let edit = self
            .lock_for_update(
                &mut *tx,
                user,
                edit_id,
                TargetType::Performer,
                input.edit.operation,
            )
            .await?;
        let built = PerformerProcessor::build(&mut *tx, input).await?;
        let edit = self.replace_edit_data(&mut *tx, &edit, built).await?;
        tx.commit().await?;
        Ok(edit)
    }

    pub async fn studio_edit_update(
        &self,
        user: &EditUser,
        edit_id: Id,
        input: &StudioEditInput,
    ) -> Result<Edit, EditError> {
        let mut tx = self.pool.begin().await?;
        let edit = self
            .lock_for_update(
                &mut *tx,
                user,
                edit_id,
                TargetType::Studio,
                input.edit.operation,
            )
            .await?;
        let built = StudioProcessor::build(&mut *tx, input).await?;
        let edit = self.replace_edit_data(&mut *tx, &edit, built).await?;
        tx.commit().await?;
        Ok(edit)
    }

    pub async fn scene_edit_update(
        &self,
        user: &EditUser,
        edit_id: Id,
        input: &SceneEditInput,
    ) -> Result<Edit, EditError> {
        let mut tx = self.pool.begin().await?;
        let edit = self
            .lock_for_update(
                &mut *tx,
                user,
                edit_id,
                TargetType::Scene,
                input.edit.operation,
            )
            .await?;
        let built = SceneProcessor::build(&mut *tx, input).await?;
        let edit = self.replace_edit_data(&mut *tx, &edit, built).await?;
        tx.commit().await?;
        Ok(edit)
    }

    // --- voting ---

    /// Record a vote and resolve the edit if the tally now settles it.
    pub async fn vote(
        &self,
        user: &EditUser,
        edit_id: Id,
        vote: VoteType,
    ) -> Result<Edit, EditError> {
        if !user.can_vote() {
            return Err(CoreError::UnauthorizedVote.into());
        }
        let immediate = matches!(vote, VoteType::ImmediateAccept | VoteType::ImmediateReject);
        if immediate && !user.is_admin() {
            return Err(CoreError::UnauthorizedVote.into());
        }

        let mut tx = self.pool.begin().await?;
        let edit = EditRepo::find_by_id_for_update(&mut *tx, edit_id)
            .await?
            .ok_or(CoreError::EditNotFound)?;
        validate::validate_pending(&edit)?;
        if edit.user_id == user.id {
            return Err(CoreError::OwnEditVote.into());
        }
        EditRepo::upsert_vote(&mut *tx, edit_id, user.id, vote).await?;

        let outcome = match vote {
            VoteType::ImmediateAccept => Some(VoteOutcome::Accept),
            VoteType::ImmediateReject => Some(VoteOutcome::Reject),
            VoteType::Accept | VoteType::Reject => {
                let votes = EditRepo::list_votes(&mut *tx, edit_id).await?;
                let parsed: Vec<VoteType> = votes
                    .iter()
                    .map(|v| v.vote())
                    .collect::<Result<_, _>>()?;
                let tally = VoteTally::tally(&parsed);
                let age = Utc::now() - edit.created_at;
                voting::resolve_threshold(
                    &self.policy.voting,
                    tally,
                    edit.is_destructive()?,
                    age,
                )
            }
        };

        match outcome {
            None => {
                let edit = EditRepo::find_by_id(&mut *tx, edit_id)
                    .await?
                    .ok_or(CoreError::EditNotFound)?;
                tx.commit().await?;
                Ok(edit)
            }
            Some(VoteOutcome::Reject) => {
                let status = if immediate {
                    EditStatus::ImmediateRejected
                } else {
                    EditStatus::Rejected
                };
                let edit = Self::transition(&mut tx, edit_id, status).await?;
                tx.commit().await?;
                tracing::info!(%edit_id, status = %status, "edit rejected by vote");
                Ok(edit)
            }
            Some(VoteOutcome::Accept) => self.accept_in_tx(tx, edit, immediate).await,
        }
    }

    /// Cancel a pending edit. The creator withdraws it; an admin
    /// rejects it outright, recording an immediate-reject vote.
    pub async fn cancel_edit(&self, user: &EditUser, edit_id: Id) -> Result<Edit, EditError> {
        let mut tx = self.pool.begin().await?;
        let edit = EditRepo::find_by_id_for_update(&mut *tx, edit_id)
            .await?
            .ok_or(CoreError::EditNotFound)?;
        validate::validate_pending(&edit)?;

        let status = if edit.user_id == user.id {
            EditStatus::Canceled
        } else if user.is_admin() {
            EditRepo::upsert_vote(&mut *tx, edit_id, user.id, VoteType::ImmediateReject).await?;
            EditStatus::ImmediateRejected
        } else {
            return Err(CoreError::UnauthorizedUpdate.into());
        };

        let edit = Self::transition(&mut tx, edit_id, status).await?;
        tx.commit().await?;
        tracing::info!(%edit_id, status = %status, "edit canceled");
        Ok(edit)
    }

    /// Apply a pending edit right away. Admin only; records an
    /// immediate-accept vote.
    pub async fn apply_edit(&self, user: &EditUser, edit_id: Id) -> Result<Edit, EditError> {
        if !user.is_admin() {
            return Err(CoreError::UnauthorizedVote.into());
        }
        let mut tx = self.pool.begin().await?;
        let edit = EditRepo::find_by_id_for_update(&mut *tx, edit_id)
            .await?
            .ok_or(CoreError::EditNotFound)?;
        validate::validate_pending(&edit)?;
        if edit.user_id != user.id {
            EditRepo::upsert_vote(&mut *tx, edit_id, user.id, VoteType::ImmediateAccept).await?;
        }
        self.accept_in_tx(tx, edit, true).await
    }

    // --- comments ---

    pub async fn comment(
        &self,
        user: &EditUser,
        edit_id: Id,
        text: &str,
    ) -> Result<EditComment, EditError> {
        let mut conn = self.pool.acquire().await?;
        EditRepo::find_by_id(&mut *conn, edit_id)
            .await?
            .ok_or(CoreError::EditNotFound)?;
        Ok(EditRepo::create_comment(&mut *conn, new_id(), edit_id, user.id, text).await?)
    }

    // --- reads ---

    pub async fn get_edit(&self, edit_id: Id) -> Result<Edit, EditError> {
        let mut conn = self.pool.acquire().await?;
        EditRepo::find_by_id(&mut *conn, edit_id)
            .await?
            .ok_or_else(|| CoreError::EditNotFound.into())
    }

    pub async fn list_votes(&self, edit_id: Id) -> Result<Vec<EditVote>, EditError> {
        let mut conn = self.pool.acquire().await?;
        Ok(EditRepo::list_votes(&mut *conn, edit_id).await?)
    }

    pub async fn list_comments(&self, edit_id: Id) -> Result<Vec<EditComment>, EditError> {
        let mut conn = self.pool.acquire().await?;
        Ok(EditRepo::list_comments(&mut *conn, edit_id).await?)
    }

    pub async fn list_edits_for_entity(
        &self,
        target_type: TargetType,
        entity_id: Id,
    ) -> Result<Vec<Edit>, EditError> {
        let mut conn = self.pool.acquire().await?;
        Ok(EditRepo::list_for_entity(&mut *conn, target_type, entity_id).await?)
    }

    // --- sweep ---

    /// Settle pending edits whose voting period has elapsed, and
    /// re-check destructive edits whose unanimous tally was waiting out
    /// the grace period. One edit failing does not stop the sweep.
    pub async fn close_completed_edits(&self) -> Result<(), EditError> {
        let now = Utc::now();

        let expired = {
            let mut conn = self.pool.acquire().await?;
            EditRepo::list_pending_created_before(&mut *conn, now - self.policy.voting.voting_period)
                .await?
        };
        for edit in expired {
            if let Err(err) = self.settle_expired(edit.id).await {
                tracing::warn!(edit_id = %edit.id, %err, "failed to settle expired edit");
            }
        }

        let aged = {
            let mut conn = self.pool.acquire().await?;
            EditRepo::list_pending_created_before(
                &mut *conn,
                now - self.policy.voting.destructive_voting_period,
            )
            .await?
        };
        for edit in aged {
            if let Err(err) = self.settle_threshold(edit.id).await {
                tracing::warn!(edit_id = %edit.id, %err, "failed to re-check aged edit");
            }
        }
        Ok(())
    }

    async fn settle_expired(&self, edit_id: Id) -> Result<(), EditError> {
        let mut tx = self.pool.begin().await?;
        let Some(edit) = EditRepo::find_by_id_for_update(&mut *tx, edit_id).await? else {
            return Ok(());
        };
        if !edit.is_pending()? {
            return Ok(());
        }

        let tally = self.tally_votes(&mut *tx, edit_id).await?;
        match voting::resolve_expired(tally, edit.is_destructive()?) {
            VoteOutcome::Accept => {
                self.accept_in_tx(tx, edit, false).await?;
            }
            VoteOutcome::Reject => {
                Self::transition(&mut tx, edit_id, EditStatus::Rejected).await?;
                tx.commit().await?;
                tracing::info!(%edit_id, "expired edit rejected");
            }
        }
        Ok(())
    }

    async fn settle_threshold(&self, edit_id: Id) -> Result<(), EditError> {
        let mut tx = self.pool.begin().await?;
        let Some(edit) = EditRepo::find_by_id_for_update(&mut *tx, edit_id).await? else {
            return Ok(());
        };
        if !edit.is_pending()? {
            return Ok(());
        }

        let tally = self.tally_votes(&mut *tx, edit_id).await?;
        let age = Utc::now() - edit.created_at;
        match voting::resolve_threshold(&self.policy.voting, tally, edit.is_destructive()?, age) {
            Some(VoteOutcome::Accept) => {
                self.accept_in_tx(tx, edit, false).await?;
            }
            Some(VoteOutcome::Reject) => {
                Self::transition(&mut tx, edit_id, EditStatus::Rejected).await?;
                tx.commit().await?;
            }
            None => {}
        }
        Ok(())
    }

    // --- internals ---

    fn check_bot(&self, user: &EditUser, bot: bool) -> Result<(), CoreError> {
        if bot && !user.can_submit_as_bot() {
            return Err(CoreError::UnauthorizedBot);
        }
        Ok(())
    }

    async fn insert_edit(
        &self,
        conn: &mut PgConnection,
        user: &EditUser,
        target_type: TargetType,
        input: &EditInput,
        built: BuiltEdit,
    ) -> Result<Edit, EditError> {
        let edit = EditRepo::create(
            conn,
            &CreateEdit {
                id: new_id(),
                user_id: user.id,
                target_type,
                operation: input.operation,
                bot: input.bot,
                data: built.data.encode()?,
            },
        )
        .await?;
        for &entity_id in &built.links {
            EditRepo::link_entity(conn, edit.id, target_type, entity_id).await?;
        }
        if let Some(text) = input.comment.as_deref().filter(|t| !t.trim().is_empty()) {
            EditRepo::create_comment(conn, new_id(), edit.id, user.id, text).await?;
        }
        Ok(edit)
    }

    async fn lock_for_update(
        &self,
        conn: &mut PgConnection,
        user: &EditUser,
        edit_id: Id,
        target_type: TargetType,
        operation: Operation,
    ) -> Result<Edit, EditError> {
        let edit = EditRepo::find_by_id_for_update(conn, edit_id)
            .await?
            .ok_or(CoreError::EditNotFound)?;
        validate::validate_update(&edit, user, self.policy.edit_update_limit)?;
        if edit.target_type()? != target_type || edit.operation()? != operation {
            return Err(CoreError::PayloadMismatch.into());
        }
        Ok(edit)
    }

    /// Swap in a rebuilt payload: votes reset, old links dropped and the
    /// rebuilt ones written, so an amendment that retargets the edit
    /// leaves exactly one set of link rows.
    async fn replace_edit_data(
        &self,
        conn: &mut PgConnection,
        edit: &Edit,
        built: BuiltEdit,
    ) -> Result<Edit, EditError> {
        let updated = EditRepo::update_data(conn, edit.id, &built.data.encode()?).await?;
        EditRepo::reset_votes(conn, edit.id).await?;
        let target_type = updated.target_type()?;
        EditRepo::unlink_entities(conn, edit.id, target_type).await?;
        for &entity_id in &built.links {
            EditRepo::link_entity(conn, edit.id, target_type, entity_id).await?;
        }
        tracing::info!(edit_id = %edit.id, update_count = updated.update_count, "edit amended");
        Ok(updated)
    }

    /// Move an edit out of PENDING. A racing transition that already
    /// closed the edit surfaces as `InvalidVoteStatus` carrying the
    /// status it holds now.
    async fn transition(
        conn: &mut PgConnection,
        edit_id: Id,
        status: EditStatus,
    ) -> Result<Edit, EditError> {
        match EditRepo::update_status(conn, edit_id, status).await? {
            Some(edit) => Ok(edit),
            None => {
                let current = EditRepo::find_by_id(conn, edit_id)
                    .await?
                    .ok_or(CoreError::EditNotFound)?;
                Err(CoreError::InvalidVoteStatus(current.status).into())
            }
        }
    }

    async fn tally_votes(
        &self,
        conn: &mut PgConnection,
        edit_id: Id,
    ) -> Result<VoteTally, EditError> {
        let votes = EditRepo::list_votes(conn, edit_id).await?;
        let parsed: Vec<VoteType> = votes.iter().map(|v| v.vote()).collect::<Result<_, _>>()?;
        Ok(VoteTally::tally(&parsed))
    }

    /// Apply the edit inside the given transaction and commit. On a
    /// domain failure the transaction rolls back and the edit is marked
    /// FAILED with an explanatory comment in a fresh transaction.
    async fn accept_in_tx(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        edit: Edit,
        immediate: bool,
    ) -> Result<Edit, EditError> {
        match self.apply_within(&mut *tx, &edit, immediate).await {
            Ok(applied) => {
                tx.commit().await?;
                tracing::info!(edit_id = %edit.id, status = %applied.status, "edit applied");
                self.queue_promotion(edit.user_id).await;
                Ok(applied)
            }
            Err(EditError::Core(err)) => {
                tx.rollback().await?;
                tracing::warn!(edit_id = %edit.id, %err, "edit application failed");
                self.fail_edit(edit.id, &err).await
            }
            Err(err) => Err(err),
        }
    }

    async fn apply_within(
        &self,
        conn: &mut PgConnection,
        edit: &Edit,
        immediate: bool,
    ) -> Result<Edit, EditError> {
        if edit.applied {
            return Err(CoreError::EditAlreadyApplied.into());
        }
        let target_type = edit.target_type()?;
        let created = match target_type {
            TargetType::Tag => TagProcessor::apply(conn, edit).await?,
            TargetType::Performer => PerformerProcessor::apply(conn, edit).await?,
            TargetType::Studio => StudioProcessor::apply(conn, edit).await?,
            TargetType::Scene => SceneProcessor::apply(conn, edit).await?,
        };
        if let Some(entity_id) = created {
            EditRepo::link_entity(conn, edit.id, target_type, entity_id).await?;
        }
        EditRepo::mark_applied(conn, edit.id).await?;
        let status = if immediate {
            EditStatus::ImmediateAccepted
        } else {
            EditStatus::Accepted
        };
        Self::transition(conn, edit.id, status).await
    }

    /// Record an apply failure: explanatory comment from the system
    /// user, then FAILED.
    async fn fail_edit(&self, edit_id: Id, err: &CoreError) -> Result<Edit, EditError> {
        let mut tx = self.pool.begin().await?;
        let text = format!("Edit application failed: {err}");
        EditRepo::create_comment(&mut *tx, new_id(), edit_id, self.system_user_id, &text).await?;
        let edit = Self::transition(&mut tx, edit_id, EditStatus::Failed).await?;
        tx.commit().await?;
        Ok(edit)
    }

    async fn queue_promotion(&self, user_id: Id) {
        match &self.promotion {
            Some(handle) => handle.notify(user_id),
            None => {
                let result = promotion::promote_user_vote_rights(
                    &self.pool,
                    user_id,
                    self.policy.vote_promotion_threshold,
                )
                .await;
                if let Err(err) = result {
                    tracing::warn!(%user_id, %err, "vote-right promotion failed");
                }
            }
        }
    }
}
