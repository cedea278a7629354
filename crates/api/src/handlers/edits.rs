//! Handlers for the edit workflow.
//!
//! Provides endpoints for proposing and amending edits on each entity
//! type, voting, cancelling, administrative application, comments, and
//! read access to an edit's state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curio_core::edit::{TargetType, VoteType};
use curio_core::types::Id;
use curio_db::models::edit::{Edit, EditComment, EditVote};
use curio_edits::input::{PerformerEditInput, SceneEditInput, StudioEditInput, TagEditInput};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn require_edit_role(auth: &AuthUser) -> Result<(), AppError> {
    if !auth.as_edit_user().can_edit() {
        return Err(AppError::Forbidden(
            "You do not have permission to submit edits".into(),
        ));
    }
    Ok(())
}

/// POST /api/v1/edits/tags
///
/// Propose a tag edit (create, modify, destroy, or merge).
pub async fn create_tag_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<TagEditInput>,
) -> AppResult<impl IntoResponse> {
    require_edit_role(&auth)?;
    let edit = state.edits.tag_edit(&auth.as_edit_user(), &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: edit })))
}

/// PUT /api/v1/edits/tags/{edit_id}
///
/// Amend a pending tag edit. Only the creator may amend, and only a
/// limited number of times; all votes are reset.
pub async fn update_tag_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
    Json(input): Json<TagEditInput>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state
        .edits
        .tag_edit_update(&auth.as_edit_user(), edit_id, &input)
        .await?;
    Ok(Json(DataResponse { data: edit }))
}

/// POST /api/v1/edits/performers
pub async fn create_performer_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PerformerEditInput>,
) -> AppResult<impl IntoResponse> {
    require_edit_role(&auth)?;
    let edit = state
        .edits
        .performer_edit(&auth.as_edit_user(), &input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: edit })))
}

/// PUT /api/v1/edits/performers/{edit_id}
pub async fn update_performer_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
    Json(input): Json<PerformerEditInput>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state
        .edits
        .performer_edit_update(&auth.as_edit_user(), edit_id, &input)
        .await?;
    Ok(Json(DataResponse { data: edit }))
}

/// POST /api/v1/edits/studios
pub async fn create_studio_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<StudioEditInput>,
) -> AppResult<impl IntoResponse> {
    require_edit_role(&auth)?;
    let edit = state
        .edits
        .studio_edit(&auth.as_edit_user(), &input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: edit })))
}

/// PUT /api/v1/edits/studios/{edit_id}
pub async fn update_studio_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
    Json(input): Json<StudioEditInput>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state
        .edits
        .studio_edit_update(&auth.as_edit_user(), edit_id, &input)
        .await?;
    Ok(Json(DataResponse { data: edit }))
}

/// POST /api/v1/edits/scenes
pub async fn create_scene_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SceneEditInput>,
) -> AppResult<impl IntoResponse> {
    require_edit_role(&auth)?;
    let edit = state.edits.scene_edit(&auth.as_edit_user(), &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: edit })))
}

/// PUT /api/v1/edits/scenes/{edit_id}
pub async fn update_scene_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
    Json(input): Json<SceneEditInput>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state
        .edits
        .scene_edit_update(&auth.as_edit_user(), edit_id, &input)
        .await?;
    Ok(Json(DataResponse { data: edit }))
}

/// GET /api/v1/edits/{edit_id}
pub async fn get_edit(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state.edits.get_edit(edit_id).await?;
    Ok(Json(DataResponse { data: edit }))
}

/// Query parameters for listing the edits attached to an entity.
#[derive(Debug, Deserialize)]
pub struct ListEditsQuery {
    pub target_type: TargetType,
    pub entity_id: Id,
}

/// GET /api/v1/edits?target_type=TAG&entity_id={id}
///
/// List edits linked to an entity, newest first.
pub async fn list_edits(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListEditsQuery>,
) -> AppResult<Json<DataResponse<Vec<Edit>>>> {
    let edits = state
        .edits
        .list_edits_for_entity(query.target_type, query.entity_id)
        .await?;
    Ok(Json(DataResponse { data: edits }))
}

/// Request body for casting a vote.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote: VoteType,
}

/// POST /api/v1/edits/{edit_id}/vote
///
/// Cast or change a vote. Immediate votes require the admin role and
/// close the edit at once; regular votes may trigger early resolution
/// when the unanimity threshold is met.
pub async fn vote(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
    Json(input): Json<VoteRequest>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state
        .edits
        .vote(&auth.as_edit_user(), edit_id, input.vote)
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        %edit_id,
        vote = %input.vote,
        status = %edit.status,
        "Vote recorded"
    );

    Ok(Json(DataResponse { data: edit }))
}

/// POST /api/v1/edits/{edit_id}/cancel
///
/// Cancel a pending edit. The creator withdraws it; an admin rejects it
/// immediately.
pub async fn cancel_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state.edits.cancel_edit(&auth.as_edit_user(), edit_id).await?;
    Ok(Json(DataResponse { data: edit }))
}

/// POST /api/v1/edits/{edit_id}/apply
///
/// Apply a pending edit immediately, bypassing the vote threshold.
/// Admin only.
pub async fn apply_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
) -> AppResult<Json<DataResponse<Edit>>> {
    let edit = state.edits.apply_edit(&auth.as_edit_user(), edit_id).await?;

    tracing::info!(
        user_id = %auth.user_id,
        %edit_id,
        status = %edit.status,
        "Edit applied by admin"
    );

    Ok(Json(DataResponse { data: edit }))
}

/// Request body for commenting on an edit.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// POST /api/v1/edits/{edit_id}/comments
pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
    Json(input): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Comment text must not be empty".into()));
    }

    let comment = state
        .edits
        .comment(&auth.as_edit_user(), edit_id, text)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// GET /api/v1/edits/{edit_id}/comments
pub async fn list_comments(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
) -> AppResult<Json<DataResponse<Vec<EditComment>>>> {
    let comments = state.edits.list_comments(edit_id).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// GET /api/v1/edits/{edit_id}/votes
pub async fn list_votes(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(edit_id): Path<Id>,
) -> AppResult<Json<DataResponse<Vec<EditVote>>>> {
    let votes = state.edits.list_votes(edit_id).await?;
    Ok(Json(DataResponse { data: votes }))
}
