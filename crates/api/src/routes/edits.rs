//! Route definitions for the edit workflow, mounted at `/edits`.
//!
//! ```text
//! POST   /tags                       create_tag_edit
//! PUT    /tags/{edit_id}             update_tag_edit
//! POST   /performers                 create_performer_edit
//! PUT    /performers/{edit_id}       update_performer_edit
//! POST   /studios                    create_studio_edit
//! PUT    /studios/{edit_id}          update_studio_edit
//! POST   /scenes                     create_scene_edit
//! PUT    /scenes/{edit_id}           update_scene_edit
//! GET    /                           list_edits (by target entity)
//! GET    /{edit_id}                  get_edit
//! POST   /{edit_id}/vote             vote
//! POST   /{edit_id}/cancel           cancel_edit
//! POST   /{edit_id}/apply            apply_edit
//! GET    /{edit_id}/votes            list_votes
//! POST   /{edit_id}/comments         create_comment
//! GET    /{edit_id}/comments         list_comments
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::edits;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", post(edits::create_tag_edit))
        .route("/tags/{edit_id}", put(edits::update_tag_edit))
        .route("/performers", post(edits::create_performer_edit))
        .route("/performers/{edit_id}", put(edits::update_performer_edit))
        .route("/studios", post(edits::create_studio_edit))
        .route("/studios/{edit_id}", put(edits::update_studio_edit))
        .route("/scenes", post(edits::create_scene_edit))
        .route("/scenes/{edit_id}", put(edits::update_scene_edit))
        .route("/", get(edits::list_edits))
        .route("/{edit_id}", get(edits::get_edit))
        .route("/{edit_id}/vote", post(edits::vote))
        .route("/{edit_id}/cancel", post(edits::cancel_edit))
        .route("/{edit_id}/apply", post(edits::apply_edit))
        .route("/{edit_id}/votes", get(edits::list_votes))
        .route(
            "/{edit_id}/comments",
            post(edits::create_comment).get(edits::list_comments),
        )
}
