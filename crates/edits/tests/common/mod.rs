//! Shared fixtures for edit-workflow integration tests.
//!
//! Users, entities, and the service itself are created through the
//! repository layer; scenarios then run against the public service API.

#![allow(dead_code)]

use chrono::Duration;
use curio_core::edit::Operation;
use curio_core::field::FieldUpdate;
use curio_core::types::{new_id, Id};
use curio_core::voting::VotingPolicy;
use curio_db::models::user::{roles, CreateUser};
use curio_db::repositories::UserRepo;
use curio_db::DbPool;
use curio_edits::input::{EditInput, TagDetailsInput, TagEditInput};
use curio_edits::{EditService, EditUser, ModerationPolicy};

/// Insert a user with the given roles and return the service-side view.
pub async fn seed_user(pool: &DbPool, name: &str, user_roles: &[&str]) -> EditUser {
    let mut conn = pool.acquire().await.unwrap();
    let user = UserRepo::create(
        &mut conn,
        &CreateUser {
            id: new_id(),
            name: name.to_string(),
            email: None,
        },
    )
    .await
    .unwrap();
    for role in user_roles {
        UserRepo::grant_role(&mut conn, user.id, role).await.unwrap();
    }
    EditUser::new(user.id, user_roles.iter().map(|r| r.to_string()).collect())
}

pub async fn seed_editor(pool: &DbPool, name: &str) -> EditUser {
    seed_user(pool, name, &[roles::READ, roles::EDIT]).await
}

pub async fn seed_voter(pool: &DbPool, name: &str) -> EditUser {
    seed_user(pool, name, &[roles::READ, roles::VOTE]).await
}

pub async fn seed_admin(pool: &DbPool, name: &str) -> EditUser {
    seed_user(pool, name, &[roles::READ, roles::ADMIN]).await
}

/// Policy used by most tests: unanimity at two votes, no destructive
/// grace period so merges and destroys resolve as soon as the tally
/// allows.
pub fn test_policy() -> ModerationPolicy {
    ModerationPolicy {
        voting: VotingPolicy {
            application_threshold: 2,
            voting_period: Duration::days(4),
            destructive_voting_period: Duration::zero(),
        },
        edit_update_limit: 1,
        vote_promotion_threshold: 10,
    }
}

/// Build a service backed by `pool`, seeding the system user that
/// authors failure comments.
pub async fn build_service(pool: &DbPool, policy: ModerationPolicy) -> EditService {
    let system = seed_user(pool, "system", &[]).await;
    EditService::new(pool.clone(), policy, system.id)
}

pub async fn test_service(pool: &DbPool) -> EditService {
    build_service(pool, test_policy()).await
}

pub fn edit_input(operation: Operation, id: Option<Id>) -> EditInput {
    EditInput {
        operation,
        id,
        merge_source_ids: Vec::new(),
        comment: None,
        bot: false,
    }
}

pub fn tag_create_input(name: &str, aliases: &[&str]) -> TagEditInput {
    TagEditInput {
        edit: edit_input(Operation::Create, None),
        details: Some(TagDetailsInput {
            name: FieldUpdate::Set(name.to_string()),
            description: FieldUpdate::Unset,
            aliases: Some(aliases.iter().map(|a| a.to_string()).collect()),
        }),
    }
}

pub fn tag_modify_input(id: Id, details: TagDetailsInput) -> TagEditInput {
    TagEditInput {
        edit: edit_input(Operation::Modify, Some(id)),
        details: Some(details),
    }
}

pub fn tag_destroy_input(id: Id) -> TagEditInput {
    TagEditInput {
        edit: edit_input(Operation::Destroy, Some(id)),
        details: None,
    }
}

pub fn tag_merge_input(target: Id, sources: &[Id], details: TagDetailsInput) -> TagEditInput {
    TagEditInput {
        edit: EditInput {
            operation: Operation::Merge,
            id: Some(target),
            merge_source_ids: sources.to_vec(),
            comment: None,
            bot: false,
        },
        details: Some(details),
    }
}
