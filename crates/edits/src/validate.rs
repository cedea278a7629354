//! Validation shared across the per-entity processors.

use sqlx::PgConnection;

use curio_core::data::UrlRef;
use curio_core::edit::{EditStatus, Operation};
use curio_core::error::CoreError;
use curio_core::types::Id;
use curio_db::models::edit::Edit;
use curio_db::repositories::{ImageRepo, SiteRepo};

use crate::error::EditError;
use crate::user::EditUser;

/// Operation-level input checks that do not touch the database.
pub fn validate_operation(
    operation: Operation,
    target_id: Option<Id>,
    merge_source_ids: &[Id],
) -> Result<(), CoreError> {
    match operation {
        Operation::Create => Ok(()),
        Operation::Modify | Operation::Destroy => {
            target_id.map(|_| ()).ok_or(CoreError::TargetIdMissing)
        }
        Operation::Merge => {
            let target = target_id.ok_or(CoreError::MergeIdMissing)?;
            validate_merge_sources(target, merge_source_ids)
        }
    }
}

/// Merge sources must be non-empty and must not include the target.
pub fn validate_merge_sources(target_id: Id, sources: &[Id]) -> Result<(), CoreError> {
    if sources.is_empty() {
        return Err(CoreError::NoMergeSources);
    }
    if sources.contains(&target_id) {
        return Err(CoreError::MergeTargetIsSource);
    }
    Ok(())
}

/// Every URL must reference a known site.
pub async fn validate_urls(
    conn: &mut PgConnection,
    urls: &[UrlRef],
) -> Result<(), EditError> {
    for url in urls {
        if !SiteRepo::exists(conn, url.site_id).await? {
            return Err(CoreError::InvalidSite(url.site_id).into());
        }
    }
    Ok(())
}

/// Every image id must exist.
pub async fn validate_image_ids(conn: &mut PgConnection, ids: &[Id]) -> Result<(), EditError> {
    for &id in ids {
        if !ImageRepo::exists(conn, id).await? {
            return Err(CoreError::InvalidImage(id).into());
        }
    }
    Ok(())
}

/// Votes and updates only touch pending edits.
pub fn validate_pending(edit: &Edit) -> Result<(), CoreError> {
    if edit.status()? != EditStatus::Pending {
        return Err(CoreError::ClosedEdit);
    }
    Ok(())
}

/// An update must come from the creator, target a pending edit, and
/// stay within the per-edit update budget.
pub fn validate_update(edit: &Edit, user: &EditUser, update_limit: i32) -> Result<(), CoreError> {
    validate_pending(edit)?;
    if edit.user_id != user.id {
        return Err(CoreError::UnauthorizedUpdate);
    }
    if edit.update_count >= update_limit {
        return Err(CoreError::UpdateLimit);
    }
    Ok(())
}
