//! Edit, vote, and comment rows.

use serde::Serialize;
use sqlx::FromRow;

use curio_core::data::EditData;
use curio_core::edit::{EditStatus, Operation, TargetType, VoteType};
use curio_core::error::CoreError;
use curio_core::types::{Id, Timestamp};

/// A row from the `edits` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Edit {
    pub id: Id,
    pub user_id: Id,
    pub target_type: String,
    pub operation: String,
    pub status: String,
    pub bot: bool,
    pub data: serde_json::Value,
    pub applied: bool,
    pub update_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub closed_at: Option<Timestamp>,
}

impl Edit {
    pub fn status(&self) -> Result<EditStatus, CoreError> {
        self.status.parse().map_err(CoreError::InvalidStoredValue)
    }

    pub fn operation(&self) -> Result<Operation, CoreError> {
        self.operation
            .parse()
            .map_err(CoreError::InvalidStoredValue)
    }

    pub fn target_type(&self) -> Result<TargetType, CoreError> {
        self.target_type
            .parse()
            .map_err(CoreError::InvalidStoredValue)
    }

    /// Decode the stored payload, checking version and entity tag.
    pub fn decode_data(&self) -> Result<EditData, CoreError> {
        EditData::decode(self.data.clone(), self.target_type()?)
    }

    pub fn is_pending(&self) -> Result<bool, CoreError> {
        Ok(self.status()? == EditStatus::Pending)
    }

    /// Destructive for grace-period purposes: destroys, merges, and
    /// modifications that rename a performer without carrying the old
    /// name forward. A CREATE payload also has a new name and no old
    /// snapshot, so the rename check only runs for MODIFY.
    pub fn is_destructive(&self) -> Result<bool, CoreError> {
        let operation = self.operation()?;
        if operation.is_destructive() {
            return Ok(true);
        }
        Ok(operation == Operation::Modify && self.decode_data()?.is_destructive_rename())
    }
}

/// DTO for inserting a new edit.
#[derive(Debug, Clone)]
pub struct CreateEdit {
    pub id: Id,
    pub user_id: Id,
    pub target_type: TargetType,
    pub operation: Operation,
    pub bot: bool,
    pub data: serde_json::Value,
}

/// A row from the `edit_votes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EditVote {
    pub edit_id: Id,
    pub user_id: Id,
    pub vote: String,
    pub created_at: Timestamp,
}

impl EditVote {
    pub fn vote(&self) -> Result<VoteType, CoreError> {
        self.vote.parse().map_err(CoreError::InvalidStoredValue)
    }
}

/// A row from the `edit_comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EditComment {
    pub id: Id,
    pub edit_id: Id,
    pub user_id: Id,
    pub text: String,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use curio_core::data::{EditData, PerformerChanges, PerformerEditData};
    use curio_core::types::new_id;

    fn edit_row(operation: Operation, data: EditData) -> Edit {
        Edit {
            id: new_id(),
            user_id: new_id(),
            target_type: TargetType::Performer.as_str().to_string(),
            operation: operation.as_str().to_string(),
            status: EditStatus::Pending.as_str().to_string(),
            bot: false,
            data: data.encode().unwrap(),
            applied: false,
            update_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            closed_at: None,
        }
    }

    fn performer_data(old: Option<PerformerChanges>, new: PerformerChanges) -> EditData {
        EditData::Performer(PerformerEditData {
            new,
            old,
            ..Default::default()
        })
    }

    #[test]
    fn creates_are_not_destructive() {
        // A CREATE has a new name and no old snapshot; that alone must
        // not classify it as a destructive rename.
        let data = performer_data(
            None,
            PerformerChanges {
                name: Some("Jane Hart".into()),
                ..Default::default()
            },
        );
        let edit = edit_row(Operation::Create, data);
        assert!(!edit.is_destructive().unwrap());
    }

    #[test]
    fn renames_without_carryover_are_destructive() {
        let data = performer_data(
            Some(PerformerChanges {
                name: Some("Belle Nox".into()),
                ..Default::default()
            }),
            PerformerChanges {
                name: Some("Isabelle Nox".into()),
                ..Default::default()
            },
        );
        let edit = edit_row(Operation::Modify, data);
        assert!(edit.is_destructive().unwrap());
    }

    #[test]
    fn destroys_and_merges_are_destructive() {
        let data = performer_data(None, PerformerChanges::default());
        assert!(edit_row(Operation::Destroy, data.clone())
            .is_destructive()
            .unwrap());
        assert!(edit_row(Operation::Merge, data).is_destructive().unwrap());
    }
}
