//! Tag edit processor: builds tag payloads at proposal time and replays
//! them at apply time.

use sqlx::PgConnection;

use curio_core::data::{EditData, TagChanges, TagEditData};
use curio_core::diff::diff_slices;
use curio_core::edit::{Operation, TargetType};
use curio_core::error::CoreError;
use curio_core::snapshot;
use curio_core::types::{new_id, Id};
use curio_db::models::edit::Edit;
use curio_db::models::tag::{CreateTag, Tag};
use curio_db::repositories::TagRepo;

use crate::error::EditError;
use crate::input::{TagDetailsInput, TagEditInput};
use crate::mutator::{self, BuiltEdit};
use crate::validate;

pub struct TagProcessor;

impl TagProcessor {
    /// Build the payload and link list for a tag edit request.
    pub async fn build(
        conn: &mut PgConnection,
        input: &TagEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let edit = &input.edit;
        validate::validate_operation(edit.operation, edit.id, &edit.merge_source_ids)?;

        match edit.operation {
            Operation::Create => Self::build_create(input),
            Operation::Modify => {
                let target = edit.id.ok_or(CoreError::TargetIdMissing)?;
                Self::build_modify(conn, target, input).await
            }
            Operation::Destroy => {
                let target = edit.id.ok_or(CoreError::TargetIdMissing)?;
                Self::build_destroy(conn, target).await
            }
            Operation::Merge => {
                let target = edit.id.ok_or(CoreError::MergeIdMissing)?;
                Self::build_merge(conn, target, input).await
            }
        }
    }

    fn build_create(input: &TagEditInput) -> Result<BuiltEdit, EditError> {
        let details = input.details.clone().unwrap_or_default();
        let name = details
            .name
            .as_set()
            .cloned()
            .ok_or(CoreError::MissingRequiredField("name"))?;

        let new = TagChanges {
            name: Some(name),
            description: details.description.as_set().cloned(),
            added_aliases: mutator::dedup(&details.aliases.unwrap_or_default()),
            ..Default::default()
        };
        Ok(BuiltEdit {
            data: EditData::Tag(TagEditData {
                new,
                old: None,
                merge_sources: vec![],
                create_id: Some(input.edit.id.unwrap_or_else(new_id)),
            }),
            links: vec![],
        })
    }

    async fn build_modify(
        conn: &mut PgConnection,
        target: Id,
        input: &TagEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let tag = Self::fetch_live(conn, target).await?;
        let details = input.details.clone().unwrap_or_default();
        let (old, new, changed) = Self::diff_details(conn, &tag, &details).await?;
        if !changed {
            return Err(CoreError::NoChanges.into());
        }

        Ok(BuiltEdit {
            data: EditData::Tag(TagEditData {
                new,
                old: Some(old),
                merge_sources: vec![],
                create_id: None,
            }),
            links: vec![target],
        })
    }

    async fn build_destroy(conn: &mut PgConnection, target: Id) -> Result<BuiltEdit, EditError> {
        Self::fetch_live(conn, target).await?;
        Ok(BuiltEdit {
            data: EditData::Tag(TagEditData::default()),
            links: vec![target],
        })
    }

    async fn build_merge(
        conn: &mut PgConnection,
        target: Id,
        input: &TagEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let tag = Self::fetch_live(conn, target).await?;
        let sources = mutator::dedup(&input.edit.merge_source_ids);
        for &source in &sources {
            Self::fetch_live(conn, source).await?;
        }

        // A merge may fold a modification of the target into the same
        // edit; an unchanged target is fine here.
        let details = input.details.clone().unwrap_or_default();
        let (old, new, _) = Self::diff_details(conn, &tag, &details).await?;

        let mut links = vec![target];
        links.extend(&sources);
        Ok(BuiltEdit {
            data: EditData::Tag(TagEditData {
                new,
                old: Some(old),
                merge_sources: sources,
                create_id: None,
            }),
            links,
        })
    }

    async fn diff_details(
        conn: &mut PgConnection,
        tag: &Tag,
        details: &TagDetailsInput,
    ) -> Result<(TagChanges, TagChanges, bool), EditError> {
        let (old_name, new_name) = snapshot::diff_required(&tag.name, &details.name);
        let (old_desc, new_desc) =
            snapshot::diff_option(tag.description.as_ref(), &details.description);

        let (added_aliases, removed_aliases) = match &details.aliases {
            Some(desired) => {
                let current = TagRepo::list_aliases(conn, tag.id).await?;
                diff_slices(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };

        let changed = snapshot::is_changed(&old_name, &new_name)
            || snapshot::is_changed(&old_desc, &new_desc)
            || !added_aliases.is_empty()
            || !removed_aliases.is_empty();

        let old = TagChanges {
            name: old_name,
            description: old_desc,
            ..Default::default()
        };
        let new = TagChanges {
            name: new_name,
            description: new_desc,
            added_aliases,
            removed_aliases,
        };
        Ok((old, new, changed))
    }

    /// Apply an accepted tag edit. Returns the id of a newly created
    /// tag, if any.
    pub async fn apply(conn: &mut PgConnection, edit: &Edit) -> Result<Option<Id>, EditError> {
        let EditData::Tag(data) = edit.decode_data()? else {
            return Err(CoreError::PayloadMismatch.into());
        };

        match edit.operation()? {
            Operation::Create => Self::apply_create(conn, edit, &data).await.map(Some),
            Operation::Modify => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Tag, &[]).await?;
                Self::apply_modify(conn, target, &data).await?;
                Ok(None)
            }
            Operation::Destroy => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Tag, &[]).await?;
                Self::fetch_live(conn, target).await?;
                TagRepo::delete_scene_tags(conn, target).await?;
                TagRepo::soft_delete(conn, target).await?;
                Ok(None)
            }
            Operation::Merge => {
                let target = mutator::linked_target_id(
                    conn,
                    edit.id,
                    TargetType::Tag,
                    &data.merge_sources,
                )
                .await?;
                Self::apply_modify(conn, target, &data).await?;
                for &source in &data.merge_sources {
                    Self::absorb(conn, source, target).await?;
                }
                Ok(None)
            }
        }
    }

    async fn apply_create(
        conn: &mut PgConnection,
        edit: &Edit,
        data: &TagEditData,
    ) -> Result<Id, EditError> {
        let id = data.create_id.unwrap_or(edit.id);
        let name = data
            .new
            .name
            .clone()
            .ok_or(CoreError::MissingRequiredField("name"))?;
        TagRepo::create(
            conn,
            &CreateTag {
                id,
                name,
                description: data.new.description.clone(),
            },
        )
        .await?;
        for alias in &data.new.added_aliases {
            TagRepo::add_alias(conn, id, alias).await?;
        }
        Ok(id)
    }

    async fn apply_modify(
        conn: &mut PgConnection,
        target: Id,
        data: &TagEditData,
    ) -> Result<(), EditError> {
        let tag = Self::fetch_live(conn, target).await?;

        if let Some(old) = &data.old {
            snapshot::guard_required("name", old.name.as_ref(), &tag.name)?;
            snapshot::guard_option(
                "description",
                old.description.as_ref(),
                tag.description.as_ref(),
            )?;
        }

        let name = data.new.name.clone().unwrap_or_else(|| tag.name.clone());
        let old_desc = data.old.as_ref().and_then(|o| o.description.clone());
        let description =
            snapshot::apply_option(tag.description.clone(), &old_desc, &data.new.description);
        TagRepo::update(conn, target, &name, description.as_deref()).await?;

        for alias in &data.new.removed_aliases {
            TagRepo::remove_alias(conn, target, alias).await?;
        }
        for alias in &data.new.added_aliases {
            TagRepo::add_alias(conn, target, alias).await?;
        }
        Ok(())
    }

    /// Fold one merge source into the target: move its scene links,
    /// soft-delete it, and leave a redirect behind.
    async fn absorb(conn: &mut PgConnection, source: Id, target: Id) -> Result<(), EditError> {
        Self::fetch_live(conn, source).await?;
        TagRepo::reassign_scene_tags(conn, source, target).await?;
        TagRepo::soft_delete(conn, source).await?;
        TagRepo::create_redirect(conn, source, target).await?;
        TagRepo::repoint_redirects(conn, source, target).await?;
        Ok(())
    }

    async fn fetch_live(conn: &mut PgConnection, id: Id) -> Result<Tag, EditError> {
        let tag = TagRepo::find_by_id(conn, id)
            .await?
            .ok_or(CoreError::EntityNotFound { kind: "tag", id })?;
        if tag.deleted {
            return Err(CoreError::EntityDeleted { kind: "tag", id }.into());
        }
        Ok(tag)
    }
}
