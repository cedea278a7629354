//! Studio edit processor.

use sqlx::PgConnection;

use curio_core::data::{EditData, StudioChanges, StudioEditData, UrlRef};
use curio_core::diff::{diff_slices, diff_urls};
use curio_core::edit::{Operation, TargetType};
use curio_core::error::CoreError;
use curio_core::snapshot;
use curio_core::types::{new_id, Id};
use curio_db::models::edit::Edit;
use curio_db::models::studio::{CreateStudio, Studio};
use curio_db::repositories::StudioRepo;

use crate::error::EditError;
use crate::input::{StudioDetailsInput, StudioEditInput};
use crate::mutator::{self, BuiltEdit};
use crate::validate;

pub struct StudioProcessor;

impl StudioProcessor {
    pub async fn build(
        conn: &mut PgConnection,
        input: &StudioEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let edit = &input.edit;
        validate::validate_operation(edit.operation, edit.id, &edit.merge_source_ids)?;

        match edit.operation {
            Operation::Create => Self::build_create(conn, input).await,
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

    async fn build_create(
        conn: &mut PgConnection,
        input: &StudioEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let details = input.details.clone().unwrap_or_default();
        let name = details
            .name
            .as_set()
            .cloned()
            .ok_or(CoreError::MissingRequiredField("name"))?;

        let parent_id = details.parent_id.as_set().copied();
        if let Some(parent) = parent_id {
            Self::fetch_live(conn, parent)
                .await
                .map_err(|_| CoreError::InvalidStudio(parent))?;
        }
        let added_urls = mutator::dedup(&details.urls.clone().unwrap_or_default());
        validate::validate_urls(conn, &added_urls).await?;
        let added_images = mutator::dedup(&details.image_ids.clone().unwrap_or_default());
        validate::validate_image_ids(conn, &added_images).await?;

        let new = StudioChanges {
            name: Some(name),
            parent_id,
            added_aliases: mutator::dedup(&details.aliases.unwrap_or_default()),
            added_urls,
            added_images,
            ..Default::default()
        };
        Ok(BuiltEdit {
            data: EditData::Studio(StudioEditData {
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
        input: &StudioEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let studio = Self::fetch_live(conn, target).await?;
        let details = input.details.clone().unwrap_or_default();
        let (old, new, changed) = Self::diff_details(conn, &studio, &details).await?;
        if !changed {
            return Err(CoreError::NoChanges.into());
        }

        Ok(BuiltEdit {
            data: EditData::Studio(StudioEditData {
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
            data: EditData::Studio(StudioEditData::default()),
            links: vec![target],
        })
    }

    async fn build_merge(
        conn: &mut PgConnection,
        target: Id,
        input: &StudioEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let studio = Self::fetch_live(conn, target).await?;
        let sources = mutator::dedup(&input.edit.merge_source_ids);
        for &source in &sources {
            Self::fetch_live(conn, source).await?;
        }

        let details = input.details.clone().unwrap_or_default();
        let (old, new, _) = Self::diff_details(conn, &studio, &details).await?;

        let mut links = vec![target];
        links.extend(&sources);
        Ok(BuiltEdit {
            data: EditData::Studio(StudioEditData {
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
        studio: &Studio,
        details: &StudioDetailsInput,
    ) -> Result<(StudioChanges, StudioChanges, bool), EditError> {
        let (old_name, new_name) = snapshot::diff_required(&studio.name, &details.name);
        let (old_parent, new_parent) =
            snapshot::diff_option(studio.parent_studio_id.as_ref(), &details.parent_id);
        if let Some(parent) = new_parent {
            if parent == studio.id {
                return Err(CoreError::InvalidStudio(parent).into());
            }
            Self::fetch_live(conn, parent)
                .await
                .map_err(|_| CoreError::InvalidStudio(parent))?;
        }

        let (added_aliases, removed_aliases) = match &details.aliases {
            Some(desired) => {
                let current = StudioRepo::list_aliases(conn, studio.id).await?;
                diff_slices(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };

        let (added_urls, removed_urls) = match &details.urls {
            Some(desired) => {
                let current: Vec<UrlRef> = StudioRepo::list_urls(conn, studio.id)
                    .await?
                    .into_iter()
                    .map(|u| UrlRef { url: u.url, site_id: u.site_id })
                    .collect();
                diff_urls(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };
        validate::validate_urls(conn, &added_urls).await?;

        let (added_images, removed_images) = match &details.image_ids {
            Some(desired) => {
                let current = StudioRepo::list_image_ids(conn, studio.id).await?;
                diff_slices(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };
        validate::validate_image_ids(conn, &added_images).await?;

        let changed = snapshot::is_changed(&old_name, &new_name)
            || snapshot::is_changed(&old_parent, &new_parent)
            || !added_aliases.is_empty()
            || !removed_aliases.is_empty()
            || !added_urls.is_empty()
            || !removed_urls.is_empty()
            || !added_images.is_empty()
            || !removed_images.is_empty();

        let old = StudioChanges {
            name: old_name,
            parent_id: old_parent,
            ..Default::default()
        };
        let new = StudioChanges {
            name: new_name,
            parent_id: new_parent,
            added_aliases,
            removed_aliases,
            added_urls,
            removed_urls,
            added_images,
            removed_images,
        };
        Ok((old, new, changed))
    }

    /// Apply an accepted studio edit.
    pub async fn apply(conn: &mut PgConnection, edit: &Edit) -> Result<Option<Id>, EditError> {
        let EditData::Studio(data) = edit.decode_data()? else {
            return Err(CoreError::PayloadMismatch.into());
        };

        match edit.operation()? {
            Operation::Create => Self::apply_create(conn, edit, &data).await.map(Some),
            Operation::Modify => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Studio, &[]).await?;
                Self::apply_modify(conn, target, &data).await?;
                Ok(None)
            }
            Operation::Destroy => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Studio, &[]).await?;
                let studio = Self::fetch_live(conn, target).await?;
                StudioRepo::reassign_scenes(conn, target, None).await?;
                StudioRepo::reassign_children(conn, target, studio.parent_studio_id).await?;
                StudioRepo::delete_favorites(conn, target).await?;
                StudioRepo::soft_delete(conn, target).await?;
                Ok(None)
            }
            Operation::Merge => {
                let target = mutator::linked_target_id(
                    conn,
                    edit.id,
                    TargetType::Studio,
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
        data: &StudioEditData,
    ) -> Result<Id, EditError> {
        let id = data.create_id.unwrap_or(edit.id);
        let name = data
            .new
            .name
            .clone()
            .ok_or(CoreError::MissingRequiredField("name"))?;
        StudioRepo::create(
            conn,
            &CreateStudio {
                id,
                name,
                parent_studio_id: data.new.parent_id,
            },
        )
        .await?;
        Self::apply_relations(conn, id, data).await?;
        Ok(id)
    }

    async fn apply_modify(
        conn: &mut PgConnection,
        target: Id,
        data: &StudioEditData,
    ) -> Result<(), EditError> {
        let studio = Self::fetch_live(conn, target).await?;

        if let Some(old) = &data.old {
            snapshot::guard_required("name", old.name.as_ref(), &studio.name)?;
            snapshot::guard_option(
                "parent_id",
                old.parent_id.as_ref(),
                studio.parent_studio_id.as_ref(),
            )?;
        }

        let name = data.new.name.clone().unwrap_or_else(|| studio.name.clone());
        let old_parent = data.old.as_ref().and_then(|o| o.parent_id);
        let parent = snapshot::apply_option(
            studio.parent_studio_id,
            &old_parent,
            &data.new.parent_id,
        );
        StudioRepo::update(conn, target, &name, parent).await?;
        Self::apply_relations(conn, target, data).await?;
        Ok(())
    }

    async fn apply_relations(
        conn: &mut PgConnection,
        target: Id,
        data: &StudioEditData,
    ) -> Result<(), EditError> {
        for alias in &data.new.removed_aliases {
            StudioRepo::remove_alias(conn, target, alias).await?;
        }
        for alias in &data.new.added_aliases {
            StudioRepo::add_alias(conn, target, alias).await?;
        }
        for url in &data.new.removed_urls {
            StudioRepo::remove_url(conn, target, url.site_id, &url.url).await?;
        }
        for url in &data.new.added_urls {
            StudioRepo::add_url(conn, target, url.site_id, &url.url).await?;
        }
        for &image in &data.new.removed_images {
            StudioRepo::remove_image(conn, target, image).await?;
        }
        for &image in &data.new.added_images {
            StudioRepo::add_image(conn, target, image).await?;
        }
        Ok(())
    }

    async fn absorb(conn: &mut PgConnection, source: Id, target: Id) -> Result<(), EditError> {
        Self::fetch_live(conn, source).await?;
        StudioRepo::reassign_scenes(conn, source, Some(target)).await?;
        StudioRepo::reassign_children(conn, source, Some(target)).await?;
        StudioRepo::reassign_favorites(conn, source, target).await?;
        StudioRepo::soft_delete(conn, source).await?;
        StudioRepo::create_redirect(conn, source, target).await?;
        StudioRepo::repoint_redirects(conn, source, target).await?;
        Ok(())
    }

    async fn fetch_live(conn: &mut PgConnection, id: Id) -> Result<Studio, EditError> {
        let studio = StudioRepo::find_by_id(conn, id)
            .await?
            .ok_or(CoreError::EntityNotFound { kind: "studio", id })?;
        if studio.deleted {
            return Err(CoreError::EntityDeleted { kind: "studio", id }.into());
        }
        Ok(studio)
    }
}
