//! Scene edit processor.
//!
//! Scene relation inputs are resolved through the redirect tables at
//! proposal time, so a request built against a since-merged tag or
//! performer lands on the surviving entity instead of failing.

use sqlx::PgConnection;

use curio_core::data::{EditData, PerformerCredit, SceneChanges, SceneEditData, UrlRef};
use curio_core::diff::{diff_performer_credits, diff_slices, diff_urls};
use curio_core::edit::{Operation, TargetType};
use curio_core::error::CoreError;
use curio_core::snapshot;
use curio_core::types::{new_id, Id};
use curio_db::models::edit::Edit;
use curio_db::models::scene::{CreateScene, Scene};
use curio_db::repositories::{PerformerRepo, SceneRepo, StudioRepo, TagRepo};

use crate::error::EditError;
use crate::input::{SceneDetailsInput, SceneEditInput};
use crate::mutator::{self, BuiltEdit};
use crate::validate;

pub struct SceneProcessor;

impl SceneProcessor {
    pub async fn build(
        conn: &mut PgConnection,
        input: &SceneEditInput,
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
        input: &SceneEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let details = input.details.clone().unwrap_or_default();

        let studio_id = match details.studio_id.as_set() {
            Some(&id) => Some(Self::resolve_studio(conn, id).await?),
            None => None,
        };
        let added_urls = mutator::dedup(&details.urls.clone().unwrap_or_default());
        validate::validate_urls(conn, &added_urls).await?;
        let added_tags =
            Self::resolve_tags(conn, &mutator::dedup(&details.tag_ids.clone().unwrap_or_default()))
                .await?;
        let added_images = mutator::dedup(&details.image_ids.clone().unwrap_or_default());
        validate::validate_image_ids(conn, &added_images).await?;
        let added_performers =
            Self::resolve_credits(conn, &details.performers.clone().unwrap_or_default()).await?;

        let new = SceneChanges {
            title: details.title.as_set().cloned(),
            details: details.details.as_set().cloned(),
            date: details.date.as_set().cloned(),
            studio_id,
            duration: details.duration.as_set().copied(),
            director: details.director.as_set().cloned(),
            code: details.code.as_set().cloned(),
            added_urls,
            added_tags,
            added_images,
            added_performers,
            ..Default::default()
        };
        Ok(BuiltEdit {
            data: EditData::Scene(SceneEditData {
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
        input: &SceneEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let scene = Self::fetch_live(conn, target).await?;
        let details = input.details.clone().unwrap_or_default();
        let (old, new, changed) = Self::diff_details(conn, &scene, &details).await?;
        if !changed {
            return Err(CoreError::NoChanges.into());
        }

        Ok(BuiltEdit {
            data: EditData::Scene(SceneEditData {
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
            data: EditData::Scene(SceneEditData::default()),
            links: vec![target],
        })
    }

    async fn build_merge(
        conn: &mut PgConnection,
        target: Id,
        input: &SceneEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let scene = Self::fetch_live(conn, target).await?;
        let sources = mutator::dedup(&input.edit.merge_source_ids);
        for &source in &sources {
            Self::fetch_live(conn, source).await?;
        }

        let details = input.details.clone().unwrap_or_default();
        let (old, new, _) = Self::diff_details(conn, &scene, &details).await?;

        let mut links = vec![target];
        links.extend(&sources);
        Ok(BuiltEdit {
            data: EditData::Scene(SceneEditData {
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
        scene: &Scene,
        details: &SceneDetailsInput,
    ) -> Result<(SceneChanges, SceneChanges, bool), EditError> {
        let (old_title, new_title) = snapshot::diff_option(scene.title.as_ref(), &details.title);
        let (old_details, new_details) =
            snapshot::diff_option(scene.details.as_ref(), &details.details);
        let (old_date, new_date) = snapshot::diff_option(scene.date.as_ref(), &details.date);
        let (old_duration, new_duration) =
            snapshot::diff_option(scene.duration.as_ref(), &details.duration);
        let (old_director, new_director) =
            snapshot::diff_option(scene.director.as_ref(), &details.director);
        let (old_code, new_code) = snapshot::diff_option(scene.code.as_ref(), &details.code);

        let studio_update = match details.studio_id.as_set() {
            Some(&id) => {
                curio_core::field::FieldUpdate::Set(Self::resolve_studio(conn, id).await?)
            }
            None => details.studio_id.clone(),
        };
        let (old_studio, new_studio) =
            snapshot::diff_option(scene.studio_id.as_ref(), &studio_update);

        let (added_urls, removed_urls) = match &details.urls {
            Some(desired) => {
                let current: Vec<UrlRef> = SceneRepo::list_urls(conn, scene.id)
                    .await?
                    .into_iter()
                    .map(|u| UrlRef { url: u.url, site_id: u.site_id })
                    .collect();
                diff_urls(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };
        validate::validate_urls(conn, &added_urls).await?;

        let (added_tags, removed_tags) = match &details.tag_ids {
            Some(desired) => {
                let resolved = Self::resolve_tags(conn, &mutator::dedup(desired)).await?;
                let current = SceneRepo::list_tag_ids(conn, scene.id).await?;
                diff_slices(&resolved, &current)
            }
            None => (vec![], vec![]),
        };

        let (added_images, removed_images) = match &details.image_ids {
            Some(desired) => {
                let current = SceneRepo::list_image_ids(conn, scene.id).await?;
                diff_slices(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };
        validate::validate_image_ids(conn, &added_images).await?;

        let (added_performers, removed_performers) = match &details.performers {
            Some(desired) => {
                let resolved = Self::resolve_credits(conn, desired).await?;
                let current: Vec<PerformerCredit> = SceneRepo::list_performers(conn, scene.id)
                    .await?
                    .into_iter()
                    .map(|p| PerformerCredit {
                        performer_id: p.performer_id,
                        alias: p.alias,
                    })
                    .collect();
                diff_performer_credits(&resolved, &current)
            }
            None => (vec![], vec![]),
        };

        let scalar_changed = snapshot::is_changed(&old_title, &new_title)
            || snapshot::is_changed(&old_details, &new_details)
            || snapshot::is_changed(&old_date, &new_date)
            || snapshot::is_changed(&old_studio, &new_studio)
            || snapshot::is_changed(&old_duration, &new_duration)
            || snapshot::is_changed(&old_director, &new_director)
            || snapshot::is_changed(&old_code, &new_code);
        let relations_changed = !added_urls.is_empty()
            || !removed_urls.is_empty()
            || !added_tags.is_empty()
            || !removed_tags.is_empty()
            || !added_images.is_empty()
            || !removed_images.is_empty()
            || !added_performers.is_empty()
            || !removed_performers.is_empty();

        let old = SceneChanges {
            title: old_title,
            details: old_details,
            date: old_date,
            studio_id: old_studio,
            duration: old_duration,
            director: old_director,
            code: old_code,
            ..Default::default()
        };
        let new = SceneChanges {
            title: new_title,
            details: new_details,
            date: new_date,
            studio_id: new_studio,
            duration: new_duration,
            director: new_director,
            code: new_code,
            added_urls,
            removed_urls,
            added_tags,
            removed_tags,
            added_images,
            removed_images,
            added_performers,
            removed_performers,
        };
        Ok((old, new, scalar_changed || relations_changed))
    }

    /// Apply an accepted scene edit.
    pub async fn apply(conn: &mut PgConnection, edit: &Edit) -> Result<Option<Id>, EditError> {
        let EditData::Scene(data) = edit.decode_data()? else {
            return Err(CoreError::PayloadMismatch.into());
        };

        match edit.operation()? {
            Operation::Create => Self::apply_create(conn, edit, &data).await.map(Some),
            Operation::Modify => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Scene, &[]).await?;
                Self::apply_modify(conn, target, &data).await?;
                Ok(None)
            }
            Operation::Destroy => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Scene, &[]).await?;
                Self::fetch_live(conn, target).await?;
                SceneRepo::soft_delete(conn, target).await?;
                Ok(None)
            }
            Operation::Merge => {
                let target = mutator::linked_target_id(
                    conn,
                    edit.id,
                    TargetType::Scene,
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
        data: &SceneEditData,
    ) -> Result<Id, EditError> {
        let id = data.create_id.unwrap_or(edit.id);
        SceneRepo::create(
            conn,
            &CreateScene {
                id,
                title: data.new.title.clone(),
                details: data.new.details.clone(),
                date: data.new.date.clone(),
                studio_id: data.new.studio_id,
                duration: data.new.duration,
                director: data.new.director.clone(),
                code: data.new.code.clone(),
            },
        )
        .await?;
        Self::apply_relations(conn, id, data).await?;
        Ok(id)
    }

    async fn apply_modify(
        conn: &mut PgConnection,
        target: Id,
        data: &SceneEditData,
    ) -> Result<(), EditError> {
        let scene = Self::fetch_live(conn, target).await?;

        if let Some(old) = &data.old {
            snapshot::guard_option("title", old.title.as_ref(), scene.title.as_ref())?;
            snapshot::guard_option("details", old.details.as_ref(), scene.details.as_ref())?;
            snapshot::guard_option("date", old.date.as_ref(), scene.date.as_ref())?;
            snapshot::guard_option("studio_id", old.studio_id.as_ref(), scene.studio_id.as_ref())?;
            snapshot::guard_option("duration", old.duration.as_ref(), scene.duration.as_ref())?;
            snapshot::guard_option("director", old.director.as_ref(), scene.director.as_ref())?;
            snapshot::guard_option("code", old.code.as_ref(), scene.code.as_ref())?;
        }

        let old = data.old.clone().unwrap_or_default();
        let updated = Scene {
            title: snapshot::apply_option(scene.title.clone(), &old.title, &data.new.title),
            details: snapshot::apply_option(scene.details.clone(), &old.details, &data.new.details),
            date: snapshot::apply_option(scene.date.clone(), &old.date, &data.new.date),
            studio_id: snapshot::apply_option(scene.studio_id, &old.studio_id, &data.new.studio_id),
            duration: snapshot::apply_option(scene.duration, &old.duration, &data.new.duration),
            director: snapshot::apply_option(
                scene.director.clone(),
                &old.director,
                &data.new.director,
            ),
            code: snapshot::apply_option(scene.code.clone(), &old.code, &data.new.code),
            ..scene
        };
        SceneRepo::update(conn, &updated).await?;
        Self::apply_relations(conn, target, data).await?;
        Ok(())
    }

    async fn apply_relations(
        conn: &mut PgConnection,
        target: Id,
        data: &SceneEditData,
    ) -> Result<(), EditError> {
        for url in &data.new.removed_urls {
            SceneRepo::remove_url(conn, target, url.site_id, &url.url).await?;
        }
        for url in &data.new.added_urls {
            SceneRepo::add_url(conn, target, url.site_id, &url.url).await?;
        }
        for &tag in &data.new.removed_tags {
            SceneRepo::remove_tag(conn, target, tag).await?;
        }
        for &tag in &data.new.added_tags {
            SceneRepo::add_tag(conn, target, tag).await?;
        }
        for &image in &data.new.removed_images {
            SceneRepo::remove_image(conn, target, image).await?;
        }
        for &image in &data.new.added_images {
            SceneRepo::add_image(conn, target, image).await?;
        }
        // Removals first: an alias change is a remove/add pair for the
        // same performer.
        for credit in &data.new.removed_performers {
            SceneRepo::remove_performer(conn, target, credit.performer_id).await?;
        }
        for credit in &data.new.added_performers {
            SceneRepo::add_performer(conn, target, credit.performer_id, credit.alias.as_deref())
                .await?;
        }
        Ok(())
    }

    async fn absorb(conn: &mut PgConnection, source: Id, target: Id) -> Result<(), EditError> {
        Self::fetch_live(conn, source).await?;
        SceneRepo::soft_delete(conn, source).await?;
        SceneRepo::create_redirect(conn, source, target).await?;
        SceneRepo::repoint_redirects(conn, source, target).await?;
        Ok(())
    }

    // --- reference resolution ---

    async fn resolve_studio(conn: &mut PgConnection, id: Id) -> Result<Id, EditError> {
        StudioRepo::find_with_redirect(conn, id)
            .await?
            .map(|s| s.id)
            .ok_or_else(|| CoreError::InvalidStudio(id).into())
    }

    async fn resolve_tags(conn: &mut PgConnection, ids: &[Id]) -> Result<Vec<Id>, EditError> {
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            let tag = TagRepo::find_with_redirect(conn, id)
                .await?
                .ok_or(CoreError::InvalidTag(id))?;
            if !out.contains(&tag.id) {
                out.push(tag.id);
            }
        }
        Ok(out)
    }

    async fn resolve_credits(
        conn: &mut PgConnection,
        credits: &[PerformerCredit],
    ) -> Result<Vec<PerformerCredit>, EditError> {
        let mut out: Vec<PerformerCredit> = Vec::with_capacity(credits.len());
        for credit in credits {
            let performer = PerformerRepo::find_with_redirect(conn, credit.performer_id)
                .await?
                .ok_or(CoreError::InvalidPerformer(credit.performer_id))?;
            if !out.iter().any(|c| c.performer_id == performer.id) {
                out.push(PerformerCredit {
                    performer_id: performer.id,
                    alias: credit.alias.clone(),
                });
            }
        }
        Ok(out)
    }

    async fn fetch_live(conn: &mut PgConnection, id: Id) -> Result<Scene, EditError> {
        let scene = SceneRepo::find_by_id(conn, id)
            .await?
            .ok_or(CoreError::EntityNotFound { kind: "scene", id })?;
        if scene.deleted {
            return Err(CoreError::EntityDeleted { kind: "scene", id }.into());
        }
        Ok(scene)
    }
}
