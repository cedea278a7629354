//! Performer edit processor.
//!
//! Performers carry the most state of any entity: scalar profile
//! fields, aliases, URLs, tattoos, piercings, and images, plus the
//! alias-carry-over options that decide whether a rename or merge
//! stamps the prior name onto existing scene credits.

use sqlx::PgConnection;

use curio_core::data::{
    BodyModification, EditData, PerformerChanges, PerformerEditData, UrlRef,
};
use curio_core::diff::{diff_body_modifications, diff_slices, diff_urls};
use curio_core::edit::{Operation, TargetType};
use curio_core::error::CoreError;
use curio_core::snapshot;
use curio_core::types::{new_id, Id};
use curio_db::models::edit::Edit;
use curio_db::models::performer::{CreatePerformer, Performer};
use curio_db::repositories::performer_repo::BodyModTable;
use curio_db::repositories::PerformerRepo;

use crate::error::EditError;
use crate::input::{PerformerDetailsInput, PerformerEditInput};
use crate::mutator::{self, BuiltEdit};
use crate::validate;

pub struct PerformerProcessor;

impl PerformerProcessor {
    pub async fn build(
        conn: &mut PgConnection,
        input: &PerformerEditInput,
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
        input: &PerformerEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let details = input.details.clone().unwrap_or_default();
        let name = details
            .name
            .as_set()
            .cloned()
            .ok_or(CoreError::MissingRequiredField("name"))?;

        let added_urls = mutator::dedup(&details.urls.clone().unwrap_or_default());
        validate::validate_urls(conn, &added_urls).await?;
        let added_images = mutator::dedup(&details.image_ids.clone().unwrap_or_default());
        validate::validate_image_ids(conn, &added_images).await?;

        let new = PerformerChanges {
            name: Some(name),
            disambiguation: details.disambiguation.as_set().cloned(),
            gender: details.gender.as_set().cloned(),
            birthdate: details.birthdate.as_set().cloned(),
            country: details.country.as_set().cloned(),
            career_start_year: details.career_start_year.as_set().copied(),
            career_end_year: details.career_end_year.as_set().copied(),
            added_aliases: mutator::dedup(&details.aliases.unwrap_or_default()),
            added_urls,
            added_tattoos: dedup_by_location(&details.tattoos.unwrap_or_default()),
            added_piercings: dedup_by_location(&details.piercings.unwrap_or_default()),
            added_images,
            ..Default::default()
        };
        Ok(BuiltEdit {
            data: EditData::Performer(PerformerEditData {
                new,
                old: None,
                merge_sources: vec![],
                set_modify_aliases: false,
                set_merge_aliases: false,
                create_id: Some(input.edit.id.unwrap_or_else(new_id)),
            }),
            links: vec![],
        })
    }

    async fn build_modify(
        conn: &mut PgConnection,
        target: Id,
        input: &PerformerEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let performer = Self::fetch_live(conn, target).await?;
        let details = input.details.clone().unwrap_or_default();
        let (old, new, changed) = Self::diff_details(conn, &performer, &details).await?;
        if !changed {
            return Err(CoreError::NoChanges.into());
        }

        Ok(BuiltEdit {
            data: EditData::Performer(PerformerEditData {
                new,
                old: Some(old),
                merge_sources: vec![],
                set_modify_aliases: input.options.set_modify_aliases,
                set_merge_aliases: false,
                create_id: None,
            }),
            links: vec![target],
        })
    }

    async fn build_destroy(conn: &mut PgConnection, target: Id) -> Result<BuiltEdit, EditError> {
        Self::fetch_live(conn, target).await?;
        Ok(BuiltEdit {
            data: EditData::Performer(PerformerEditData::default()),
            links: vec![target],
        })
    }

    async fn build_merge(
        conn: &mut PgConnection,
        target: Id,
        input: &PerformerEditInput,
    ) -> Result<BuiltEdit, EditError> {
        let performer = Self::fetch_live(conn, target).await?;
        let sources = mutator::dedup(&input.edit.merge_source_ids);
        for &source in &sources {
            Self::fetch_live(conn, source).await?;
        }

        let details = input.details.clone().unwrap_or_default();
        let (old, new, _) = Self::diff_details(conn, &performer, &details).await?;

        let mut links = vec![target];
        links.extend(&sources);
        Ok(BuiltEdit {
            data: EditData::Performer(PerformerEditData {
                new,
                old: Some(old),
                merge_sources: sources,
                set_modify_aliases: input.options.set_modify_aliases,
                set_merge_aliases: input.options.set_merge_aliases,
                create_id: None,
            }),
            links,
        })
    }

    async fn diff_details(
        conn: &mut PgConnection,
        performer: &Performer,
        details: &PerformerDetailsInput,
    ) -> Result<(PerformerChanges, PerformerChanges, bool), EditError> {
        let (old_name, new_name) = snapshot::diff_required(&performer.name, &details.name);
        let (old_disambig, new_disambig) = snapshot::diff_option(
            performer.disambiguation.as_ref(),
            &details.disambiguation,
        );
        let (old_gender, new_gender) =
            snapshot::diff_option(performer.gender.as_ref(), &details.gender);
        let (old_birthdate, new_birthdate) =
            snapshot::diff_option(performer.birthdate.as_ref(), &details.birthdate);
        let (old_country, new_country) =
            snapshot::diff_option(performer.country.as_ref(), &details.country);
        let (old_start, new_start) = snapshot::diff_option(
            performer.career_start_year.as_ref(),
            &details.career_start_year,
        );
        let (old_end, new_end) =
            snapshot::diff_option(performer.career_end_year.as_ref(), &details.career_end_year);

        let (added_aliases, removed_aliases) = match &details.aliases {
            Some(desired) => {
                let current = PerformerRepo::list_aliases(conn, performer.id).await?;
                diff_slices(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };

        let (added_urls, removed_urls) = match &details.urls {
            Some(desired) => {
                let current: Vec<UrlRef> = PerformerRepo::list_urls(conn, performer.id)
                    .await?
                    .into_iter()
                    .map(|u| UrlRef { url: u.url, site_id: u.site_id })
                    .collect();
                diff_urls(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };
        validate::validate_urls(conn, &added_urls).await?;

        let (added_tattoos, removed_tattoos) =
            Self::diff_body_mods(conn, performer.id, BodyModTable::Tattoos, &details.tattoos)
                .await?;
        let (added_piercings, removed_piercings) = Self::diff_body_mods(
            conn,
            performer.id,
            BodyModTable::Piercings,
            &details.piercings,
        )
        .await?;

        let (added_images, removed_images) = match &details.image_ids {
            Some(desired) => {
                let current = PerformerRepo::list_image_ids(conn, performer.id).await?;
                diff_slices(&mutator::dedup(desired), &current)
            }
            None => (vec![], vec![]),
        };
        validate::validate_image_ids(conn, &added_images).await?;

        let scalar_changed = snapshot::is_changed(&old_name, &new_name)
            || snapshot::is_changed(&old_disambig, &new_disambig)
            || snapshot::is_changed(&old_gender, &new_gender)
            || snapshot::is_changed(&old_birthdate, &new_birthdate)
            || snapshot::is_changed(&old_country, &new_country)
            || snapshot::is_changed(&old_start, &new_start)
            || snapshot::is_changed(&old_end, &new_end);
        let relations_changed = !added_aliases.is_empty()
            || !removed_aliases.is_empty()
            || !added_urls.is_empty()
            || !removed_urls.is_empty()
            || !added_tattoos.is_empty()
            || !removed_tattoos.is_empty()
            || !added_piercings.is_empty()
            || !removed_piercings.is_empty()
            || !added_images.is_empty()
            || !removed_images.is_empty();

        let old = PerformerChanges {
            name: old_name,
            disambiguation: old_disambig,
            gender: old_gender,
            birthdate: old_birthdate,
            country: old_country,
            career_start_year: old_start,
            career_end_year: old_end,
            ..Default::default()
        };
        let new = PerformerChanges {
            name: new_name,
            disambiguation: new_disambig,
            gender: new_gender,
            birthdate: new_birthdate,
            country: new_country,
            career_start_year: new_start,
            career_end_year: new_end,
            added_aliases,
            removed_aliases,
            added_urls,
            removed_urls,
            added_tattoos,
            removed_tattoos,
            added_piercings,
            removed_piercings,
            added_images,
            removed_images,
        };
        Ok((old, new, scalar_changed || relations_changed))
    }

    async fn diff_body_mods(
        conn: &mut PgConnection,
        performer_id: Id,
        table: BodyModTable,
        desired: &Option<Vec<BodyModification>>,
    ) -> Result<(Vec<BodyModification>, Vec<BodyModification>), EditError> {
        match desired {
            Some(desired) => {
                let current: Vec<BodyModification> =
                    PerformerRepo::list_body_modifications(conn, table, performer_id)
                        .await?
                        .into_iter()
                        .map(|m| BodyModification {
                            location: m.location,
                            description: m.description,
                        })
                        .collect();
                Ok(diff_body_modifications(desired, &current))
            }
            None => Ok((vec![], vec![])),
        }
    }

    /// Apply an accepted performer edit.
    pub async fn apply(conn: &mut PgConnection, edit: &Edit) -> Result<Option<Id>, EditError> {
        let EditData::Performer(data) = edit.decode_data()? else {
            return Err(CoreError::PayloadMismatch.into());
        };

        match edit.operation()? {
            Operation::Create => Self::apply_create(conn, edit, &data).await.map(Some),
            Operation::Modify => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Performer, &[]).await?;
                Self::apply_modify(conn, target, &data).await?;
                Ok(None)
            }
            Operation::Destroy => {
                let target =
                    mutator::linked_target_id(conn, edit.id, TargetType::Performer, &[]).await?;
                Self::fetch_live(conn, target).await?;
                PerformerRepo::delete_scene_performers(conn, target).await?;
                PerformerRepo::delete_favorites(conn, target).await?;
                PerformerRepo::soft_delete(conn, target).await?;
                Ok(None)
            }
            Operation::Merge => {
                let target = mutator::linked_target_id(
                    conn,
                    edit.id,
                    TargetType::Performer,
                    &data.merge_sources,
                )
                .await?;
                Self::apply_modify(conn, target, &data).await?;
                for &source in &data.merge_sources {
                    Self::absorb(conn, source, target, data.set_merge_aliases).await?;
                }
                Ok(None)
            }
        }
    }

    async fn apply_create(
        conn: &mut PgConnection,
        edit: &Edit,
        data: &PerformerEditData,
    ) -> Result<Id, EditError> {
        let id = data.create_id.unwrap_or(edit.id);
        let name = data
            .new
            .name
            .clone()
            .ok_or(CoreError::MissingRequiredField("name"))?;
        PerformerRepo::create(
            conn,
            &CreatePerformer {
                id,
                name,
                disambiguation: data.new.disambiguation.clone(),
                gender: data.new.gender.clone(),
                birthdate: data.new.birthdate.clone(),
                country: data.new.country.clone(),
                career_start_year: data.new.career_start_year,
                career_end_year: data.new.career_end_year,
            },
        )
        .await?;
        Self::apply_relations(conn, id, data).await?;
        Ok(id)
    }

    async fn apply_modify(
        conn: &mut PgConnection,
        target: Id,
        data: &PerformerEditData,
    ) -> Result<(), EditError> {
        let performer = Self::fetch_live(conn, target).await?;

        if let Some(old) = &data.old {
            snapshot::guard_required("name", old.name.as_ref(), &performer.name)?;
            snapshot::guard_option(
                "disambiguation",
                old.disambiguation.as_ref(),
                performer.disambiguation.as_ref(),
            )?;
            snapshot::guard_option("gender", old.gender.as_ref(), performer.gender.as_ref())?;
            snapshot::guard_option(
                "birthdate",
                old.birthdate.as_ref(),
                performer.birthdate.as_ref(),
            )?;
            snapshot::guard_option("country", old.country.as_ref(), performer.country.as_ref())?;
            snapshot::guard_option(
                "career_start_year",
                old.career_start_year.as_ref(),
                performer.career_start_year.as_ref(),
            )?;
            snapshot::guard_option(
                "career_end_year",
                old.career_end_year.as_ref(),
                performer.career_end_year.as_ref(),
            )?;
        }

        let old = data.old.clone().unwrap_or_default();
        let renamed_from = match (&old.name, &data.new.name) {
            (Some(old_name), Some(new_name)) if old_name != new_name => Some(old_name.clone()),
            _ => None,
        };

        let updated = Performer {
            name: data
                .new
                .name
                .clone()
                .unwrap_or_else(|| performer.name.clone()),
            disambiguation: snapshot::apply_option(
                performer.disambiguation.clone(),
                &old.disambiguation,
                &data.new.disambiguation,
            ),
            gender: snapshot::apply_option(
                performer.gender.clone(),
                &old.gender,
                &data.new.gender,
            ),
            birthdate: snapshot::apply_option(
                performer.birthdate.clone(),
                &old.birthdate,
                &data.new.birthdate,
            ),
            country: snapshot::apply_option(
                performer.country.clone(),
                &old.country,
                &data.new.country,
            ),
            career_start_year: snapshot::apply_option(
                performer.career_start_year,
                &old.career_start_year,
                &data.new.career_start_year,
            ),
            career_end_year: snapshot::apply_option(
                performer.career_end_year,
                &old.career_end_year,
                &data.new.career_end_year,
            ),
            ..performer
        };
        PerformerRepo::update(conn, &updated).await?;
        Self::apply_relations(conn, target, data).await?;

        if data.set_modify_aliases {
            if let Some(old_name) = renamed_from {
                PerformerRepo::stamp_scene_performer_alias(conn, target, &old_name).await?;
            }
        }
        Ok(())
    }

    async fn apply_relations(
        conn: &mut PgConnection,
        target: Id,
        data: &PerformerEditData,
    ) -> Result<(), EditError> {
        for alias in &data.new.removed_aliases {
            PerformerRepo::remove_alias(conn, target, alias).await?;
        }
        for alias in &data.new.added_aliases {
            PerformerRepo::add_alias(conn, target, alias).await?;
        }
        for url in &data.new.removed_urls {
            PerformerRepo::remove_url(conn, target, url.site_id, &url.url).await?;
        }
        for url in &data.new.added_urls {
            PerformerRepo::add_url(conn, target, url.site_id, &url.url).await?;
        }
        // Removals first: a changed description shows up as a
        // remove/add pair on the same location.
        for m in &data.new.removed_tattoos {
            PerformerRepo::remove_body_modification(conn, BodyModTable::Tattoos, target, &m.location)
                .await?;
        }
        for m in &data.new.added_tattoos {
            PerformerRepo::upsert_body_modification(
                conn,
                BodyModTable::Tattoos,
                target,
                &m.location,
                m.description.as_deref(),
            )
            .await?;
        }
        for m in &data.new.removed_piercings {
            PerformerRepo::remove_body_modification(
                conn,
                BodyModTable::Piercings,
                target,
                &m.location,
            )
            .await?;
        }
        for m in &data.new.added_piercings {
            PerformerRepo::upsert_body_modification(
                conn,
                BodyModTable::Piercings,
                target,
                &m.location,
                m.description.as_deref(),
            )
            .await?;
        }
        for &image in &data.new.removed_images {
            PerformerRepo::remove_image(conn, target, image).await?;
        }
        for &image in &data.new.added_images {
            PerformerRepo::add_image(conn, target, image).await?;
        }
        Ok(())
    }

    async fn absorb(
        conn: &mut PgConnection,
        source: Id,
        target: Id,
        stamp_alias: bool,
    ) -> Result<(), EditError> {
        let performer = Self::fetch_live(conn, source).await?;
        let alias_stamp = stamp_alias.then_some(performer.name.as_str());
        PerformerRepo::reassign_scene_performers(conn, source, target, alias_stamp).await?;
        PerformerRepo::reassign_favorites(conn, source, target).await?;
        PerformerRepo::soft_delete(conn, source).await?;
        PerformerRepo::create_redirect(conn, source, target).await?;
        PerformerRepo::repoint_redirects(conn, source, target).await?;
        Ok(())
    }

    async fn fetch_live(conn: &mut PgConnection, id: Id) -> Result<Performer, EditError> {
        let performer = PerformerRepo::find_by_id(conn, id)
            .await?
            .ok_or(CoreError::EntityNotFound { kind: "performer", id })?;
        if performer.deleted {
            return Err(CoreError::EntityDeleted { kind: "performer", id }.into());
        }
        Ok(performer)
    }
}

fn dedup_by_location(mods: &[BodyModification]) -> Vec<BodyModification> {
    let mut out: Vec<BodyModification> = Vec::with_capacity(mods.len());
    for m in mods {
        if !out.iter().any(|seen| seen.location == m.location) {
            out.push(m.clone());
        }
    }
    out
}
