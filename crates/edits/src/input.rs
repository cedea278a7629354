//! Request inputs for proposing and updating edits.
//!
//! Scalar fields use [`FieldUpdate`] so a PATCH-style request can
//! distinguish "leave alone" from "clear". Relation lists are full
//! desired states: `None` leaves the relation untouched, `Some(list)`
//! replaces it and the processor computes the added/removed diff.

use serde::Deserialize;

use curio_core::data::{BodyModification, PerformerCredit, UrlRef};
use curio_core::edit::Operation;
use curio_core::field::FieldUpdate;
use curio_core::types::Id;

/// The operation-independent part of every edit request.
#[derive(Debug, Clone, Deserialize)]
pub struct EditInput {
    pub operation: Operation,
    /// Target entity id. Required for MODIFY, DESTROY, and MERGE;
    /// optional for CREATE, where a caller may supply the id the new
    /// row should get.
    pub id: Option<Id>,
    /// Entities to absorb into the target. MERGE only.
    #[serde(default)]
    pub merge_source_ids: Vec<Id>,
    /// Optional comment recorded alongside the proposal.
    pub comment: Option<String>,
    /// Submit on behalf of an automated process. Requires the bot role.
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagDetailsInput {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub description: FieldUpdate<String>,
    pub aliases: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagEditInput {
    pub edit: EditInput,
    #[serde(default)]
    pub details: Option<TagDetailsInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformerDetailsInput {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub disambiguation: FieldUpdate<String>,
    #[serde(default)]
    pub gender: FieldUpdate<String>,
    #[serde(default)]
    pub birthdate: FieldUpdate<String>,
    #[serde(default)]
    pub country: FieldUpdate<String>,
    #[serde(default)]
    pub career_start_year: FieldUpdate<i32>,
    #[serde(default)]
    pub career_end_year: FieldUpdate<i32>,
    pub aliases: Option<Vec<String>>,
    pub urls: Option<Vec<UrlRef>>,
    pub tattoos: Option<Vec<BodyModification>>,
    pub piercings: Option<Vec<BodyModification>>,
    pub image_ids: Option<Vec<Id>>,
}

/// Alias-handling options for performer renames and merges.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PerformerEditOptions {
    /// On rename, stamp the old name onto existing unaliased credits.
    #[serde(default)]
    pub set_modify_aliases: bool,
    /// On merge, stamp each source's name onto its moved credits.
    #[serde(default)]
    pub set_merge_aliases: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformerEditInput {
    pub edit: EditInput,
    #[serde(default)]
    pub details: Option<PerformerDetailsInput>,
    #[serde(default)]
    pub options: PerformerEditOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudioDetailsInput {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub parent_id: FieldUpdate<Id>,
    pub aliases: Option<Vec<String>>,
    pub urls: Option<Vec<UrlRef>>,
    pub image_ids: Option<Vec<Id>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioEditInput {
    pub edit: EditInput,
    #[serde(default)]
    pub details: Option<StudioDetailsInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneDetailsInput {
    #[serde(default)]
    pub title: FieldUpdate<String>,
    #[serde(default)]
    pub details: FieldUpdate<String>,
    #[serde(default)]
    pub date: FieldUpdate<String>,
    #[serde(default)]
    pub studio_id: FieldUpdate<Id>,
    #[serde(default)]
    pub duration: FieldUpdate<i32>,
    #[serde(default)]
    pub director: FieldUpdate<String>,
    #[serde(default)]
    pub code: FieldUpdate<String>,
    pub urls: Option<Vec<UrlRef>>,
    pub tag_ids: Option<Vec<Id>>,
    pub image_ids: Option<Vec<Id>>,
    pub performers: Option<Vec<PerformerCredit>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneEditInput {
    pub edit: EditInput,
    #[serde(default)]
    pub details: Option<SceneDetailsInput>,
}
