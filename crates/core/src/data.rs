//! Typed, versioned edit payloads.
//!
//! The payload is the sole durable representation of a pending proposal's
//! effect: an `old_data` snapshot of the fields it touches, a `new_data`
//! block with replacement values plus added/removed relation lists, the
//! merge source ids, and the alias-carry-over option flags. It is stored
//! as JSONB on the edit row and must round-trip unchanged through apply.
//!
//! Unlike a free-form JSON blob, the payload is a tagged union per entity
//! kind, validated on read: an unknown version or a payload whose entity
//! tag disagrees with the edit's target type is rejected outright.

use serde::{Deserialize, Serialize};

use crate::edit::TargetType;
use crate::error::CoreError;
use crate::types::Id;

/// Current payload schema version. Bump when the shape changes.
pub const EDIT_DATA_VERSION: u32 = 1;

/// A link attached to an entity. Two URLs are the same link iff both the
/// string and the site id match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRef {
    pub url: String,
    pub site_id: Id,
}

/// A tattoo or piercing. `location` is the identity key; the description
/// participates only in the dirty-check (see `diff`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyModification {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A performer credited on a scene, with an optional display alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformerCredit {
    pub performer_id: Id,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_aliases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_end_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_urls: Vec<UrlRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_urls: Vec<UrlRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_tattoos: Vec<BodyModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_tattoos: Vec<BodyModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_piercings: Vec<BodyModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_piercings: Vec<BodyModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_images: Vec<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_images: Vec<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_urls: Vec<UrlRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_urls: Vec<UrlRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_images: Vec<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_images: Vec<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_urls: Vec<UrlRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_urls: Vec<UrlRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_tags: Vec<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_tags: Vec<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_images: Vec<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_images: Vec<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_performers: Vec<PerformerCredit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_performers: Vec<PerformerCredit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagEditData {
    #[serde(rename = "new_data")]
    pub new: TagChanges,
    #[serde(rename = "old_data", skip_serializing_if = "Option::is_none")]
    pub old: Option<TagChanges>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<Id>,
    /// Id the new row will get. CREATE only; fixed at proposal time so
    /// apply is deterministic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_id: Option<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerEditData {
    #[serde(rename = "new_data")]
    pub new: PerformerChanges,
    #[serde(rename = "old_data", skip_serializing_if = "Option::is_none")]
    pub old: Option<PerformerChanges>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<Id>,
    /// On rename, stamp the old name as a credit alias on existing scenes.
    #[serde(rename = "modify_aliases", default, skip_serializing_if = "std::ops::Not::not")]
    pub set_modify_aliases: bool,
    /// On merge, stamp each source's name as a credit alias on its scenes.
    #[serde(rename = "merge_aliases", default, skip_serializing_if = "std::ops::Not::not")]
    pub set_merge_aliases: bool,
    /// Id the new row will get. CREATE only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_id: Option<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioEditData {
    #[serde(rename = "new_data")]
    pub new: StudioChanges,
    #[serde(rename = "old_data", skip_serializing_if = "Option::is_none")]
    pub old: Option<StudioChanges>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<Id>,
    /// Id the new row will get. CREATE only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_id: Option<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneEditData {
    #[serde(rename = "new_data")]
    pub new: SceneChanges,
    #[serde(rename = "old_data", skip_serializing_if = "Option::is_none")]
    pub old: Option<SceneChanges>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<Id>,
    /// Id the new row will get. CREATE only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_id: Option<Id>,
}

/// The payload body, tagged by entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditData {
    Tag(TagEditData),
    Performer(PerformerEditData),
    Studio(StudioEditData),
    Scene(SceneEditData),
}

impl EditData {
    pub fn target_type(&self) -> TargetType {
        match self {
            Self::Tag(_) => TargetType::Tag,
            Self::Performer(_) => TargetType::Performer,
            Self::Studio(_) => TargetType::Studio,
            Self::Scene(_) => TargetType::Scene,
        }
    }

    pub fn merge_sources(&self) -> &[Id] {
        match self {
            Self::Tag(d) => &d.merge_sources,
            Self::Performer(d) => &d.merge_sources,
            Self::Studio(d) => &d.merge_sources,
            Self::Scene(d) => &d.merge_sources,
        }
    }

    /// A performer rename that does not carry the old name forward as a
    /// credit alias destroys information, so it is treated like a
    /// destructive operation for grace-period purposes.
    pub fn is_destructive_rename(&self) -> bool {
        match self {
            Self::Performer(d) => {
                if let Some(new_name) = &d.new.name {
                    let old_name = d
                        .old
                        .as_ref()
                        .and_then(|o| o.name.as_deref())
                        .map(str::trim)
                        .unwrap_or("");
                    old_name != new_name && !d.set_modify_aliases
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Serialize into the versioned storage envelope.
    pub fn encode(&self) -> Result<serde_json::Value, CoreError> {
        let mut value = serde_json::to_value(self)?;
        value
            .as_object_mut()
            .expect("edit data serializes to an object")
            .insert("version".into(), EDIT_DATA_VERSION.into());
        Ok(value)
    }

    /// Decode a stored payload, validating the version and that the
    /// entity tag matches the edit's target type.
    pub fn decode(value: serde_json::Value, expected: TargetType) -> Result<Self, CoreError> {
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        if version != EDIT_DATA_VERSION {
            return Err(CoreError::UnsupportedPayloadVersion(version));
        }

        let data: EditData = serde_json::from_value(value)?;
        if data.target_type() != expected {
            return Err(CoreError::PayloadMismatch);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::types::new_id;

    fn sample_tag_data() -> EditData {
        EditData::Tag(TagEditData {
            new: TagChanges {
                name: Some("Foo".into()),
                added_aliases: vec!["bar".into()],
                ..Default::default()
            },
            old: Some(TagChanges {
                name: Some("Old Foo".into()),
                ..Default::default()
            }),
            merge_sources: vec![],
            create_id: None,
        })
    }

    #[test]
    fn payload_round_trips_through_the_envelope() {
        let data = sample_tag_data();
        let encoded = data.encode().unwrap();
        assert_eq!(encoded["version"], EDIT_DATA_VERSION);
        assert_eq!(encoded["entity"], "TAG");

        let decoded = EditData::decode(encoded, TargetType::Tag).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let mut encoded = sample_tag_data().encode().unwrap();
        encoded["version"] = 99.into();
        assert_matches!(
            EditData::decode(encoded, TargetType::Tag),
            Err(CoreError::UnsupportedPayloadVersion(99))
        );
    }

    #[test]
    fn decode_rejects_mismatched_entity() {
        let encoded = sample_tag_data().encode().unwrap();
        assert_matches!(
            EditData::decode(encoded, TargetType::Performer),
            Err(CoreError::PayloadMismatch)
        );
    }

    #[test]
    fn rename_without_alias_carryover_is_destructive() {
        let data = EditData::Performer(PerformerEditData {
            new: PerformerChanges {
                name: Some("New Name".into()),
                ..Default::default()
            },
            old: Some(PerformerChanges {
                name: Some("Old Name".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(data.is_destructive_rename());
    }

    #[test]
    fn rename_with_alias_carryover_is_not_destructive() {
        let data = EditData::Performer(PerformerEditData {
            new: PerformerChanges {
                name: Some("New Name".into()),
                ..Default::default()
            },
            old: Some(PerformerChanges {
                name: Some("Old Name".into()),
                ..Default::default()
            }),
            set_modify_aliases: true,
            ..Default::default()
        });
        assert!(!data.is_destructive_rename());
    }

    #[test]
    fn merge_sources_are_exposed_uniformly() {
        let source = new_id();
        let data = EditData::Scene(SceneEditData {
            merge_sources: vec![source],
            ..Default::default()
        });
        assert_eq!(data.merge_sources(), &[source]);
    }
}
