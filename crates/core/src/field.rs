//! Three-state optional fields for edit inputs.
//!
//! A PATCH-style input must distinguish "field omitted" (leave it alone)
//! from "field set to null" (clear it) from "field set to a value".
//! [`FieldUpdate`] makes the distinction explicit in the type instead of
//! requiring the caller to introspect raw request arguments.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A tri-state optional update.
///
/// Deserializes from JSON with `#[serde(default)]` on the field:
/// a missing key is `Unset`, an explicit `null` is `Clear`, and a value
/// is `Set(v)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Field was not supplied; the current value is left untouched.
    #[default]
    Unset,
    /// Field was explicitly nulled; the current value is removed.
    Clear,
    /// Field was supplied with a value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// The supplied value, if any.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// The desired end state: `None` for both `Unset` and `Clear`.
    /// Callers that need to distinguish the two should match directly.
    pub fn desired(&self) -> Option<&T> {
        self.as_set()
    }

    /// Resolve against the current value: `Unset` keeps it, `Clear`
    /// drops it, `Set` replaces it.
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unset => current,
            Self::Clear => None,
            Self::Set(v) => Some(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for FieldUpdate<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A present key deserializes here; `null` maps to Clear. Absent
        // keys never reach this impl and fall back to Default (Unset).
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => FieldUpdate::Set(v),
            None => FieldUpdate::Clear,
        })
    }
}

impl<T> Serialize for FieldUpdate<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldUpdate::Set(v) => serializer.serialize_some(v),
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default)]
        name: FieldUpdate<String>,
        #[serde(default)]
        height: FieldUpdate<i64>,
    }

    #[test]
    fn missing_key_is_unset() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.name, FieldUpdate::Unset);
        assert_eq!(patch.height, FieldUpdate::Unset);
    }

    #[test]
    fn explicit_null_is_clear() {
        let patch: Patch = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(patch.name, FieldUpdate::Clear);
        assert_eq!(patch.height, FieldUpdate::Unset);
    }

    #[test]
    fn value_is_set() {
        let patch: Patch = serde_json::from_str(r#"{"name": "Foo", "height": 180}"#).unwrap();
        assert_eq!(patch.name, FieldUpdate::Set("Foo".to_string()));
        assert_eq!(patch.height, FieldUpdate::Set(180));
    }

    #[test]
    fn resolve_applies_the_three_states() {
        let current = Some("old".to_string());
        assert_eq!(
            FieldUpdate::Unset.resolve(current.clone()),
            Some("old".to_string())
        );
        assert_eq!(FieldUpdate::<String>::Clear.resolve(current.clone()), None);
        assert_eq!(
            FieldUpdate::Set("new".to_string()).resolve(current),
            Some("new".to_string())
        );
    }
}
