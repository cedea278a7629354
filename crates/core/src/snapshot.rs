//! Old/new field snapshots and the apply-time prerequisite guard.
//!
//! A modify edit stores, for each field it touches, the value at proposal
//! time (`old`) and the desired value (`new`). Untouched fields appear in
//! neither. At apply time the guard re-checks every captured `old` value
//! against the live row so a stale edit cannot clobber an intervening
//! change.

use crate::error::CoreError;
use crate::field::FieldUpdate;

/// Compute the `(old, new)` snapshot pair for one optional field.
///
/// `Unset` produces `(None, None)` and the field is considered untouched.
/// `Clear` captures the current value (if any) as `old` with no `new`.
/// `Set` captures both sides, unless the value already matches, in which
/// case the field is untouched.
pub fn diff_option<T: PartialEq + Clone>(
    current: Option<&T>,
    update: &FieldUpdate<T>,
) -> (Option<T>, Option<T>) {
    match update {
        FieldUpdate::Unset => (None, None),
        FieldUpdate::Clear => (current.cloned(), None),
        FieldUpdate::Set(v) => {
            if current == Some(v) {
                (None, None)
            } else {
                (current.cloned(), Some(v.clone()))
            }
        }
    }
}

/// Snapshot pair for a required field. `Clear` is treated as untouched;
/// required fields cannot be nulled through an edit.
pub fn diff_required<T: PartialEq + Clone>(
    current: &T,
    update: &FieldUpdate<T>,
) -> (Option<T>, Option<T>) {
    match update {
        FieldUpdate::Set(v) if v != current => (Some(current.clone()), Some(v.clone())),
        _ => (None, None),
    }
}

/// Whether the snapshot pair marks the field as changed by this edit.
/// Clearing counts: `old` present with no `new` is a change.
pub fn is_changed<T>(old: &Option<T>, new: &Option<T>) -> bool {
    old.is_some() || new.is_some()
}

/// Resolve a snapshot pair against the live value at apply time: a
/// present `new` replaces, an `old` with no `new` clears, and an
/// untouched field keeps the live value.
pub fn apply_option<T: Clone>(
    live: Option<T>,
    old: &Option<T>,
    new: &Option<T>,
) -> Option<T> {
    match (old, new) {
        (_, Some(v)) => Some(v.clone()),
        (Some(_), None) => None,
        (None, None) => live,
    }
}

/// Apply-time guard for an optional field: fails only when the captured
/// `old` value is present and disagrees with the live value. An absent
/// `old` means the field was untouched or was empty at proposal time;
/// neither blocks the apply.
pub fn guard_option<T: PartialEq + std::fmt::Display>(
    field: &'static str,
    old: Option<&T>,
    live: Option<&T>,
) -> Result<(), CoreError> {
    if let Some(expected) = old {
        if live != Some(expected) {
            return Err(CoreError::PrerequisiteFailed {
                field,
                expected: expected.to_string(),
                actual: live.map(ToString::to_string).unwrap_or_default(),
            });
        }
    }
    Ok(())
}

/// Guard for a required field.
pub fn guard_required<T: PartialEq + std::fmt::Display>(
    field: &'static str,
    old: Option<&T>,
    live: &T,
) -> Result<(), CoreError> {
    guard_option(field, old, Some(live))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unset_touches_nothing() {
        let (old, new) = diff_option(Some(&"a".to_string()), &FieldUpdate::Unset);
        assert_eq!((old, new), (None, None));
    }

    #[test]
    fn clear_captures_the_current_value() {
        let (old, new) = diff_option(Some(&"a".to_string()), &FieldUpdate::Clear);
        assert_eq!(old, Some("a".to_string()));
        assert_eq!(new, None);
        assert!(is_changed(&old, &new));
    }

    #[test]
    fn clearing_an_empty_field_is_a_no_op() {
        let (old, new) = diff_option::<String>(None, &FieldUpdate::Clear);
        assert!(!is_changed(&old, &new));
    }

    #[test]
    fn setting_the_same_value_is_a_no_op() {
        let (old, new) = diff_option(Some(&5), &FieldUpdate::Set(5));
        assert!(!is_changed(&old, &new));
    }

    #[test]
    fn setting_a_new_value_captures_both_sides() {
        let (old, new) = diff_option(Some(&5), &FieldUpdate::Set(7));
        assert_eq!((old, new), (Some(5), Some(7)));
    }

    #[test]
    fn required_fields_ignore_clear() {
        let (old, new) = diff_required(&"name".to_string(), &FieldUpdate::Clear);
        assert!(!is_changed(&old, &new));
    }

    #[test]
    fn apply_prefers_new_then_clears_then_keeps() {
        assert_eq!(apply_option(Some(1), &Some(1), &Some(2)), Some(2));
        assert_eq!(apply_option(Some(1), &Some(1), &None), None);
        assert_eq!(apply_option(Some(1), &None, &None), Some(1));
    }

    #[test]
    fn guard_passes_when_old_matches_live() {
        assert!(guard_option("name", Some(&"a"), Some(&"a")).is_ok());
    }

    #[test]
    fn guard_passes_when_old_is_absent() {
        // Live value drifted, but the edit never captured this field.
        assert!(guard_option::<&str>("name", None, Some(&"drifted")).is_ok());
    }

    #[test]
    fn guard_fails_on_drift() {
        let err = guard_option("name", Some(&"a"), Some(&"b")).unwrap_err();
        assert_matches!(
            err,
            CoreError::PrerequisiteFailed { field: "name", .. }
        );
        assert!(err.is_prerequisite_failure());
    }

    #[test]
    fn guard_fails_when_live_was_cleared() {
        let err = guard_option::<&str>("name", Some(&"a"), None).unwrap_err();
        assert_matches!(err, CoreError::PrerequisiteFailed { .. });
    }
}
