//! Set-style diffs between a desired relation list and the current one.
//!
//! Edits store relation changes as added/removed lists rather than full
//! replacements, so two concurrent edits touching different relations of
//! the same entity can both apply. Every diff is computed with the same
//! shape: elements of `desired` absent from `current` are added, elements
//! of `current` absent from `desired` are removed, and each output list
//! is deduplicated under the comparison in use.

use crate::data::{BodyModification, PerformerCredit, UrlRef};

/// Diff two slices under an arbitrary equivalence. Returns
/// `(added, removed)`; each list is unique under `eq`.
pub fn diff_by<T: Clone>(
    desired: &[T],
    current: &[T],
    eq: impl Fn(&T, &T) -> bool,
) -> (Vec<T>, Vec<T>) {
    (
        missing_from(desired, current, &eq),
        missing_from(current, desired, &eq),
    )
}

fn missing_from<T: Clone>(subject: &[T], against: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in subject {
        if against.iter().any(|other| eq(item, other)) {
            continue;
        }
        if out.iter().any(|seen| eq(item, seen)) {
            continue;
        }
        out.push(item.clone());
    }
    out
}

/// Diff under plain equality. Used for aliases, tag ids, and image ids.
pub fn diff_slices<T: PartialEq + Clone>(desired: &[T], current: &[T]) -> (Vec<T>, Vec<T>) {
    diff_by(desired, current, PartialEq::eq)
}

/// Diff URL lists. Two entries match only when both the URL string and
/// the site id are identical.
pub fn diff_urls(desired: &[UrlRef], current: &[UrlRef]) -> (Vec<UrlRef>, Vec<UrlRef>) {
    diff_by(desired, current, PartialEq::eq)
}

/// Diff tattoo or piercing lists, keyed by location.
///
/// An entry whose location exists on both sides but whose description
/// differs, in presence or in value, is treated as changed: it shows up
/// in `added` with the new description and in `removed` with the old one,
/// so applying the pair rewrites the entry in place. Each output list
/// holds at most one entry per location.
pub fn diff_body_modifications(
    desired: &[BodyModification],
    current: &[BodyModification],
) -> (Vec<BodyModification>, Vec<BodyModification>) {
    let eq = |a: &BodyModification, b: &BodyModification| {
        a.location == b.location && a.description == b.description
    };
    let dedup = |a: &BodyModification, b: &BodyModification| a.location == b.location;
    (
        missing_keyed(desired, current, eq, dedup),
        missing_keyed(current, desired, eq, dedup),
    )
}

fn missing_keyed<T: Clone>(
    subject: &[T],
    against: &[T],
    eq: impl Fn(&T, &T) -> bool,
    key_eq: impl Fn(&T, &T) -> bool,
) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in subject {
        if against.iter().any(|other| eq(item, other)) {
            continue;
        }
        if out.iter().any(|seen| key_eq(item, seen)) {
            continue;
        }
        out.push(item.clone());
    }
    out
}

/// Diff scene performer credits. An absent alias and an empty alias are
/// the same credit; only a real alias change counts.
pub fn diff_performer_credits(
    desired: &[PerformerCredit],
    current: &[PerformerCredit],
) -> (Vec<PerformerCredit>, Vec<PerformerCredit>) {
    diff_by(desired, current, |a, b| {
        a.performer_id == b.performer_id && credit_alias(a) == credit_alias(b)
    })
}

fn credit_alias(credit: &PerformerCredit) -> &str {
    credit.alias.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::new_id;

    fn body_mod(location: &str, description: Option<&str>) -> BodyModification {
        BodyModification {
            location: location.into(),
            description: description.map(Into::into),
        }
    }

    #[test]
    fn identical_lists_diff_to_nothing() {
        let list = vec!["a".to_string(), "b".to_string()];
        let (added, removed) = diff_slices(&list, &list);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn added_and_removed_are_disjoint_and_unique() {
        let desired = vec!["a", "b", "b", "c"];
        let current = vec!["c", "d", "d"];
        let (added, removed) = diff_slices(&desired, &current);
        assert_eq!(added, vec!["a", "b"]);
        assert_eq!(removed, vec!["d"]);
        assert!(!added.iter().any(|x| removed.contains(x)));
    }

    #[test]
    fn urls_match_only_on_both_fields() {
        let site_a = new_id();
        let site_b = new_id();
        let url = |s: &str, site| UrlRef { url: s.into(), site_id: site };

        let desired = vec![url("https://example.com/x", site_a)];
        let current = vec![url("https://example.com/x", site_b)];
        let (added, removed) = diff_urls(&desired, &current);
        assert_eq!(added, desired);
        assert_eq!(removed, current);
    }

    #[test]
    fn unchanged_body_mods_diff_to_nothing() {
        let mods = vec![body_mod("arm", Some("dragon")), body_mod("leg", None)];
        let (added, removed) = diff_body_modifications(&mods, &mods);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn changed_description_rewrites_the_entry() {
        let desired = vec![body_mod("arm", Some("dragon"))];
        let current = vec![body_mod("arm", Some("snake"))];
        let (added, removed) = diff_body_modifications(&desired, &current);
        assert_eq!(added, desired);
        assert_eq!(removed, current);
    }

    #[test]
    fn description_presence_change_rewrites_the_entry() {
        let desired = vec![body_mod("arm", Some("dragon"))];
        let current = vec![body_mod("arm", None)];
        let (added, removed) = diff_body_modifications(&desired, &current);
        assert_eq!(added, desired);
        assert_eq!(removed, current);
    }

    #[test]
    fn body_mods_dedup_by_location() {
        let desired = vec![body_mod("arm", Some("a")), body_mod("arm", Some("b"))];
        let current = vec![];
        let (added, _) = diff_body_modifications(&desired, &current);
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn absent_alias_equals_empty_alias() {
        let performer = new_id();
        let desired = vec![PerformerCredit { performer_id: performer, alias: None }];
        let current = vec![PerformerCredit {
            performer_id: performer,
            alias: Some(String::new()),
        }];
        let (added, removed) = diff_performer_credits(&desired, &current);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn alias_change_swaps_the_credit() {
        let performer = new_id();
        let desired = vec![PerformerCredit {
            performer_id: performer,
            alias: Some("Stage Name".into()),
        }];
        let current = vec![PerformerCredit { performer_id: performer, alias: None }];
        let (added, removed) = diff_performer_credits(&desired, &current);
        assert_eq!(added, desired);
        assert_eq!(removed, current);
    }
}
