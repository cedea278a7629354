//! Bits shared by the per-entity processors.

use curio_core::data::EditData;
use curio_core::edit::TargetType;
use curio_core::error::CoreError;
use curio_core::types::Id;
use sqlx::PgConnection;

use curio_db::repositories::EditRepo;

use crate::error::EditError;

/// A payload built at proposal time, plus the entity ids the edit row
/// should be linked to.
#[derive(Debug)]
pub struct BuiltEdit {
    pub data: EditData,
    pub links: Vec<Id>,
}

/// Drop duplicate entries, keeping first occurrences in order.
pub fn dedup<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Resolve the target id of an applied edit from its link rows: the one
/// linked entity that is not a merge source.
pub async fn linked_target_id(
    conn: &mut PgConnection,
    edit_id: Id,
    target_type: TargetType,
    merge_sources: &[Id],
) -> Result<Id, EditError> {
    let linked = EditRepo::list_linked_ids(conn, edit_id, target_type).await?;
    linked
        .into_iter()
        .find(|id| !merge_sources.contains(id))
        .ok_or_else(|| CoreError::TargetIdMissing.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
