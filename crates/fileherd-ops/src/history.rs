//! Builds reversible history records from reconciled outcomes.

use fileherd_core::{HistoryKind, HistoryRecord, ItemKind, ItemOutcome, ItemRef, OperationItem};
use itertools::Itertools;

use crate::reconcile::matching_items;

/// Build the record for a relocating operation.
///
/// Each succeeded outcome that landed somewhere other than its source pairs
/// the first request item at that source with a reference to the new
/// location. In-place overwrites cannot be undone and are left out; if
/// nothing relocated there is no record.
pub fn build_history(
    kind: HistoryKind,
    items: &[OperationItem],
    outcomes: &[ItemOutcome],
) -> Option<HistoryRecord> {
    let pairs = relocation_pairs(items, outcomes);
    (!pairs.is_empty()).then(|| HistoryRecord::paired(kind, pairs))
}

/// Build the record for a delete.
///
/// Items that went to the trash produce a `Recycle` record that can be
/// restored; otherwise the sources with a succeeded outcome are recorded as
/// gone for good. Nothing succeeded, no record.
pub fn build_delete_history(sources: &[ItemRef], outcomes: &[ItemOutcome]) -> Option<HistoryRecord> {
    let items: Vec<OperationItem> = sources
        .iter()
        .cloned()
        .map(OperationItem::without_destination)
        .collect();

    build_history(HistoryKind::Recycle, &items, outcomes).or_else(|| {
        let deleted: Vec<ItemRef> = outcomes
            .iter()
            .filter(|outcome| outcome.succeeded)
            .flat_map(|outcome| matching_items(outcome, &items))
            .map(|item| item.source.clone())
            .unique()
            .collect();
        (!deleted.is_empty()).then(|| HistoryRecord::deleted(deleted))
    })
}

/// Build the record for created links. Links are always files, whatever
/// they point at.
pub fn build_link_history(items: &[OperationItem], outcomes: &[ItemOutcome]) -> Option<HistoryRecord> {
    let pairs: Vec<_> = relocation_pairs(items, outcomes)
        .into_iter()
        .map(|(target, link)| (target, ItemRef::new(link.path, ItemKind::File)))
        .collect();
    (!pairs.is_empty()).then(|| HistoryRecord::paired(HistoryKind::CreateLink, pairs))
}

fn relocation_pairs(items: &[OperationItem], outcomes: &[ItemOutcome]) -> Vec<(ItemRef, ItemRef)> {
    outcomes
        .iter()
        .filter(|outcome| outcome.is_relocation())
        .filter_map(|outcome| {
            let item = matching_items(outcome, items).next()?;
            let destination = outcome.destination.as_ref()?;
            Some((item.source.clone(), item.source.with_path(destination)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use fileherd_core::{native, CollisionPolicy};

    fn items(names: &[&str]) -> Vec<OperationItem> {
        names
            .iter()
            .map(|n| {
                OperationItem::new(
                    ItemRef::file(format!("/src/{n}")),
                    format!("/dst/{n}"),
                    CollisionPolicy::GenerateUniqueName,
                )
            })
            .collect()
    }

    #[test]
    fn test_relocations_are_paired() {
        let items = items(&["a", "b"]);
        let outcomes = vec![
            ItemOutcome::succeeded("/src/a", Some(PathBuf::from("/dst/a (1)"))),
            ItemOutcome::succeeded("/src/b", Some(PathBuf::from("/dst/b"))),
        ];

        let record = build_history(HistoryKind::Move, &items, &outcomes).unwrap();
        assert_eq!(record.kind, HistoryKind::Move);
        let pairs: Vec<_> = record.pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].1.path, PathBuf::from("/dst/a (1)"));
    }

    #[test]
    fn test_overwrites_yield_no_record() {
        let items = items(&["a"]);
        let outcomes = vec![ItemOutcome::succeeded("/src/a", Some(PathBuf::from("/src/a")))];
        assert!(build_history(HistoryKind::Copy, &items, &outcomes).is_none());
    }

    #[test]
    fn test_mixed_batch_keeps_only_relocations() {
        let items = items(&["a", "b", "c"]);
        let outcomes = vec![
            ItemOutcome::succeeded("/src/a", Some(PathBuf::from("/src/a"))),
            ItemOutcome::succeeded("/src/b", Some(PathBuf::from("/dst/b"))),
            ItemOutcome::failed("/src/c", Some(native::ACCESS_DENIED_DEST)),
        ];
        let record = build_history(HistoryKind::Copy, &items, &outcomes).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.sources[0].file_name(), "b");
    }

    #[test]
    fn test_unmatched_outcomes_are_ignored() {
        let items = items(&["a"]);
        let outcomes = vec![ItemOutcome::succeeded("/elsewhere", Some(PathBuf::from("/x")))];
        assert!(build_history(HistoryKind::Copy, &items, &outcomes).is_none());
    }

    #[test]
    fn test_links_are_files() {
        let items = vec![OperationItem::new(
            ItemRef::directory("/src/dir"),
            "/desk/dir.lnk",
            CollisionPolicy::GenerateUniqueName,
        )];
        let outcomes = vec![ItemOutcome::succeeded("/src/dir", Some(PathBuf::from("/desk/dir.lnk")))];

        let record = build_link_history(&items, &outcomes).unwrap();
        assert_eq!(record.kind, HistoryKind::CreateLink);
        assert!(record.sources[0].kind.is_dir());
        assert!(record.destinations.unwrap()[0].kind.is_file());
    }

    #[test]
    fn test_delete_to_trash_is_recycle() {
        let sources = vec![ItemRef::file("/a"), ItemRef::directory("/b")];
        let outcomes = vec![
            ItemOutcome::succeeded("/a", Some(PathBuf::from("/trash/$R1"))),
            ItemOutcome::succeeded("/b", Some(PathBuf::from("/trash/$R2"))),
        ];
        let record = build_delete_history(&sources, &outcomes).unwrap();
        assert_eq!(record.kind, HistoryKind::Recycle);
        assert!(record.destinations.as_ref().unwrap()[1].kind.is_dir());
    }

    #[test]
    fn test_permanent_delete_records_unique_sources() {
        let sources = vec![ItemRef::file("/a"), ItemRef::file("/A"), ItemRef::file("/b")];
        let outcomes = vec![
            ItemOutcome::succeeded("/a", None),
            ItemOutcome::succeeded("/b", None),
        ];
        let record = build_delete_history(&sources, &outcomes).unwrap();
        assert_eq!(record.kind, HistoryKind::Delete);
        assert_eq!(record.len(), 2);
        assert!(record.destinations.is_none());
    }

    #[test]
    fn test_permanent_delete_records_only_succeeded_sources() {
        let sources = vec![ItemRef::file("/a"), ItemRef::file("/b"), ItemRef::file("/c")];
        let outcomes = vec![
            ItemOutcome::succeeded("/b", None),
            ItemOutcome::failed("/a", Some(native::USER_CANCELLED)),
            ItemOutcome::failed("/c", Some(native::ACCESS_DENIED_DEST)),
        ];
        let record = build_delete_history(&sources, &outcomes).unwrap();
        assert_eq!(record.kind, HistoryKind::Delete);
        assert_eq!(record.sources, vec![ItemRef::file("/b")]);
    }

    #[test]
    fn test_delete_with_nothing_removed_has_no_record() {
        let sources = vec![ItemRef::file("/a"), ItemRef::file("/b")];
        let outcomes = vec![
            ItemOutcome::failed("/a", Some(native::USER_CANCELLED)),
            ItemOutcome::failed("/b", Some(native::USER_CANCELLED)),
        ];
        assert!(build_delete_history(&sources, &outcomes).is_none());
    }
}
