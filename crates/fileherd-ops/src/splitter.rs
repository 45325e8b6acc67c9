//! Splits a batch by collision policy.
//!
//! The executor takes one overwrite flag per call, so items that must
//! overwrite and items that must not cannot share a dispatch.

use fileherd_core::{CollisionPolicy, OperationItem};
use itertools::{Either, Itertools};

/// A batch partitioned into sub-batches.
#[derive(Debug, Clone, Default)]
pub struct SplitBatch {
    /// Items whose collisions get a fresh name, in request order.
    pub rename_group: Vec<OperationItem>,
    /// Items that overwrite existing destinations, in request order.
    pub replace_group: Vec<OperationItem>,
    /// Number of `Skip` items dropped.
    pub skipped: usize,
}

/// One dispatchable sub-batch.
#[derive(Debug, Clone)]
pub struct SubBatch {
    /// Overwrite flag for the executor.
    pub overwrite: bool,
    pub items: Vec<OperationItem>,
}

impl SplitBatch {
    /// Drop `Skip` items and partition the rest, keeping relative order.
    pub fn split(items: impl IntoIterator<Item = OperationItem>) -> Self {
        let mut skipped = 0;
        let (replace_group, rename_group): (Vec<_>, Vec<_>) = items
            .into_iter()
            .filter(|item| {
                let skip = item.policy == CollisionPolicy::Skip;
                skipped += usize::from(skip);
                !skip
            })
            .partition_map(|item| {
                if item.policy.overwrites() {
                    Either::Left(item)
                } else {
                    Either::Right(item)
                }
            });

        Self {
            rename_group,
            replace_group,
            skipped,
        }
    }

    /// Whether nothing is left to dispatch.
    pub fn is_empty(&self) -> bool {
        self.rename_group.is_empty() && self.replace_group.is_empty()
    }

    /// Number of items left to dispatch.
    pub fn len(&self) -> usize {
        self.rename_group.len() + self.replace_group.len()
    }

    /// Non-empty sub-batches in dispatch order: the rename group, then the
    /// replace group.
    pub fn into_sub_batches(self) -> Vec<SubBatch> {
        [(false, self.rename_group), (true, self.replace_group)]
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(overwrite, items)| SubBatch { overwrite, items })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileherd_core::ItemRef;

    fn item(name: &str, policy: CollisionPolicy) -> OperationItem {
        OperationItem::new(ItemRef::file(format!("/src/{name}")), format!("/dst/{name}"), policy)
    }

    fn names(items: &[OperationItem]) -> Vec<String> {
        items.iter().map(|i| i.source.file_name()).collect()
    }

    #[test]
    fn test_split_preserves_relative_order() {
        let split = SplitBatch::split(vec![
            item("a", CollisionPolicy::ReplaceExisting),
            item("b", CollisionPolicy::GenerateUniqueName),
            item("c", CollisionPolicy::Skip),
            item("d", CollisionPolicy::ReplaceExisting),
            item("e", CollisionPolicy::GenerateUniqueName),
        ]);

        assert_eq!(names(&split.replace_group), vec!["a", "d"]);
        assert_eq!(names(&split.rename_group), vec!["b", "e"]);
        assert_eq!(split.skipped, 1);
        assert_eq!(split.len(), 4);
    }

    #[test]
    fn test_sub_batch_order_is_fixed() {
        let split = SplitBatch::split(vec![
            item("a", CollisionPolicy::ReplaceExisting),
            item("b", CollisionPolicy::GenerateUniqueName),
        ]);
        let batches = split.into_sub_batches();

        assert_eq!(batches.len(), 2);
        assert!(!batches[0].overwrite);
        assert_eq!(names(&batches[0].items), vec!["b"]);
        assert!(batches[1].overwrite);
        assert_eq!(names(&batches[1].items), vec!["a"]);
    }

    #[test]
    fn test_all_skip_yields_nothing() {
        let split = SplitBatch::split(vec![
            item("a", CollisionPolicy::Skip),
            item("b", CollisionPolicy::Skip),
        ]);
        assert!(split.is_empty());
        assert_eq!(split.skipped, 2);
        assert!(split.into_sub_batches().is_empty());
    }

    #[test]
    fn test_single_group_yields_one_batch() {
        let split = SplitBatch::split(vec![item("a", CollisionPolicy::ReplaceExisting)]);
        let batches = split.into_sub_batches();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].overwrite);
    }
}
