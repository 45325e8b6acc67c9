//! Operation requests submitted by callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::ModelError;
use crate::item::ItemRef;

/// The kind of bulk operation being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum OperationKind {
    Copy,
    Move,
    Delete,
    Rename,
    Restore,
    #[strum(serialize = "Create link")]
    CreateLink,
}

impl OperationKind {
    /// Whether items of this kind carry a destination.
    pub fn needs_destination(&self) -> bool {
        !matches!(self, Self::Delete)
    }
}

/// How to handle an item whose destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Display)]
pub enum CollisionPolicy {
    /// Leave the item alone.
    Skip,
    /// Overwrite the existing destination.
    ReplaceExisting,
    /// Pick a fresh name such as "file (1).txt".
    #[default]
    GenerateUniqueName,
}

impl CollisionPolicy {
    /// Whether the executor must be told to overwrite.
    pub fn overwrites(&self) -> bool {
        matches!(self, Self::ReplaceExisting)
    }
}

/// One (source, destination, policy) triple of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationItem {
    /// The item being operated on.
    pub source: ItemRef,
    /// Where it goes; the new name for renames and `None` for deletes.
    pub destination: Option<PathBuf>,
    /// Collision handling for this item.
    pub policy: CollisionPolicy,
}

impl OperationItem {
    /// Create an item with an explicit destination and policy.
    pub fn new(source: ItemRef, destination: impl Into<PathBuf>, policy: CollisionPolicy) -> Self {
        Self {
            source,
            destination: Some(destination.into()),
            policy,
        }
    }

    /// Create an item without a destination (used by deletes).
    pub fn without_destination(source: ItemRef) -> Self {
        Self {
            source,
            destination: None,
            policy: CollisionPolicy::default(),
        }
    }

    /// Destination as a lossy string, empty when absent.
    pub fn destination_str(&self) -> String {
        self.destination
            .as_ref()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A validated batch of items to operate on.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRequest {
    kind: OperationKind,
    items: Vec<OperationItem>,
    permanent: bool,
}

impl OperationRequest {
    /// Create a request, checking that it is non-empty and that every item
    /// has a destination unless this is a delete.
    pub fn new(
        kind: OperationKind,
        items: Vec<OperationItem>,
        permanent: bool,
    ) -> Result<Self, ModelError> {
        if items.is_empty() {
            return Err(ModelError::EmptyRequest { kind });
        }

        if kind.needs_destination() {
            if let Some(missing) = items.iter().find(|item| item.destination.is_none()) {
                return Err(ModelError::MissingDestination {
                    kind,
                    path: missing.source.path.clone(),
                });
            }
        }

        Ok(Self {
            kind,
            items,
            permanent,
        })
    }

    /// Create a delete request.
    pub fn delete(sources: Vec<ItemRef>, permanent: bool) -> Result<Self, ModelError> {
        let items = sources
            .into_iter()
            .map(OperationItem::without_destination)
            .collect();
        Self::new(OperationKind::Delete, items, permanent)
    }

    /// Create a rename request for a single item.
    pub fn rename(
        source: ItemRef,
        new_name: impl Into<String>,
        policy: CollisionPolicy,
    ) -> Result<Self, ModelError> {
        let item = OperationItem::new(source, new_name.into(), policy);
        Self::new(OperationKind::Rename, vec![item], false)
    }

    /// The kind of operation.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Items in caller order.
    pub fn items(&self) -> &[OperationItem] {
        &self.items
    }

    /// Whether deletes bypass the trash.
    pub fn permanent(&self) -> bool {
        self.permanent
    }

    /// Consume the request, returning its items.
    pub fn into_items(self) -> Vec<OperationItem> {
        self.items
    }

    /// Source references in caller order.
    pub fn sources(&self) -> impl Iterator<Item = &ItemRef> {
        self.items.iter().map(|item| &item.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_empty() {
        let err = OperationRequest::new(OperationKind::Copy, vec![], false).unwrap_err();
        assert!(matches!(err, ModelError::EmptyRequest { .. }));
    }

    #[test]
    fn test_request_requires_destination_except_delete() {
        let item = OperationItem::without_destination(ItemRef::file("/a.txt"));
        let err = OperationRequest::new(OperationKind::Move, vec![item.clone()], false).unwrap_err();
        assert!(matches!(err, ModelError::MissingDestination { .. }));

        let request = OperationRequest::new(OperationKind::Delete, vec![item], true).unwrap();
        assert!(request.permanent());
        assert_eq!(request.items().len(), 1);
    }

    #[test]
    fn test_rename_request_carries_new_name() {
        let request =
            OperationRequest::rename(ItemRef::file("/dir/a.txt"), "b.txt", CollisionPolicy::Skip)
                .unwrap();
        assert_eq!(request.kind(), OperationKind::Rename);
        assert_eq!(request.items()[0].destination_str(), "b.txt");
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Copy.to_string(), "Copy");
        assert_eq!(OperationKind::CreateLink.to_string(), "Create link");
        assert!(CollisionPolicy::ReplaceExisting.overwrites());
        assert!(!CollisionPolicy::GenerateUniqueName.overwrites());
    }
}
