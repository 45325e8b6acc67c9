//! Reversible descriptions of completed operations.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::item::ItemRef;
use crate::request::OperationKind;

/// The kind of action a history record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum HistoryKind {
    Copy,
    Move,
    /// Items were removed for good.
    Delete,
    /// Items were moved to the trash.
    Recycle,
    Rename,
    Restore,
    #[strum(serialize = "Create link")]
    CreateLink,
}

impl From<OperationKind> for HistoryKind {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Copy => Self::Copy,
            OperationKind::Move => Self::Move,
            OperationKind::Delete => Self::Delete,
            OperationKind::Rename => Self::Rename,
            OperationKind::Restore => Self::Restore,
            OperationKind::CreateLink => Self::CreateLink,
        }
    }
}

/// A completed, reversible batch.
///
/// `sources[i]` ended up at `destinations[i]`. A record without destinations
/// marks items that are gone for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// The action performed.
    pub kind: HistoryKind,
    /// Items as they were before the action.
    pub sources: Vec<ItemRef>,
    /// Items as they are after the action, paired by index with `sources`.
    pub destinations: Option<Vec<ItemRef>>,
}

impl HistoryRecord {
    /// Create a record pairing each source with its destination.
    pub fn paired(kind: HistoryKind, pairs: Vec<(ItemRef, ItemRef)>) -> Self {
        let (sources, destinations) = pairs.into_iter().unzip();
        Self {
            kind,
            sources,
            destinations: Some(destinations),
        }
    }

    /// Create a record for items that were removed permanently.
    pub fn deleted(sources: Vec<ItemRef>) -> Self {
        Self {
            kind: HistoryKind::Delete,
            sources,
            destinations: None,
        }
    }

    /// Iterate over (source, destination) pairs. Empty without destinations.
    pub fn pairs(&self) -> impl Iterator<Item = (&ItemRef, &ItemRef)> {
        self.sources
            .iter()
            .zip(self.destinations.iter().flatten())
    }

    /// Number of items the record covers.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the record covers no items.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Check if this record can be reversed.
    pub fn can_undo(&self) -> bool {
        !self.is_empty() && self.kind != HistoryKind::Delete
    }

    /// Human-readable summary of the recorded action.
    pub fn summary(&self) -> String {
        let count = self.len();
        match self.kind {
            HistoryKind::Copy => format!("Copied {count} items"),
            HistoryKind::Move => format!("Moved {count} items"),
            HistoryKind::Delete => format!("Permanently deleted {count} items"),
            HistoryKind::Recycle => format!("Moved {count} items to trash"),
            HistoryKind::Restore => format!("Restored {count} items from trash"),
            HistoryKind::CreateLink => format!("Created {count} links"),
            HistoryKind::Rename => match self.pairs().next() {
                Some((from, to)) if count == 1 => {
                    format!("Renamed '{}' to '{}'", from.file_name(), to.file_name())
                }
                _ => format!("Renamed {count} items"),
            },
        }
    }
}
