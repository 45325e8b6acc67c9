//! Undo log for completed operations.

use std::collections::VecDeque;
use std::time::SystemTime;

use fileherd_core::{
    CollisionPolicy, HistoryKind, HistoryRecord, ItemRef, OperationItem, OrchestratorConfig,
};

use crate::engine::{FilesystemOperations, OperationContext};
use crate::error::{OpsError, OpsResult};

/// An entry in the undo log.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    /// Unique ID for this entry.
    pub id: u64,
    /// When the operation was performed.
    pub timestamp: SystemTime,
    /// What the operation did.
    pub record: HistoryRecord,
    /// Human-readable description.
    pub description: String,
}

impl UndoEntry {
    /// Create a new undo entry described by its record's summary.
    pub fn new(id: u64, record: HistoryRecord) -> Self {
        Self {
            id,
            timestamp: SystemTime::now(),
            description: record.summary(),
            record,
        }
    }

    /// Get a description of how to undo this entry.
    pub fn undo_description(&self) -> String {
        let count = self.record.len();
        match self.record.kind {
            HistoryKind::Copy => format!("Delete {count} copied items"),
            HistoryKind::Move => format!("Move {count} items back to original location"),
            HistoryKind::Delete => "Cannot undo permanent deletion".to_string(),
            HistoryKind::Recycle => format!("Restore {count} items from trash"),
            HistoryKind::Restore => format!("Move {count} items back to trash"),
            HistoryKind::CreateLink => format!("Delete {count} links"),
            HistoryKind::Rename => match self.record.sources.first() {
                Some(original) if count == 1 => format!("Rename back to '{}'", original.file_name()),
                _ => format!("Rename {count} items back"),
            },
        }
    }

    fn replace_record(&mut self, record: HistoryRecord) {
        self.description = record.summary();
        self.record = record;
    }
}

/// Undo log with configurable maximum depth and a redo stack.
#[derive(Debug)]
pub struct UndoLog {
    entries: VecDeque<UndoEntry>,
    redo: Vec<UndoEntry>,
    max_entries: usize,
    next_id: u64,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoLog {
    /// Create a new undo log with the specified maximum entries.
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1000)),
            redo: Vec::new(),
            max_entries,
            next_id: 0,
        }
    }

    /// Create a log holding `history_depth` entries.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(config.history_depth)
    }

    /// Record a completed operation.
    ///
    /// Clears the redo stack. Returns the ID assigned to this entry.
    pub fn record(&mut self, record: HistoryRecord) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.redo.clear();
        self.push_undo(UndoEntry::new(id, record));
        id
    }

    /// Pop the most recent undoable entry.
    ///
    /// Entries that cannot be undone are discarded on the way.
    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        while let Some(entry) = self.entries.pop_back() {
            if entry.record.can_undo() {
                return Some(entry);
            }
            tracing::debug!(target: "fileherd::undo", id = entry.id, kind = %entry.record.kind, "Discarding irreversible entry");
        }
        None
    }

    /// Put an entry back on top of the undo stack without touching redo.
    pub fn push_undo(&mut self, entry: UndoEntry) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Pop the most recently undone entry.
    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        self.redo.pop()
    }

    /// Make an undone entry available to redo.
    pub fn push_redo(&mut self, entry: UndoEntry) {
        self.redo.push(entry);
    }

    /// Undo the most recent entry through `ops`.
    ///
    /// Returns false when there was nothing to undo. On error the entry stays
    /// on the undo stack.
    pub async fn undo(&mut self, ops: &dyn FilesystemOperations, ctx: &OperationContext) -> OpsResult<bool> {
        let Some(mut entry) = self.pop_undo() else {
            return Ok(false);
        };

        tracing::debug!(target: "fileherd::undo", id = entry.id, kind = %entry.record.kind, "Undoing");
        match execute_undo(&entry.record, ops, ctx).await {
            Ok(replacement) => {
                if let Some(record) = replacement {
                    entry.replace_record(record);
                }
                self.push_redo(entry);
                Ok(true)
            }
            Err(e) => {
                self.push_undo(entry);
                Err(e)
            }
        }
    }

    /// Redo the most recently undone entry through `ops`.
    ///
    /// Returns false when there was nothing to redo. On error the entry stays
    /// on the redo stack.
    pub async fn redo(&mut self, ops: &dyn FilesystemOperations, ctx: &OperationContext) -> OpsResult<bool> {
        let Some(mut entry) = self.pop_redo() else {
            return Ok(false);
        };

        tracing::debug!(target: "fileherd::undo", id = entry.id, kind = %entry.record.kind, "Redoing");
        match execute_redo(&entry.record, ops, ctx).await {
            Ok(replacement) => {
                if let Some(record) = replacement {
                    entry.replace_record(record);
                }
                self.push_undo(entry);
                Ok(true)
            }
            Err(e) => {
                self.push_redo(entry);
                Err(e)
            }
        }
    }

    /// Peek at the most recent entry without removing it.
    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.back()
    }

    /// Peek at the entry the next redo would replay.
    pub fn peek_redo(&self) -> Option<&UndoEntry> {
        self.redo.last()
    }

    /// Get the number of entries in the log.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries available to redo.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Clear all entries from the log.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.redo.clear();
    }

    /// Get an iterator over all entries (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &UndoEntry> {
        self.entries.iter()
    }
}

/// Reverse `record` through `ops`.
///
/// Returns the record that should replace the undone one, when reversing it
/// changed where the items live.
pub async fn execute_undo(
    record: &HistoryRecord,
    ops: &dyn FilesystemOperations,
    ctx: &OperationContext,
) -> OpsResult<Option<HistoryRecord>> {
    match record.kind {
        HistoryKind::Delete => Err(OpsError::Irreversible { kind: record.kind }),
        HistoryKind::Copy => {
            ops.delete_items(destinations(record), false, ctx).await?;
            Ok(None)
        }
        HistoryKind::CreateLink => {
            ops.delete_items(destinations(record), true, ctx).await?;
            Ok(None)
        }
        HistoryKind::Move => {
            ops.move_items(reversed_items(record), ctx).await?;
            Ok(None)
        }
        HistoryKind::Rename => {
            for (original, renamed) in record.pairs() {
                ops.rename_item(
                    renamed.clone(),
                    original.file_name(),
                    CollisionPolicy::GenerateUniqueName,
                    ctx,
                )
                .await?;
            }
            Ok(None)
        }
        HistoryKind::Recycle => {
            ops.restore_items_from_trash(reversed_items(record), ctx).await?;
            Ok(None)
        }
        HistoryKind::Restore => {
            let recycled = ops.delete_items(destinations(record), false, ctx).await?;
            Ok(recycled.map(|recycled| {
                let pairs = recycled
                    .pairs()
                    .map(|(original, trashed)| (trashed.clone(), original.clone()))
                    .collect();
                HistoryRecord::paired(HistoryKind::Restore, pairs)
            }))
        }
    }
}

/// Perform `record` again through `ops`.
///
/// Returns the record of the repeated operation, which replaces the redone
/// one.
pub async fn execute_redo(
    record: &HistoryRecord,
    ops: &dyn FilesystemOperations,
    ctx: &OperationContext,
) -> OpsResult<Option<HistoryRecord>> {
    match record.kind {
        HistoryKind::Delete => Err(OpsError::Irreversible { kind: record.kind }),
        HistoryKind::Copy => ops.copy_items(forward_items(record), ctx).await,
        HistoryKind::Move => ops.move_items(forward_items(record), ctx).await,
        HistoryKind::CreateLink => ops.create_links(forward_items(record), ctx).await,
        HistoryKind::Restore => ops.restore_items_from_trash(forward_items(record), ctx).await,
        HistoryKind::Recycle => ops.delete_items(record.sources.clone(), false, ctx).await,
        HistoryKind::Rename => {
            let mut pairs = Vec::with_capacity(record.len());
            for (original, renamed) in record.pairs() {
                let redone = ops
                    .rename_item(
                        original.clone(),
                        renamed.file_name(),
                        CollisionPolicy::GenerateUniqueName,
                        ctx,
                    )
                    .await?;
                if let Some(redone) = redone {
                    pairs.extend(redone.pairs().map(|(s, d)| (s.clone(), d.clone())));
                }
            }
            Ok((!pairs.is_empty()).then(|| HistoryRecord::paired(HistoryKind::Rename, pairs)))
        }
    }
}

fn destinations(record: &HistoryRecord) -> Vec<ItemRef> {
    record.pairs().map(|(_, dest)| dest.clone()).collect()
}

/// Items taking each destination back to its source.
fn reversed_items(record: &HistoryRecord) -> Vec<OperationItem> {
    record
        .pairs()
        .map(|(source, dest)| {
            OperationItem::new(
                dest.clone(),
                source.path.clone(),
                CollisionPolicy::GenerateUniqueName,
            )
        })
        .collect()
}

/// Items taking each source to its destination again.
fn forward_items(record: &HistoryRecord) -> Vec<OperationItem> {
    record
        .pairs()
        .map(|(source, dest)| {
            OperationItem::new(
                source.clone(),
                dest.path.clone(),
                CollisionPolicy::GenerateUniqueName,
            )
        })
        .collect()
}
