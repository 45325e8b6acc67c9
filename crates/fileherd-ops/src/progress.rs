//! Progress reporting helpers.

use fileherd_core::StatusCode;
use tokio::sync::mpsc;

use crate::engine::OperationContext;

/// An update delivered through an operation's update channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationUpdate {
    /// Overall progress, 0-100.
    Progress(f32),
    /// Final status of the operation.
    Status(StatusCode),
}

impl OperationContext {
    /// Create a context whose progress and statuses arrive on a channel.
    ///
    /// Updates sent after the receiver is dropped are discarded.
    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<OperationUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let status_tx = tx.clone();
        let ctx = Self::new()
            .with_progress(move |percent| {
                let _ = tx.send(OperationUpdate::Progress(percent));
            })
            .with_error_sink(move |status| {
                let _ = status_tx.send(OperationUpdate::Status(status));
            });
        (ctx, rx)
    }
}

/// Tracks item-by-item progress of an operation.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    /// Number of items completed.
    pub items_completed: usize,
    /// Total number of items to process.
    pub items_total: usize,
}

impl ProgressTracker {
    /// Create a tracker for `items_total` items.
    pub fn new(items_total: usize) -> Self {
        Self {
            items_completed: 0,
            items_total,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f32 {
        if self.items_total > 0 {
            (self.items_completed as f32 / self.items_total as f32) * 100.0
        } else {
            0.0
        }
    }

    /// Mark one more item done and report the new percentage.
    pub fn complete_item(&mut self, ctx: &OperationContext) {
        self.items_completed = (self.items_completed + 1).min(self.items_total);
        ctx.report_progress(self.percentage());
    }

    /// Whether every item has been processed.
    pub fn is_done(&self) -> bool {
        self.items_completed >= self.items_total
    }
}
