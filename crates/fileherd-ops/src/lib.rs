//! Bulk filesystem operations for fileherd.
//!
//! The [`Orchestrator`] sends copy, move, delete, rename, restore and link
//! requests to a privileged executor when it can, splits them by collision
//! policy, follows their progress, retries failures through an in-process
//! fallback engine and turns the outcome into a [`HistoryRecord`] for undo.
//!
//! [`HistoryRecord`]: fileherd_core::HistoryRecord

mod cache;
mod classifier;
mod correlator;
mod engine;
mod error;
mod history;
mod orchestrator;
mod privileged;
mod progress;
mod reconcile;
mod retry;
mod splitter;
mod trash;
mod undo;

pub use cache::ListingCache;
pub use classifier::{is_eligible_path, is_inside_archive, is_privileged_eligible, is_remote_path};
pub use correlator::OperationScope;
pub use engine::{
    BoxFuture, ErrorSink, FilesystemOperations, HistoryResult, OperationContext, ProgressSink,
};
pub use error::{OpsError, OpsResult};
pub use history::{build_delete_history, build_history, build_link_history};
pub use orchestrator::Orchestrator;
pub use privileged::{PrivilegedExecutor, TransferOp};
pub use progress::{OperationUpdate, ProgressTracker};
pub use reconcile::{matching_items, Reconciled, Reconciler};
pub use retry::{plan_retry, RetryPlan};
pub use splitter::{SplitBatch, SubBatch};
pub use trash::{info_companion, is_in_trash};
pub use undo::{execute_redo, execute_undo, UndoEntry, UndoLog};
