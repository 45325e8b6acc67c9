//! The execution channel contract shared by the orchestrator and the
//! fallback engine.

use std::fmt;
use std::sync::Arc;

use fileherd_core::{CollisionPolicy, HistoryRecord, ItemRef, OperationItem, StatusCode};
use tokio_util::sync::CancellationToken;

pub use fileherd_channel::BoxFuture;

use crate::error::OpsResult;

/// Result of a high-level operation: a reversible record, or `None` when
/// nothing undoable happened.
pub type HistoryResult = OpsResult<Option<HistoryRecord>>;

/// Receives overall progress as a percentage in `0.0..=100.0`.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f32);
}

impl<F> ProgressSink for F
where
    F: Fn(f32) + Send + Sync,
{
    fn report(&self, percent: f32) {
        self(percent)
    }
}

/// Receives the final status of an operation.
pub trait ErrorSink: Send + Sync {
    fn report(&self, status: StatusCode);
}

impl<F> ErrorSink for F
where
    F: Fn(StatusCode) + Send + Sync,
{
    fn report(&self, status: StatusCode) {
        self(status)
    }
}

/// Caller-supplied sinks and cancellation signal for one operation.
#[derive(Clone, Default)]
pub struct OperationContext {
    progress: Option<Arc<dyn ProgressSink>>,
    errors: Option<Arc<dyn ErrorSink>>,
    cancel: CancellationToken,
}

impl OperationContext {
    /// Create a context with no sinks and a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report progress to a closure.
    pub fn with_progress(self, sink: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.with_progress_sink(Arc::new(sink))
    }

    /// Report statuses to a closure.
    pub fn with_error_sink(self, sink: impl Fn(StatusCode) + Send + Sync + 'static) -> Self {
        self.with_status_sink(Arc::new(sink))
    }

    /// Report progress to a shared sink.
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Report statuses to a shared sink.
    pub fn with_status_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.errors = Some(sink);
        self
    }

    /// Use `token` as the cancellation signal.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A context that reports nowhere and has its own cancellation signal,
    /// for follow-up work that must finish even if this request is cancelled.
    pub fn detached(&self) -> Self {
        Self {
            progress: None,
            errors: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Forward a progress value, clamped to `0.0..=100.0`.
    pub fn report_progress(&self, percent: f32) {
        if let Some(sink) = &self.progress {
            let percent = if percent.is_nan() {
                0.0
            } else {
                percent.clamp(0.0, 100.0)
            };
            sink.report(percent);
        }
    }

    /// Forward a status.
    pub fn report_status(&self, status: StatusCode) {
        if let Some(sink) = &self.errors {
            sink.report(status);
        }
    }

    /// The cancellation signal.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("progress", &self.progress.is_some())
            .field("errors", &self.errors.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// High-level filesystem operations.
///
/// Implemented by the orchestrator and by the in-process fallback engine, so
/// either can stand in for the other. Expected failures are reported through
/// the context's error sink, not returned as errors.
pub trait FilesystemOperations: Send + Sync {
    /// Copy each item's source to its destination.
    fn copy_items<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult>;

    /// Move each item's source to its destination.
    fn move_items<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult>;

    /// Delete items, to the trash unless `permanent`.
    fn delete_items<'a>(
        &'a self,
        items: Vec<ItemRef>,
        permanent: bool,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult>;

    /// Give one item a new name within its directory.
    fn rename_item<'a>(
        &'a self,
        item: ItemRef,
        new_name: String,
        policy: CollisionPolicy,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult>;

    /// Move trashed items (sources) back to their original paths (destinations).
    fn restore_items_from_trash<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult>;

    /// Create a link at each destination pointing at its source.
    fn create_links<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_is_clamped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let ctx = OperationContext::new().with_progress(move |p| sink.lock().unwrap().push(p));

        ctx.report_progress(-5.0);
        ctx.report_progress(42.5);
        ctx.report_progress(250.0);
        ctx.report_progress(f32::NAN);

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 42.5, 100.0, 0.0]);
    }

    #[test]
    fn test_detached_is_silent_and_outlives_cancellation() {
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&statuses);
        let ctx = OperationContext::new().with_error_sink(move |s| sink.lock().unwrap().push(s));
        ctx.cancellation().cancel();

        let detached = ctx.detached();
        detached.report_status(StatusCode::Generic);
        assert!(statuses.lock().unwrap().is_empty());
        assert!(!detached.is_cancelled());
    }
}
