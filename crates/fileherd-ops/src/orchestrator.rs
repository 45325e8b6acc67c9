//! Routes bulk operations to the privileged executor or the fallback engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fileherd_channel::PrivilegedChannel;
use fileherd_core::{
    validate_filename, BatchResult, CollisionPolicy, HistoryKind, HistoryRecord, ItemRef, OperationItem,
    OperationKind, OperationRequest, OrchestratorConfig, StatusCode,
};
use itertools::Itertools;

use crate::cache::ListingCache;
use crate::classifier::is_privileged_eligible;
use crate::correlator::OperationScope;
use crate::engine::{BoxFuture, FilesystemOperations, HistoryResult, OperationContext};
use crate::history::{build_delete_history, build_history, build_link_history};
use crate::privileged::{wire_path, PrivilegedExecutor, TransferOp};
use crate::progress::ProgressTracker;
use crate::reconcile::{Reconciled, Reconciler};
use crate::retry::{plan_retry, RetryPlan};
use crate::splitter::SplitBatch;
use crate::trash::{info_companion, is_in_trash};

/// How a request stands once its outcomes are reconciled.
enum Settlement {
    /// Every item succeeded, or the request was cancelled part way. History
    /// is built from whatever relocated.
    Complete,
    /// These items go once through the fallback engine.
    Retry(Vec<OperationItem>),
    /// Nothing left to try; the status has been reported.
    GaveUp,
}

/// Executes bulk filesystem operations.
///
/// Requests whose paths the privileged executor can handle go there while it
/// is reachable; everything else, and every retry, goes to the fallback
/// engine.
pub struct Orchestrator {
    privileged: Option<PrivilegedExecutor>,
    fallback: Arc<dyn FilesystemOperations>,
    cache: Option<Arc<dyn ListingCache>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        privileged: Option<Arc<dyn PrivilegedChannel>>,
        fallback: Arc<dyn FilesystemOperations>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            privileged: privileged.map(PrivilegedExecutor::new),
            fallback,
            cache: None,
            config,
        }
    }

    /// Notify `cache` of items removed by deletes.
    pub fn with_listing_cache(mut self, cache: Arc<dyn ListingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run a validated request.
    pub async fn execute(&self, request: OperationRequest, ctx: &OperationContext) -> HistoryResult {
        let kind = request.kind();
        let permanent = request.permanent();
        let items = request.into_items();

        match kind {
            OperationKind::Copy => self.copy_items(items, ctx).await,
            OperationKind::Move => self.move_items(items, ctx).await,
            OperationKind::Delete => {
                let sources = items.into_iter().map(|item| item.source).collect();
                self.delete_items(sources, permanent, ctx).await
            }
            OperationKind::Rename => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    let new_name = item.destination_str();
                    records.push(self.rename_item(item.source, new_name, item.policy, ctx).await?);
                }
                Ok(merge_records(HistoryKind::Rename, records))
            }
            OperationKind::Restore => self.restore_items_from_trash(items, ctx).await,
            OperationKind::CreateLink => self.create_links(items, ctx).await,
        }
    }

    pub async fn copy_items(&self, items: Vec<OperationItem>, ctx: &OperationContext) -> HistoryResult {
        self.transfer(TransferOp::Copy, items, ctx).await
    }

    pub async fn move_items(&self, items: Vec<OperationItem>, ctx: &OperationContext) -> HistoryResult {
        self.transfer(TransferOp::Move, items, ctx).await
    }

    /// Delete items, to the trash unless `permanent`.
    ///
    /// Items already in the trash are always deleted permanently, together
    /// with their metadata companions.
    pub async fn delete_items(
        &self,
        items: Vec<ItemRef>,
        permanent: bool,
        ctx: &OperationContext,
    ) -> HistoryResult {
        let sources: Vec<ItemRef> = items.into_iter().unique().collect();
        if sources.is_empty() {
            return Ok(None);
        }

        let Some(executor) = self.route(sources.iter().map(|s| s.path.as_path())) else {
            return self.fallback.delete_items(sources, permanent, ctx).await;
        };

        let from_trash = sources
            .first()
            .is_some_and(|first| is_in_trash(&first.path, &self.config));
        let permanent = permanent || from_trash;

        let mut dispatched: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
        if from_trash {
            dispatched.extend(
                sources
                    .iter()
                    .filter_map(|s| info_companion(&s.path, &self.config)),
            );
        }

        tracing::debug!(
            target: "fileherd::orchestrator",
            count = dispatched.len(),
            permanent,
            from_trash,
            "Dispatching delete"
        );

        let mut scope = OperationScope::open(executor.channel(), ctx);
        let id = scope.id();
        let paths = dispatched.iter().map(|p| wire_path(p)).collect();
        let result = scope.run(executor.delete(id, paths, permanent), ctx).await?;

        let mut reconciler = Reconciler::new();
        if scope.cancel_sent() {
            reconciler.mark_interrupted();
        }
        drop(scope);
        reconciler.add_batch(dispatched.iter().map(PathBuf::as_path), result);
        let reconciled = reconciler.finish();

        self.notify_removed(&reconciled).await;

        let items: Vec<OperationItem> = sources
            .iter()
            .cloned()
            .map(OperationItem::without_destination)
            .collect();
        match self.settle(OperationKind::Delete, &reconciled, &items, ctx) {
            Settlement::Complete => Ok(build_delete_history(&sources, &reconciled.outcomes)),
            Settlement::Retry(retry) => {
                self.fallback_for(OperationKind::Delete, retry, permanent, ctx)
                    .await
            }
            Settlement::GaveUp => Ok(None),
        }
    }

    /// Give `item` a new name within its directory.
    ///
    /// An invalid name is reported as [`StatusCode::InvalidName`] and nothing
    /// is dispatched.
    pub async fn rename_item(
        &self,
        item: ItemRef,
        new_name: String,
        policy: CollisionPolicy,
        ctx: &OperationContext,
    ) -> HistoryResult {
        if let Err(e) = validate_filename(&new_name) {
            tracing::debug!(target: "fileherd::orchestrator", error = %e, "Rejected rename");
            ctx.report_status(StatusCode::InvalidName);
            return Ok(None);
        }

        let Some(executor) = self.route([item.path.as_path()]) else {
            return self.fallback.rename_item(item, new_name, policy, ctx).await;
        };

        tracing::debug!(target: "fileherd::orchestrator", path = %item.path.display(), new_name = %new_name, "Dispatching rename");

        let mut scope = OperationScope::open(executor.channel(), ctx);
        let id = scope.id();
        let dispatch = executor.rename(id, wire_path(&item.path), new_name.clone(), policy.overwrites());
        let result = scope.run(dispatch, ctx).await?;

        let mut reconciler = Reconciler::new();
        if scope.cancel_sent() {
            reconciler.mark_interrupted();
        }
        drop(scope);
        reconciler.add_batch([item.path.as_path()], result);
        let reconciled = reconciler.finish();

        let items = [OperationItem::new(item, new_name, policy)];
        match self.settle(OperationKind::Rename, &reconciled, &items, ctx) {
            Settlement::Complete => Ok(build_history(HistoryKind::Rename, &items, &reconciled.outcomes)),
            Settlement::Retry(retry) => {
                self.fallback_for(OperationKind::Rename, retry, false, ctx)
                    .await
            }
            Settlement::GaveUp => Ok(None),
        }
    }

    /// Move trashed items (sources) back to their original paths
    /// (destinations), then remove their metadata companions.
    pub async fn restore_items_from_trash(
        &self,
        items: Vec<OperationItem>,
        ctx: &OperationContext,
    ) -> HistoryResult {
        if items.is_empty() {
            return Ok(None);
        }

        let Some(executor) = self.route(item_paths(&items)) else {
            return self.fallback.restore_items_from_trash(items, ctx).await;
        };

        tracing::debug!(target: "fileherd::orchestrator", count = items.len(), "Dispatching restore");

        let mut scope = OperationScope::open(executor.channel(), ctx);
        let id = scope.id();
        let (sources, destinations) = wire_pairs(&items);
        let dispatch = executor.dispatch(id, TransferOp::Move, sources, destinations, false);
        let result = scope.run(dispatch, ctx).await?;

        let mut reconciler = Reconciler::new();
        if scope.cancel_sent() {
            reconciler.mark_interrupted();
        }
        drop(scope);
        reconciler.add_batch(items.iter().map(|i| i.source.path.as_path()), result);
        let reconciled = reconciler.finish();

        match self.settle(OperationKind::Restore, &reconciled, &items, ctx) {
            Settlement::Complete => {
                self.delete_companions(&reconciled, ctx).await;
                Ok(build_history(HistoryKind::Restore, &items, &reconciled.outcomes))
            }
            Settlement::Retry(retry) => {
                self.fallback_for(OperationKind::Restore, retry, false, ctx)
                    .await
            }
            Settlement::GaveUp => Ok(None),
        }
    }

    /// Create a link at each item's destination pointing at its source.
    pub async fn create_links(&self, items: Vec<OperationItem>, ctx: &OperationContext) -> HistoryResult {
        let items: Vec<OperationItem> = items
            .into_iter()
            .filter(|item| {
                !item.source.path.as_os_str().is_empty()
                    && item.destination.as_ref().is_some_and(|d| !d.as_os_str().is_empty())
            })
            .collect();
        if items.is_empty() {
            return Ok(None);
        }

        let Some(executor) = self.route(item_paths(&items)) else {
            return self.fallback.create_links(items, ctx).await;
        };

        tracing::debug!(target: "fileherd::orchestrator", count = items.len(), "Dispatching link creation");

        let mut tracker = ProgressTracker::new(items.len());
        let mut reconciler = Reconciler::new();
        for (index, item) in items.iter().enumerate() {
            if ctx.is_cancelled() {
                reconciler.add_cancelled(items[index..].iter().map(|i| i.source.path.as_path()));
                break;
            }

            let Some(link) = item.destination.as_deref() else {
                continue;
            };
            let outcome = executor.create_link(&item.source.path, link).await?;
            reconciler.add_batch(
                [item.source.path.as_path()],
                BatchResult::new(true, vec![outcome]),
            );
            tracker.complete_item(ctx);
        }
        let reconciled = reconciler.finish();

        match self.settle(OperationKind::CreateLink, &reconciled, &items, ctx) {
            Settlement::Complete => Ok(build_link_history(&items, &reconciled.outcomes)),
            Settlement::Retry(retry) => {
                self.fallback_for(OperationKind::CreateLink, retry, false, ctx)
                    .await
            }
            Settlement::GaveUp => Ok(None),
        }
    }

    async fn transfer(
        &self,
        op: TransferOp,
        items: Vec<OperationItem>,
        ctx: &OperationContext,
    ) -> HistoryResult {
        let kind = match op {
            TransferOp::Copy => OperationKind::Copy,
            TransferOp::Move => OperationKind::Move,
        };
        if items.is_empty() {
            return Ok(None);
        }

        let Some(executor) = self.route(item_paths(&items)) else {
            return self.fallback_for(kind, items, false, ctx).await;
        };

        let split = SplitBatch::split(items.iter().cloned());
        if split.is_empty() {
            tracing::debug!(target: "fileherd::orchestrator", %op, skipped = split.skipped, "Every item skipped");
            ctx.report_progress(100.0);
            ctx.report_status(StatusCode::Success);
            return Ok(None);
        }

        let mut scope = OperationScope::open(executor.channel(), ctx);
        let id = scope.id();
        let mut reconciler = Reconciler::new();

        for batch in split.into_sub_batches() {
            let paths = batch.items.iter().map(|i| i.source.path.as_path());
            if ctx.is_cancelled() {
                tracing::debug!(target: "fileherd::orchestrator", operation_id = %id, "Skipping sub-batch after cancellation");
                reconciler.add_cancelled(paths);
                continue;
            }

            tracing::debug!(
                target: "fileherd::orchestrator",
                operation_id = %id,
                %op,
                count = batch.items.len(),
                overwrite = batch.overwrite,
                "Dispatching sub-batch"
            );

            let (sources, destinations) = wire_pairs(&batch.items);
            let dispatch = executor.dispatch(id, op, sources, destinations, batch.overwrite);
            let result = scope.run(dispatch, ctx).await?;
            if scope.cancel_sent() {
                reconciler.mark_interrupted();
            }
            reconciler.add_batch(paths, result);
        }
        drop(scope);

        let reconciled = reconciler.finish();
        match self.settle(kind, &reconciled, &items, ctx) {
            Settlement::Complete => Ok(build_history(kind.into(), &items, &reconciled.outcomes)),
            Settlement::Retry(retry) => self.fallback_for(kind, retry, false, ctx).await,
            Settlement::GaveUp => Ok(None),
        }
    }

    /// The executor to use for `paths`, if any.
    fn route<'p>(&self, paths: impl IntoIterator<Item = &'p Path>) -> Option<&PrivilegedExecutor> {
        let Some(executor) = self.privileged.as_ref() else {
            tracing::debug!(target: "fileherd::orchestrator", "No privileged executor, using fallback");
            return None;
        };
        if !self.config.prefer_privileged {
            tracing::debug!(target: "fileherd::orchestrator", "Privileged executor disabled, using fallback");
            return None;
        }
        if !executor.is_available() {
            tracing::debug!(target: "fileherd::orchestrator", "Privileged executor unavailable, using fallback");
            return None;
        }
        if !is_privileged_eligible(paths, &self.config) {
            tracing::debug!(target: "fileherd::orchestrator", "Paths not eligible for privileged executor, using fallback");
            return None;
        }
        Some(executor)
    }

    /// Report the result of a privileged pass and decide what follows.
    fn settle(
        &self,
        kind: OperationKind,
        reconciled: &Reconciled,
        items: &[OperationItem],
        ctx: &OperationContext,
    ) -> Settlement {
        if reconciled.success {
            tracing::info!(
                target: "fileherd::orchestrator",
                %kind,
                count = reconciled.outcomes.len(),
                "Operation completed"
            );
            ctx.report_progress(100.0);
            ctx.report_status(StatusCode::Success);
            return Settlement::Complete;
        }

        if reconciled.interrupted {
            tracing::info!(
                target: "fileherd::orchestrator",
                %kind,
                succeeded = reconciled.succeeded().count(),
                "Operation cancelled"
            );
            ctx.report_status(StatusCode::Cancelled);
            return Settlement::Complete;
        }

        match plan_retry(reconciled, items) {
            RetryPlan::Fallback(retry) => {
                tracing::warn!(
                    target: "fileherd::orchestrator",
                    %kind,
                    failed = reconciled.failed().count(),
                    retrying = retry.len(),
                    "Retrying failed items through fallback"
                );
                Settlement::Retry(retry)
            }
            RetryPlan::GiveUp(status) => {
                tracing::info!(target: "fileherd::orchestrator", %kind, %status, "Operation failed");
                ctx.report_status(status);
                Settlement::GaveUp
            }
        }
    }

    /// Hand `items` to the fallback engine as one `kind` request.
    async fn fallback_for(
        &self,
        kind: OperationKind,
        items: Vec<OperationItem>,
        permanent: bool,
        ctx: &OperationContext,
    ) -> HistoryResult {
        match kind {
            OperationKind::Copy => self.fallback.copy_items(items, ctx).await,
            OperationKind::Move => self.fallback.move_items(items, ctx).await,
            OperationKind::Delete => {
                let sources = items.into_iter().map(|item| item.source).collect();
                self.fallback.delete_items(sources, permanent, ctx).await
            }
            OperationKind::Restore => self.fallback.restore_items_from_trash(items, ctx).await,
            OperationKind::CreateLink => self.fallback.create_links(items, ctx).await,
            OperationKind::Rename if items.len() == 1 => {
                let Some(item) = items.into_iter().next() else {
                    return Ok(None);
                };
                let new_name = item.destination_str();
                self.fallback
                    .rename_item(item.source, new_name, item.policy, ctx)
                    .await
            }
            OperationKind::Rename => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    let new_name = item.destination_str();
                    records.push(
                        self.fallback
                            .rename_item(item.source, new_name, item.policy, ctx)
                            .await?,
                    );
                }
                Ok(merge_records(HistoryKind::Rename, records))
            }
        }
    }

    async fn notify_removed(&self, reconciled: &Reconciled) {
        let Some(cache) = &self.cache else {
            return;
        };
        for outcome in reconciled.succeeded() {
            cache.remove_item(&outcome.source).await;
        }
    }

    /// Permanently delete the metadata companions of restored items.
    async fn delete_companions(&self, reconciled: &Reconciled, ctx: &OperationContext) {
        let companions: Vec<ItemRef> = reconciled
            .succeeded()
            .filter_map(|outcome| info_companion(&outcome.source, &self.config))
            .map(ItemRef::file)
            .collect();
        if companions.is_empty() {
            return;
        }

        let quiet = ctx.detached();
        if let Err(e) = self.delete_items(companions, true, &quiet).await {
            tracing::warn!(target: "fileherd::orchestrator", error = %e, "Could not remove trash metadata");
        }
    }
}

impl FilesystemOperations for Orchestrator {
    fn copy_items<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        Box::pin(Orchestrator::copy_items(self, items, ctx))
    }

    fn move_items<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        Box::pin(Orchestrator::move_items(self, items, ctx))
    }

    fn delete_items<'a>(
        &'a self,
        items: Vec<ItemRef>,
        permanent: bool,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        Box::pin(Orchestrator::delete_items(self, items, permanent, ctx))
    }

    fn rename_item<'a>(
        &'a self,
        item: ItemRef,
        new_name: String,
        policy: CollisionPolicy,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        Box::pin(Orchestrator::rename_item(self, item, new_name, policy, ctx))
    }

    fn restore_items_from_trash<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        Box::pin(Orchestrator::restore_items_from_trash(self, items, ctx))
    }

    fn create_links<'a>(
        &'a self,
        items: Vec<OperationItem>,
        ctx: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        Box::pin(Orchestrator::create_links(self, items, ctx))
    }
}

/// Sources and destinations of `items`, for eligibility checks. A missing
/// destination counts as an empty path.
fn item_paths(items: &[OperationItem]) -> impl Iterator<Item = &Path> {
    items.iter().flat_map(|item| {
        [
            item.source.path.as_path(),
            item.destination.as_deref().unwrap_or(Path::new("")),
        ]
    })
}

fn wire_pairs(items: &[OperationItem]) -> (Vec<String>, Vec<String>) {
    items
        .iter()
        .map(|item| (wire_path(&item.source.path), item.destination_str()))
        .unzip()
}

/// Combine per-item records of one kind into a single record.
fn merge_records(kind: HistoryKind, records: Vec<Option<HistoryRecord>>) -> Option<HistoryRecord> {
    let mut records: Vec<HistoryRecord> = records.into_iter().flatten().collect();
    if records.len() == 1 {
        return records.pop();
    }
    let pairs: Vec<(ItemRef, ItemRef)> = records
        .iter()
        .flat_map(|record| record.pairs().map(|(s, d)| (s.clone(), d.clone())))
        .collect();
    (!pairs.is_empty()).then(|| HistoryRecord::paired(kind, pairs))
}
