//! Folds sub-batch results into one verdict for the request.

use std::path::Path;

use fileherd_core::{native, paths_equal, BatchResult, ItemOutcome, OperationItem, StatusCode};

/// Accumulates the results of a request's sub-batches.
#[derive(Debug)]
pub struct Reconciler {
    success: bool,
    interrupted: bool,
    outcomes: Vec<ItemOutcome>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            success: true,
            interrupted: false,
            outcomes: Vec::new(),
        }
    }

    /// Record that the caller cancelled while a sub-batch was in flight.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Add the result of a dispatched sub-batch.
    ///
    /// When the round trip failed, every dispatched path the executor did not
    /// report on is recorded as failed so it can be retried. After
    /// cancellation those paths are recorded as cancelled instead.
    pub fn add_batch<'p>(&mut self, dispatched: impl IntoIterator<Item = &'p Path>, result: BatchResult) {
        if !result.success {
            self.success = false;
            let code = self.interrupted.then_some(native::USER_CANCELLED);
            let missing: Vec<ItemOutcome> = dispatched
                .into_iter()
                .filter(|path| !result.items.iter().any(|o| paths_equal(&o.source, path)))
                .map(|path| ItemOutcome::failed(path, code))
                .collect();
            self.outcomes.extend(result.items);
            self.outcomes.extend(missing);
        } else {
            self.outcomes.extend(result.items);
        }
    }

    /// Record a sub-batch that was never dispatched because of cancellation.
    pub fn add_cancelled<'p>(&mut self, skipped: impl IntoIterator<Item = &'p Path>) {
        self.interrupted = true;
        self.success = false;
        self.outcomes.extend(
            skipped
                .into_iter()
                .map(|path| ItemOutcome::failed(path, Some(native::USER_CANCELLED))),
        );
    }

    pub fn finish(self) -> Reconciled {
        let success = self.success && self.outcomes.iter().all(|o| o.succeeded);
        Reconciled {
            success,
            interrupted: self.interrupted,
            outcomes: self.outcomes,
        }
    }
}

/// The combined verdict for a request.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Every round trip completed and every item succeeded.
    pub success: bool,
    /// The caller cancelled during dispatch.
    pub interrupted: bool,
    /// All outcomes in dispatch order.
    pub outcomes: Vec<ItemOutcome>,
}

impl Reconciled {
    /// Outcomes of items that succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded)
    }

    /// Outcomes of items that failed.
    pub fn failed(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded)
    }

    /// Status of the first failed item, or `Generic` if the failure was only
    /// at the transport level.
    pub fn first_failure_status(&self) -> StatusCode {
        self.failed()
            .next()
            .map(ItemOutcome::status)
            .unwrap_or(StatusCode::Generic)
    }
}

/// Request items whose source is the path an outcome reports on.
///
/// Several items may share a source path; all of them match.
pub fn matching_items<'r>(
    outcome: &'r ItemOutcome,
    items: &'r [OperationItem],
) -> impl Iterator<Item = &'r OperationItem> + 'r {
    items.iter().filter(move |item| item.source.is_at(&outcome.source))
}
