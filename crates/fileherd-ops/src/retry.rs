//! Chooses what, if anything, goes to the fallback engine after a failure.

use fileherd_core::{OperationItem, StatusCode};

use crate::reconcile::Reconciled;

/// What to do with a request that did not fully succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryPlan {
    /// Run these items once through the fallback engine.
    Fallback(Vec<OperationItem>),
    /// Nothing can be retried; report this status.
    GiveUp(StatusCode),
}

/// Plan the single fallback pass for a failed request.
///
/// Retries every failed item except those that failed terminally
/// (cancelled by the user, or already gone from the trash). Items keep their
/// original destination and policy, and request order.
pub fn plan_retry(reconciled: &Reconciled, items: &[OperationItem]) -> RetryPlan {
    let retryable: Vec<_> = reconciled
        .failed()
        .filter(|outcome| !outcome.is_terminal_failure())
        .collect();

    let retry: Vec<OperationItem> = items
        .iter()
        .filter(|item| retryable.iter().any(|o| item.source.is_at(&o.source)))
        .cloned()
        .collect();

    if retry.is_empty() {
        RetryPlan::GiveUp(reconciled.first_failure_status())
    } else {
        RetryPlan::Fallback(retry)
    }
}
