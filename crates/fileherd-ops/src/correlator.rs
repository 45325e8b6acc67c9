//! Ties progress events and cancellation to one in-flight request.

use std::future::Future;

use fileherd_channel::{PrivilegedChannel, ProgressEvent};
use fileherd_core::OperationId;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::engine::OperationContext;

/// The per-request subscription to the executor's event stream.
///
/// Opening a scope mints the request's [`OperationId`] and subscribes to
/// progress. The subscription is the owned `broadcast::Receiver`, so dropping
/// the scope unsubscribes on any exit path; the `Drop` impl only logs.
pub struct OperationScope<'a> {
    id: OperationId,
    channel: &'a dyn PrivilegedChannel,
    events: broadcast::Receiver<ProgressEvent>,
    events_open: bool,
    cancel: CancellationToken,
    cancel_sent: bool,
}

impl<'a> OperationScope<'a> {
    /// Mint an id and subscribe to `channel`'s events.
    pub fn open(channel: &'a dyn PrivilegedChannel, ctx: &OperationContext) -> Self {
        let id = OperationId::new();
        tracing::debug!(target: "fileherd::correlator", operation_id = %id, "Opened operation scope");
        Self {
            id,
            channel,
            events: channel.subscribe(),
            events_open: true,
            cancel: ctx.cancellation().clone(),
            cancel_sent: false,
        }
    }

    /// The request's operation id.
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Whether a cancel message was sent for this request.
    pub fn cancel_sent(&self) -> bool {
        self.cancel_sent
    }

    /// Drive `dispatch` to completion, forwarding this request's progress to
    /// `ctx` and passing on the first cancellation to the executor.
    pub async fn run<F, T>(&mut self, dispatch: F, ctx: &OperationContext) -> T
    where
        F: Future<Output = T>,
    {
        tokio::pin!(dispatch);

        let output = loop {
            tokio::select! {
                biased;

                output = &mut dispatch => break output,

                _ = self.cancel.cancelled(), if !self.cancel_sent => {
                    self.send_cancel().await;
                }

                event = self.events.recv(), if self.events_open => match event {
                    Ok(event) => self.forward(event, ctx),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(target: "fileherd::correlator", operation_id = %self.id, skipped, "Progress subscriber lagged");
                    }
                    Err(RecvError::Closed) => self.events_open = false,
                },
            }
        };

        // Events published before the reply may still be queued.
        self.drain(ctx);
        output
    }

    fn forward(&self, event: ProgressEvent, ctx: &OperationContext) {
        if event.operation_id == self.id {
            ctx.report_progress(event.progress);
        }
    }

    fn drain(&mut self, ctx: &OperationContext) {
        while self.events_open {
            match self.events.try_recv() {
                Ok(event) => self.forward(event, ctx),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => self.events_open = false,
            }
        }
    }

    async fn send_cancel(&mut self) {
        self.cancel_sent = true;
        tracing::debug!(target: "fileherd::correlator", operation_id = %self.id, "Sending cancellation");
        if let Err(e) = self.channel.cancel(self.id).await {
            tracing::warn!(target: "fileherd::correlator", operation_id = %self.id, error = %e, "Cancel message was not delivered");
        }
    }
}

impl Drop for OperationScope<'_> {
    fn drop(&mut self) {
        tracing::debug!(target: "fileherd::correlator", operation_id = %self.id, "Closed operation scope");
    }
}
