//! Typed dispatch to the privileged executor.

use std::path::Path;
use std::sync::Arc;

use fileherd_channel::protocol::{DeleteArgs, RenameArgs, TransferArgs};
use fileherd_channel::{PrivilegedChannel, Request};
use fileherd_core::{BatchResult, ItemOutcome, OperationId};
use strum::Display;

use crate::error::{OpsError, OpsResult};

/// Transfer kinds the executor performs in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TransferOp {
    Copy,
    Move,
}

/// Wraps a [`PrivilegedChannel`] with typed operations.
///
/// Transport failures come back as a [`BatchResult`] whose `success` is
/// false; only undecodable replies are errors.
#[derive(Clone)]
pub struct PrivilegedExecutor {
    channel: Arc<dyn PrivilegedChannel>,
}

impl PrivilegedExecutor {
    pub fn new(channel: Arc<dyn PrivilegedChannel>) -> Self {
        Self { channel }
    }

    /// The underlying channel.
    pub fn channel(&self) -> &dyn PrivilegedChannel {
        self.channel.as_ref()
    }

    /// Whether the executor can be reached.
    pub fn is_available(&self) -> bool {
        self.channel.is_available()
    }

    /// Copy or move `sources[i]` to `destinations[i]`.
    pub async fn dispatch(
        &self,
        operation_id: OperationId,
        op: TransferOp,
        sources: Vec<String>,
        destinations: Vec<String>,
        overwrite: bool,
    ) -> OpsResult<BatchResult> {
        let args = TransferArgs {
            operation_id,
            sources,
            destinations,
            overwrite,
        };
        let request = match op {
            TransferOp::Copy => Request::CopyItem(args),
            TransferOp::Move => Request::MoveItem(args),
        };
        self.round_trip(request).await
    }

    /// Delete `sources`, to the trash unless `permanently`.
    pub async fn delete(
        &self,
        operation_id: OperationId,
        sources: Vec<String>,
        permanently: bool,
    ) -> OpsResult<BatchResult> {
        self.round_trip(Request::DeleteItem(DeleteArgs {
            operation_id,
            sources,
            permanently,
        }))
        .await
    }

    /// Rename `source` to `new_name` within its directory.
    pub async fn rename(
        &self,
        operation_id: OperationId,
        source: String,
        new_name: String,
        overwrite: bool,
    ) -> OpsResult<BatchResult> {
        self.round_trip(Request::RenameItem(RenameArgs {
            operation_id,
            source,
            new_name,
            overwrite,
        }))
        .await
    }

    /// Create a link at `link_path` pointing at `target`.
    ///
    /// The executor answers link requests with a bare status, so the outcome
    /// is built here.
    pub async fn create_link(&self, target: &Path, link_path: &Path) -> OpsResult<ItemOutcome> {
        let request = Request::create_link(
            link_path.to_string_lossy().into_owned(),
            target.to_string_lossy().into_owned(),
        );
        let result = self.round_trip(request).await?;
        Ok(if result.success {
            ItemOutcome::succeeded(target, Some(link_path.to_path_buf()))
        } else {
            ItemOutcome::failed(target, None)
        })
    }

    async fn round_trip(&self, request: Request) -> OpsResult<BatchResult> {
        let fileop = request.name();
        match self.channel.send(request).await {
            Ok(response) => Ok(response.into_batch()?),
            Err(e) if e.is_transport() => {
                tracing::warn!(target: "fileherd::channel", fileop, error = %e, "Executor round trip failed");
                Ok(BatchResult::channel_failure())
            }
            Err(e) => Err(OpsError::Protocol(e)),
        }
    }
}

/// Lossy string form of a path, as the executor expects it.
pub(crate) fn wire_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
