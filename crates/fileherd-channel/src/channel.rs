//! The privileged channel trait.

use std::future::Future;
use std::pin::Pin;

use fileherd_core::OperationId;
use tokio::sync::broadcast;

use crate::error::ChannelResult;
use crate::protocol::{ProgressEvent, Request, Response};

/// Type alias for boxed futures returned by async channel methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A connection to the out-of-process executor that performs operations with
/// elevated capabilities.
///
/// Implementations must be safe to share between tasks. Progress for every
/// in-flight operation arrives on a single event stream; subscribers filter
/// by [`OperationId`].
pub trait PrivilegedChannel: Send + Sync {
    /// Whether a request sent now has a chance of being delivered.
    fn is_available(&self) -> bool;

    /// Send a request and wait for its reply.
    fn send<'a>(&'a self, request: Request) -> BoxFuture<'a, ChannelResult<Response>>;

    /// Ask the executor to stop an operation. Does not wait for a reply.
    fn cancel<'a>(&'a self, operation_id: OperationId) -> BoxFuture<'a, ChannelResult<()>>;

    /// Subscribe to progress events for all operations.
    fn subscribe(&self) -> broadcast::Receiver<ProgressEvent>;
}
