//! Privileged executor channel for fileherd.
//!
//! This crate defines the messages exchanged with the out-of-process
//! executor, the [`PrivilegedChannel`] trait the orchestrator talks through,
//! and [`PipeChannel`], a JSON-lines client usable over any byte stream.

mod channel;
mod error;
mod pipe;
pub mod protocol;

pub use channel::{BoxFuture, PrivilegedChannel};
pub use error::{ChannelError, ChannelResult};
pub use pipe::{Frame, PipeChannel, PipeChannelConfig, DEFAULT_EVENT_CAPACITY};
pub use protocol::{ProgressEvent, Request, Response};
