//! JSON-lines client for an executor reachable over a byte stream.
//!
//! Every frame is one line of JSON:
//!
//! ```text
//! {"type":"request","id":7,"body":{"fileop":"CopyItem",...}}
//! {"type":"response","id":7,"body":{"Success":true,"Result":"..."}}
//! {"type":"event","body":{"OperationID":"...","Progress":40.0}}
//! {"type":"notify","body":{"fileop":"CancelOperation",...}}
//! ```
//!
//! Requests are multiplexed by frame id, so several callers can wait on the
//! same connection. A background reader routes replies to their callers and
//! progress to a broadcast stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use fileherd_core::OperationId;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio::task::JoinHandle;

use crate::channel::{BoxFuture, PrivilegedChannel};
use crate::error::{ChannelError, ChannelResult};
use crate::protocol::{ProgressEvent, Request, Response};

/// Default capacity of the progress event stream.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration for a [`PipeChannel`].
#[derive(Debug, Clone)]
pub struct PipeChannelConfig {
    /// How long to wait for a reply. `None` waits as long as the connection
    /// stays open, which suits copies of unbounded size.
    pub request_timeout: Option<Duration>,
    /// Events buffered per subscriber before the slowest one starts lagging.
    pub event_capacity: usize,
}

impl Default for PipeChannelConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PipeChannelConfig {
    /// Set the reply timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the event stream capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// One line on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// A request expecting a reply with the same id.
    Request { id: u64, body: Request },
    /// A request that gets no reply.
    Notify { body: Request },
    /// The reply to request `id`.
    Response { id: u64, body: Response },
    /// Unsolicited progress.
    Event { body: ProgressEvent },
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct Shared {
    writer: Mutex<BoxedWriter>,
    pending: DashMap<u64, oneshot::Sender<Response>>,
    next_id: AtomicU64,
    events: broadcast::Sender<ProgressEvent>,
    available: AtomicBool,
}

impl Shared {
    fn shut_down(&self) {
        self.available.store(false, Ordering::SeqCst);
        // Dropping the senders wakes every waiting caller with `Closed`.
        self.pending.clear();
    }

    async fn write_frame(&self, frame: &Frame) -> ChannelResult<()> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        let written = async {
            writer.write_all(&line).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            tracing::warn!(target: "fileherd::channel", error = %e, "Write to executor failed");
            self.shut_down();
            return Err(ChannelError::Io(e));
        }
        Ok(())
    }

    fn route(&self, line: &str) {
        match serde_json::from_str::<Frame>(line) {
            Ok(Frame::Response { id, body }) => match self.pending.remove(&id) {
                Some((_, waiter)) => {
                    let _ = waiter.send(body);
                }
                None => {
                    tracing::warn!(target: "fileherd::channel", id, "Dropping reply with no waiting request");
                }
            },
            Ok(Frame::Event { body }) => {
                // No subscribers is fine; progress is best effort.
                let _ = self.events.send(body);
            }
            Ok(frame @ (Frame::Request { .. } | Frame::Notify { .. })) => {
                tracing::warn!(target: "fileherd::channel", ?frame, "Dropping unexpected request frame");
            }
            Err(e) => {
                tracing::warn!(target: "fileherd::channel", error = %e, "Dropping undecodable frame");
            }
        }
    }
}

/// A [`PrivilegedChannel`] speaking JSON lines over any byte stream.
pub struct PipeChannel {
    shared: Arc<Shared>,
    config: PipeChannelConfig,
    reader: JoinHandle<()>,
}

impl PipeChannel {
    /// Connect over separate read and write halves.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect<R, W>(reader: R, writer: W, config: PipeChannelConfig) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let shared = Arc::new(Shared {
            writer: Mutex::new(Box::new(writer)),
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            events,
            available: AtomicBool::new(true),
        });

        let reader = tokio::spawn(read_loop(reader, Arc::clone(&shared)));

        Self {
            shared,
            config,
            reader,
        }
    }

    /// Connect over a single bidirectional stream.
    pub fn from_stream<S>(stream: S, config: PipeChannelConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::connect(reader, writer, config)
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Get the channel configuration.
    pub fn config(&self) -> &PipeChannelConfig {
        &self.config
    }

    async fn request(&self, body: Request) -> ChannelResult<Response> {
        if !self.is_available() {
            return Err(ChannelError::Unavailable);
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(id, tx);

        // The reader may have exited between the check above and the insert.
        if !self.is_available() {
            self.shared.pending.remove(&id);
            return Err(ChannelError::Closed);
        }

        tracing::debug!(target: "fileherd::channel", id, fileop = body.name(), "Sending request");
        if let Err(e) = self.shared.write_frame(&Frame::Request { id, body }).await {
            self.shared.pending.remove(&id);
            return Err(e);
        }

        let reply = match self.config.request_timeout {
            Some(after) => match tokio::time::timeout(after, rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    self.shared.pending.remove(&id);
                    tracing::warn!(target: "fileherd::channel", id, ?after, "Request timed out");
                    return Err(ChannelError::Timeout { after });
                }
            },
            None => rx.await,
        };

        reply.map_err(|_| ChannelError::Closed)
    }

    async fn notify(&self, body: Request) -> ChannelResult<()> {
        if !self.is_available() {
            return Err(ChannelError::Unavailable);
        }
        self.shared.write_frame(&Frame::Notify { body }).await
    }
}

impl PrivilegedChannel for PipeChannel {
    fn is_available(&self) -> bool {
        self.shared.available.load(Ordering::SeqCst)
    }

    fn send<'a>(&'a self, request: Request) -> BoxFuture<'a, ChannelResult<Response>> {
        Box::pin(self.request(request))
    }

    fn cancel<'a>(&'a self, operation_id: OperationId) -> BoxFuture<'a, ChannelResult<()>> {
        Box::pin(self.notify(Request::CancelOperation { operation_id }))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.shared.events.subscribe()
    }
}

impl Drop for PipeChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.shared.shut_down();
    }
}

async fn read_loop<R>(reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Send + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => shared.route(&line),
            Ok(None) => {
                tracing::debug!(target: "fileherd::channel", "Executor closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!(target: "fileherd::channel", error = %e, "Read from executor failed");
                break;
            }
        }
    }
    shared.shut_down();
}
