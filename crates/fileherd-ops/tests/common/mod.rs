//! Hand-written fakes shared by the orchestrator tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fileherd_channel::{
    BoxFuture as ChannelFuture, ChannelError, ChannelResult, PrivilegedChannel, ProgressEvent,
    Request, Response,
};
use fileherd_core::{
    split_file_name, BatchResult, CollisionPolicy, HistoryKind, HistoryRecord, ItemOutcome,
    ItemRef, OperationId, OperationItem, StatusCode,
};
use fileherd_ops::{
    BoxFuture, FilesystemOperations, HistoryResult, ListingCache, OperationContext,
};
use tokio::sync::{broadcast, Notify};

/// How the fake executor answers the next request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Succeed every item at its requested destination.
    Echo,
    /// Report these outcomes.
    Outcomes(Vec<ItemOutcome>),
    /// Report these outcomes with the communication flag cleared.
    Partial(Vec<ItemOutcome>),
    /// Answer with a bare status.
    Status(bool),
    /// The pipe closed before a reply arrived.
    Closed,
    /// A reply whose payload cannot be decoded.
    Garbage,
    /// Block until a cancel message arrives, then report these outcomes
    /// with the communication flag cleared.
    WaitForCancel(Vec<ItemOutcome>),
}

/// A privileged channel that answers from a script.
pub struct ScriptedChannel {
    available: AtomicBool,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Request>>,
    cancels: Mutex<Vec<OperationId>>,
    cancelled: Notify,
    progress: Mutex<Vec<f32>>,
    events: broadcast::Sender<ProgressEvent>,
}

impl ScriptedChannel {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            available: AtomicBool::new(true),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            cancelled: Notify::new(),
            progress: Mutex::new(Vec::new()),
            events,
        })
    }

    pub fn unavailable() -> Arc<Self> {
        let channel = Self::new();
        channel.available.store(false, Ordering::SeqCst);
        channel
    }

    /// Queue the answer to the next request. Unscripted requests echo.
    pub fn reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Progress values pushed, tagged with each request's id, before it is
    /// answered. A stray event for another operation precedes them.
    pub fn emit_progress(&self, values: &[f32]) {
        *self.progress.lock().unwrap() = values.to_vec();
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> Vec<OperationId> {
        self.cancels.lock().unwrap().clone()
    }

    async fn answer(&self, request: Request) -> ChannelResult<Response> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Echo);

        if let Some(id) = request.operation_id() {
            let progress = self.progress.lock().unwrap().clone();
            let _ = self.events.send(ProgressEvent::new(OperationId::new(), 13.0));
            for value in progress {
                let _ = self.events.send(ProgressEvent::new(id, value));
            }
        }

        match reply {
            Reply::Echo => Ok(echo(&request)),
            Reply::Outcomes(items) => Ok(Response::from_batch(&BatchResult::new(true, items))?),
            Reply::Partial(items) => Ok(Response::from_batch(&BatchResult::new(false, items))?),
            Reply::Status(success) => Ok(Response::status(success)),
            Reply::Closed => Err(ChannelError::Closed),
            Reply::Garbage => Ok(Response {
                success: true,
                result: Some("{not json".to_string()),
            }),
            Reply::WaitForCancel(items) => {
                self.cancelled.notified().await;
                Ok(Response::from_batch(&BatchResult::new(false, items))?)
            }
        }
    }
}

impl PrivilegedChannel for ScriptedChannel {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn send<'a>(&'a self, request: Request) -> ChannelFuture<'a, ChannelResult<Response>> {
        Box::pin(self.answer(request))
    }

    fn cancel<'a>(&'a self, operation_id: OperationId) -> ChannelFuture<'a, ChannelResult<()>> {
        self.cancels.lock().unwrap().push(operation_id);
        self.cancelled.notify_one();
        Box::pin(async { Ok(()) })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }
}

/// The executor's answer when every item goes where it was asked to.
fn echo(request: &Request) -> Response {
    let items = match request {
        Request::CopyItem(args) | Request::MoveItem(args) => args
            .sources
            .iter()
            .zip(&args.destinations)
            .map(|(s, d)| ItemOutcome::succeeded(s, Some(PathBuf::from(d))))
            .collect(),
        Request::DeleteItem(args) => args
            .sources
            .iter()
            .map(|s| {
                let trashed = (!args.permanently).then(|| trash_path(s));
                ItemOutcome::succeeded(s, trashed)
            })
            .collect(),
        Request::RenameItem(args) => {
            let (parent, _) = split_file_name(&args.source);
            let renamed = PathBuf::from(format!("{parent}/{}", args.new_name));
            vec![ItemOutcome::succeeded(&args.source, Some(renamed))]
        }
        Request::CreateLink(_) | Request::CancelOperation { .. } => return Response::status(true),
    };
    Response::from_batch(&BatchResult::new(true, items)).unwrap()
}

/// Where the fake executor puts a recycled item.
pub fn trash_path(source: &str) -> PathBuf {
    let (_, name) = split_file_name(source);
    PathBuf::from(format!(r"C:\$Recycle.Bin\S-1\$R{name}"))
}

/// A fallback call as the recording engine saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackCall {
    Copy(Vec<OperationItem>),
    Move(Vec<OperationItem>),
    Delete(Vec<ItemRef>, bool),
    Rename(ItemRef, String, CollisionPolicy),
    Restore(Vec<OperationItem>),
    Links(Vec<OperationItem>),
}

/// A fallback engine that records calls and answers with a fixed result.
pub struct RecordingEngine {
    calls: Mutex<Vec<FallbackCall>>,
    answer: Mutex<Option<HistoryRecord>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            answer: Mutex::new(None),
        })
    }

    /// Return `record` from every call.
    pub fn answer_with(&self, record: HistoryRecord) {
        *self.answer.lock().unwrap() = Some(record);
    }

    pub fn calls(&self) -> Vec<FallbackCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: FallbackCall) -> BoxFuture<'_, HistoryResult> {
        self.calls.lock().unwrap().push(call);
        let answer = self.answer.lock().unwrap().clone();
        Box::pin(async move { Ok(answer) })
    }
}

impl FilesystemOperations for RecordingEngine {
    fn copy_items<'a>(&'a self, items: Vec<OperationItem>, _: &'a OperationContext) -> BoxFuture<'a, HistoryResult> {
        self.respond(FallbackCall::Copy(items))
    }

    fn move_items<'a>(&'a self, items: Vec<OperationItem>, _: &'a OperationContext) -> BoxFuture<'a, HistoryResult> {
        self.respond(FallbackCall::Move(items))
    }

    fn delete_items<'a>(
        &'a self,
        items: Vec<ItemRef>,
        permanent: bool,
        _: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        self.respond(FallbackCall::Delete(items, permanent))
    }

    fn rename_item<'a>(
        &'a self,
        item: ItemRef,
        new_name: String,
        policy: CollisionPolicy,
        _: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        self.respond(FallbackCall::Rename(item, new_name, policy))
    }

    fn restore_items_from_trash<'a>(
        &'a self,
        items: Vec<OperationItem>,
        _: &'a OperationContext,
    ) -> BoxFuture<'a, HistoryResult> {
        self.respond(FallbackCall::Restore(items))
    }

    fn create_links<'a>(&'a self, items: Vec<OperationItem>, _: &'a OperationContext) -> BoxFuture<'a, HistoryResult> {
        self.respond(FallbackCall::Links(items))
    }
}

/// A listing cache that remembers what it was told to forget.
#[derive(Default)]
pub struct RecordingCache {
    removed: Mutex<Vec<PathBuf>>,
}

impl RecordingCache {
    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }
}

impl ListingCache for RecordingCache {
    fn remove_item<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, ()> {
        self.removed.lock().unwrap().push(path.to_path_buf());
        Box::pin(async {})
    }
}

/// Progress values and statuses an operation reported.
#[derive(Default)]
pub struct Reports {
    pub progress: Mutex<Vec<f32>>,
    pub statuses: Mutex<Vec<StatusCode>>,
}

impl Reports {
    pub fn context(self: &Arc<Self>) -> OperationContext {
        let progress = Arc::clone(self);
        let statuses = Arc::clone(self);
        OperationContext::new()
            .with_progress(move |p| progress.progress.lock().unwrap().push(p))
            .with_error_sink(move |s| statuses.statuses.lock().unwrap().push(s))
    }

    pub fn progress(&self) -> Vec<f32> {
        self.progress.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<StatusCode> {
        self.statuses.lock().unwrap().clone()
    }
}

pub fn item(source: &str, destination: &str, policy: CollisionPolicy) -> OperationItem {
    OperationItem::new(ItemRef::file(source), destination, policy)
}

/// A one-item record for answering fallback calls.
pub fn fallback_record(kind: HistoryKind) -> HistoryRecord {
    HistoryRecord::paired(
        kind,
        vec![(ItemRef::file("/fallback/src"), ItemRef::file("/fallback/dst"))],
    )
}
