use std::path::PathBuf;
use std::time::Duration;

use fileherd_channel::protocol::{DeleteArgs, TransferArgs};
use fileherd_channel::{
    ChannelError, Frame, PipeChannel, PipeChannelConfig, PrivilegedChannel, ProgressEvent,
    Request, Response,
};
use fileherd_core::{BatchResult, ItemOutcome, OperationId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};

/// The executor side of a duplex pipe.
struct FakeExecutor {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeExecutor {
    async fn next_frame(&mut self) -> Frame {
        let line = self.lines.next_line().await.unwrap().expect("client closed");
        serde_json::from_str(&line).unwrap()
    }

    async fn send(&mut self, frame: &Frame) {
        let mut line = serde_json::to_vec(frame).unwrap();
        line.push(b'\n');
        self.writer.write_all(&line).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }
}

fn connect(config: PipeChannelConfig) -> (PipeChannel, FakeExecutor) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let channel = PipeChannel::from_stream(client, config);
    let (read, writer) = tokio::io::split(server);
    let executor = FakeExecutor {
        lines: BufReader::new(read).lines(),
        writer,
    };
    (channel, executor)
}

fn copy_request(id: OperationId) -> Request {
    Request::CopyItem(TransferArgs {
        operation_id: id,
        sources: vec!["/src/a".into()],
        destinations: vec!["/dst/a".into()],
        overwrite: false,
    })
}

#[tokio::test]
async fn test_request_reply_round_trip() {
    let (channel, mut executor) = connect(PipeChannelConfig::default());
    let id = OperationId::new();

    let server = tokio::spawn(async move {
        let Frame::Request { id: frame_id, body } = executor.next_frame().await else {
            panic!("expected a request frame");
        };
        assert_eq!(body.name(), "CopyItem");

        let batch = BatchResult::new(
            true,
            vec![ItemOutcome::succeeded("/src/a", Some(PathBuf::from("/dst/a")))],
        );
        executor
            .send(&Frame::Response {
                id: frame_id,
                body: Response::from_batch(&batch).unwrap(),
            })
            .await;
        executor
    });

    let response = channel.send(copy_request(id)).await.unwrap();
    let batch = response.into_batch().unwrap();
    assert!(batch.all_succeeded());
    assert_eq!(batch.items[0].destination, Some(PathBuf::from("/dst/a")));
    assert_eq!(channel.pending_requests(), 0);

    server.await.unwrap();
}

#[tokio::test]
async fn test_replies_are_routed_by_frame_id() {
    let (channel, mut executor) = connect(PipeChannelConfig::default());

    let server = tokio::spawn(async move {
        let mut requests = Vec::new();
        for _ in 0..2 {
            let Frame::Request { id, body } = executor.next_frame().await else {
                panic!("expected a request frame");
            };
            requests.push((id, body));
        }
        // Answer in reverse order, tagging each reply with its request's kind.
        for (id, body) in requests.into_iter().rev() {
            let success = matches!(body, Request::CopyItem(_));
            executor
                .send(&Frame::Response {
                    id,
                    body: Response::status(success),
                })
                .await;
        }
        executor
    });

    let delete = Request::DeleteItem(DeleteArgs {
        operation_id: OperationId::new(),
        sources: vec!["/x".into()],
        permanently: true,
    });
    let (copied, deleted) = tokio::join!(
        channel.send(copy_request(OperationId::new())),
        channel.send(delete)
    );
    assert!(copied.unwrap().success);
    assert!(!deleted.unwrap().success);

    server.await.unwrap();
}

#[tokio::test]
async fn test_progress_events_are_broadcast() {
    let (channel, mut executor) = connect(PipeChannelConfig::default());
    let mut first = channel.subscribe();
    let mut second = channel.subscribe();
    let id = OperationId::new();

    executor
        .send(&Frame::Event {
            body: ProgressEvent::new(id, 40.0),
        })
        .await;

    let event = first.recv().await.unwrap();
    assert_eq!(event.operation_id, id);
    assert_eq!(event.progress, 40.0);
    assert_eq!(second.recv().await.unwrap().operation_id, id);
}

#[tokio::test]
async fn test_cancel_is_sent_without_waiting() {
    let (channel, mut executor) = connect(PipeChannelConfig::default());
    let id = OperationId::new();

    channel.cancel(id).await.unwrap();

    match executor.next_frame().await {
        Frame::Notify {
            body: Request::CancelOperation { operation_id },
        } => assert_eq!(operation_id, id),
        other => panic!("unexpected frame {other:?}"),
    }
    assert_eq!(channel.pending_requests(), 0);
}

#[tokio::test]
async fn test_request_timeout() {
    let config = PipeChannelConfig::default().with_request_timeout(Duration::from_millis(50));
    let (channel, _executor) = connect(config);

    let err = channel.send(copy_request(OperationId::new())).await.unwrap_err();
    assert!(matches!(err, ChannelError::Timeout { .. }));
    assert!(err.is_transport());
    assert_eq!(channel.pending_requests(), 0);
    assert!(channel.is_available());
}

#[tokio::test]
async fn test_closed_connection_fails_waiters_and_flips_availability() {
    let (channel, mut executor) = connect(PipeChannelConfig::default());

    let server = tokio::spawn(async move {
        let _ = executor.next_frame().await;
        drop(executor);
    });

    let err = channel.send(copy_request(OperationId::new())).await.unwrap_err();
    assert!(matches!(err, ChannelError::Closed | ChannelError::Io(_)));
    server.await.unwrap();

    // The reader notices end-of-stream and marks the channel unusable.
    for _ in 0..50 {
        if !channel.is_available() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!channel.is_available());

    let err = channel.send(copy_request(OperationId::new())).await.unwrap_err();
    assert!(matches!(err, ChannelError::Unavailable));
}

#[tokio::test]
async fn test_garbage_lines_are_skipped() {
    let (channel, mut executor) = connect(PipeChannelConfig::default());
    let mut events = channel.subscribe();
    let id = OperationId::new();

    executor.send_raw("this is not json").await;
    executor.send_raw(r#"{"type":"response","id":999,"body":{"Success":true}}"#).await;
    executor
        .send(&Frame::Event {
            body: ProgressEvent::new(id, 5.0),
        })
        .await;

    assert_eq!(events.recv().await.unwrap().operation_id, id);
    assert!(channel.is_available());
}
