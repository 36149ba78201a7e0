//! Live channels against the mock backend's event streams.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use fastbite_client::stream::sse::MAX_BLOCK_BYTES;
use fastbite_client::{ChannelError, channels};
use fastbite_core::models::{Comment, OrderEvent};
use fastbite_core::{OrderEventType, OrderId, OrderStatus};
use fastbite_integration_tests::MockBackend;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    runtime
        .streams()
        .connect(
            &channels::all_orders(),
            move |event: OrderEvent| {
                let _ = tx.send(event);
            },
            Some(Box::new(move |e| {
                let _ = err_tx.send(e);
            })),
        )
        .unwrap();

    let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.event_type, OrderEventType::StatusChanged);
    assert_eq!(first.order_id, OrderId::from(7));
    assert_eq!(first.status, Some(OrderStatus::Preparing));

    let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(second.event_type, OrderEventType::Created);
    assert_eq!(second.order_id, OrderId::from(8));

    // The malformed frame reached neither handler, and the channel is open.
    assert!(err_rx.try_recv().is_err());
    assert!(runtime.streams().is_connected("/orders/stream"));
}

#[tokio::test]
async fn test_comment_channel_delivers() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = OrderId::from(5);

    runtime
        .streams()
        .connect(
            &channels::comments(&id),
            move |comment: Comment| {
                let _ = tx.send(comment);
            },
            None,
        )
        .unwrap();

    let comment = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(comment.order_id, id);
    assert_eq!(comment.message, "Listo en 5");
}

#[tokio::test]
async fn test_closed_stream_reconnects_with_last_event_id() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();
    let id = OrderId::from(12);

    runtime
        .streams()
        .connect(
            &channels::order(&id),
            move |event: OrderEvent| {
                let _ = tx.send(event);
            },
            Some(Box::new(move |e| {
                let _ = err_tx.send(e);
            })),
        )
        .unwrap();

    // One event per connection; the second arrives after a reconnect.
    for _ in 0..2 {
        let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(event.status, Some(OrderStatus::Ready));
    }

    let closed = timeout(WAIT, err_rx.recv()).await.unwrap().unwrap();
    assert!(matches!(closed, ChannelError::Closed { .. }));
    assert!(!closed.is_fatal());

    let seen = backend.requests_to("/orders/12/stream");
    assert!(seen.len() >= 2);
    assert!(seen.first().unwrap().last_event_id.is_none());
    assert_eq!(seen.get(1).unwrap().last_event_id.as_deref(), Some("12-1"));

    runtime.streams().disconnect_all();
}

#[tokio::test]
async fn test_rejected_stream_fails_permanently() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    runtime
        .streams()
        .connect(
            &channels::order(&OrderId::from(404)),
            |_: OrderEvent| {},
            Some(Box::new(move |e| {
                let _ = err_tx.send(e);
            })),
        )
        .unwrap();

    let err = timeout(WAIT, err_rx.recv()).await.unwrap().unwrap();
    match &err {
        ChannelError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_fatal());

    // Nothing further: the transport gave up instead of retrying.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(err_rx.try_recv().is_err());
    assert_eq!(backend.requests_to("/orders/404/stream").len(), 1);
}

#[tokio::test]
async fn test_non_event_stream_is_rejected() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    runtime
        .streams()
        .connect(
            "/quirks/stream",
            |_: serde_json::Value| {},
            Some(Box::new(move |e| {
                let _ = err_tx.send(e);
            })),
        )
        .unwrap();

    let err = timeout(WAIT, err_rx.recv()).await.unwrap().unwrap();
    assert!(matches!(err, ChannelError::ContentType { ref content_type, .. } if content_type.starts_with("application/json")));
}

#[tokio::test]
async fn test_unterminated_block_is_cut_off() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    runtime
        .streams()
        .connect(
            "/quirks/endless-block",
            |_: serde_json::Value| {},
            Some(Box::new(move |e| {
                let _ = err_tx.send(e);
            })),
        )
        .unwrap();

    let err = timeout(WAIT, err_rx.recv()).await.unwrap().unwrap();
    assert!(matches!(err, ChannelError::Oversized { limit, .. } if limit == MAX_BLOCK_BYTES));
    assert!(!err.is_fatal());

    runtime.streams().disconnect_all();
}

#[tokio::test]
async fn test_disconnect_all_closes_every_channel() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (tx, mut rx) = mpsc::unbounded_channel::<OrderEvent>();
    let id = OrderId::from(5);

    let sink = tx.clone();
    runtime
        .streams()
        .connect(
            &channels::all_orders(),
            move |event: OrderEvent| {
                let _ = sink.send(event);
            },
            None,
        )
        .unwrap();
    runtime
        .streams()
        .connect(&channels::comments(&id), |_: Comment| {}, None)
        .unwrap();
    drop(tx);
    assert_eq!(runtime.streams().len(), 2);

    timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    runtime.streams().disconnect_all();

    assert!(runtime.streams().is_empty());
    assert!(runtime.streams().channels().is_empty());

    // Aborting the dispatcher drops the handler, which closes the channel.
    let drained = timeout(WAIT, async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());
}

#[tokio::test]
async fn test_reconnecting_same_key_replaces_subscription() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    let (old_tx, mut old_rx) = mpsc::unbounded_channel::<OrderEvent>();
    let (new_tx, mut new_rx) = mpsc::unbounded_channel::<OrderEvent>();

    runtime
        .streams()
        .connect(
            &channels::all_orders(),
            move |event: OrderEvent| {
                let _ = old_tx.send(event);
            },
            None,
        )
        .unwrap();
    runtime
        .streams()
        .connect(
            &channels::all_orders(),
            move |event: OrderEvent| {
                let _ = new_tx.send(event);
            },
            None,
        )
        .unwrap();

    assert_eq!(runtime.streams().len(), 1);
    timeout(WAIT, new_rx.recv()).await.unwrap().unwrap();

    // The replaced handler was dropped with its aborted task.
    let old_closed = timeout(WAIT, async {
        while old_rx.recv().await.is_some() {}
    })
    .await;
    assert!(old_closed.is_ok());
}
