//! Live channel followers.
//!
//! Each follower opens one channel, prints what arrives, and closes every
//! channel on Ctrl-C or when the transport gives up.

use tokio::sync::mpsc;

use fastbite_client::{ChannelError, ErrorHandler, Runtime, Severity, channels};
use fastbite_core::OrderId;
use fastbite_core::models::{Comment, OrderEvent};

use super::CommandError;
use super::orders::print_comment;

/// Follow every order event.
pub async fn kitchen(runtime: &Runtime) -> Result<(), CommandError> {
    follow(runtime, &channels::all_orders(), |event: OrderEvent| {
        print_event(&event);
    })
    .await
}

/// Follow one order.
pub async fn order(runtime: &Runtime, id: &OrderId) -> Result<(), CommandError> {
    follow(runtime, &channels::order(id), |event: OrderEvent| {
        print_event(&event);
    })
    .await
}

/// Follow one order's comments.
pub async fn comments(runtime: &Runtime, id: &OrderId) -> Result<(), CommandError> {
    follow(runtime, &channels::comments(id), |comment: Comment| {
        print_comment(&comment);
    })
    .await
}

async fn follow<T, F>(runtime: &Runtime, key: &str, on_message: F) -> Result<(), CommandError>
where
    T: serde::de::DeserializeOwned + Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<ChannelError>();
    let on_error: ErrorHandler = Box::new(move |e| {
        if e.is_fatal() {
            let _ = fatal_tx.send(e);
        }
    });

    runtime.streams().connect(key, on_message, Some(on_error))?;
    runtime
        .notifier()
        .show_alert(&format!("Watching {key} (Ctrl-C to stop)"), Severity::Info);

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => Ok(()),
        Some(e) = fatal_rx.recv() => Err(e),
    };

    runtime.streams().disconnect_all();
    outcome.map_err(CommandError::from)
}

#[allow(clippy::print_stdout)]
fn print_event(event: &OrderEvent) {
    let status = event
        .status
        .or_else(|| event.order.as_ref().map(|o| o.status))
        .map(|s| format!(" -> {s}"))
        .unwrap_or_default();
    println!("[{}] order {}{status}", event.event_type, event.order_id);
}
