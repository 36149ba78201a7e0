//! Named live channels over server-sent events.
//!
//! [`StreamManager`] keeps at most one subscription per channel key. Each
//! subscription is a pair of tasks joined by a bounded channel: a reader that
//! drives the [`sse`] transport, and a dispatcher that decodes each message
//! and runs the caller's handlers. Closing a subscription aborts both.
//!
//! Handlers never see malformed frames. A frame whose data is not valid JSON
//! for the handler's type is logged and skipped, and the subscription stays
//! open.

pub mod sse;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use futures::StreamExt;

use crate::config::{ClientConfig, StreamConfig};

/// Channel keys for the backend's push endpoints.
///
/// A key is the endpoint path relative to the API base URL.
pub mod channels {
    use fastbite_core::OrderId;

    /// Every order event (kitchen and delivery dashboards).
    #[must_use]
    pub fn all_orders() -> String {
        "/orders/stream".to_string()
    }

    /// Events for a single order.
    #[must_use]
    pub fn order(id: &OrderId) -> String {
        format!("/orders/{id}/stream")
    }

    /// Live comments on a single order.
    #[must_use]
    pub fn comments(id: &OrderId) -> String {
        format!("/orders/{id}/comments/stream")
    }
}

/// Failures of a live channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The connection could not be established. The transport retries.
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The connection broke while reading. The transport retries.
    #[error("connection to {url} dropped: {source}")]
    Dropped {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server ended the stream. The transport retries.
    #[error("server closed {url}")]
    Closed { url: String },

    /// An event block grew past the size limit without being terminated.
    /// The transport drops the connection and retries.
    #[error("event block from {url} exceeds {limit} bytes")]
    Oversized { url: String, limit: usize },

    /// The server refused the stream. The transport gives up.
    #[error("server rejected {url} with {status}")]
    Status { url: String, status: StatusCode },

    /// The server answered with something other than an event stream.
    /// The transport gives up.
    #[error("{url} is not an event stream (content type {content_type:?})")]
    ContentType { url: String, content_type: String },

    /// No async runtime was available to drive the subscription.
    #[error("live channels need a Tokio runtime")]
    NoRuntime,
}

impl ChannelError {
    /// Whether the transport has stopped retrying after this failure.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::ContentType { .. } | Self::NoRuntime
        )
    }
}

/// Handler for channel failures.
pub type ErrorHandler = Box<dyn FnMut(ChannelError) + Send + 'static>;

enum Delivery {
    Message(String),
    Failure(ChannelError),
}

struct Subscription {
    url: String,
    reader: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl Subscription {
    fn close(self) {
        self.reader.abort();
        self.dispatcher.abort();
    }
}

/// Registry of open live channels, keyed by channel key.
pub struct StreamManager {
    client: reqwest::Client,
    base_url: String,
    config: StreamConfig,
    subscriptions: Mutex<HashMap<String, Subscription>>,
}

impl StreamManager {
    /// Create a manager for the configured backend.
    ///
    /// Streams are long-lived, so the client carries no overall timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            config: config.stream,
            subscriptions: Mutex::new(HashMap::new()),
        })
    }

    /// Open a subscription on `key` and register it.
    ///
    /// Each message is decoded as `T` and passed to `on_message`. Failures go
    /// to `on_error` when given, and are logged either way. An existing
    /// subscription under the same key is closed first.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NoRuntime`] when called outside a Tokio
    /// runtime.
    pub fn connect<T, F>(
        &self,
        key: &str,
        on_message: F,
        on_error: Option<ErrorHandler>,
    ) -> Result<(), ChannelError>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;

        let url = format!("{}{key}", self.base_url);
        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));

        let transport = sse::open(self.client.clone(), url.clone(), self.config.retry_delay);
        let reader = handle.spawn(forward(transport, tx));
        let dispatcher = handle.spawn(dispatch(key.to_owned(), rx, on_message, on_error));

        let subscription = Subscription {
            url: url.clone(),
            reader,
            dispatcher,
        };
        if let Some(previous) = self.lock().insert(key.to_owned(), subscription) {
            warn!(channel = key, url = %previous.url, "channel already open; closing previous subscription");
            previous.close();
        }

        info!(channel = key, url = %url, "channel connected");
        Ok(())
    }

    /// Close and forget the subscription on `key`.
    ///
    /// Returns whether one was open.
    pub fn disconnect(&self, key: &str) -> bool {
        let removed = self.lock().remove(key);
        removed.is_some_and(|subscription| {
            subscription.close();
            info!(channel = key, "channel disconnected");
            true
        })
    }

    /// Close every subscription, leaving the registry empty.
    pub fn disconnect_all(&self) {
        let drained: Vec<_> = self.lock().drain().collect();
        if drained.is_empty() {
            return;
        }

        let count = drained.len();
        for (_, subscription) in drained {
            subscription.close();
        }
        info!(count, "all channels disconnected");
    }

    /// Whether a subscription is registered under `key`.
    #[must_use]
    pub fn is_connected(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Registered channel keys, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no subscription is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The map holds no invariant a panicking holder could break.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl fmt::Debug for StreamManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamManager")
            .field("base_url", &self.base_url)
            .field("channels", &self.channels())
            .finish_non_exhaustive()
    }
}

/// Pump transport items into the subscription's delivery channel.
async fn forward(
    transport: impl futures::Stream<Item = Result<String, ChannelError>> + Send,
    tx: mpsc::Sender<Delivery>,
) {
    let mut transport = std::pin::pin!(transport);
    while let Some(item) = transport.next().await {
        let delivery = match item {
            Ok(data) => Delivery::Message(data),
            Err(e) => Delivery::Failure(e),
        };
        if tx.send(delivery).await.is_err() {
            break;
        }
    }
}

/// Decode deliveries and run the handlers until the channel closes.
async fn dispatch<T, F>(
    key: String,
    mut rx: mpsc::Receiver<Delivery>,
    mut on_message: F,
    mut on_error: Option<ErrorHandler>,
) where
    T: DeserializeOwned,
    F: FnMut(T),
{
    while let Some(delivery) = rx.recv().await {
        match delivery {
            Delivery::Message(data) => match serde_json::from_str::<T>(&data) {
                Ok(message) => on_message(message),
                Err(e) => {
                    warn!(
                        channel = %key,
                        error = %e,
                        data = %data.chars().take(200).collect::<String>(),
                        "skipping malformed channel message"
                    );
                }
            },
            Delivery::Failure(e) => {
                error!(channel = %key, error = %e, fatal = e.is_fatal(), "channel error");
                if let Some(handler) = on_error.as_mut() {
                    handler(e);
                }
            }
        }
    }
    debug!(channel = %key, "channel dispatcher finished");
}
