//! Push-channel subscription for a single task.
//!
//! A [`Subscription`] is the consumer end of one progress channel. A
//! background reader owns the HTTP connection, decodes server-sent events,
//! and forwards them in arrival order. All reader awaits race against a
//! [`CancellationToken`], so closing or superseding a subscription stops
//! the reader at its next suspension point.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use equityrun_core::{parse_message, ChannelStatus, ProgressEvent, TaskHandle};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::reconnect::{next_delay, ReconnectConfig};
use crate::sse::SseDecoder;

/// Number of characters of a malformed message kept in the log.
const PREVIEW_CHARS: usize = 200;

/// An item delivered by a [`Subscription`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// A parsed progress update.
    Event(ProgressEvent),
    /// The transport changed state.
    Status(ChannelStatus),
    /// The channel ended with an unrecoverable error.
    Failed(String),
}

/// Ordered stream of progress items for one task.
///
/// Ends after a terminal event, an unrecoverable failure, or cancellation.
/// Dropping the subscription stops its reader.
pub struct Subscription {
    handle: TaskHandle,
    rx: mpsc::Receiver<StreamItem>,
    cancel: CancellationToken,
    finished: bool,
}

impl Subscription {
    /// Spawn a reader for `handle` and return its consumer end.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub(crate) fn spawn(
        api: ApiClient,
        handle: TaskHandle,
        config: &ClientConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));

        let reader = ChannelReader {
            api,
            handle: handle.clone(),
            reconnect: config.reconnect.clone(),
            max_event_bytes: config.max_event_bytes,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(reader.run());

        Self {
            handle,
            rx,
            cancel,
            finished: false,
        }
    }

    /// Task this subscription follows.
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    /// Returns true once no further items will be yielded.
    pub fn is_closed(&self) -> bool {
        self.finished || self.cancel.is_cancelled()
    }

    /// Stop the reader. Idempotent.
    pub fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for Subscription {
    type Item = StreamItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamItem>> {
        let this = self.get_mut();

        // Anything still buffered from a superseded channel is discarded.
        if this.is_closed() {
            return Poll::Ready(None);
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(item)) => {
                match &item {
                    StreamItem::Event(event) if event.done => this.finished = true,
                    StreamItem::Failed(_) => this.finished = true,
                    _ => {}
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// How one connection of the channel ended.
enum ReadOutcome {
    /// The terminal event was delivered.
    Done,
    /// The connection dropped before the terminal event.
    Dropped,
    /// The server reported an unrecoverable error.
    Failed(String),
    /// The subscription was closed or its consumer went away.
    Cancelled,
}

/// Body of a server-sent `event: error` frame.
#[derive(Debug, Deserialize)]
struct ChannelErrorBody {
    #[serde(default)]
    error: Option<String>,
}

struct ChannelReader {
    api: ApiClient,
    handle: TaskHandle,
    reconnect: ReconnectConfig,
    max_event_bytes: usize,
    tx: mpsc::Sender<StreamItem>,
    cancel: CancellationToken,
}

impl ChannelReader {
    /// Connect, read until the terminal event, and reconnect on drops.
    async fn run(self) {
        let mut attempt = 0u32;
        let mut delay = self.reconnect.initial_delay;
        let mut retry_hint: Option<Duration> = None;

        if !self.deliver(StreamItem::Status(ChannelStatus::Connecting)).await {
            return;
        }

        loop {
            let opened = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.api.open_stream(&self.handle) => result,
            };

            match opened {
                Ok(response) => {
                    info!(task_id = %self.handle, "Progress channel open");
                    attempt = 0;
                    delay = self.reconnect.initial_delay;

                    if !self.deliver(StreamItem::Status(ChannelStatus::Open)).await {
                        return;
                    }

                    match self.read_frames(response, &mut retry_hint).await {
                        ReadOutcome::Done => {
                            info!(task_id = %self.handle, "Task finished, closing channel");
                            return;
                        }
                        ReadOutcome::Cancelled => return,
                        ReadOutcome::Failed(message) => {
                            warn!(task_id = %self.handle, error = %message, "Progress channel failed");
                            self.deliver(StreamItem::Failed(message)).await;
                            return;
                        }
                        ReadOutcome::Dropped => {
                            warn!(task_id = %self.handle, "Progress channel dropped");
                        }
                    }
                }
                Err(ClientError::Network(e)) => {
                    warn!(task_id = %self.handle, attempt, error = %e, "Progress channel connect failed");
                }
                Err(e) => {
                    warn!(task_id = %self.handle, error = %e, "Progress channel rejected");
                    self.deliver(StreamItem::Failed(e.to_string())).await;
                    return;
                }
            }

            attempt += 1;
            if !self
                .deliver(StreamItem::Status(ChannelStatus::Reconnecting { attempt }))
                .await
            {
                return;
            }

            let wait = retry_hint.unwrap_or(delay);
            debug!(
                task_id = %self.handle,
                attempt,
                delay_ms = wait.as_millis() as u64,
                "Reconnecting to progress channel"
            );

            // Wait before the next attempt, respecting cancellation.
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
            }

            delay = next_delay(delay, &self.reconnect);
        }
    }

    /// Decode one connection's body until it ends.
    async fn read_frames(
        &self,
        response: reqwest::Response,
        retry_hint: &mut Option<Duration>,
    ) -> ReadOutcome {
        let mut body = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::with_limit(self.max_event_bytes);

        loop {
            let chunk = tokio::select! {
                _ = self.cancel.cancelled() => return ReadOutcome::Cancelled,
                chunk = body.next() => chunk,
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    warn!(task_id = %self.handle, error = %e, "Progress channel read error");
                    return ReadOutcome::Dropped;
                }
                None => return ReadOutcome::Dropped,
            };

            let frames = match decoder.feed(&bytes) {
                Ok(frames) => frames,
                Err(e) => {
                    warn!(task_id = %self.handle, error = %e, "Progress channel sent an oversized event");
                    return ReadOutcome::Dropped;
                }
            };
            if let Some(ms) = decoder.take_retry() {
                *retry_hint = Some(Duration::from_millis(ms));
            }

            for frame in frames {
                if frame.event.as_deref() == Some("error") {
                    return ReadOutcome::Failed(channel_error_message(&frame.data));
                }

                match parse_message(&frame.data) {
                    Ok(event) => {
                        let done = event.done;
                        if !self.deliver(StreamItem::Event(event)).await {
                            return ReadOutcome::Cancelled;
                        }
                        if done {
                            return ReadOutcome::Done;
                        }
                    }
                    Err(e) => {
                        let preview: String = frame.data.chars().take(PREVIEW_CHARS).collect();
                        warn!(
                            task_id = %self.handle,
                            error = %e,
                            preview = %preview,
                            "Discarding malformed progress message"
                        );
                    }
                }
            }
        }
    }

    /// Send an item to the consumer. Returns false if the subscription is gone.
    async fn deliver(&self, item: StreamItem) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(item) => sent.is_ok(),
        }
    }
}

fn channel_error_message(data: &str) -> String {
    serde_json::from_str::<ChannelErrorBody>(data)
        .ok()
        .and_then(|body| body.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| data.to_string())
}
