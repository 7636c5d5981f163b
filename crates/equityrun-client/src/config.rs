//! Client configuration.

use std::time::Duration;

use crate::reconnect::ReconnectConfig;
use crate::sse::DEFAULT_MAX_EVENT_BYTES;

/// Task client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the simulation service (e.g. `http://127.0.0.1:5000`).
    pub base_url: String,

    /// Upper bound on a job submission round-trip.
    pub submit_timeout: Duration,

    /// Backoff used when the progress channel drops.
    pub reconnect: ReconnectConfig,

    /// Buffered items per subscription before the reader waits on the consumer.
    pub channel_capacity: usize,

    /// Largest unfinished event the reader holds before dropping the connection.
    pub max_event_bytes: usize,
}

impl ClientConfig {
    /// Default configuration targeting `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Builder method to override the submission timeout.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Builder method to override the event size limit.
    pub fn with_max_event_bytes(mut self, bytes: usize) -> Self {
        self.max_event_bytes = bytes;
        self
    }

    /// Builder method to override the reconnect backoff.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            submit_timeout: Duration::from_secs(20),
            reconnect: ReconnectConfig::default(),
            channel_capacity: 64,
            max_event_bytes: DEFAULT_MAX_EVENT_BYTES,
        }
    }
}
