//! HTTP client for the simulation service's REST endpoints.

use std::time::Duration;

use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use equityrun_core::{JobRequest, TaskHandle};

use crate::error::ClientError;

/// HTTP client for one simulation service deployment.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: Url,
}

/// Body of a successful `POST /start`.
#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    task_id: Option<String>,
}

/// Advice-engine settings reported by `GET /config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Whether model-generated advice is available.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Why model advice is disabled, when it is.
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub guardrails: Vec<String>,
}

/// Error body shape shared by all endpoints.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// `base_url` may carry a path prefix (e.g. `https://host/api`).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            inner: client,
            base_url: parsed,
        })
    }

    /// Base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submit a job, bounded by `timeout`.
    ///
    /// Sends `POST /start` with the request's form fields and returns the
    /// server-assigned task handle.
    pub async fn submit(
        &self,
        request: &JobRequest,
        timeout: Duration,
    ) -> Result<TaskHandle, ClientError> {
        let url = self.endpoint(&["start"]);
        debug!(url = %url, "POST request");

        match tokio::time::timeout(timeout, self.submit_inner(url.clone(), request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Network(format!(
                "request to {} timed out after {}s",
                url,
                timeout.as_secs_f32()
            ))),
        }
    }

    /// Ask the service to stop a running task.
    ///
    /// Sends `POST /cancel/{task_id}`. An unknown task yields a 404
    /// [`ClientError::Server`].
    pub async fn cancel(&self, handle: &TaskHandle) -> Result<(), ClientError> {
        let url = self.endpoint(&["cancel", handle.as_str()]);
        debug!(url = %url, "POST request");

        let response = self.inner.post(url).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Check if the service is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = self.endpoint(&["health"]);
        debug!(url = %url, "Checking health");

        let response = self.inner.get(url).send().await?;
        Ok(response.status().is_success())
    }

    /// Fetch the advice-engine settings from `GET /config`.
    pub async fn service_config(&self) -> Result<ServiceConfig, ClientError> {
        let url = self.endpoint(&["config"]);
        debug!(url = %url, "GET request");

        let response = self.inner.get(url).send().await?;
        let response = Self::ensure_success(response).await?;

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::Protocol(format!("invalid config response: {}", e)))
    }

    /// Open the progress event stream for a task.
    ///
    /// Transport failures map to [`ClientError::Network`]; a non-success
    /// status maps to [`ClientError::Server`].
    pub async fn open_stream(&self, handle: &TaskHandle) -> Result<reqwest::Response, ClientError> {
        let url = self.endpoint(&["stream", handle.as_str()]);
        debug!(url = %url, "Opening event stream");

        let response = self
            .inner
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        Self::ensure_success(response).await
    }

    // ---- private helpers ----

    async fn submit_inner(&self, url: Url, request: &JobRequest) -> Result<TaskHandle, ClientError> {
        let response = self.inner.post(url).form(&request.form_fields()).send().await?;
        let response = Self::ensure_success(response).await?;

        let body = response.text().await?;
        let parsed: StartResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Protocol(format!("invalid start response: {}", e)))?;

        parsed
            .task_id
            .filter(|id| !id.is_empty())
            .map(TaskHandle::new)
            .ok_or_else(|| ClientError::Protocol("start response did not include a task_id".to_string()))
    }

    /// Resolve path segments against the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Return the response unchanged on success, or a [`ClientError::Server`]
    /// carrying the body's `error` field (or `"HTTP <status>"`) on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}
