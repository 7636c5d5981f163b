//! Task lifecycle client.

use tokio_util::sync::CancellationToken;
use tracing::info;

use equityrun_core::{JobRequest, TaskHandle};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{ApiClient, ServiceConfig};
use crate::subscription::Subscription;

/// Owns job submission and at most one live progress subscription.
///
/// Starting a job or opening a subscription always closes the previous
/// subscription first, so two jobs can never feed the same display state.
pub struct TaskClient {
    api: ApiClient,
    config: ClientConfig,
    active: Option<ActiveChannel>,
}

struct ActiveChannel {
    handle: TaskHandle,
    cancel: CancellationToken,
}

impl TaskClient {
    /// Create a client for the service at `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config.base_url)?;
        Ok(Self {
            api,
            config,
            active: None,
        })
    }

    /// Submit a job and return its handle.
    ///
    /// Any open subscription is superseded before the request is sent.
    pub async fn start(&mut self, request: &JobRequest) -> Result<TaskHandle, ClientError> {
        self.close();

        info!(
            hero = %request.hero,
            street = ?request.street(),
            villains = request.villains,
            "Submitting simulation job"
        );

        let handle = self.api.submit(request, self.config.submit_timeout).await?;
        info!(task_id = %handle, "Simulation job started");
        Ok(handle)
    }

    /// Open the progress channel for `handle`.
    ///
    /// Closes any previous subscription, whichever task it followed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the channel reader
    /// is spawned onto the current runtime.
    pub fn subscribe(&mut self, handle: &TaskHandle) -> Subscription {
        self.close();

        info!(task_id = %handle, "Subscribing to progress channel");
        let cancel = CancellationToken::new();
        self.active = Some(ActiveChannel {
            handle: handle.clone(),
            cancel: cancel.clone(),
        });

        Subscription::spawn(self.api.clone(), handle.clone(), &self.config, cancel)
    }

    /// Terminate the active subscription, if any. Idempotent.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            info!(task_id = %active.handle, "Closing progress channel");
            active.cancel.cancel();
        }
    }

    /// Handle of the task whose subscription is currently active.
    ///
    /// Stays set after the channel ends on its own, until the next
    /// `start`, `subscribe`, or `close`.
    pub fn active_handle(&self) -> Option<&TaskHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }

    /// Ask the service to stop a task.
    pub async fn cancel(&self, handle: &TaskHandle) -> Result<(), ClientError> {
        info!(task_id = %handle, "Cancelling task");
        self.api.cancel(handle).await
    }

    /// Check if the service is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        self.api.health().await
    }

    /// Fetch the service's advice-engine settings.
    pub async fn service_config(&self) -> Result<ServiceConfig, ClientError> {
        self.api.service_config().await
    }

    /// Underlying HTTP client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

impl Drop for TaskClient {
    fn drop(&mut self) {
        self.close();
    }
}
