//! Task lifecycle client for the EquityRun simulation service.
//!
//! Submits jobs over HTTP and follows their progress over a server-sent
//! event channel, with at most one live subscription per [`TaskClient`].

pub mod config;
pub mod error;
pub mod http;
pub mod reconnect;
pub mod sse;
pub mod subscription;
pub mod task_client;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::{ApiClient, ServiceConfig};
pub use reconnect::ReconnectConfig;
pub use subscription::{StreamItem, Subscription};
pub use task_client::TaskClient;
