//! Error types for the task client.

use thiserror::Error;

/// Errors that can occur when talking to the simulation service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or timeout before any response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error description from the response body, or a generic one.
        message: String,
    },

    /// A success response that is missing required data.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
