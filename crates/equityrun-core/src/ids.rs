//! Newtype wrapper for the server-issued task identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a simulation task, issued by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Create a new TaskHandle from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskHandle {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
