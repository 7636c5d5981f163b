//! EquityRun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtimes
//!
//! Everything here can be exercised synchronously: building a job request
//! from raw user input, parsing progress messages, and folding them into
//! the state a presentation layer renders.

pub mod aggregator;
pub mod display;
pub mod error;
pub mod event;
pub mod ids;
pub mod request;
pub mod status;

// Re-export commonly used types
pub use aggregator::{apply, apply_status, compute_pot_odds, AggregatedState};
pub use error::CoreError;
pub use event::{parse_message, ProgressEvent, StreetResult};
pub use ids::TaskHandle;
pub use request::{build, HandFields, JobRequest};
pub use status::{ChannelStatus, Street};
