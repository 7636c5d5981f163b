//! Folding progress events into a single displayable state.
//!
//! [`apply`] and [`apply_status`] are pure: they take the previous state by
//! value and return its replacement. Ordering is the channel's job; the
//! aggregator trusts arrival order and never reorders or enforces
//! monotonic progress.

use serde::{Deserialize, Serialize};

use crate::display::format_percent;
use crate::event::{ProgressEvent, StreetResult};
use crate::request::JobRequest;
use crate::status::ChannelStatus;

/// Stage label before the first event arrives.
pub const QUEUED_STAGE: &str = "Queued";

/// Stage label once the job has finished.
pub const COMPLETED_STAGE: &str = "Done";

/// Everything a presentation layer needs for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedState {
    pub percent: u8,
    pub stage: String,
    pub eta_secs: Option<u64>,
    pub current_street: Option<String>,
    pub latest_result: Option<StreetResult>,
    /// Minimum equity needed to call, computed locally at job start.
    pub pot_odds: Option<f64>,
    /// Set by the terminal event; freezes the state.
    pub terminal: bool,
    pub connection: ChannelStatus,
}

impl AggregatedState {
    /// Empty state for a freshly submitted job.
    pub fn initial(pot_odds: Option<f64>) -> Self {
        Self {
            percent: 0,
            stage: QUEUED_STAGE.to_string(),
            eta_secs: None,
            current_street: None,
            latest_result: None,
            pot_odds,
            terminal: false,
            connection: ChannelStatus::Idle,
        }
    }

    /// Initial state with pot odds derived from the request's call and pot.
    pub fn for_request(request: &JobRequest) -> Self {
        let pot_odds = match (request.call, request.pot) {
            (Some(call), Some(pot)) => compute_pot_odds(call, pot),
            _ => None,
        };
        Self::initial(pot_odds)
    }

    /// Latest equity as display text, e.g. `"64.20%"`.
    pub fn equity_label(&self) -> Option<String> {
        self.latest_result
            .as_ref()
            .map(|result| format_percent(result.equity))
    }

    /// Pot odds as display text.
    pub fn pot_odds_label(&self) -> Option<String> {
        self.pot_odds.map(format_percent)
    }
}

impl Default for AggregatedState {
    fn default() -> Self {
        Self::initial(None)
    }
}

/// Merge one progress event into the state.
///
/// A terminal state is returned unchanged, whatever the event holds.
pub fn apply(previous: AggregatedState, event: &ProgressEvent) -> AggregatedState {
    if previous.terminal {
        return previous;
    }

    let mut next = AggregatedState {
        percent: event.percent,
        stage: event.stage.clone(),
        eta_secs: event.eta_secs,
        current_street: event.current_street.clone(),
        ..previous
    };

    if let Some(latest) = event.latest_result() {
        next.latest_result = Some(latest.clone());
    }

    if event.done {
        next.percent = 100;
        next.stage = COMPLETED_STAGE.to_string();
        next.eta_secs = None;
        next.terminal = true;
        next.connection = ChannelStatus::Closed;
    }

    next
}

/// Record a transport status change.
///
/// A terminal state is returned unchanged.
pub fn apply_status(previous: AggregatedState, status: ChannelStatus) -> AggregatedState {
    if previous.terminal {
        return previous;
    }
    AggregatedState {
        connection: status,
        ..previous
    }
}

/// Minimum equity required to justify a call: `call / (call + pot)`.
///
/// Defined only for a positive call and a non-negative pot.
pub fn compute_pot_odds(call: f64, pot: f64) -> Option<f64> {
    if call > 0.0 && pot >= 0.0 {
        Some(call / (call + pot))
    } else {
        None
    }
}
