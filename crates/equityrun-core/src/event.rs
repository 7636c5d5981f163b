//! Progress messages pushed by the simulation service.
//!
//! The service sends JSON snapshots with the shape
//! `{"pct": 40, "stage": "...", "eta": 12, "detail": {"street": "Flop"},
//! "results": [...], "done": false}`. This module deserializes them into a
//! normalized [`ProgressEvent`].

use serde::{Deserialize, Serialize};

/// Per-street outcome produced by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetResult {
    /// Street label (wire field `title`).
    pub street: Option<String>,
    /// Estimated probability of winning, in `[0, 1]`.
    pub equity: f64,
    /// Free-form advice, may span several lines.
    pub advice_text: String,
    /// Made-hand description.
    pub hand_name: Option<String>,
    /// Equity change against the previous street.
    pub delta: Option<f64>,
    /// Where the advice came from (rules engine or model).
    pub advice_source: Option<String>,
}

/// A normalized progress update for one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion percentage, clamped to `0..=100`.
    pub percent: u8,
    pub stage: String,
    pub eta_secs: Option<u64>,
    pub current_street: Option<String>,
    /// All results so far, most recent last.
    pub results: Vec<StreetResult>,
    /// Terminal marker: nothing after this may change displayed state.
    pub done: bool,
}

impl ProgressEvent {
    /// The most recent street result, if any.
    pub fn latest_result(&self) -> Option<&StreetResult> {
        self.results.last()
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    pct: Option<f64>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    eta: Option<f64>,
    #[serde(default)]
    detail: Option<WireDetail>,
    #[serde(default)]
    results: Option<Vec<WireResult>>,
    #[serde(default)]
    done: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct WireDetail {
    #[serde(default)]
    street: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    equity: Option<f64>,
    #[serde(default)]
    advice_text: Option<String>,
    #[serde(default)]
    hand_name: Option<String>,
    #[serde(default)]
    delta: Option<f64>,
    #[serde(default)]
    advice_source: Option<String>,
}

impl From<WireResult> for StreetResult {
    fn from(wire: WireResult) -> Self {
        Self {
            street: wire.title.filter(|t| !t.is_empty()),
            equity: wire.equity.unwrap_or(0.0),
            advice_text: wire.advice_text.unwrap_or_default(),
            hand_name: wire.hand_name,
            delta: wire.delta,
            advice_source: wire.advice_source,
        }
    }
}

impl From<WireMessage> for ProgressEvent {
    fn from(wire: WireMessage) -> Self {
        let percent = wire
            .pct
            .filter(|p| p.is_finite())
            .map(|p| p.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0);

        let eta_secs = wire
            .eta
            .filter(|e| e.is_finite())
            .map(|e| e.max(0.0) as u64);

        Self {
            percent,
            stage: wire.stage.unwrap_or_default(),
            eta_secs,
            current_street: wire
                .detail
                .and_then(|d| d.street)
                .filter(|s| !s.is_empty()),
            results: wire
                .results
                .unwrap_or_default()
                .into_iter()
                .map(StreetResult::from)
                .collect(),
            done: wire.done.unwrap_or(false),
        }
    }
}

/// Parse one pushed text message into a progress event.
///
/// Returns `Err` for malformed JSON or fields of the wrong type.
/// Callers should log and drop such messages, then keep reading.
pub fn parse_message(text: &str) -> Result<ProgressEvent, serde_json::Error> {
    serde_json::from_str::<WireMessage>(text).map(ProgressEvent::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_running_message() {
        let json = r#"{"pct":37,"stage":"Flop: simulating","eta":12,"detail":{"street":"Flop"},"results":[],"done":false,"cancel":false,"ts":1700000000.5}"#;
        let event = parse_message(json).unwrap();
        assert_eq!(event.percent, 37);
        assert_eq!(event.stage, "Flop: simulating");
        assert_eq!(event.eta_secs, Some(12));
        assert_eq!(event.current_street.as_deref(), Some("Flop"));
        assert!(event.results.is_empty());
        assert!(!event.done);
    }

    #[test]
    fn parse_results_in_order() {
        let json = r#"{"pct":66,"stage":"Turn","results":[
            {"title":"Flop","equity":0.61,"advice_text":"Call","hand_name":"Straight","delta":null,"advice_source":"rule"},
            {"title":"Turn","equity":0.642,"advice_text":"Bet\nfor value","delta":0.032}
        ]}"#;
        let event = parse_message(json).unwrap();
        assert_eq!(event.results.len(), 2);

        let latest = event.latest_result().unwrap();
        assert_eq!(latest.street.as_deref(), Some("Turn"));
        assert_eq!(latest.equity, 0.642);
        assert_eq!(latest.advice_text, "Bet\nfor value");
        assert_eq!(latest.delta, Some(0.032));
        assert_eq!(event.results[0].hand_name.as_deref(), Some("Straight"));
    }

    #[test]
    fn parse_sparse_message_uses_defaults() {
        let event = parse_message(r#"{"eta":null,"detail":{}}"#).unwrap();
        assert_eq!(event.percent, 0);
        assert_eq!(event.stage, "");
        assert_eq!(event.eta_secs, None);
        assert_eq!(event.current_street, None);
        assert!(!event.done);
    }

    #[test]
    fn parse_clamps_percent() {
        let event = parse_message(r#"{"pct":140}"#).unwrap();
        assert_eq!(event.percent, 100);
        let event = parse_message(r#"{"pct":-3}"#).unwrap();
        assert_eq!(event.percent, 0);
    }

    #[test]
    fn parse_result_without_equity_reads_zero() {
        let event = parse_message(r#"{"results":[{"advice_text":"Fold"}]}"#).unwrap();
        assert_eq!(event.results[0].equity, 0.0);
        assert_eq!(event.results[0].street, None);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(parse_message("not json").is_err());
        assert!(parse_message(r#"{"pct":"fifty"}"#).is_err());
        assert!(parse_message("42").is_err());
    }

    #[test]
    fn parse_terminal_message() {
        let event = parse_message(r#"{"pct":100,"stage":"Done","eta":null,"done":true}"#).unwrap();
        assert!(event.done);
        assert_eq!(event.percent, 100);
    }
}
