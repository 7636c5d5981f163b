//! Terminal rendering of the aggregated job state.

use equityrun_client::ServiceConfig;
use equityrun_core::display::{format_eta, PLACEHOLDER};
use equityrun_core::{AggregatedState, ChannelStatus, StreetResult};

/// Turns successive states into the lines to print, skipping repeats.
#[derive(Debug, Default)]
pub struct Renderer {
    last_line: Option<String>,
    last_result: Option<StreetResult>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for `state`. Empty when nothing visible changed.
    pub fn update(&mut self, state: &AggregatedState) -> Vec<String> {
        let mut out = Vec::new();

        let line = render_line(state);
        if self.last_line.as_ref() != Some(&line) {
            out.push(line.clone());
            self.last_line = Some(line);
        }

        if let Some(result) = &state.latest_result {
            if self.last_result.as_ref() != Some(result) {
                out.extend(render_advice(result));
                self.last_result = Some(result.clone());
            }
        }

        out
    }
}

/// Pot odds banner printed once when a run starts.
pub fn render_pot_odds(state: &AggregatedState) -> Option<String> {
    state
        .pot_odds_label()
        .map(|odds| format!("Pot odds: {} equity needed to call", odds))
}

/// One-line status summary.
pub fn render_line(state: &AggregatedState) -> String {
    let eta = state
        .eta_secs
        .map(format_eta)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let street = state.current_street.as_deref().unwrap_or(PLACEHOLDER);
    let equity = state
        .equity_label()
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut line = format!(
        "[{:>3}%] {} | ETA {} | {} | equity {}",
        state.percent, state.stage, eta, street, equity
    );

    match state.connection {
        ChannelStatus::Reconnecting { attempt } => {
            line.push_str(&format!(" (reconnecting, attempt {})", attempt));
        }
        ChannelStatus::Connecting => line.push_str(" (connecting)"),
        _ => {}
    }

    line
}

/// Advice-engine settings as printable lines.
pub fn render_service_config(config: &ServiceConfig) -> Vec<String> {
    let mut lines = Vec::new();
    if config.enabled {
        lines.push("Model advice: enabled".to_string());
    } else {
        let reason = config.reason.as_deref().unwrap_or(PLACEHOLDER);
        lines.push(format!("Model advice: disabled ({})", reason));
    }
    lines.push(format!(
        "Model: {}",
        config.model.as_deref().unwrap_or(PLACEHOLDER)
    ));
    if let Some(temperature) = config.temperature {
        lines.push(format!("Temperature: {}", temperature));
    }
    if !config.guardrails.is_empty() {
        lines.push(format!("Guardrails: {}", config.guardrails.join(", ")));
    }
    lines
}

fn render_advice(result: &StreetResult) -> Vec<String> {
    let street = result.street.as_deref().unwrap_or("Result");
    let mut header = format!("== {} ==", street);
    if let Some(hand) = &result.hand_name {
        header.push_str(&format!(" {}", hand));
    }
    if let Some(delta) = result.delta {
        header.push_str(&format!(" ({:+.2}% vs previous street)", delta * 100.0));
    }

    let mut lines = vec![header];
    if result.advice_text.trim().is_empty() {
        lines.push(format!("  {}", PLACEHOLDER));
    } else {
        lines.extend(result.advice_text.lines().map(|l| format!("  {}", l)));
    }
    if let Some(source) = &result.advice_source {
        lines.push(format!("  [{}]", source));
    }
    lines
}
