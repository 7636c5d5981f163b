//! Text formatting shared by presentation layers.

/// Placeholder shown when a value is unavailable.
pub const PLACEHOLDER: &str = "—";

/// Format a fraction as a percentage with two decimals, e.g. `0.642` → `"64.20%"`.
pub fn format_percent(fraction: f64) -> String {
    if !fraction.is_finite() {
        return PLACEHOLDER.to_string();
    }
    format!("{:.2}%", fraction * 100.0)
}

/// Format a remaining-time estimate.
///
/// Leading zero units are dropped: `3723` → `"1h 2m 3s"`, `125` → `"2m 5s"`,
/// `7` → `"7s"`.
pub fn format_eta(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
