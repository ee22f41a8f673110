//! Formatting helpers shared across presentation layers.

use chrono::{DateTime, Utc};

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(ts);

    if elapsed.num_seconds() < 0 {
        "just now".to_string()
    } else if elapsed.num_seconds() < 60 {
        format!("{}s ago", elapsed.num_seconds())
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Format a millisecond duration compactly (e.g., "1.2s", "340ms").
pub fn format_duration_ms(ms: i64) -> String {
    if ms < 0 {
        "0ms".to_string()
    } else if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}

/// String form of a result cell, shared by table search, sort and export.
///
/// Null becomes empty; strings pass through unquoted; everything else is
/// serialized compactly.
pub fn cell_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
