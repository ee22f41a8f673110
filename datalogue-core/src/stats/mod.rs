//! First-order aggregates over reduced entries
//!
//! Read-only rollups a presentation layer shows next to the conversation:
//! tool-call counts and per-tool breakdown, mission outcomes, durations.
//! Everything here derives fresh values from snapshots and mutates nothing.

use crate::reduce::correlate;
use crate::types::{ConversationEntry, EntryRole};
use std::collections::HashMap;

/// Aggregates for a single entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryStats {
    pub tool_call_count: usize,
    pub completed_tool_calls: usize,
    pub pending_tool_calls: usize,
    /// `tool_end` events that arrived without a matching start.
    pub unmatched_results: usize,
    pub tool_breakdown: HashMap<String, usize>,
    pub stage_count: usize,
    /// Wall-clock spread of the entry's events, from producer timestamps.
    /// Display only, like the timestamps themselves.
    pub duration_ms: i64,
}

/// Compute aggregates for one entry.
pub fn entry_stats(entry: &ConversationEntry) -> EntryStats {
    let pairs = correlate(&entry.events);

    let mut stats = EntryStats {
        tool_call_count: pairs.len(),
        stage_count: entry.mission_state().stages.len(),
        ..Default::default()
    };

    for pair in &pairs {
        if let Some(name) = pair.tool_name() {
            *stats.tool_breakdown.entry(name.to_string()).or_insert(0) += 1;
        }
        if pair.is_pending() {
            stats.pending_tool_calls += 1;
        } else if pair.start.is_none() {
            stats.unmatched_results += 1;
        } else {
            stats.completed_tool_calls += 1;
        }
    }

    let mut timestamps = entry.events.iter().map(|e| e.timestamp);
    if let Some(first) = timestamps.next() {
        let (min, max) = timestamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
        stats.duration_ms = max.signed_duration_since(min).num_milliseconds();
    }

    stats
}

/// Aggregates for a whole conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationStats {
    pub entry_count: usize,
    pub user_entries: usize,
    pub agent_entries: usize,
    pub total_tool_calls: usize,
    pub tool_breakdown: HashMap<String, usize>,
    pub completed_missions: usize,
    pub failed_missions: usize,
    pub entries_with_sql: usize,
    pub entries_with_tables: usize,
}

/// Compute aggregates across a conversation snapshot.
pub fn conversation_stats(entries: &[ConversationEntry]) -> ConversationStats {
    let mut stats = ConversationStats {
        entry_count: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        match entry.role {
            EntryRole::User => stats.user_entries += 1,
            EntryRole::Agent => stats.agent_entries += 1,
        }

        let per_entry = entry_stats(entry);
        stats.total_tool_calls += per_entry.tool_call_count;
        for (name, count) in per_entry.tool_breakdown {
            *stats.tool_breakdown.entry(name).or_insert(0) += count;
        }

        let mission = entry.mission_state();
        if mission.is_failed {
            stats.failed_missions += 1;
        } else if mission.is_complete {
            stats.completed_missions += 1;
        }

        if entry.structured.has_query() {
            stats.entries_with_sql += 1;
        }
        if entry.latest_table().is_some() {
            stats.entries_with_tables += 1;
        }
    }

    stats
}
