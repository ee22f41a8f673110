//! Event reduction layer
//!
//! This module turns the per-turn event stream into a stable
//! [`ConversationEntry`] a presentation layer can render.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌──────────────────────┐
//! │ StreamEvent  │ ──► │ ConversationEntry  │ ──► │ derived views        │
//! │ (transport)  │     │ .apply_event()     │     │ tool_calls()         │
//! └──────────────┘     │  - dedup by seq    │     │ mission_state()      │
//!                      │  - text accrual    │     │ latest_table()       │
//!                      │  - re-extraction   │     └──────────────────────┘
//!                      └────────────────────┘
//! ```
//!
//! The reducer is a pure, single-threaded fold: one call per incoming
//! event, no internal queuing, no locking. Derived views (`tool_calls`,
//! `mission_state`, `latest_table`) replay the full event list each time,
//! which keeps them re-entrant and safe to call from a re-render loop.

mod correlator;
mod mission;

pub use correlator::correlate;
pub use mission::track;

use crate::extract::extract;
use crate::table::normalize;
use crate::types::{
    ConversationEntry, EventPayload, MissionState, QueryResultTable, StreamEvent, ToolCallPair,
};

impl ConversationEntry {
    /// Apply one stream event to this entry.
    ///
    /// Events are deduplicated by sequence number and kept in sequence
    /// order, so applying the same event twice is a no-op and delivery
    /// order does not matter. Token text accrues into `raw_text` only
    /// while the entry is streaming; terminal events freeze the text.
    /// Every event (late ones included) lands in `events` for audit.
    pub fn apply_event(&mut self, event: StreamEvent) {
        if self
            .events
            .iter()
            .any(|existing| existing.sequence == event.sequence)
        {
            tracing::debug!(
                entry_id = self.id.as_str(),
                sequence = event.sequence,
                "duplicate event dropped"
            );
            return;
        }

        let insert_at = self
            .events
            .partition_point(|existing| existing.sequence < event.sequence);

        match &event.payload {
            EventPayload::Token { text } => {
                if self.is_streaming {
                    self.raw_text.push_str(text);
                    self.refresh_extraction();
                }
            }
            EventPayload::MissionComplete | EventPayload::MissionError { .. } => {
                if self.is_streaming {
                    self.is_streaming = false;
                    // Final extraction pass over the completed text.
                    self.refresh_extraction();
                }
            }
            _ => {}
        }

        self.events.insert(insert_at, event);
    }

    /// Apply a batch of events in order.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = StreamEvent>) {
        for event in events {
            self.apply_event(event);
        }
    }

    /// User-initiated "stop generation".
    ///
    /// Freezes the entry where it stands; already-applied extraction and
    /// correlation results are kept.
    pub fn cancel(&mut self) {
        if self.is_streaming {
            self.is_streaming = false;
            tracing::debug!(entry_id = self.id.as_str(), "entry cancelled");
        }
    }

    /// Correlated tool calls for this entry, resolved and pending.
    pub fn tool_calls(&self) -> Vec<ToolCallPair> {
        correlate(&self.events)
    }

    /// Mission view derived from this entry's events.
    pub fn mission_state(&self) -> MissionState {
        track(&self.events)
    }

    /// The most recent tabular result in this entry, if any.
    ///
    /// A later tabular `tool_end` supersedes earlier ones; none of them is
    /// ever mutated.
    pub fn latest_table(&self) -> Option<QueryResultTable> {
        self.events
            .iter()
            .rev()
            .filter_map(|event| match &event.payload {
                EventPayload::ToolEnd { output, .. } => normalize(output),
                _ => None,
            })
            .next()
    }

    fn refresh_extraction(&mut self) {
        let extraction = extract(&self.raw_text);
        self.display_text = extraction.display_text;
        if let Some(content) = extraction.content {
            self.structured.merge(content);
        }
    }
}
