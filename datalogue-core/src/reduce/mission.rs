//! Mission stage tracking
//!
//! Folds the ordered `mission_stage` / `mission_complete` / `mission_error`
//! events of one entry into a [`MissionState`]. The tracker is
//! observational: it enforces no transition graph, records every stage in
//! sequence order, and exposes the last stage seen before termination as
//! "current". Stage events after a terminal event are kept in the history
//! for audit but no longer move `current_stage`.
//!
//! Like the correlator, this is a full replay over the event list, so
//! repeated invocation over a growing stream is safe and idempotent.

use crate::types::{EventPayload, MissionState, StageRecord, StreamEvent};

/// Fold an entry's events into its mission state.
pub fn track(events: &[StreamEvent]) -> MissionState {
    let mut ordered: Vec<&StreamEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.sequence);

    let mut state = MissionState::default();

    for event in ordered {
        match &event.payload {
            EventPayload::MissionStage {
                stage,
                confidence,
                output_summary,
                artifacts_produced,
            } => {
                if !state.is_terminal() {
                    state.current_stage = Some(*stage);
                }
                state.stages.push(StageRecord {
                    stage: *stage,
                    sequence: event.sequence,
                    timestamp: event.timestamp,
                    confidence: *confidence,
                    output_summary: output_summary.clone(),
                    artifacts_produced: artifacts_produced.clone(),
                });
            }
            EventPayload::MissionComplete => {
                // Failure is sticky: completion never clears it.
                if !state.is_failed {
                    state.is_complete = true;
                }
            }
            EventPayload::MissionError { message } => {
                state.is_failed = true;
                state.is_complete = false;
                if state.error.is_none() {
                    state.error = Some(message.clone());
                }
            }
            _ => {}
        }
    }

    state
}
