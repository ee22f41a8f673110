//! Tool-call correlation
//!
//! Pairs `tool_start` events with their eventual `tool_end` by replaying
//! the full ordered event list. Correlation key is the tool name; when
//! several calls to the same tool are in flight, matching is first-in
//! first-out against the pending starts for that name.
//!
//! Replaying from the full list (instead of mutating a retained queue from
//! deltas) makes the algorithm re-entrant: running it again over the same
//! or a longer stream reproduces every previously resolved pair.

use crate::types::{EventPayload, StreamEvent, ToolCallPair};
use std::collections::{HashMap, VecDeque};

/// Correlate the ordered event list of one entry into tool-call pairs.
///
/// Pairs appear in the order of the event that opened them: a `tool_start`
/// opens a pair at its own position; a `tool_end` with no pending start
/// opens a start-less pair at its position. Leftover starts stay as
/// pending pairs ("in progress").
pub fn correlate(events: &[StreamEvent]) -> Vec<ToolCallPair> {
    let mut ordered: Vec<&StreamEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.sequence);

    let mut pairs: Vec<ToolCallPair> = Vec::new();
    // tool name -> indices into `pairs` still awaiting their end, FIFO
    let mut pending: HashMap<&str, VecDeque<usize>> = HashMap::new();

    for event in ordered {
        match &event.payload {
            EventPayload::ToolStart { tool_name, .. } => {
                pending
                    .entry(tool_name.as_str())
                    .or_default()
                    .push_back(pairs.len());
                pairs.push(ToolCallPair {
                    start: Some(event.clone()),
                    end: None,
                });
            }
            EventPayload::ToolEnd { tool_name, .. } => {
                let matched = pending
                    .get_mut(tool_name.as_str())
                    .and_then(|queue| queue.pop_front());
                match matched {
                    Some(index) => pairs[index].end = Some(event.clone()),
                    None => {
                        // Start lost in transport; keep the result visible.
                        tracing::debug!(
                            tool_name = tool_name.as_str(),
                            sequence = event.sequence,
                            "tool_end without pending start"
                        );
                        pairs.push(ToolCallPair {
                            start: None,
                            end: Some(event.clone()),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn start(seq: u64, tool: &str) -> StreamEvent {
        StreamEvent::new(
            seq,
            Utc::now(),
            EventPayload::ToolStart {
                tool_name: tool.to_string(),
                input: json!({}),
            },
        )
    }

    fn end(seq: u64, tool: &str) -> StreamEvent {
        StreamEvent::new(
            seq,
            Utc::now(),
            EventPayload::ToolEnd {
                tool_name: tool.to_string(),
                output: json!({}),
            },
        )
    }

    #[test]
    fn test_simple_pairing() {
        let events = vec![start(1, "sql_execute"), end(2, "sql_execute")];
        let pairs = correlate(&events);

        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].start.is_some());
        assert!(pairs[0].end.is_some());
        assert_eq!(pairs[0].tool_name(), Some("sql_execute"));
    }

    #[test]
    fn test_concurrent_same_tool_fifo() {
        let events = vec![
            start(1, "sql_execute"),
            start(2, "sql_execute"),
            end(3, "sql_execute"),
            end(4, "sql_execute"),
        ];
        let pairs = correlate(&events);

        assert_eq!(pairs.len(), 2);
        // Oldest start gets the first end.
        assert_eq!(pairs[0].start.as_ref().unwrap().sequence, 1);
        assert_eq!(pairs[0].end.as_ref().unwrap().sequence, 3);
        assert_eq!(pairs[1].start.as_ref().unwrap().sequence, 2);
        assert_eq!(pairs[1].end.as_ref().unwrap().sequence, 4);
    }

    #[test]
    fn test_unmatched_end_keeps_result() {
        let events = vec![end(1, "schema_lookup")];
        let pairs = correlate(&events);

        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].start.is_none());
        assert!(pairs[0].end.is_some());
        assert_eq!(pairs[0].tool_name(), Some("schema_lookup"));
    }

    #[test]
    fn test_pending_start_is_in_progress() {
        let events = vec![start(1, "sql_execute"), start(2, "chart_builder")];
        let pairs = correlate(&events);

        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.is_pending()));
    }

    #[test]
    fn test_name_mismatch_does_not_pair() {
        let events = vec![start(1, "sql_execute"), end(2, "schema_lookup")];
        let pairs = correlate(&events);

        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].is_pending());
        assert!(pairs[1].start.is_none());
    }

    #[test]
    fn test_out_of_order_delivery() {
        // Delivered end-before-start; sequence order still wins.
        let events = vec![end(4, "sql_execute"), start(1, "sql_execute")];
        let pairs = correlate(&events);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].start.as_ref().unwrap().sequence, 1);
        assert_eq!(pairs[0].end.as_ref().unwrap().sequence, 4);
    }

    #[test]
    fn test_reentrant_over_prefixes() {
        let events = vec![
            start(1, "sql_execute"),
            start(2, "chart_builder"),
            end(3, "sql_execute"),
            end(4, "chart_builder"),
            start(5, "sql_execute"),
        ];

        let full = correlate(&events);
        for cut in 0..=events.len() {
            let partial = correlate(&events[..cut]);
            for (i, pair) in partial.iter().enumerate() {
                // A pair resolved in the prefix is identical in the full run.
                if pair.end.is_some() {
                    assert_eq!(full[i], *pair, "pair {} changed after prefix {}", i, cut);
                } else {
                    assert_eq!(full[i].start, pair.start);
                }
            }
        }
    }
}
