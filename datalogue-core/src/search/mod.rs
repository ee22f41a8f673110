//! Retrospective conversation search
//!
//! Filtered, ranked lookup over reduced conversation entries. Search is a
//! synchronous call over a read-only snapshot; it never mutates the
//! entries and has no persisted side effects.
//!
//! ## Pipeline
//!
//! 1. Short-circuit: an inactive filter set (empty text, date "all", type
//!    "all") returns nothing, so the default view costs nothing.
//! 2. Date-range filter.
//! 3. Entry-type filter.
//! 4. Text filter and scoring across raw text, query text, summary and
//!    insights (skipped when the text query is empty).
//!
//! SQL matches outrank summary matches, which outrank raw-text matches,
//! which outrank insight matches; an exact full-string match earns a
//! bonus. The weights themselves are configuration ([`ScoringWeights`]),
//! only that ordering is contractual.

use crate::error::{Error, Result};
use crate::types::{ConversationEntry, DateRange, EntryRole, EntryTypeFilter, SearchFilters};
use chrono::{DateTime, Duration, Months, Utc};
use regex::Regex;
use serde::Deserialize;

// ============================================
// Scoring weights
// ============================================

/// Relevance weights for text matches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScoringWeights {
    /// Match in the entry's raw text.
    #[serde(default = "default_raw_text_weight")]
    pub raw_text: i64,
    /// Match in the extracted SQL; typically what a user is hunting for.
    #[serde(default = "default_query_text_weight")]
    pub query_text: i64,
    /// Match in the extracted summary.
    #[serde(default = "default_summary_weight")]
    pub summary: i64,
    /// Match in the extracted insights.
    #[serde(default = "default_insights_weight")]
    pub insights: i64,
    /// Bonus for an exact full-string match on raw text or SQL.
    #[serde(default = "default_exact_match_weight")]
    pub exact_match: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            raw_text: default_raw_text_weight(),
            query_text: default_query_text_weight(),
            summary: default_summary_weight(),
            insights: default_insights_weight(),
            exact_match: default_exact_match_weight(),
        }
    }
}

fn default_raw_text_weight() -> i64 {
    3
}

fn default_query_text_weight() -> i64 {
    5
}

fn default_summary_weight() -> i64 {
    4
}

fn default_insights_weight() -> i64 {
    2
}

fn default_exact_match_weight() -> i64 {
    10
}

impl ScoringWeights {
    /// The ordering sql > summary > raw text > insights is the contract;
    /// configured values must keep it.
    pub fn validate(&self) -> Result<()> {
        if self.insights < 1 {
            return Err(Error::Config(
                "search weights must be positive".to_string(),
            ));
        }
        if !(self.query_text > self.summary
            && self.summary > self.raw_text
            && self.raw_text > self.insights)
        {
            return Err(Error::Config(
                "search weights must satisfy query_text > summary > raw_text > insights"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================
// Search
// ============================================

/// One ranked hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub entry_id: String,
    /// Relevance score; 0 when only date/type filters were active.
    pub score: i64,
}

/// Filtered, ranked lookup over a snapshot of entries.
///
/// Results are sorted by descending score; ties keep the original entry
/// order (stable sort).
pub fn search(
    entries: &[ConversationEntry],
    filters: &SearchFilters,
    weights: &ScoringWeights,
) -> Vec<SearchMatch> {
    if !filters.is_active() {
        return Vec::new();
    }

    let now = Utc::now();
    let needle = filters.query_text.trim().to_lowercase();
    let mut matches = Vec::new();

    for entry in entries {
        if !within_date_range(entry.created_at, filters, now) {
            continue;
        }
        if !matches_type(entry, filters.entry_type) {
            continue;
        }
        if needle.is_empty() {
            matches.push(SearchMatch {
                entry_id: entry.id.clone(),
                score: 0,
            });
            continue;
        }
        let score = score_entry(entry, &needle, weights);
        if score > 0 {
            matches.push(SearchMatch {
                entry_id: entry.id.clone(),
                score,
            });
        }
    }

    matches.sort_by(|a, b| b.score.cmp(&a.score));

    tracing::debug!(
        candidates = entries.len(),
        hits = matches.len(),
        "conversation search"
    );

    matches
}

fn within_date_range(created_at: DateTime<Utc>, filters: &SearchFilters, now: DateTime<Utc>) -> bool {
    match filters.date_range {
        DateRange::All => true,
        DateRange::Today => created_at.date_naive() == now.date_naive(),
        DateRange::Week => created_at >= now - Duration::days(7),
        DateRange::Month => match now.checked_sub_months(Months::new(1)) {
            Some(cutoff) => created_at >= cutoff,
            None => true,
        },
        DateRange::Custom => match filters.custom_range {
            Some(range) => created_at >= range.start && created_at <= range.end,
            // Custom without bounds constrains nothing.
            None => true,
        },
    }
}

fn matches_type(entry: &ConversationEntry, filter: EntryTypeFilter) -> bool {
    match filter {
        EntryTypeFilter::All => true,
        EntryTypeFilter::User => entry.role == EntryRole::User,
        EntryTypeFilter::Agent => entry.role == EntryRole::Agent,
        EntryTypeFilter::HasSql => entry.structured.has_query(),
        EntryTypeFilter::HasTasks => entry.has_tasks(),
    }
}

fn score_entry(entry: &ConversationEntry, needle: &str, weights: &ScoringWeights) -> i64 {
    let mut score = 0;

    let raw = entry.raw_text.to_lowercase();
    if raw.contains(needle) {
        score += weights.raw_text;
    }

    let sql = entry
        .structured
        .query_text
        .as_deref()
        .map(str::to_lowercase);
    if let Some(ref sql) = sql {
        if sql.contains(needle) {
            score += weights.query_text;
        }
    }

    if let Some(summary) = entry.structured.summary.as_deref() {
        if summary.to_lowercase().contains(needle) {
            score += weights.summary;
        }
    }

    if let Some(insights) = entry.structured.insights.as_deref() {
        if insights.to_lowercase().contains(needle) {
            score += weights.insights;
        }
    }

    if raw == needle || sql.as_deref() == Some(needle) {
        score += weights.exact_match;
    }

    score
}

// ============================================
// Highlighting
// ============================================

/// One run of text, flagged when it matched the query.
///
/// Spans are structured output for the presentation layer to emphasize;
/// no markup strings, so user-controlled query text cannot inject markup.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSpan {
    pub text: String,
    pub is_match: bool,
}

/// Split text into spans around every case-insensitive occurrence of the
/// literal query. Regex metacharacters in the query are escaped first.
pub fn highlight(text: &str, query: &str) -> Vec<HighlightSpan> {
    let query = query.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if query.is_empty() {
        return vec![HighlightSpan {
            text: text.to_string(),
            is_match: false,
        }];
    }

    let pattern = format!("(?i){}", regex::escape(query));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        // An escaped literal always compiles; degrade to no highlight.
        Err(_) => {
            return vec![HighlightSpan {
                text: text.to_string(),
                is_match: false,
            }]
        }
    };

    let mut spans = Vec::new();
    let mut last = 0;
    for found in re.find_iter(text) {
        if found.start() > last {
            spans.push(HighlightSpan {
                text: text[last..found.start()].to_string(),
                is_match: false,
            });
        }
        spans.push(HighlightSpan {
            text: found.as_str().to_string(),
            is_match: true,
        });
        last = found.end();
    }
    if last < text.len() {
        spans.push(HighlightSpan {
            text: text[last..].to_string(),
            is_match: false,
        });
    }

    if spans.is_empty() {
        spans.push(HighlightSpan {
            text: text.to_string(),
            is_match: false,
        });
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomRange, StructuredContent};

    fn entry(role: EntryRole, raw: &str) -> ConversationEntry {
        let mut entry = match role {
            EntryRole::User => ConversationEntry::user(raw),
            EntryRole::Agent => {
                let mut e = ConversationEntry::agent();
                e.raw_text = raw.to_string();
                e.display_text = raw.to_string();
                e.is_streaming = false;
                e
            }
        };
        entry.created_at = Utc::now();
        entry
    }

    fn sql_entry(raw: &str, sql: &str) -> ConversationEntry {
        let mut e = entry(EntryRole::Agent, raw);
        e.structured = StructuredContent {
            query_text: Some(sql.to_string()),
            ..Default::default()
        };
        e
    }

    #[test]
    fn test_inactive_filters_short_circuit() {
        let entries = vec![entry(EntryRole::User, "Show sales")];
        let hits = search(&entries, &SearchFilters::default(), &ScoringWeights::default());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_sql_match_outranks_raw_text_match() {
        let entries = vec![
            entry(EntryRole::User, "Show sales"),
            sql_entry("Here is the query.", "SELECT * FROM sales"),
        ];
        let filters = SearchFilters {
            query_text: "sales".to_string(),
            ..Default::default()
        };
        let hits = search(&entries, &filters, &ScoringWeights::default());

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry_id, entries[1].id);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_exact_match_bonus() {
        let entries = vec![
            entry(EntryRole::User, "sales by region please"),
            entry(EntryRole::User, "sales"),
        ];
        let filters = SearchFilters {
            query_text: "sales".to_string(),
            ..Default::default()
        };
        let hits = search(&entries, &filters, &ScoringWeights::default());

        assert_eq!(hits[0].entry_id, entries[1].id);
        assert_eq!(hits[0].score, 3 + 10);
        assert_eq!(hits[1].score, 3);
    }

    #[test]
    fn test_type_filter() {
        let entries = vec![
            entry(EntryRole::User, "question"),
            entry(EntryRole::Agent, "answer"),
            sql_entry("with sql", "SELECT 1"),
        ];

        let filters = SearchFilters {
            entry_type: EntryTypeFilter::User,
            ..Default::default()
        };
        assert_eq!(search(&entries, &filters, &ScoringWeights::default()).len(), 1);

        let filters = SearchFilters {
            entry_type: EntryTypeFilter::HasSql,
            ..Default::default()
        };
        let hits = search(&entries, &filters, &ScoringWeights::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry_id, entries[2].id);
    }

    #[test]
    fn test_date_filter_excludes_old_entries() {
        let mut old = entry(EntryRole::User, "ancient question");
        old.created_at = Utc::now() - Duration::days(45);
        let fresh = entry(EntryRole::User, "fresh question");
        let entries = vec![old, fresh];

        let filters = SearchFilters {
            date_range: DateRange::Month,
            ..Default::default()
        };
        let hits = search(&entries, &filters, &ScoringWeights::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry_id, entries[1].id);
    }

    #[test]
    fn test_custom_range_inclusive() {
        let mut e = entry(EntryRole::User, "edge");
        let at = Utc::now() - Duration::days(3);
        e.created_at = at;
        let entries = vec![e];

        let filters = SearchFilters {
            date_range: DateRange::Custom,
            custom_range: Some(CustomRange { start: at, end: at }),
            ..Default::default()
        };
        assert_eq!(search(&entries, &filters, &ScoringWeights::default()).len(), 1);
    }

    #[test]
    fn test_more_filters_never_grow_results() {
        let entries = vec![
            entry(EntryRole::User, "sales question"),
            sql_entry("sales answer", "SELECT * FROM sales"),
            entry(EntryRole::Agent, "unrelated"),
        ];
        let weights = ScoringWeights::default();

        let text_only = SearchFilters {
            query_text: "sales".to_string(),
            ..Default::default()
        };
        let text_and_type = SearchFilters {
            query_text: "sales".to_string(),
            entry_type: EntryTypeFilter::Agent,
            ..Default::default()
        };
        let text_type_date = SearchFilters {
            query_text: "sales".to_string(),
            entry_type: EntryTypeFilter::Agent,
            date_range: DateRange::Today,
            ..Default::default()
        };

        let a = search(&entries, &text_only, &weights).len();
        let b = search(&entries, &text_and_type, &weights).len();
        let c = search(&entries, &text_type_date, &weights).len();
        assert!(a >= b);
        assert!(b >= c);
    }

    #[test]
    fn test_tie_preserves_entry_order() {
        let entries = vec![
            entry(EntryRole::User, "sales one"),
            entry(EntryRole::User, "sales two"),
        ];
        let filters = SearchFilters {
            query_text: "sales".to_string(),
            ..Default::default()
        };
        let hits = search(&entries, &filters, &ScoringWeights::default());
        assert_eq!(hits[0].entry_id, entries[0].id);
        assert_eq!(hits[1].entry_id, entries[1].id);
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoringWeights::default().validate().is_ok());

        let bad = ScoringWeights {
            raw_text: 9,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_highlight_spans() {
        let spans = highlight("Sales are up. SALES!", "sales");
        assert_eq!(
            spans,
            vec![
                HighlightSpan {
                    text: "Sales".to_string(),
                    is_match: true
                },
                HighlightSpan {
                    text: " are up. ".to_string(),
                    is_match: false
                },
                HighlightSpan {
                    text: "SALES".to_string(),
                    is_match: true
                },
                HighlightSpan {
                    text: "!".to_string(),
                    is_match: false
                },
            ]
        );
    }

    #[test]
    fn test_highlight_escapes_metacharacters() {
        let spans = highlight("cost is $5.20 today", "$5.20");
        let matched: Vec<&str> = spans
            .iter()
            .filter(|s| s.is_match)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(matched, vec!["$5.20"]);
    }

    #[test]
    fn test_highlight_no_occurrence() {
        let spans = highlight("nothing here", "sales");
        assert_eq!(spans.len(), 1);
        assert!(!spans[0].is_match);
    }
}
