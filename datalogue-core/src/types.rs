//! Core domain types for datalogue
//!
//! These types form the canonical vocabulary shared by the reducer, the
//! extractor, the table processor and the search index.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Entry** | One accumulated conversation turn (user or agent) with its events and derived content |
//! | **Stream event** | A typed increment delivered by the transport for one turn |
//! | **Tool call** | An agent-invoked external action, represented by a start/end event pair |
//! | **Mission stage** | A named phase of the agent's multi-step reasoning/execution process |
//! | **Structured payload** | A machine-readable object embedded in otherwise free-form streamed text |
//! | **Tabular result** | A normalized column/row representation of a query's output |
//!
//! ### Ordering
//!
//! `StreamEvent::sequence` is the only reliable ordering key. It is unique
//! and increasing within a single turn's stream. `timestamp` is stamped by
//! the producer, may be skewed, and is for display only; nothing in this
//! crate orders by it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Stream events
// ============================================

/// A single typed event delivered by the transport for one conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Position within the turn's stream; unique, increasing, the sole
    /// ordering key.
    pub sequence: u64,
    /// Producer wall-clock time. Display only.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl StreamEvent {
    pub fn new(sequence: u64, timestamp: DateTime<Utc>, payload: EventPayload) -> Self {
        Self {
            sequence,
            timestamp,
            payload,
        }
    }
}

/// The closed set of event kinds the engine understands.
///
/// Dispatch is exhaustive pattern matching; unknown kinds are a transport
/// concern and never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// The agent invoked a tool.
    ToolStart {
        tool_name: String,
        input: serde_json::Value,
    },
    /// A previously started tool produced its output.
    ToolEnd {
        tool_name: String,
        output: serde_json::Value,
    },
    /// An incremental fragment of the agent's textual output.
    Token { text: String },
    /// The agent moved to a named phase of its mission.
    MissionStage {
        stage: MissionStage,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_summary: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        artifacts_produced: Vec<String>,
    },
    /// The mission finished successfully.
    MissionComplete,
    /// The mission failed; the message is surfaced verbatim.
    MissionError { message: String },
}

// ============================================
// Mission stages
// ============================================

/// Named phases of the agent's multi-step process.
///
/// There is no enforced transition graph; the tracker is observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStage {
    Plan,
    Explore,
    Execute,
    Synthesize,
    Finalize,
    Failed,
}

impl MissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStage::Plan => "plan",
            MissionStage::Explore => "explore",
            MissionStage::Execute => "execute",
            MissionStage::Synthesize => "synthesize",
            MissionStage::Finalize => "finalize",
            MissionStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MissionStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(MissionStage::Plan),
            "explore" => Ok(MissionStage::Explore),
            "execute" => Ok(MissionStage::Execute),
            "synthesize" => Ok(MissionStage::Synthesize),
            "finalize" => Ok(MissionStage::Finalize),
            "failed" => Ok(MissionStage::Failed),
            _ => Err(format!("unknown mission stage: {}", s)),
        }
    }
}

/// One recorded `mission_stage` event, kept for the full stage history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: MissionStage,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub confidence: Option<f64>,
    pub output_summary: Option<String>,
    pub artifacts_produced: Vec<String>,
}

/// Derived mission view for one entry.
///
/// Never stored; recomputed from the entry's event list on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionState {
    /// Full stage history in sequence order, including stages that arrived
    /// after a terminal event (kept for audit).
    pub stages: Vec<StageRecord>,
    /// The last stage observed before the mission terminated.
    pub current_stage: Option<MissionStage>,
    /// Set by `mission_complete`, regardless of the last recorded stage.
    pub is_complete: bool,
    /// Set by `mission_error`. Sticky: wins over completion.
    pub is_failed: bool,
    /// The failure message, retained verbatim for display.
    pub error: Option<String>,
}

impl MissionState {
    pub fn is_terminal(&self) -> bool {
        self.is_complete || self.is_failed
    }
}

// ============================================
// Tool calls
// ============================================

/// A correlated tool invocation.
///
/// `start` is absent when the `tool_end` arrived without a matching pending
/// start (the result is still shown). `end` is absent while the call is in
/// progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPair {
    pub start: Option<StreamEvent>,
    pub end: Option<StreamEvent>,
}

impl ToolCallPair {
    /// A pair with a start and no end yet.
    pub fn is_pending(&self) -> bool {
        self.start.is_some() && self.end.is_none()
    }

    /// Tool name from whichever side is present.
    pub fn tool_name(&self) -> Option<&str> {
        fn name(ev: &StreamEvent) -> Option<&str> {
            match &ev.payload {
                EventPayload::ToolStart { tool_name, .. } => Some(tool_name.as_str()),
                EventPayload::ToolEnd { tool_name, .. } => Some(tool_name.as_str()),
                _ => None,
            }
        }
        self.start
            .as_ref()
            .and_then(name)
            .or_else(|| self.end.as_ref().and_then(name))
    }

    /// The raw output payload, when the call has finished.
    pub fn output(&self) -> Option<&serde_json::Value> {
        match self.end.as_ref().map(|e| &e.payload) {
            Some(EventPayload::ToolEnd { output, .. }) => Some(output),
            _ => None,
        }
    }
}

// ============================================
// Structured content
// ============================================

/// Typed slots promoted out of an entry's raw text.
///
/// Slots merge idempotently: a populated slot is only replaced by a later
/// extraction pass that supplies a non-empty value for the same slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredContent {
    /// SQL the agent generated (the `sql` payload key).
    pub query_text: Option<String>,
    /// Narrative summary of the answer.
    pub summary: Option<String>,
    /// Insight list, normalized to bulleted lines.
    pub insights: Option<String>,
    /// Chart suggestions, normalized to bulleted lines
    /// (the `chart_recommendations` payload key).
    pub chart_suggestions: Option<String>,
    /// The agent's reasoning, when the payload carries it.
    pub reasoning: Option<String>,
}

impl StructuredContent {
    pub fn is_empty(&self) -> bool {
        self.query_text.is_none()
            && self.summary.is_none()
            && self.insights.is_none()
            && self.chart_suggestions.is_none()
            && self.reasoning.is_none()
    }

    pub fn has_query(&self) -> bool {
        self.query_text
            .as_deref()
            .map(|q| !q.trim().is_empty())
            .unwrap_or(false)
    }

    /// Merge a newer extraction pass into this one.
    ///
    /// A slot yields only to a non-empty newer value.
    pub fn merge(&mut self, newer: StructuredContent) {
        merge_slot(&mut self.query_text, newer.query_text);
        merge_slot(&mut self.summary, newer.summary);
        merge_slot(&mut self.insights, newer.insights);
        merge_slot(&mut self.chart_suggestions, newer.chart_suggestions);
        merge_slot(&mut self.reasoning, newer.reasoning);
    }
}

fn merge_slot(slot: &mut Option<String>, newer: Option<String>) {
    if let Some(value) = newer {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}

// ============================================
// Conversation entries
// ============================================

/// Who authored an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRole {
    User,
    Agent,
}

impl EntryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryRole::User => "user",
            EntryRole::Agent => "agent",
        }
    }
}

impl std::str::FromStr for EntryRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(EntryRole::User),
            "agent" => Ok(EntryRole::Agent),
            _ => Err(format!("unknown entry role: {}", s)),
        }
    }
}

/// One accumulated conversation turn.
///
/// Owned exclusively by the reducer; mutated only by applying stream events
/// (see [`crate::reduce`]). Once `is_streaming` goes false the textual
/// content is frozen; late events are still appended to `events` for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: String,
    pub role: EntryRole,
    /// Everything the stream produced, fenced payloads included.
    pub raw_text: String,
    /// Prose left over after structured payload extraction; what a
    /// presentation layer renders as the entry body.
    pub display_text: String,
    /// Ordered event list for this turn. Sequence order is maintained on
    /// insertion; duplicates (by sequence) are dropped.
    pub events: Vec<StreamEvent>,
    pub structured: StructuredContent,
    pub is_streaming: bool,
    pub created_at: DateTime<Utc>,
}

impl ConversationEntry {
    /// A finished user turn. User text is taken as-is; no stream follows.
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: EntryRole::User,
            raw_text: text.clone(),
            display_text: text,
            events: Vec::new(),
            structured: StructuredContent::default(),
            is_streaming: false,
            created_at: Utc::now(),
        }
    }

    /// A fresh agent turn, awaiting its event stream.
    pub fn agent() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: EntryRole::Agent,
            raw_text: String::new(),
            display_text: String::new(),
            events: Vec::new(),
            structured: StructuredContent::default(),
            is_streaming: true,
            created_at: Utc::now(),
        }
    }

    /// Whether the agent recorded any mission stages for this turn.
    ///
    /// The stage history doubles as the turn's task list.
    pub fn has_tasks(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e.payload, EventPayload::MissionStage { .. }))
    }
}

// ============================================
// Tabular results
// ============================================

/// One normalized result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A normalized tabular payload.
///
/// Created once per `tool_end` carrying a recognizable tabular shape and
/// immutable afterwards; a later result in the same entry supersedes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResultTable {
    /// Ordered, unique column names.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Row count as reported by the producer, else `rows.len()`.
    pub row_count: usize,
    /// Query execution time as reported by the producer, if any.
    pub execution_time: Option<f64>,
}

// ============================================
// Search filters
// ============================================

/// Date window for retrospective search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Week,
    Month,
    Custom,
    #[default]
    All,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::Custom => "custom",
            DateRange::All => "all",
        }
    }
}

impl std::str::FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "custom" => Ok(DateRange::Custom),
            "all" => Ok(DateRange::All),
            _ => Err(format!("unknown date range: {}", s)),
        }
    }
}

/// Entry classification filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTypeFilter {
    #[default]
    All,
    User,
    Agent,
    /// Entries whose structured content carries non-empty SQL.
    HasSql,
    /// Entries with a non-empty mission stage history.
    HasTasks,
}

impl EntryTypeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryTypeFilter::All => "all",
            EntryTypeFilter::User => "user",
            EntryTypeFilter::Agent => "agent",
            EntryTypeFilter::HasSql => "has_sql",
            EntryTypeFilter::HasTasks => "has_tasks",
        }
    }
}

impl std::str::FromStr for EntryTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(EntryTypeFilter::All),
            "user" => Ok(EntryTypeFilter::User),
            "agent" => Ok(EntryTypeFilter::Agent),
            "has_sql" => Ok(EntryTypeFilter::HasSql),
            "has_tasks" => Ok(EntryTypeFilter::HasTasks),
            _ => Err(format!("unknown entry type filter: {}", s)),
        }
    }
}

/// Explicit bounds for [`DateRange::Custom`], inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Pure value object describing a retrospective search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Free-text query; empty means "no text filter".
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub entry_type: EntryTypeFilter,
    /// Required when `date_range` is `Custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_range: Option<CustomRange>,
}

impl SearchFilters {
    /// The default/unfiltered view is inactive; searching it short-circuits
    /// to an empty result.
    pub fn is_active(&self) -> bool {
        !self.query_text.trim().is_empty()
            || self.date_range != DateRange::All
            || self.entry_type != EntryTypeFilter::All
    }
}
