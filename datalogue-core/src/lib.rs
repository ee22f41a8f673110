//! # datalogue-core
//!
//! Core library for datalogue - the conversation and result reduction
//! engine behind a database Q&A agent.
//!
//! The engine consumes the per-turn event stream an agent transport
//! delivers (tool invocations, mission stage transitions, token fragments,
//! tabular results) and reduces it into stable, queryable conversation
//! state for a presentation layer:
//!
//! - **Reduction** ([`reduce`]): fold events into [`ConversationEntry`]
//!   values, correlate tool start/end pairs, track mission stages.
//! - **Extraction** ([`extract`]): promote SQL, summaries, insights and
//!   chart suggestions embedded in streamed text into typed slots.
//! - **Tables** ([`table`]): normalize tool output into column/row form,
//!   then search, sort, paginate and export it client-side.
//! - **Search** ([`search`]): filtered, ranked retrospective lookup over
//!   the reduced entries.
//!
//! Everything is a pure, synchronous transformation: one call per
//! incoming event, no internal queuing, no locking, no I/O. Derived views
//! replay the full event list, so repeated application over a growing
//! stream is safe from a re-render loop.
//!
//! ## Example
//!
//! ```rust
//! use datalogue_core::{ConversationEntry, EventPayload, StreamEvent};
//!
//! let mut entry = ConversationEntry::agent();
//! entry.apply_event(StreamEvent::new(
//!     1,
//!     chrono::Utc::now(),
//!     EventPayload::Token { text: "Looking at sales...".into() },
//! ));
//! assert!(entry.is_streaming);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{extract, Extraction};
pub use reduce::{correlate, track};
pub use search::{highlight, search, HighlightSpan, ScoringWeights, SearchMatch};
pub use table::{normalize, SortDirection, SortSpec, TablePage, TableView};
pub use types::*;

// Public modules
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod logging;
pub mod reduce;
pub mod search;
pub mod stats;
pub mod table;
pub mod types;
