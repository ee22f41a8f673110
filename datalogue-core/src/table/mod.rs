//! Tabular result processing
//!
//! Normalizes raw tool output into a uniform [`QueryResultTable`] and
//! offers client-side post-processing over it: substring search, stable
//! single-column sort, pagination and CSV/JSON export.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌───────────────────┐    ┌───────────────────────┐
//! │ tool_end     │ ─► │ normalize()       │ ─► │ TableView             │
//! │ output value │    │  shape predicates │    │  search → sort → page │
//! └──────────────┘    └───────────────────┘    │  export (pre-page)    │
//!                                              └───────────────────────┘
//! ```
//!
//! Shape detection is an explicit ordered predicate list, not incidental
//! property probing:
//!
//! 1. An object with a `results` list (optional `columns`, `row_count`,
//!    `execution_time`).
//! 2. A bare list of uniform records.
//!
//! Anything else is not tabular and yields `None`: absence, not an error.

mod export;
mod view;

pub use export::{to_csv, to_json};
pub use view::{paginate, search_rows, sort_rows, SortDirection, SortSpec, TablePage, TableView};

use crate::types::{QueryResultTable, Row};
use serde_json::Value;

/// Normalize a raw tool output payload into a table, if it has one of the
/// recognized tabular shapes.
pub fn normalize(output: &Value) -> Option<QueryResultTable> {
    if let Some(table) = from_results_object(output) {
        return Some(table);
    }
    if let Some(table) = from_record_list(output) {
        return Some(table);
    }
    tracing::trace!("tool output is not tabular");
    None
}

/// Shape (a): `{ "results": [...], "columns"?, "row_count"?, "execution_time"? }`
fn from_results_object(output: &Value) -> Option<QueryResultTable> {
    let object = output.as_object()?;
    let results = object.get("results")?.as_array()?;
    let rows = record_rows(results);

    let columns = object
        .get("columns")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|names| !names.is_empty())
        .unwrap_or_else(|| first_record_keys(&rows));

    let row_count = object
        .get("row_count")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(rows.len());

    let execution_time = object.get("execution_time").and_then(Value::as_f64);

    Some(QueryResultTable {
        columns: unique_in_order(columns),
        rows,
        row_count,
        execution_time,
    })
}

/// Shape (b): a bare list of uniform records.
fn from_record_list(output: &Value) -> Option<QueryResultTable> {
    let items = output.as_array()?;
    // An empty list has no first record to derive columns from, and a list
    // of scalars is not a record set.
    items.first()?.as_object()?;

    let rows = record_rows(items);
    let columns = first_record_keys(&rows);
    let row_count = rows.len();

    Some(QueryResultTable {
        columns: unique_in_order(columns),
        rows,
        row_count,
        execution_time: None,
    })
}

fn record_rows(items: &[Value]) -> Vec<Row> {
    items
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect()
}

fn first_record_keys(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

fn unique_in_order(columns: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    columns
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
