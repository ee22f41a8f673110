//! Table export
//!
//! Both formats operate on already-processed rows (post-search, post-sort,
//! pre-pagination) restricted to the visible columns. Neither ever fails:
//! odd cell values degrade to an empty or well-quoted representation.

use crate::format::cell_display;
use crate::types::Row;
use serde_json::Value;

/// Render rows as CSV with a header line.
///
/// RFC 4180-style quoting: a field containing a comma, quote or newline is
/// wrapped in quotes with internal quotes doubled. Null and missing cells
/// become empty fields.
pub fn to_csv(columns: &[String], rows: &[Row]) -> String {
    let mut out = String::new();

    let header: Vec<String> = columns.iter().map(|name| csv_field(name)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in rows {
        let fields: Vec<String> = columns
            .iter()
            .map(|name| csv_field(&cell_display(row.get(name).unwrap_or(&Value::Null))))
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Render rows as a single-line JSON array of objects, visible columns
/// only. Missing cells are emitted as null.
pub fn to_json(columns: &[String], rows: &[Row]) -> String {
    let projected: Vec<Value> = rows
        .iter()
        .map(|row| {
            let object: serde_json::Map<String, Value> = columns
                .iter()
                .map(|name| {
                    (
                        name.clone(),
                        row.get(name).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_string(&projected).unwrap_or_else(|_| "[]".to_string())
}
