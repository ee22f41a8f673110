//! Client-side table post-processing
//!
//! Pure functions over a normalized table plus a parameter object. They
//! compose in any order, but [`TableView`] applies them in one fixed
//! pipeline for determinism: search, then sort, then paginate. Export
//! runs on the post-search, post-sort, pre-pagination row set.

use crate::format::cell_display;
use crate::types::{QueryResultTable, Row};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;

// ============================================
// Sorting
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }
}

/// Single-column sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// The asc → desc → unsorted cycle a column header click drives.
    ///
    /// Clicking a different column starts over at ascending.
    pub fn toggled(current: Option<&SortSpec>, column: &str) -> Option<SortSpec> {
        match current {
            Some(spec) if spec.column == column => match spec.direction {
                SortDirection::Ascending => Some(SortSpec {
                    column: column.to_string(),
                    direction: SortDirection::Descending,
                }),
                SortDirection::Descending => None,
            },
            _ => Some(SortSpec {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            }),
        }
    }
}

/// Stable sort by one column.
///
/// When both cells are numeric the comparison is numeric, otherwise the
/// string forms are compared. Ties keep their prior relative order.
pub fn sort_rows(rows: &[Row], spec: &SortSpec) -> Vec<Row> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_cells(a.get(&spec.column), b.get(&spec.column));
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    sorted
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let left = cell_display(a.unwrap_or(&Value::Null));
    let right = cell_display(b.unwrap_or(&Value::Null));

    match (numeric(&left), numeric(&right)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => left.cmp(&right),
    }
}

fn numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

// ============================================
// Searching
// ============================================

/// Case-insensitive substring filter: a row matches when any cell's string
/// form contains the query. An empty query keeps every row.
pub fn search_rows(rows: &[Row], query: &str) -> Vec<Row> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|row| {
            row.values()
                .any(|cell| cell_display(cell).to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

// ============================================
// Pagination
// ============================================

/// One page of processed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub rows: Vec<Row>,
    /// The page actually served, after clamping. 1-indexed.
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

/// Fixed-size, 1-indexed pagination. Out-of-range pages (0 included) clamp
/// to the nearest valid page.
pub fn paginate(rows: &[Row], page: usize, page_size: usize) -> TablePage {
    let page_size = page_size.max(1);
    let total_rows = rows.len();
    let page_count = ((total_rows + page_size - 1) / page_size).max(1);
    let page = page.clamp(1, page_count);

    let start = (page - 1) * page_size;
    let slice = if start < total_rows {
        rows[start..(start + page_size).min(total_rows)].to_vec()
    } else {
        Vec::new()
    };

    TablePage {
        rows: slice,
        page,
        page_count,
        total_rows,
    }
}

// ============================================
// View
// ============================================

/// A result table with its presentation state: search query, sort order,
/// page cursor and hidden columns.
///
/// The view never mutates the underlying table; every accessor derives a
/// fresh value.
#[derive(Debug, Clone)]
pub struct TableView {
    pub table: QueryResultTable,
    pub search_query: String,
    pub sort: Option<SortSpec>,
    pub page: usize,
    pub page_size: usize,
    pub hidden_columns: HashSet<String>,
}

impl TableView {
    pub fn new(table: QueryResultTable, page_size: usize) -> Self {
        Self {
            table,
            search_query: String::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
            hidden_columns: HashSet::new(),
        }
    }

    /// Update the search query and jump back to the first page.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.page = 1;
    }

    /// Drive the asc → desc → unsorted cycle for a column header.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort = SortSpec::toggled(self.sort.as_ref(), column);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn hide_column(&mut self, column: &str) {
        self.hidden_columns.insert(column.to_string());
    }

    pub fn show_column(&mut self, column: &str) {
        self.hidden_columns.remove(column);
    }

    /// Columns in table order with the hidden ones removed.
    pub fn visible_columns(&self) -> Vec<String> {
        self.table
            .columns
            .iter()
            .filter(|name| !self.hidden_columns.contains(*name))
            .cloned()
            .collect()
    }

    /// The fixed pipeline up to pagination: search, then sort.
    fn processed_rows(&self) -> Vec<Row> {
        let searched = search_rows(&self.table.rows, &self.search_query);
        match &self.sort {
            Some(spec) => sort_rows(&searched, spec),
            None => searched,
        }
    }

    /// The page the presentation layer renders right now.
    pub fn current_page(&self) -> TablePage {
        paginate(&self.processed_rows(), self.page, self.page_size)
    }

    /// CSV over the post-search, post-sort, pre-pagination rows, visible
    /// columns only.
    pub fn export_csv(&self) -> String {
        super::to_csv(&self.visible_columns(), &self.processed_rows())
    }

    /// JSON array of objects over the same row set as [`Self::export_csv`].
    pub fn export_json(&self) -> String {
        super::to_json(&self.visible_columns(), &self.processed_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sample_table() -> QueryResultTable {
        let rows = vec![
            row(&[("region", json!("North")), ("total", json!(42))]),
            row(&[("region", json!("south")), ("total", json!(7))]),
            row(&[("region", json!("East")), ("total", json!(19))]),
            row(&[("region", json!("West")), ("total", json!(7))]),
        ];
        QueryResultTable {
            columns: vec!["region".to_string(), "total".to_string()],
            row_count: rows.len(),
            rows,
            execution_time: None,
        }
    }

    #[test]
    fn test_search_case_insensitive_any_cell() {
        let table = sample_table();
        let hits = search_rows(&table.rows, "SOUTH");
        assert_eq!(hits.len(), 1);

        let hits = search_rows(&table.rows, "7");
        assert_eq!(hits.len(), 2);

        let hits = search_rows(&table.rows, "");
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn test_sort_numeric_when_both_numeric() {
        let table = sample_table();
        let spec = SortSpec {
            column: "total".to_string(),
            direction: SortDirection::Ascending,
        };
        let sorted = sort_rows(&table.rows, &spec);
        let totals: Vec<i64> = sorted
            .iter()
            .map(|r| r.get("total").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(totals, vec![7, 7, 19, 42]);

        // Stable: the two 7s keep their original relative order.
        assert_eq!(sorted[0].get("region"), Some(&json!("south")));
        assert_eq!(sorted[1].get("region"), Some(&json!("West")));
    }

    #[test]
    fn test_sort_strings_otherwise() {
        let rows = vec![
            row(&[("v", json!("10"))]),
            row(&[("v", json!("9"))]),
            row(&[("v", json!("apple"))]),
        ];
        let spec = SortSpec {
            column: "v".to_string(),
            direction: SortDirection::Ascending,
        };
        let sorted = sort_rows(&rows, &spec);
        // "apple" forces string comparison against it, but the two numeric
        // strings still compare numerically with each other.
        let values: Vec<&str> = sorted
            .iter()
            .map(|r| r.get("v").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(values, vec!["9", "10", "apple"]);
    }

    #[test]
    fn test_missing_cells_sort_as_empty() {
        let rows = vec![row(&[("a", json!("x"))]), row(&[("b", json!("y"))])];
        let spec = SortSpec {
            column: "a".to_string(),
            direction: SortDirection::Ascending,
        };
        let sorted = sort_rows(&rows, &spec);
        // The row missing "a" sorts first (empty string).
        assert!(sorted[0].get("a").is_none());
    }

    #[test]
    fn test_toggle_cycle() {
        let first = SortSpec::toggled(None, "total");
        assert_eq!(
            first,
            Some(SortSpec {
                column: "total".to_string(),
                direction: SortDirection::Ascending
            })
        );

        let second = SortSpec::toggled(first.as_ref(), "total");
        assert_eq!(second.as_ref().unwrap().direction, SortDirection::Descending);

        let third = SortSpec::toggled(second.as_ref(), "total");
        assert!(third.is_none());

        // A different column restarts at ascending.
        let other = SortSpec::toggled(second.as_ref(), "region");
        assert_eq!(other.unwrap().direction, SortDirection::Ascending);
    }

    #[test]
    fn test_paginate_clamps() {
        let table = sample_table();

        let page = paginate(&table.rows, 1, 3);
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.page_count, 2);

        let beyond = paginate(&table.rows, 99, 3);
        assert_eq!(beyond.page, 2);
        assert_eq!(beyond.rows.len(), 1);

        let zero = paginate(&table.rows, 0, 3);
        assert_eq!(zero.page, 1);

        let empty = paginate(&[], 5, 10);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.page_count, 1);
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn test_view_pipeline_search_sort_page() {
        let mut view = TableView::new(sample_table(), 2);
        view.set_search("7");
        view.toggle_sort("region");

        let page = view.current_page();
        assert_eq!(page.total_rows, 2);
        assert_eq!(page.rows[0].get("region"), Some(&json!("West")));
        assert_eq!(page.rows[1].get("region"), Some(&json!("south")));
    }

    #[test]
    fn test_view_export_ignores_pagination_and_hidden_columns() {
        let mut view = TableView::new(sample_table(), 2);
        view.set_page(2);
        view.hide_column("total");

        let csv = view.export_csv();
        let lines: Vec<&str> = csv.lines().collect();
        // Header plus all four rows, despite the 2-row page.
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "region");
        assert!(!csv.contains("42"));
    }
}
