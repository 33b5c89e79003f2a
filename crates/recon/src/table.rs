use serde::Serialize;

use crate::error::ReconError;

/// Header of the aging bucket column, always the first column of the result.
pub const AGE_BUCKET_COLUMN: &str = "Age Bucket";
/// Header of the elapsed-days column.
pub const AGE_DAYS_COLUMN: &str = "Age (Days)";
/// Header of the per-row source attribution column.
pub const MATCH_SOURCE_COLUMN: &str = "Match Source";
/// Header of the per-row amount difference summary.
pub const AMOUNT_DIFFERENCE_COLUMN: &str = "Amount Difference";

/// Name of the blank column that visually separates reference blocks.
pub fn separator_column(slot: usize) -> String {
    format!("Separator{slot}")
}

/// A cell is either a string or missing.
pub type Cell = Option<String>;

/// True when a cell carries no usable value. Blank strings count as missing.
pub fn is_missing(cell: Option<&str>) -> bool {
    cell.map_or(true, |s| s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Ordered named columns over row-major string cells.
///
/// Every row has exactly `headers.len()` cells; constructors pad or truncate
/// ragged input so indexing never goes out of bounds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Self::new(headers);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Build a table from string literals; empty strings become missing cells.
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        let headers = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect()
            })
            .collect();
        Self::from_rows(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, or `MissingColumn` naming `table` as the owner.
    pub fn require_column(&self, table: &str, name: &str) -> Result<usize, ReconError> {
        self.column_index(name).ok_or_else(|| ReconError::MissingColumn {
            table: table.into(),
            column: name.into(),
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).and_then(|c| c.as_deref())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.column_index(column).and_then(|col| self.cell(row, col))
    }

    pub fn column_values(&self, col: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows.iter().map(move |r| r.get(col).and_then(|c| c.as_deref()))
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    /// Append a column; `values` is padded with missing cells to the row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Cell>) {
        let at = self.headers.len();
        self.insert_column(at, name, values);
    }

    pub fn insert_column(&mut self, at: usize, name: impl Into<String>, values: Vec<Cell>) {
        let at = at.min(self.headers.len());
        self.headers.insert(at, name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(at, values.next().flatten());
        }
    }

    /// Remove a column by name. Returns false when no such column exists.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Rewrite every cell of one column in place.
    pub fn map_column(&mut self, col: usize, mut f: impl FnMut(Cell) -> Cell) {
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(col) {
                *cell = f(cell.take());
            }
        }
    }

    /// `base` if unused, else `base (2)`, `base (3)`, ...
    pub fn unique_name(&self, base: &str) -> String {
        unique_header(&self.headers, base)
    }
}

pub(crate) fn unique_header(headers: &[String], base: &str) -> String {
    let taken = |name: &str| headers.iter().any(|h| h == name);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_padded_and_truncated() {
        let t = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Some("1".into())], vec![Some("1".into()), None, Some("x".into())]],
        );
        assert_eq!(t.rows()[0].len(), 2);
        assert_eq!(t.rows()[1].len(), 2);
        assert_eq!(t.cell(0, 1), None);
    }

    #[test]
    fn insert_column_positions_values() {
        let mut t = Table::from_strs(&["a", "b"], &[&["1", "2"], &["3", "4"]]);
        t.insert_column(0, "first", vec![Some("x".into()), Some("y".into())]);
        assert_eq!(t.headers(), &["first", "a", "b"]);
        assert_eq!(t.get(1, "first"), Some("y"));
        assert_eq!(t.get(1, "b"), Some("4"));
    }

    #[test]
    fn push_column_pads_short_values() {
        let mut t = Table::from_strs(&["a"], &[&["1"], &["2"]]);
        t.push_column("b", vec![Some("only".into())]);
        assert_eq!(t.get(0, "b"), Some("only"));
        assert_eq!(t.get(1, "b"), None);
    }

    #[test]
    fn remove_column_by_name() {
        let mut t = Table::from_strs(&["a", "b"], &[&["1", "2"]]);
        assert!(t.remove_column("a"));
        assert!(!t.remove_column("a"));
        assert_eq!(t.headers(), &["b"]);
        assert_eq!(t.cell(0, 0), Some("2"));
    }

    #[test]
    fn unique_name_suffixes() {
        let t = Table::from_strs(&["x", "x (2)"], &[]);
        assert_eq!(t.unique_name("y"), "y");
        assert_eq!(t.unique_name("x"), "x (3)");
    }

    #[test]
    fn blank_cells_are_missing() {
        assert!(is_missing(None));
        assert!(is_missing(Some("   ")));
        assert!(!is_missing(Some("0")));
    }

    #[test]
    fn require_column_names_table() {
        let t = Table::from_strs(&["a"], &[]);
        let err = t.require_column("statement", "b").unwrap_err();
        assert_eq!(err.to_string(), "statement: missing column 'b'");
    }
}
