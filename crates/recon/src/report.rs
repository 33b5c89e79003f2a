use std::collections::BTreeSet;

use serde::Serialize;

use crate::mismatch::{FlaggedCell, Keywords};
use crate::table::{separator_column, Cell, Table};

/// Values that stand for "no date" in exported sheets.
const DATE_PLACEHOLDERS: &[&str] = &["nan", "NaN", "NaT", "None"];

/// A cell to render with the mismatch style. Coordinates are data-relative:
/// `row` 0 is the first row under the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

/// The final, presentation-ready result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub table: Table,
    pub highlights: Vec<CellRef>,
}

impl ReportDocument {
    pub fn is_highlighted(&self, row: usize, col: usize) -> bool {
        self.highlights.binary_search(&CellRef { row, col }).is_ok()
    }
}

/// Clean up the annotated table and resolve flagged cells against the final
/// column layout.
pub fn finalize(mut table: Table, flagged: &BTreeSet<FlaggedCell>, keywords: &Keywords) -> ReportDocument {
    table.remove_column(&separator_column(1));

    let date_cols: Vec<usize> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, name)| keywords.is_date_column(name))
        .map(|(i, _)| i)
        .collect();
    for col in date_cols {
        table.map_column(col, clean_date_cell);
    }

    let mut highlights: Vec<CellRef> = flagged
        .iter()
        .filter_map(|(row, name)| {
            let col = table.column_index(name)?;
            (*row < table.row_count()).then_some(CellRef { row: *row, col })
        })
        .collect();
    highlights.sort();
    highlights.dedup();

    ReportDocument { table, highlights }
}

fn clean_date_cell(cell: Cell) -> Cell {
    let value = cell?;
    if DATE_PLACEHOLDERS.contains(&value.trim()) {
        return Some(String::new());
    }
    Some(strip_midnight(&value).to_string())
}

/// `"2024-06-16 00:00:00"` → `"2024-06-16"`. Other times are kept.
fn strip_midnight(value: &str) -> &str {
    match value.strip_suffix("00:00:00") {
        Some(head) if head.ends_with(char::is_whitespace) => head.trim_end(),
        _ => value,
    }
}
