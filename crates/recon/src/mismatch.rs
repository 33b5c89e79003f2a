use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::amount::parse_amount;
use crate::matcher::{slot_label, MAX_SLOTS};
use crate::progress::{Channels, NullReporter, ProgressReporter};
use crate::table::{Cell, Table, AMOUNT_DIFFERENCE_COLUMN};

/// Default absolute tolerance for amount comparison.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Keywords
// ---------------------------------------------------------------------------

/// Column-name fragments that mark amount and date columns. Matching is a
/// case-insensitive substring test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keywords {
    pub amount: Vec<String>,
    pub date: Vec<String>,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            amount: ["amount", "amt", "value", "total", "sum", "price", "cost"]
                .map(String::from)
                .to_vec(),
            date: ["date", "dt", "dated"].map(String::from).to_vec(),
        }
    }
}

impl Keywords {
    pub fn is_amount_column(&self, name: &str) -> bool {
        contains_any(name, &self.amount)
    }

    pub fn is_date_column(&self, name: &str) -> bool {
        contains_any(name, &self.date)
    }
}

fn contains_any(name: &str, keywords: &[String]) -> bool {
    let lower = name.to_lowercase();
    keywords
        .iter()
        .filter(|kw| !kw.is_empty())
        .any(|kw| lower.contains(&kw.to_lowercase()))
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// A flagged cell, addressed by row and column name.
pub type FlaggedCell = (usize, String);

#[derive(Debug, Clone)]
pub struct Annotation {
    pub table: Table,
    pub flagged: BTreeSet<FlaggedCell>,
    /// One per (row, reference column) whose difference exceeded tolerance.
    pub mismatch_count: usize,
    /// Reference amount columns that took part in the comparison.
    pub compared_columns: Vec<String>,
}

impl Annotation {
    fn unchanged(table: Table) -> Self {
        Self { table, flagged: BTreeSet::new(), mismatch_count: 0, compared_columns: Vec::new() }
    }
}

/// `Ref1`..`Ref4` for a column carrying one of the slot prefixes.
fn slot_prefix(name: &str) -> Option<String> {
    (1..=MAX_SLOTS)
        .map(slot_label)
        .find(|label| name.starts_with(&format!("{label}_")))
}

/// Compare the statement amount column against every reference amount column.
///
/// Adds `Amount Difference` as the last column and returns the cells to
/// highlight. Every skip path leaves the table untouched and says why on the
/// status channel.
pub fn annotate(
    table: Table,
    amount_column: Option<&str>,
    keywords: &Keywords,
    tolerance: f64,
    reporter: &dyn ProgressReporter,
) -> Annotation {
    let channels = Channels::new(reporter, &NullReporter);
    annotate_with(table, amount_column, keywords, tolerance, &channels)
}

pub(crate) fn annotate_with(
    mut table: Table,
    amount_column: Option<&str>,
    keywords: &Keywords,
    tolerance: f64,
    ch: &Channels<'_>,
) -> Annotation {
    let Some(amount_column) = amount_column else {
        ch.status("Amount comparison: No amount column selected for comparison");
        return Annotation::unchanged(table);
    };
    let Some(stmt_col) = table.column_index(amount_column) else {
        ch.status(&format!(
            "Amount comparison: Amount column '{amount_column}' not found in result"
        ));
        return Annotation::unchanged(table);
    };

    let ref_cols: Vec<(usize, String, String)> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != stmt_col)
        .filter(|(_, name)| keywords.is_amount_column(name))
        .filter_map(|(i, name)| slot_prefix(name).map(|label| (i, name.clone(), label)))
        .collect();

    if ref_cols.is_empty() {
        ch.status(&format!(
            "Amount comparison: No Ref amount columns detected for comparison with '{amount_column}'"
        ));
        return Annotation::unchanged(table);
    }

    tracing::debug!(
        statement = amount_column,
        references = ?ref_cols.iter().map(|(_, n, _)| n.as_str()).collect::<Vec<_>>(),
        "comparing amounts"
    );

    let mut flagged = BTreeSet::new();
    let mut mismatch_count = 0;
    let mut summary: Vec<Cell> = Vec::with_capacity(table.row_count());

    for (r, row) in table.rows().iter().enumerate() {
        let mut entries = Vec::new();
        if let Some(stmt) = parse_amount(row[stmt_col].as_deref()) {
            for (c, name, label) in &ref_cols {
                let Some(reference) = parse_amount(row[*c].as_deref()) else {
                    continue;
                };
                let diff = stmt - reference;
                if diff.abs() > tolerance {
                    entries.push(format!("{label}: {}", signed(diff)));
                    flagged.insert((r, amount_column.to_string()));
                    flagged.insert((r, name.clone()));
                    mismatch_count += 1;
                } else {
                    entries.push(format!("{label}: 0.00"));
                }
            }
        }
        summary.push(Some(entries.join(", ")));
    }

    let name = table.unique_name(AMOUNT_DIFFERENCE_COLUMN);
    table.push_column(name, summary);

    ch.status(&format!(
        "Amount comparison: {} ref column(s) checked, {mismatch_count} mismatches highlighted",
        ref_cols.len()
    ));

    Annotation {
        table,
        flagged,
        mismatch_count,
        compared_columns: ref_cols.into_iter().map(|(_, n, _)| n).collect(),
    }
}

fn signed(diff: f64) -> String {
    if diff > 0.0 {
        format!("+{diff:.2}")
    } else {
        format!("{diff:.2}")
    }
}
