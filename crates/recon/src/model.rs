use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::matcher::SlotSummary;
use crate::mismatch::{Keywords, DEFAULT_TOLERANCE};
use crate::report::ReportDocument;
use crate::table::Table;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The primary table and the columns the run reads from it.
#[derive(Debug, Clone)]
pub struct StatementConfig {
    pub table: Table,
    pub match_column: String,
    pub date_column: Option<String>,
    pub amount_column: Option<String>,
}

impl StatementConfig {
    pub fn new(table: Table, match_column: impl Into<String>) -> Self {
        Self {
            table,
            match_column: match_column.into(),
            date_column: None,
            amount_column: None,
        }
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    pub fn with_amount_column(mut self, column: impl Into<String>) -> Self {
        self.amount_column = Some(column.into());
        self
    }
}

/// Run-wide settings that are not tied to a table.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub name: String,
    /// Reference date for aging.
    pub as_of: NaiveDate,
    pub tolerance: f64,
    pub keywords: Keywords,
}

impl RunOptions {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            name: String::new(),
            as_of,
            tolerance: DEFAULT_TOLERANCE,
            keywords: Keywords::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub statement_rows: usize,
    pub output_rows: usize,
    pub output_columns: usize,
    /// Distinct non-blank statement keys matched by at least one source.
    pub matched_keys: usize,
    pub unmatched_keys: usize,
    pub slots: Vec<SlotSummary>,
    pub compared_columns: Vec<String>,
    pub mismatch_count: usize,
    /// Statement rows per aging bucket; empty when no date column was set.
    pub age_buckets: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconOutcome {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub document: ReportDocument,
}
