use std::collections::BTreeMap;

use crate::aging::compute_ages;
use crate::error::ReconError;
use crate::matcher::{reconcile_with, ReferenceConfig};
use crate::mismatch::annotate_with;
use crate::model::{ReconOutcome, RunMeta, RunOptions, RunSummary, StatementConfig};
use crate::progress::{Channels, DiagnosticSink, ProgressReporter};
use crate::report::finalize;

/// Run one reconciliation: aging, matching, amount comparison, cleanup.
///
/// Fails only on structural problems with the statement (missing match or
/// date column) or unusable options. Per-slot and per-cell problems are
/// reported through `reporter`/`sink` and the run carries on.
pub fn run(
    statement: &StatementConfig,
    slots: &[Option<ReferenceConfig>],
    options: &RunOptions,
    reporter: &dyn ProgressReporter,
    sink: &dyn DiagnosticSink,
) -> Result<ReconOutcome, ReconError> {
    if !options.tolerance.is_finite() || options.tolerance < 0.0 {
        return Err(ReconError::ConfigValidation(format!(
            "amount tolerance must be a non-negative number, got {}",
            options.tolerance
        )));
    }

    let ch = Channels::new(reporter, sink);
    let mut table = statement.table.clone();

    // Aging runs once, on the statement alone, before any join.
    let mut age_buckets = BTreeMap::new();
    if let Some(date_column) = &statement.date_column {
        let ages = compute_ages(&table, date_column, options.as_of).map_err(|e| {
            ch.failure(&format!("[WARNING] Age Bucket Error: {e}"));
            e
        })?;
        for bucket in &ages.buckets {
            *age_buckets.entry(bucket.to_string()).or_insert(0) += 1;
        }
        ages.apply(&mut table);
    }

    let matched = reconcile_with(&table, &statement.match_column, slots, &ch)?;

    let (matched_keys, unmatched_keys) = matched
        .attribution
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .fold((0, 0), |(hit, miss), (_, labels)| {
            if labels.is_empty() {
                (hit, miss + 1)
            } else {
                (hit + 1, miss)
            }
        });

    let annotation = annotate_with(
        matched.table,
        statement.amount_column.as_deref(),
        &options.keywords,
        options.tolerance,
        &ch,
    );

    let document = finalize(annotation.table, &annotation.flagged, &options.keywords);

    let summary = RunSummary {
        statement_rows: statement.table.row_count(),
        output_rows: document.table.row_count(),
        output_columns: document.table.column_count(),
        matched_keys,
        unmatched_keys,
        slots: matched.slots,
        compared_columns: annotation.compared_columns,
        mismatch_count: annotation.mismatch_count,
        age_buckets,
    };

    tracing::info!(
        name = %options.name,
        rows = summary.output_rows,
        matched_keys = summary.matched_keys,
        unmatched_keys = summary.unmatched_keys,
        mismatches = summary.mismatch_count,
        "reconciliation finished"
    );

    Ok(ReconOutcome {
        meta: RunMeta {
            name: options.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            as_of: options.as_of,
        },
        summary,
        document,
    })
}
