use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::error::ReconError;
use crate::normalize::normalize_key;
use crate::progress::{Channels, DiagnosticSink, ProgressReporter};
use crate::table::{is_missing, separator_column, unique_header, Cell, Table, MATCH_SOURCE_COLUMN};

/// Number of reference slots a run accepts.
pub const MAX_SLOTS: usize = 4;

/// `Ref{slot}`, the label used for prefixes and in `Match Source`.
pub fn slot_label(slot: usize) -> String {
    format!("Ref{slot}")
}

// ---------------------------------------------------------------------------
// Reference slot config
// ---------------------------------------------------------------------------

/// One reference table plus the column to match on and the columns to bring
/// back into the statement.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub table: Table,
    pub match_column: String,
    pub return_columns: Vec<String>,
}

impl ReferenceConfig {
    pub fn new<I, S>(table: Table, match_column: impl Into<String>, return_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table,
            match_column: match_column.into(),
            return_columns: return_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Return columns must be non-empty, distinct, and exclude the match column.
    pub fn validate(&self, slot: usize) -> Result<(), ReconError> {
        validate_return_columns(slot, &self.match_column, &self.return_columns)
    }
}

pub(crate) fn validate_return_columns(
    slot: usize,
    match_column: &str,
    return_columns: &[String],
) -> Result<(), ReconError> {
    if return_columns.is_empty() {
        return Err(ReconError::InvalidReturnColumns {
            slot,
            reason: "at least one return column is required".into(),
        });
    }
    let mut seen = HashSet::new();
    for col in return_columns {
        if col == match_column {
            return Err(ReconError::InvalidReturnColumns {
                slot,
                reason: format!("'{col}' is the match column"),
            });
        }
        if !seen.insert(col.as_str()) {
            return Err(ReconError::InvalidReturnColumns {
                slot,
                reason: format!("duplicate return column '{col}'"),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What happened to one present slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub slot: usize,
    /// Output rows whose first return column came back non-missing.
    pub matched_rows: usize,
    /// Extra rows created because a key hit several reference rows.
    pub fanout_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MatchOutput {
    /// Statement rows (fanned out where needed) with every joined block and
    /// the trailing `Match Source` column.
    pub table: Table,
    /// Normalized key → labels of the slots that matched it, in slot order.
    pub attribution: BTreeMap<String, Vec<String>>,
    pub slots: Vec<SlotSummary>,
}

// ---------------------------------------------------------------------------
// Fold
// ---------------------------------------------------------------------------

/// State threaded through the slot steps.
#[derive(Debug, Clone)]
struct Accumulator {
    table: Table,
    /// Normalized join key per row of `table`.
    keys: Vec<String>,
    attribution: BTreeMap<String, Vec<String>>,
    /// Whether any reference block has been joined yet.
    has_block: bool,
}

/// Left-join `statement` against every present slot, in slot order.
///
/// `slots[i]` is slot `i + 1`; `None` entries are skipped. A slot that fails
/// (missing columns, unusable return columns) is reported and skipped; the
/// run continues with the remaining slots.
pub fn reconcile(
    statement: &Table,
    match_column: &str,
    slots: &[Option<ReferenceConfig>],
    reporter: &dyn ProgressReporter,
    sink: &dyn DiagnosticSink,
) -> Result<MatchOutput, ReconError> {
    let channels = Channels::new(reporter, sink);
    reconcile_with(statement, match_column, slots, &channels)
}

pub(crate) fn reconcile_with(
    statement: &Table,
    match_column: &str,
    slots: &[Option<ReferenceConfig>],
    ch: &Channels<'_>,
) -> Result<MatchOutput, ReconError> {
    let key_col = statement.require_column("statement", match_column)?;
    let keys: Vec<String> = statement.column_values(key_col).map(normalize_key).collect();
    let attribution = keys.iter().map(|k| (k.clone(), Vec::new())).collect();

    ch.status("Starting reconciliation...");
    ch.progress(0);

    let present: Vec<(usize, &ReferenceConfig)> = slots
        .iter()
        .take(MAX_SLOTS)
        .enumerate()
        .filter_map(|(i, s)| s.as_ref().map(|cfg| (i + 1, cfg)))
        .collect();
    let total = present.len();

    let init = Accumulator {
        table: statement.clone(),
        keys,
        attribution,
        has_block: false,
    };
    let mut summaries = Vec::with_capacity(total);

    let acc = present.iter().enumerate().fold(init, |acc, (position, (slot, cfg))| {
        let step = SlotStep { slot: *slot, position, total };
        let (acc, summary) = step.apply(acc, cfg, ch);
        summaries.push(summary);
        acc
    });

    let Accumulator { mut table, keys, attribution, .. } = acc;
    let sources: Vec<Cell> = keys
        .iter()
        .map(|k| Some(attribution.get(k).map(|labels| labels.join(", ")).unwrap_or_default()))
        .collect();
    let name = table.unique_name(MATCH_SOURCE_COLUMN);
    table.push_column(name, sources);

    ch.status("Reconciliation Complete");
    ch.progress(100);

    Ok(MatchOutput { table, attribution, slots: summaries })
}

/// One slot's join, positioned within the run for progress accounting.
struct SlotStep {
    slot: usize,
    /// Zero-based index among present slots.
    position: usize,
    total: usize,
}

impl SlotStep {
    /// `(acc, config) -> acc`. On failure the accumulator passes through
    /// unchanged and the error is reported.
    fn apply(&self, acc: Accumulator, cfg: &ReferenceConfig, ch: &Channels<'_>) -> (Accumulator, SlotSummary) {
        let label = slot_label(self.slot);
        ch.status(&format!(
            "Matching {label} | Match = {} | Returns = {}",
            cfg.match_column,
            cfg.return_columns.join(", ")
        ));

        match self.join(&acc, cfg, ch) {
            Ok((next, summary)) => {
                tracing::debug!(
                    slot = self.slot,
                    matched = summary.matched_rows,
                    fanout = summary.fanout_rows,
                    "slot joined"
                );
                (next, summary)
            }
            Err(e) => {
                // Slot errors already lead with the slot label.
                let text = e.to_string();
                let detail = text.strip_prefix(&format!("{label}: ")).unwrap_or(&text);
                ch.failure(&format!("Error matching {label}: {detail}"));
                let summary = SlotSummary {
                    slot: self.slot,
                    matched_rows: 0,
                    fanout_rows: 0,
                    error: Some(e.to_string()),
                };
                (acc, summary)
            }
        }
    }

    fn join(
        &self,
        acc: &Accumulator,
        cfg: &ReferenceConfig,
        ch: &Channels<'_>,
    ) -> Result<(Accumulator, SlotSummary), ReconError> {
        cfg.validate(self.slot)?;
        let label = slot_label(self.slot);
        let reference = &cfg.table;
        let ref_key_col = reference.require_column(&label, &cfg.match_column)?;
        let return_idx: Vec<usize> = cfg
            .return_columns
            .iter()
            .map(|c| reference.require_column(&label, c))
            .collect::<Result<_, _>>()?;

        // Reference rows per normalized key, in reference order. Blank keys
        // never join.
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, raw) in reference.column_values(ref_key_col).enumerate() {
            let key = normalize_key(raw);
            if !key.is_empty() {
                index.entry(key).or_default().push(i);
            }
        }

        let mut headers = acc.table.headers().to_vec();
        let separator = acc.has_block;
        if separator {
            let name = unique_header(&headers, &separator_column(self.slot));
            headers.push(name);
        }
        for col in &cfg.return_columns {
            let name = unique_header(&headers, &format!("{label}_{col}"));
            headers.push(name);
        }

        let mut table = Table::new(headers);
        let mut keys = Vec::with_capacity(acc.keys.len());
        let mut attribution = acc.attribution.clone();
        let mut matched_rows = 0;
        let mut fanout_rows = 0;
        let row_total = acc.table.row_count();

        for (r, (row, key)) in acc.table.rows().iter().zip(&acc.keys).enumerate() {
            let hits = index.get(key).map(Vec::as_slice).unwrap_or(&[]);
            let mut row_matched = false;

            if hits.is_empty() {
                let mut out = row.clone();
                if separator {
                    out.push(None);
                }
                out.extend(std::iter::repeat(None).take(return_idx.len()));
                table.push_row(out);
                keys.push(key.clone());
            } else {
                fanout_rows += hits.len() - 1;
                for &h in hits {
                    let ref_row = &reference.rows()[h];
                    let mut out = row.clone();
                    if separator {
                        out.push(None);
                    }
                    out.extend(return_idx.iter().map(|&c| ref_row[c].clone()));
                    if !is_missing(ref_row[return_idx[0]].as_deref()) {
                        matched_rows += 1;
                        row_matched = true;
                    }
                    table.push_row(out);
                    keys.push(key.clone());
                }
            }

            if row_matched {
                let labels = attribution.entry(key.clone()).or_default();
                if labels.last() != Some(&label) {
                    labels.push(label.clone());
                }
            }

            ch.progress(self.percent(r + 1, row_total));
        }

        let next = Accumulator { table, keys, attribution, has_block: true };
        let summary = SlotSummary { slot: self.slot, matched_rows, fanout_rows, error: None };
        Ok((next, summary))
    }

    /// Progress after `done` of `rows` rows of this slot, across all slots.
    fn percent(&self, done: usize, rows: usize) -> u8 {
        if rows == 0 || self.total == 0 {
            return 0;
        }
        let numer = 100 * (self.position * rows + done);
        let denom = self.total * rows;
        (numer / denom).min(100) as u8
    }
}
