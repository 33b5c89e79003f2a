//! `soarec run` / `soarec validate`: config-driven statement reconciliation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use soarec_recon::config::{resolve_path, ReferenceSection};
use soarec_recon::{
    DiagnosticSink, ProgressReporter, ReconOutcome, ReferenceConfig, RunConfig, SlotSummary,
    StatementConfig, Table, TracingSink,
};

use crate::exit_codes::{
    recon_exit_code, EXIT_ERROR, EXIT_RUN_INVALID_CONFIG, EXIT_RUN_MISMATCH, EXIT_RUN_OUTPUT,
    EXIT_RUN_RUNTIME, EXIT_USAGE,
};
use crate::reporter::StderrReporter;
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Options of `soarec run` beyond the config path.
pub struct RunArgs {
    pub output: Option<PathBuf>,
    pub as_of: Option<String>,
    pub json: bool,
    pub fail_on_mismatch: bool,
    pub quiet: bool,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn load_config(config_path: &Path) -> Result<RunConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        recon_err(EXIT_RUN_RUNTIME, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    RunConfig::from_toml(&config_str).map_err(|e| CliError {
        code: EXIT_RUN_INVALID_CONFIG,
        message: e.to_string(),
        hint: Some(format!("check {} against `soarec run --help`", config_path.display())),
    })
}

fn config_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn load(base_dir: &Path, file: &str, sheet: Option<&str>) -> Result<Table, CliError> {
    let path = resolve_path(base_dir, file);
    let table = soarec_io::load_table(&path, sheet).map_err(|e| CliError {
        code: EXIT_RUN_RUNTIME,
        message: e.to_string(),
        hint: Some(format!("list available columns with `soarec columns {}`", path.display())),
    })?;
    tracing::info!(
        file = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "table loaded"
    );
    Ok(table)
}

struct LoadedRun {
    statement: StatementConfig,
    slots: Vec<Option<ReferenceConfig>>,
}

fn load_tables(config: &RunConfig, base_dir: &Path) -> Result<LoadedRun, CliError> {
    let s = &config.statement;
    let table = load(base_dir, &s.file, s.sheet.as_deref())?;
    let statement = StatementConfig {
        table,
        match_column: s.match_column.clone(),
        date_column: s.date_column.clone(),
        amount_column: s.amount_column.clone(),
    };

    let mut slots = Vec::with_capacity(4);
    for (_, section) in config.slots() {
        let slot = match section {
            Some(ReferenceSection { file, sheet, match_column, return_columns }) => {
                let table = load(base_dir, file, sheet.as_deref())?;
                Some(ReferenceConfig::new(table, match_column.clone(), return_columns.iter().cloned()))
            }
            None => None,
        };
        slots.push(slot);
    }

    Ok(LoadedRun { statement, slots })
}

fn parse_as_of(flag: Option<&str>, config: &RunConfig) -> Result<NaiveDate, CliError> {
    match flag {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("invalid --as-of '{raw}': {e}"),
            hint: Some("use YYYY-MM-DD, e.g. --as-of 2024-06-30".into()),
        }),
        None => Ok(config.as_of.unwrap_or_else(|| chrono::Local::now().date_naive())),
    }
}

/// `soa_reco_YYYYmmdd_HHMMSS.xlsx` in the working directory.
fn default_output_name() -> PathBuf {
    PathBuf::from(format!("soa_reco_{}.xlsx", chrono::Local::now().format("%Y%m%d_%H%M%S")))
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonSummary<'a> {
    name: &'a str,
    as_of: NaiveDate,
    engine_version: &'a str,
    rows: usize,
    columns: usize,
    statement_rows: usize,
    matched_keys: usize,
    unmatched_keys: usize,
    slots: &'a [SlotSummary],
    compared_columns: &'a [String],
    mismatch_count: usize,
    age_buckets: &'a BTreeMap<String, usize>,
    output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_error: Option<String>,
}

pub fn cmd_run(config_path: PathBuf, args: RunArgs) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base_dir = config_dir(&config_path);
    let as_of = parse_as_of(args.as_of.as_deref(), &config)?;
    let loaded = load_tables(&config, base_dir)?;
    let options = config.run_options(as_of);

    let reporter = StderrReporter::new(args.quiet);
    let sink = TracingSink;

    let outcome = soarec_recon::run(&loaded.statement, &loaded.slots, &options, &reporter, &sink)
        .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    let output = args
        .output
        .or_else(|| config.output.path.as_deref().map(|p| resolve_path(base_dir, p)))
        .unwrap_or_else(default_output_name);

    let output_error = match soarec_io::write_report(&outcome.document, &output) {
        Ok(()) => {
            tracing::info!(path = %output.display(), "report written");
            None
        }
        Err(e) => {
            let message = format!("Error saving output: {e}");
            reporter.status(&message);
            sink.record(&message);
            Some(e.to_string())
        }
    };

    if args.json {
        let summary = JsonSummary {
            name: &outcome.meta.name,
            as_of: outcome.meta.as_of,
            engine_version: &outcome.meta.engine_version,
            rows: outcome.summary.output_rows,
            columns: outcome.summary.output_columns,
            statement_rows: outcome.summary.statement_rows,
            matched_keys: outcome.summary.matched_keys,
            unmatched_keys: outcome.summary.unmatched_keys,
            slots: &outcome.summary.slots,
            compared_columns: &outcome.summary.compared_columns,
            mismatch_count: outcome.summary.mismatch_count,
            age_buckets: &outcome.summary.age_buckets,
            output: output.display().to_string(),
            output_error: output_error.clone(),
        };
        let json_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| recon_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    if !args.quiet {
        print_summary(&outcome, &output, output_error.is_none());
    }

    if let Some(e) = output_error {
        return Err(CliError {
            code: EXIT_RUN_OUTPUT,
            message: format!("cannot write report: {e}"),
            hint: Some("use --output with a .xlsx or .csv path in a writable directory".into()),
        });
    }

    if args.fail_on_mismatch && outcome.summary.mismatch_count > 0 {
        return Err(recon_err(
            EXIT_RUN_MISMATCH,
            format!("{} amount mismatch(es) found", outcome.summary.mismatch_count),
        ));
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(outcome: &ReconOutcome, output: &Path, written: bool) {
    let s = &outcome.summary;
    let label = if outcome.meta.name.is_empty() { "reconciliation" } else { outcome.meta.name.as_str() };
    eprintln!(
        "{label}: {} rows ({} statement rows), {} keys matched, {} unmatched, {} amount mismatches",
        s.output_rows, s.statement_rows, s.matched_keys, s.unmatched_keys, s.mismatch_count,
    );
    for slot in &s.slots {
        match &slot.error {
            Some(err) => eprintln!("  Ref{}: skipped ({err})", slot.slot),
            None if slot.fanout_rows > 0 => eprintln!(
                "  Ref{}: {} rows matched, {} extra rows from duplicate keys",
                slot.slot, slot.matched_rows, slot.fanout_rows
            ),
            None => eprintln!("  Ref{}: {} rows matched", slot.slot, slot.matched_rows),
        }
    }
    if !s.age_buckets.is_empty() {
        let buckets: Vec<String> = s.age_buckets.iter().map(|(b, n)| format!("{b}: {n}")).collect();
        eprintln!("  aging (as of {}): {}", outcome.meta.as_of, buckets.join(", "));
    }
    if written {
        eprintln!("wrote {}", output.display());
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn require(table: &Table, owner: &str, column: &str, file: &str) -> Result<(), CliError> {
    if table.column_index(column).is_some() {
        return Ok(());
    }
    Err(CliError {
        code: EXIT_RUN_INVALID_CONFIG,
        message: format!("{owner}: column '{column}' not found in {file}"),
        hint: Some(format!("available: {}", table.headers().join(", "))),
    })
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base_dir = config_dir(&config_path);
    let loaded = load_tables(&config, base_dir)?;

    let s = &config.statement;
    let stmt = &loaded.statement.table;
    require(stmt, "statement", &s.match_column, &s.file)?;
    for column in [&s.date_column, &s.amount_column].into_iter().flatten() {
        require(stmt, "statement", column, &s.file)?;
    }

    let mut present = 0;
    for ((slot, section), loaded_slot) in config.slots().into_iter().zip(&loaded.slots) {
        let (Some(section), Some(reference)) = (section, loaded_slot) else {
            continue;
        };
        let owner = format!("ref{slot}");
        require(&reference.table, &owner, &section.match_column, &section.file)?;
        for column in &section.return_columns {
            require(&reference.table, &owner, column, &section.file)?;
        }
        present += 1;
    }

    let name = if config.name.is_empty() { "run" } else { config.name.as_str() };
    eprintln!(
        "valid: '{name}' statement {} rows, {present} reference slot(s)",
        stmt.row_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_of_bare_file_is_cwd() {
        assert_eq!(config_dir(Path::new("run.toml")), Path::new("."));
        assert_eq!(config_dir(Path::new("close/run.toml")), Path::new("close"));
    }

    #[test]
    fn as_of_flag_overrides_config() {
        let config = RunConfig::from_toml(
            "as_of = \"2024-06-30\"\n[statement]\nfile = \"a.csv\"\nmatch_column = \"k\"\n",
        )
        .unwrap();
        assert_eq!(
            parse_as_of(None, &config).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
        );
        assert_eq!(
            parse_as_of(Some("2024-07-01"), &config).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
        assert_eq!(parse_as_of(Some("01/07/2024"), &config).unwrap_err().code, EXIT_USAGE);
    }

    #[test]
    fn default_output_name_shape() {
        let name = default_output_name().display().to_string();
        assert!(name.starts_with("soa_reco_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(name.len(), "soa_reco_20240630_120000.xlsx".len());
    }
}
