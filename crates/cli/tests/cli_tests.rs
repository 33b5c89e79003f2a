// End-to-end tests for the `soarec` binary.
// Run with: cargo test -p soarec-cli --test cli_tests -- --nocapture
//
// Each test writes its own tables and run file into a temp dir.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn soarec(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_soarec"));
    cmd.current_dir(dir);
    cmd.arg("--log-dir").arg(dir.join("logs"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

const SOA: &str = "\
InvoiceNo,Amount,Date
0308607218,100.00,2024-06-16
'555,250.00,15/06/2024
777,80.00,2024-02-01
888,12.50,
";

const ERP: &str = "\
Invoice;Amount;Status
308607218;100.00;Open
555;249.00;Open
";

const BANK: &str = "\
Ref,Paid Amount
777,80.00
0555,250.00
";

const RUN: &str = r#"
name = "June close"
as_of = "2024-06-30"

[statement]
file = "soa.csv"
match_column = "InvoiceNo"
date_column = "Date"
amount_column = "Amount"

[ref1]
file = "erp.csv"
match_column = "Invoice"
return_columns = ["Amount", "Status"]

[ref4]
file = "bank.csv"
match_column = "Ref"
return_columns = ["Paid Amount"]

[output]
path = "out/report.csv"
"#;

/// Temp dir holding the three tables and `run.toml`.
fn workspace(run: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("soa.csv"), SOA).unwrap();
    fs::write(dir.path().join("erp.csv"), ERP).unwrap();
    fs::write(dir.path().join("bank.csv"), BANK).unwrap();
    fs::create_dir_all(dir.path().join("out")).unwrap();
    let config = dir.path().join("run.toml");
    fs::write(&config, run).unwrap();
    (dir, config)
}

// -------------------------------------------------------------------------
// run
// -------------------------------------------------------------------------

#[test]
fn run_writes_csv_report_and_json_summary() {
    let (dir, config) = workspace(RUN);
    let out = soarec(dir.path()).arg("run").arg(&config).arg("--json").output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(summary["name"], "June close");
    assert_eq!(summary["as_of"], "2024-06-30");
    assert_eq!(summary["rows"], 4);
    assert_eq!(summary["matched_keys"], 3);
    assert_eq!(summary["unmatched_keys"], 1);
    assert_eq!(summary["mismatch_count"], 1);
    assert_eq!(summary["slots"][0]["slot"], 1);
    assert_eq!(summary["slots"][0]["matched_rows"], 2);
    assert_eq!(summary["slots"][1]["slot"], 4);

    let report = soarec_io::load_table(&dir.path().join("out/report.csv"), None).unwrap();
    assert_eq!(report.headers()[0], "Age Bucket");
    assert_eq!(report.get(1, "Match Source"), Some("Ref1, Ref4"));
    assert_eq!(report.get(1, "Amount Difference"), Some("Ref1: +1.00, Ref4: 0.00"));
    assert_eq!(report.get(3, "Age Bucket"), Some("Unknown"));

    let err = stderr(&out);
    assert!(err.contains("Starting reconciliation..."), "stderr: {err}");
    assert!(err.contains("Reconciliation Complete"), "stderr: {err}");
}

#[test]
fn run_writes_styled_workbook() {
    let (dir, config) = workspace(RUN);
    let target = dir.path().join("june.xlsx");
    let out = soarec(dir.path())
        .arg("run")
        .arg(&config)
        .arg("--output")
        .arg(&target)
        .arg("--quiet")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).is_empty(), "quiet run printed: {}", stderr(&out));

    let report = soarec_io::load_table(&target, Some("Sheet1")).unwrap();
    assert_eq!(report.get(0, "InvoiceNo"), Some("0308607218"));
    assert_eq!(report.get(0, "Ref1_Status"), Some("Open"));
    assert!(report.column_index("Separator4").is_some());
}

#[test]
fn as_of_flag_changes_aging() {
    let (dir, config) = workspace(RUN);
    let out = soarec(dir.path())
        .args(["run", "--as-of", "2024-07-31", "--quiet"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report = soarec_io::load_table(&dir.path().join("out/report.csv"), None).unwrap();
    assert_eq!(report.get(0, "Age (Days)"), Some("45"));
    assert_eq!(report.get(0, "Age Bucket"), Some("31-60"));
}

#[test]
fn fail_on_mismatch_exit_code() {
    let (dir, config) = workspace(RUN);
    let out = soarec(dir.path())
        .args(["run", "--fail-on-mismatch"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(63));
    assert!(stderr(&out).contains("error: 1 amount mismatch(es) found"));
    // report is still written
    assert!(dir.path().join("out/report.csv").exists());
}

#[test]
fn invalid_run_file_exit_code() {
    let bad = RUN.replace(r#"return_columns = ["Paid Amount"]"#, r#"return_columns = ["Ref"]"#);
    let (dir, config) = workspace(&bad);
    let out = soarec(dir.path()).arg("run").arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(60));
    assert!(stderr(&out).contains("Ref4: invalid return columns"), "stderr: {}", stderr(&out));
}

#[test]
fn missing_table_exit_code() {
    let (dir, config) = workspace(RUN);
    fs::remove_file(dir.path().join("bank.csv")).unwrap();
    let out = soarec(dir.path()).arg("run").arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(61));
    assert!(stderr(&out).contains("bank.csv"));
}

#[test]
fn missing_date_column_exit_code() {
    let bad = RUN.replace(r#"date_column = "Date""#, r#"date_column = "Posted""#);
    let (dir, config) = workspace(&bad);
    let out = soarec(dir.path()).arg("run").arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(61));
    assert!(stderr(&out).contains("Age Bucket Error"), "stderr: {}", stderr(&out));
    assert!(!dir.path().join("out/report.csv").exists());
}

#[test]
fn broken_reference_slot_is_skipped() {
    let bad = RUN.replace(r#"match_column = "Ref""#, r#"match_column = "Reference""#);
    let (dir, config) = workspace(&bad);
    let out = soarec(dir.path()).args(["run", "--json"]).arg(&config).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert_eq!(
        err.matches("Error matching Ref4: missing column 'Reference'").count(),
        1,
        "stderr: {err}"
    );

    let summary: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert!(summary["slots"][1]["error"].is_string());

    // one record in the log file too
    let log: String = fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .map(|e| fs::read_to_string(e.unwrap().path()).unwrap())
        .collect();
    assert_eq!(log.matches("Error matching Ref4").count(), 1, "log: {log}");
}

#[test]
fn unwritable_output_exit_code() {
    let (dir, config) = workspace(RUN);
    let out = soarec(dir.path())
        .arg("run")
        .arg(&config)
        .arg("--output")
        .arg(dir.path().join("report.pdf"))
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(62));
    assert!(stderr(&out).contains("Error saving output:"));
    // summary still printed
    let summary: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert!(summary["output_error"].is_string());
}

#[test]
fn bad_as_of_is_usage_error() {
    let (dir, config) = workspace(RUN);
    let out = soarec(dir.path())
        .args(["run", "--as-of", "30/06/2024"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

// -------------------------------------------------------------------------
// validate / columns
// -------------------------------------------------------------------------

#[test]
fn validate_accepts_good_run_file() {
    let (dir, config) = workspace(RUN);
    let out = soarec(dir.path()).arg("validate").arg(&config).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("valid: 'June close' statement 4 rows, 2 reference slot(s)"));
}

#[test]
fn validate_reports_unknown_column() {
    let bad = RUN.replace(r#""Amount", "Status""#, r#""Amount", "State""#);
    let (dir, config) = workspace(&bad);
    let out = soarec(dir.path()).arg("validate").arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(60));
    let err = stderr(&out);
    assert!(err.contains("ref1: column 'State' not found in erp.csv"), "stderr: {err}");
    assert!(err.contains("hint:  available: Invoice, Amount, Status"), "stderr: {err}");
}

#[test]
fn columns_lists_headers() {
    let (dir, _) = workspace(RUN);
    let out = soarec(dir.path()).arg("columns").arg("erp.csv").output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "Invoice\nAmount\nStatus\n");
}

#[test]
fn columns_rejects_unknown_format() {
    let (dir, _) = workspace(RUN);
    fs::write(dir.path().join("notes.pdf"), "x").unwrap();
    let out = soarec(dir.path()).arg("columns").arg("notes.pdf").output().unwrap();
    assert_eq!(out.status.code(), Some(61));
    assert!(stderr(&out).contains("hint:  supported:"));
}

#[test]
fn columns_lists_workbook_sheets() {
    let (dir, config) = workspace(RUN);
    let report = dir.path().join("june.xlsx");
    let out = soarec(dir.path())
        .args(["run", "--quiet", "--output"])
        .arg(&report)
        .arg(&config)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let out = soarec(dir.path()).args(["columns", "--sheets", "june.xlsx"]).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "Sheet1\n");

    let out = soarec(dir.path()).args(["columns", "--sheets", "erp.csv"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("is not a workbook"));
}

#[test]
fn log_file_is_written() {
    let (dir, config) = workspace(RUN);
    let out = soarec(dir.path()).args(["run", "--quiet"]).arg(&config).output().unwrap();
    assert!(out.status.success());
    let logs: Vec<_> = fs::read_dir(dir.path().join("logs")).unwrap().collect();
    assert!(!logs.is_empty());
}
