// soarec - statement-of-account reconciliation from the command line

mod exit_codes;
mod logging;
mod recon;
mod reporter;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_RUN_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "soarec")]
#[command(about = "Reconcile a statement of account against up to four reference tables")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Directory for the daily log file
    #[arg(long, global = true, default_value = "logs", env = "SOAREC_LOG_DIR")]
    log_dir: PathBuf,

    /// More log output on stderr (-v, -vv). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation from a TOML run file and write the report
    #[command(after_help = "\
Examples:
  soarec run close.toml
  soarec run close.toml --output june.xlsx --as-of 2024-06-30
  soarec run close.toml --json --quiet > summary.json
  soarec run close.toml --fail-on-mismatch

Run file:
  name = \"June close\"
  as_of = \"2024-06-30\"

  [statement]
  file = \"soa.xlsx\"
  match_column = \"InvoiceNo\"
  date_column = \"Date\"
  amount_column = \"Amount\"

  [ref1]
  file = \"erp.csv\"
  match_column = \"Invoice\"
  return_columns = [\"Amount\", \"Status\"]")]
    Run {
        /// Path to the run file
        config: PathBuf,

        /// Report path (.xlsx styled, .csv plain). Defaults to [output].path,
        /// then soa_reco_<timestamp>.xlsx
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Aging reference date (YYYY-MM-DD). Defaults to as_of, then today
        #[arg(long)]
        as_of: Option<String>,

        /// Print a JSON summary to stdout
        #[arg(long)]
        json: bool,

        /// Exit 63 when any amount mismatch is found
        #[arg(long)]
        fail_on_mismatch: bool,

        /// No status or summary on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Check a run file: parse it, load every table, confirm the named columns exist
    #[command(after_help = "\
Examples:
  soarec validate close.toml")]
    Validate {
        /// Path to the run file
        config: PathBuf,
    },

    /// List the column headers (or sheet names) of a table file
    #[command(after_help = "\
Examples:
  soarec columns erp.csv
  soarec columns soa.xlsx --sheet June
  soarec columns soa.xlsx --sheets")]
    Columns {
        /// CSV/TSV or workbook file
        file: PathBuf,

        /// Sheet name (workbooks only; defaults to the first sheet)
        #[arg(long, conflicts_with = "sheets")]
        sheet: Option<String>,

        /// List the workbook's sheet names instead of column headers
        #[arg(long)]
        sheets: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  soarec-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Commands::Run { quiet: true, .. });
    let _guard = logging::init_logging(&cli.log_dir, cli.verbose, quiet);

    let result = match cli.command {
        Commands::Run { config, output, as_of, json, fail_on_mismatch, quiet } => recon::cmd_run(
            config,
            recon::RunArgs { output, as_of, json, fail_on_mismatch, quiet },
        ),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Columns { file, sheet, sheets } => cmd_columns(file, sheet, sheets),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn io_err(e: soarec_io::IoError) -> CliError {
    let hint = match &e {
        soarec_io::IoError::UnsupportedFormat(_) => {
            Some("supported: .csv .tsv .txt .xlsx .xlsm .xls .xlsb .ods".to_string())
        }
        _ => None,
    };
    CliError { code: EXIT_RUN_RUNTIME, message: e.to_string(), hint }
}

fn cmd_columns(file: PathBuf, sheet: Option<String>, sheets: bool) -> Result<(), CliError> {
    let names = if sheets {
        let names = soarec_io::sheet_names(&file).map_err(io_err)?;
        if names.is_empty() {
            return Err(CliError {
                code: EXIT_USAGE,
                message: format!("{} is not a workbook", file.display()),
                hint: Some("--sheets applies to .xlsx .xlsm .xls .xlsb .ods files".into()),
            });
        }
        names
    } else {
        soarec_io::headers(&file, sheet.as_deref()).map_err(io_err)?
    };

    for name in names {
        println!("{name}");
    }
    Ok(())
}
