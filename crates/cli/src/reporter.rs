//! Status and progress output for a run on the terminal.

use std::cell::Cell;

use soarec_recon::ProgressReporter;

/// Prints status lines to stderr and progress at every tenth percent.
pub struct StderrReporter {
    quiet: bool,
    last_decile: Cell<Option<u8>>,
}

impl StderrReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, last_decile: Cell::new(None) }
    }
}

impl ProgressReporter for StderrReporter {
    fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    fn progress(&self, percent: u8) {
        let decile = percent / 10;
        if self.last_decile.get() == Some(decile) {
            return;
        }
        self.last_decile.set(Some(decile));
        tracing::debug!(percent, "progress");
        if !self.quiet && percent > 0 && percent < 100 {
            eprintln!("  {percent:>3}%");
        }
    }
}
