//! CLI Exit Code Registry
//!
//! Single source of truth for `soarec` exit codes. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Domain    | Description                                        |
//! |------|-----------|----------------------------------------------------|
//! | 0    | Universal | Success                                            |
//! | 1    | Universal | General error (unspecified)                        |
//! | 2    | Universal | CLI usage error (bad args, bad date)               |
//! | 60   | run       | Run file invalid (parse, validation, bad columns)  |
//! | 61   | run       | Runtime error (cannot load a table, fatal column)  |
//! | 62   | run       | Report computed but could not be written           |
//! | 63   | run       | Mismatches found and `--fail-on-mismatch` was set  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use soarec_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (60-69)
// =============================================================================

/// Run file could not be parsed or failed validation, or names columns the
/// loaded tables do not have (`validate`).
pub const EXIT_RUN_INVALID_CONFIG: u8 = 60;

/// A table could not be loaded, or the engine hit a fatal statement error.
pub const EXIT_RUN_RUNTIME: u8 = 61;

/// The report could not be written. The summary is still printed.
pub const EXIT_RUN_OUTPUT: u8 = 62;

/// Amount mismatches were found and `--fail-on-mismatch` was given.
pub const EXIT_RUN_MISMATCH: u8 = 63;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::InvalidReturnColumns { .. } => EXIT_RUN_INVALID_CONFIG,
        ReconError::MissingColumn { .. } | ReconError::DateColumn { .. } => EXIT_RUN_RUNTIME,
    }
}
