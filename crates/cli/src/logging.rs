//! Tracing setup: human-readable stderr output plus a daily-rolling log file.

use std::path::Path;

use soarec_recon::DIAGNOSTICS_TARGET;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "soarec.log";

/// Stderr filter by `-v` count. Engine status and failures already reach
/// stderr through the run reporter, so the quiet level leaves them out and
/// diagnostics records never go to the console.
fn console_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn,soarec_recon=error",
        1 => "info",
        _ => "debug",
    };
    format!("{level},{DIAGNOSTICS_TARGET}=off")
}

/// `RUST_LOG` when set, else `fallback`.
fn filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber.
///
/// The file layer keeps info and above (run summaries, skipped reference
/// slots, output failures). The stderr layer is dropped when `quiet` is set.
/// The returned guard flushes the file writer on drop and must live until the
/// process exits.
pub fn init_logging(log_dir: &Path, verbosity: u8, quiet: bool) -> Option<WorkerGuard> {
    let console_layer = (!quiet).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(filter_or(&console_directive(verbosity)))
    });

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter_or(if verbosity > 1 { "debug" } else { "info" }));
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("warning: cannot create log dir {}: {e}", log_dir.display());
            (None, None)
        }
    };

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();
    if installed.is_err() {
        return None;
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_widens_console_filter() {
        assert!(console_directive(0).starts_with("warn,soarec_recon=error"));
        assert!(console_directive(1).starts_with("info,"));
        assert!(console_directive(5).starts_with("debug,"));
    }

    #[test]
    fn diagnostics_stay_off_the_console() {
        for verbosity in 0..3 {
            assert!(console_directive(verbosity).ends_with("soarec::diagnostics=off"));
            assert!(console_directive(verbosity).parse::<EnvFilter>().is_ok());
        }
    }
}
