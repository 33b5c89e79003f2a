//! Status, progress and diagnostic channels of a reconciliation run.
//!
//! Hosts implement [`ProgressReporter`] to show human-readable status lines
//! and a percentage, and [`DiagnosticSink`] to persist recoverable failures.
//! Both are fire-and-forget: the engine never waits on them.

use std::cell::Cell;
use std::sync::Mutex;

pub trait ProgressReporter {
    /// One human-readable status line.
    fn status(&self, message: &str);
    /// Percentage complete, `0..=100`, non-decreasing within a run.
    fn progress(&self, percent: u8);
}

/// Durable sink for recoverable failures.
pub trait DiagnosticSink {
    fn record(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn status(&self, _message: &str) {}
    fn progress(&self, _percent: u8) {}
}

impl DiagnosticSink for NullReporter {
    fn record(&self, _message: &str) {}
}

/// `tracing` target of [`TracingSink`] records. Hosts that already print
/// status lines can filter it out of their console layer.
pub const DIAGNOSTICS_TARGET: &str = "soarec::diagnostics";

/// Forwards diagnostics to `tracing` so whatever subscriber the host
/// installed (file appender, journald, ...) keeps them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, message: &str) {
        tracing::warn!(target: DIAGNOSTICS_TARGET, "{message}");
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    statuses: Mutex<Vec<String>>,
    percents: Mutex<Vec<u8>>,
    diagnostics: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        lock(&self.statuses).clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        lock(&self.percents).clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        lock(&self.diagnostics).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProgressReporter for MemoryReporter {
    fn status(&self, message: &str) {
        lock(&self.statuses).push(message.to_string());
    }

    fn progress(&self, percent: u8) {
        lock(&self.percents).push(percent);
    }
}

impl DiagnosticSink for MemoryReporter {
    fn record(&self, message: &str) {
        lock(&self.diagnostics).push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Run-scoped channel bundle
// ---------------------------------------------------------------------------

/// The reporter + sink pair for one run. Clamps progress so the host only
/// ever sees non-decreasing percentages, each value at most once.
pub(crate) struct Channels<'a> {
    reporter: &'a dyn ProgressReporter,
    sink: &'a dyn DiagnosticSink,
    last_percent: Cell<Option<u8>>,
}

impl<'a> Channels<'a> {
    pub(crate) fn new(reporter: &'a dyn ProgressReporter, sink: &'a dyn DiagnosticSink) -> Self {
        Self { reporter, sink, last_percent: Cell::new(None) }
    }

    pub(crate) fn status(&self, message: &str) {
        tracing::info!("{message}");
        self.reporter.status(message);
    }

    /// Recoverable failure: goes to the durable sink and the status line.
    /// The sink is the only persistent record of it.
    pub(crate) fn failure(&self, message: &str) {
        self.sink.record(message);
        self.reporter.status(message);
    }

    pub(crate) fn progress(&self, percent: u8) {
        let percent = percent.min(100);
        if self.last_percent.get().map_or(true, |last| percent > last) {
            self.last_percent.set(Some(percent));
            self.reporter.progress(percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_monotonic_and_deduplicated() {
        let mem = MemoryReporter::new();
        let ch = Channels::new(&mem, &mem);
        for p in [0, 10, 10, 5, 40, 120] {
            ch.progress(p);
        }
        assert_eq!(mem.percents(), vec![0, 10, 40, 100]);
    }

    #[test]
    fn failures_reach_both_channels() {
        let mem = MemoryReporter::new();
        let ch = Channels::new(&mem, &mem);
        ch.status("Starting");
        ch.failure("Error matching Ref2: boom");
        assert_eq!(mem.statuses(), vec!["Starting", "Error matching Ref2: boom"]);
        assert_eq!(mem.diagnostics(), vec!["Error matching Ref2: boom"]);
    }
}
