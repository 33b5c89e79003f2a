//! `soarec-recon`: statement-of-account reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns the merged,
//! annotated report. No CLI or IO dependencies.

pub mod aging;
pub mod amount;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod mismatch;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod table;

pub use config::RunConfig;
pub use engine::run;
pub use error::ReconError;
pub use matcher::{reconcile, MatchOutput, ReferenceConfig, SlotSummary};
pub use mismatch::{annotate, Annotation, Keywords};
pub use model::{ReconOutcome, RunOptions, RunSummary, StatementConfig};
pub use progress::{
    DiagnosticSink, MemoryReporter, NullReporter, ProgressReporter, TracingSink,
    DIAGNOSTICS_TARGET,
};
pub use report::{finalize, CellRef, ReportDocument};
pub use table::{Cell, Table};
