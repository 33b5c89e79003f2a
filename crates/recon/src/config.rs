use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ReconError;
use crate::matcher::{validate_return_columns, MAX_SLOTS};
use crate::mismatch::{Keywords, DEFAULT_TOLERANCE};
use crate::model::RunOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A run file: which tables to load, which columns to use, where to write.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub name: String,
    /// Aging reference date. Hosts fall back to today when unset.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    pub statement: StatementSection,
    #[serde(default)]
    pub ref1: Option<ReferenceSection>,
    #[serde(default)]
    pub ref2: Option<ReferenceSection>,
    #[serde(default)]
    pub ref3: Option<ReferenceSection>,
    #[serde(default)]
    pub ref4: Option<ReferenceSection>,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub keywords: Keywords,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StatementSection {
    pub file: String,
    #[serde(default)]
    pub sheet: Option<String>,
    pub match_column: String,
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub amount_column: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceSection {
    pub file: String,
    #[serde(default)]
    pub sheet: Option<String>,
    pub match_column: String,
    pub return_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default = "default_amount_tolerance")]
    pub amount: f64,
}

fn default_amount_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self { amount: DEFAULT_TOLERANCE }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.statement.file.trim().is_empty() {
            return Err(ReconError::ConfigValidation("statement.file is empty".into()));
        }
        if self.statement.match_column.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "statement.match_column is empty".into(),
            ));
        }

        for (slot, section) in self.slots() {
            let Some(section) = section else { continue };
            if section.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("ref{slot}.file is empty")));
            }
            if section.match_column.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "ref{slot}.match_column is empty"
                )));
            }
            validate_return_columns(slot, &section.match_column, &section.return_columns)?;
        }

        if !self.tolerance.amount.is_finite() || self.tolerance.amount < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance.amount must be non-negative, got {}",
                self.tolerance.amount
            )));
        }

        if self.keywords.amount.iter().all(|k| k.trim().is_empty()) {
            return Err(ReconError::ConfigValidation("keywords.amount is empty".into()));
        }
        if self.keywords.date.iter().all(|k| k.trim().is_empty()) {
            return Err(ReconError::ConfigValidation("keywords.date is empty".into()));
        }

        Ok(())
    }

    /// `(slot, section)` for slots 1 through 4, present or not.
    pub fn slots(&self) -> [(usize, Option<&ReferenceSection>); MAX_SLOTS] {
        [
            (1, self.ref1.as_ref()),
            (2, self.ref2.as_ref()),
            (3, self.ref3.as_ref()),
            (4, self.ref4.as_ref()),
        ]
    }

    /// Run options for this file. `as_of` overrides the configured date.
    pub fn run_options(&self, as_of: NaiveDate) -> RunOptions {
        RunOptions {
            name: self.name.clone(),
            as_of,
            tolerance: self.tolerance.amount,
            keywords: self.keywords.clone(),
        }
    }
}

/// Resolve a path from a run file against the directory holding it.
pub fn resolve_path(config_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
