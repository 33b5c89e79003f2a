use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty return columns, bad tolerance, etc.).
    ConfigValidation(String),
    /// A configured column is not present in the table it names.
    MissingColumn { table: String, column: String },
    /// The designated statement date column cannot be aged.
    DateColumn { column: String, reason: String },
    /// A reference slot's return column set is unusable.
    InvalidReturnColumns { slot: usize, reason: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "{table}: missing column '{column}'")
            }
            Self::DateColumn { column, reason } => {
                write!(f, "date column '{column}': {reason}")
            }
            Self::InvalidReturnColumns { slot, reason } => {
                write!(f, "Ref{slot}: invalid return columns: {reason}")
            }
        }
    }
}

impl std::error::Error for ReconError {}
