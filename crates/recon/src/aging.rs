use chrono::{DateTime, Datelike, NaiveDate};

use crate::error::ReconError;
use crate::table::{Table, AGE_BUCKET_COLUMN, AGE_DAYS_COLUMN};

/// Bucket label for rows whose date could not be parsed.
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// Inclusive upper bound (days) → label, evaluated in order.
const BUCKETS: &[(i64, &str)] = &[
    (15, "0-15"),
    (30, "16-30"),
    (60, "31-60"),
    (90, "61-90"),
    (120, "91-120"),
];
const OLDEST_BUCKET: &str = "121+";

// Day-first before month-first: "01/02/2024" is 1 February.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%d-%B-%Y",
    "%d %b, %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%m/%d/%y",
    "%d-%b-%y",
    "%d %b %y",
];

/// Parse a date cell permissively, preferring day-first readings.
///
/// A trailing time of day (`2024-01-01 00:00:00`, `2024-01-01T10:00:00Z`) is
/// ignored. Returns `None` for anything unrecognized.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let date_part = strip_time_of_day(s);
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(date_part, fmt)
            .ok()
            // %Y happily reads "24" as year 24; leave two-digit years to %y.
            .filter(|d| d.year() >= 1000)
    })
}

fn strip_time_of_day(s: &str) -> &str {
    let Some(colon) = s.find(':') else {
        return s;
    };
    match s[..colon].rfind([' ', 'T']) {
        Some(cut) => s[..cut].trim_end(),
        None => s,
    }
}

/// Bucket label for an age in days; `None` is [`UNKNOWN_BUCKET`].
pub fn bucket_for(days: Option<i64>) -> &'static str {
    let Some(days) = days else {
        return UNKNOWN_BUCKET;
    };
    BUCKETS
        .iter()
        .find(|(upper, _)| days <= *upper)
        .map(|(_, label)| *label)
        .unwrap_or(OLDEST_BUCKET)
}

/// Derived aging columns, one entry per statement row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeColumns {
    pub days: Vec<Option<i64>>,
    pub buckets: Vec<&'static str>,
}

/// Age every row of `date_column` relative to `as_of`.
///
/// Unparseable cells yield a missing age and the `Unknown` bucket. A column
/// that is not in the table is a structural error and aborts the run.
pub fn compute_ages(
    table: &Table,
    date_column: &str,
    as_of: NaiveDate,
) -> Result<AgeColumns, ReconError> {
    let col = table.column_index(date_column).ok_or_else(|| ReconError::DateColumn {
        column: date_column.into(),
        reason: "not present in statement".into(),
    })?;

    let days: Vec<Option<i64>> = table
        .column_values(col)
        .map(|v| v.and_then(parse_date).map(|d| (as_of - d).num_days()))
        .collect();
    let buckets = days.iter().map(|d| bucket_for(*d)).collect();

    Ok(AgeColumns { days, buckets })
}

impl AgeColumns {
    /// Insert `Age Bucket` as the first column and append `Age (Days)`.
    /// The source date column is left untouched.
    pub fn apply(self, table: &mut Table) {
        let days = self.days.into_iter().map(|d| d.map(|d| d.to_string())).collect();
        let buckets = self.buckets.into_iter().map(|b| Some(b.to_string())).collect();
        let days_name = table.unique_name(AGE_DAYS_COLUMN);
        table.push_column(days_name, days);
        let bucket_name = table.unique_name(AGE_BUCKET_COLUMN);
        table.insert_column(0, bucket_name, buckets);
    }
}
