// Table file I/O: CSV/TSV and workbook loading, report writing

pub mod csv;
pub mod error;
pub mod xlsx;

use std::collections::HashSet;
use std::path::Path;

use soarec_recon::{Cell, ReportDocument, Table};

pub use error::IoError;

/// File families the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Load a table, choosing the reader by extension. `sheet` only applies to
/// workbooks.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Delimited) => crate::csv::import_table(path),
        Some(TableFormat::Workbook) => xlsx::import_table(path, sheet),
        None => Err(IoError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Column headers of a table file.
pub fn headers(path: &Path, sheet: Option<&str>) -> Result<Vec<String>, IoError> {
    Ok(load_table(path, sheet)?.headers().to_vec())
}

/// Sheet names of a workbook, in workbook order. Delimited files have none.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Delimited) => Ok(Vec::new()),
        Some(TableFormat::Workbook) => xlsx::sheet_names(path),
        None => Err(IoError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Write a report: styled workbook for `.xlsx`, plain text for `.csv`/`.tsv`/`.txt`
/// (highlights dropped).
pub fn write_report(doc: &ReportDocument, path: &Path) -> Result<(), IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("xlsx") => xlsx::export_report(doc, path),
        Some("csv") | Some("tsv") | Some("txt") => crate::csv::export_table(&doc.table, path),
        _ => Err(IoError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Build a table from raw records; the first record names the columns.
///
/// Blank header cells become `Unnamed: {index}` and repeated names get a
/// `.{n}` suffix, so every column is addressable by name. Trailing fully
/// empty records are dropped.
pub(crate) fn table_from_records(mut records: Vec<Vec<Cell>>) -> Table {
    while records.last().is_some_and(|r| r.iter().all(Option::is_none)) {
        records.pop();
    }
    if records.is_empty() {
        return Table::default();
    }

    let header_row = records.remove(0);
    let width = records
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(header_row.len());

    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(width);
    for i in 0..width {
        let raw = header_row
            .get(i)
            .and_then(|c| c.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unnamed: {i}"));
        let mut name = raw.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{raw}.{n}");
            n += 1;
        }
        seen.insert(name.clone());
        headers.push(name);
    }

    Table::from_rows(headers, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(cells: &[&str]) -> Vec<Cell> {
        cells
            .iter()
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect()
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let table = table_from_records(vec![rec(&["Amount", "", "Amount", "Amount"]), rec(&["1", "2", "3", "4"])]);
        assert_eq!(table.headers(), &["Amount", "Unnamed: 1", "Amount.1", "Amount.2"]);
        assert_eq!(table.get(0, "Amount.2"), Some("4"));
    }

    #[test]
    fn test_rows_wider_than_header() {
        let table = table_from_records(vec![rec(&["a"]), rec(&["1", "2"]), rec(&["", ""])]);
        assert_eq!(table.headers(), &["a", "Unnamed: 1"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(table_from_records(Vec::new()), Table::default());
    }

    #[test]
    fn test_format_dispatch() {
        assert_eq!(TableFormat::from_path(Path::new("a.CSV")), Some(TableFormat::Delimited));
        assert_eq!(TableFormat::from_path(Path::new("a.xlsb")), Some(TableFormat::Workbook));
        assert_eq!(TableFormat::from_path(Path::new("a.pdf")), None);
        assert!(matches!(
            load_table(Path::new("notes.pdf"), None),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_write_report_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ReportDocument {
            table: Table::from_strs(&["Inv", "Match Source"], &[&["1", "Ref1"]]),
            highlights: Vec::new(),
        };

        let csv_path = dir.path().join("out.csv");
        write_report(&doc, &csv_path).unwrap();
        assert_eq!(load_table(&csv_path, None).unwrap(), doc.table);

        let xlsx_path = dir.path().join("out.xlsx");
        write_report(&doc, &xlsx_path).unwrap();
        assert_eq!(headers(&xlsx_path, None).unwrap(), vec!["Inv", "Match Source"]);
        assert_eq!(sheet_names(&xlsx_path).unwrap(), vec!["Sheet1"]);
        assert!(sheet_names(&csv_path).unwrap().is_empty());

        assert!(write_report(&doc, &dir.path().join("out.ods")).is_err());
    }
}
