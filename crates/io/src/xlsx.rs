// Workbook import (xlsx, xlsm, xls, xlsb, ods) and report export (xlsx only)
//
// Import reads one sheet as text cells. Export writes the finished report with
// a styled header row and highlighted mismatch cells.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook as XlsxWorkbook};
use soarec_recon::{Cell, ReportDocument, Table};

use crate::error::IoError;
use crate::table_from_records;

/// Sheet name of the exported report.
pub const REPORT_SHEET: &str = "Sheet1";

/// Load one sheet; the first non-blank row is the header row. `sheet` defaults to the
/// first sheet in the workbook.
pub fn import_table(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| IoError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IoError::parse(path, "workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::parse(path, format!("sheet '{name}': {e}")))?;

    // Ranges start at the first used cell. Pad columns so they line up with
    // the sheet; leading blank rows are skipped so the first non-blank row is
    // the header.
    let start_col = range.start().map_or(0, |(_, c)| c as usize);
    let mut records: Vec<Vec<Cell>> = Vec::with_capacity(range.height());
    for row in range.rows() {
        let mut record: Vec<Cell> = vec![None; start_col];
        record.extend(row.iter().map(cell_text));
        if records.is_empty() && record.iter().all(Option::is_none) {
            continue;
        }
        records.push(record);
    }

    tracing::debug!(path = %path.display(), sheet = %name, rows = records.len(), "workbook sheet loaded");
    Ok(table_from_records(records))
}

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    let workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;
    Ok(workbook.sheet_names().to_vec())
}

fn cell_text(cell: &Data) -> Cell {
    match cell {
        Data::Empty => None,
        Data::String(s) => (!s.is_empty()).then(|| s.clone()),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{n}"))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{e:?}")),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            Some(
                excel_serial_to_datetime(serial)
                    .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| format!("{serial}")),
            )
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// 1900 date system serial → timestamp, rounded to the second.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // 9999-12-31 is the last day Excel can represent
    if !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(chrono::Duration::seconds(seconds))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(Color::RGB(0x404040))
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_border(FormatBorder::Thin)
}

fn mismatch_format() -> Format {
    Format::new()
        .set_background_color(Color::RGB(0xFFC7CE))
        .set_font_color(Color::RGB(0x9C0006))
}

/// Write the report as a single styled sheet. Every cell is written as text;
/// missing cells stay blank unless highlighted.
pub fn export_report(doc: &ReportDocument, path: &Path) -> Result<(), IoError> {
    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(REPORT_SHEET)
        .map_err(|e| IoError::write(path, e))?;

    let header = header_format();
    let mismatch = mismatch_format();

    for (col, name) in doc.table.headers().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header)
            .map_err(|e| IoError::write(path, e))?;
    }

    for (r, row) in doc.table.rows().iter().enumerate() {
        let row32 = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let col16 = c as u16;
            let highlighted = doc.is_highlighted(r, c);
            match (cell.as_deref(), highlighted) {
                (Some(text), false) if !text.is_empty() => {
                    worksheet.write_string(row32, col16, text).map_err(|e| IoError::write(path, e))?;
                }
                (Some(text), true) => {
                    worksheet
                        .write_string_with_format(row32, col16, text, &mismatch)
                        .map_err(|e| IoError::write(path, e))?;
                }
                (None, true) => {
                    worksheet
                        .write_blank(row32, col16, &mismatch)
                        .map_err(|e| IoError::write(path, e))?;
                }
                _ => {}
            }
        }
    }

    xlsx_workbook.save(path).map_err(|e| IoError::write(path, e))?;
    Ok(())
}
