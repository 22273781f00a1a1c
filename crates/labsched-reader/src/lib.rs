//! # labsched-reader
//!
//! Loading of occupancy reports.
//!
//! This crate provides:
//! - Workbook loading (`.xlsx`, `.xlsm`, `.xls`, `.ods`) through `calamine`
//! - An in-memory [`Table`] that any tabular source can be turned into
//! - Required-column validation and conversion to `OccupancyRecord`s
//!
//! ## Example
//!
//! ```rust,ignore
//! use labsched_reader::read_occupancy;
//!
//! let records = read_occupancy(Path::new("reporte_ocupacion.xlsx"), None)?;
//! println!("{} rows", records.len());
//! ```

pub mod table;

pub use table::{Column, Table};

use calamine::{open_workbook_auto, Data, Reader};
use labsched_core::OccupancyRecord;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Input loading error
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumn(Vec<String>),

    #[error("Input file not found: {0}")]
    NotFound(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    #[error("Worksheet {0:?} has no header row")]
    EmptySheet(String),
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Office Open XML workbook (.xlsx, .xlsm)
    Xlsx,
    /// Legacy Excel workbook (.xls)
    Xls,
    /// OpenDocument spreadsheet (.ods)
    Ods,
}

/// Detect input format from the file extension
pub fn detect_format(path: &Path) -> Option<FileFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" => Some(FileFormat::Xlsx),
        "xls" => Some(FileFormat::Xls),
        "ods" => Some(FileFormat::Ods),
        _ => None,
    }
}

/// Read one worksheet into a [`Table`].
///
/// Uses the first worksheet unless `sheet` names another one. The first
/// non-empty row of the used range is the header.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table, ReadError> {
    if !path.exists() {
        return Err(ReadError::NotFound(path.display().to_string()));
    }
    if detect_format(path).is_none() {
        return Err(ReadError::UnsupportedFormat(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(ReadError::SheetNotFound(name.to_string()));
            }
            name.to_string()
        }
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ReadError::SheetNotFound("(workbook has no sheets)".into()))?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let start_row = range.start().map_or(0, |(row, _)| row as usize);

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows
        .next()
        .filter(|h| h.iter().any(|cell| !cell.trim().is_empty()))
        .ok_or_else(|| ReadError::EmptySheet(sheet_name.clone()))?;

    let table = Table {
        headers,
        rows: rows.collect(),
        first_row: start_row + 2,
    };
    debug!(
        sheet = %sheet_name,
        rows = table.rows.len(),
        "loaded occupancy worksheet"
    );
    Ok(table)
}

/// Read a workbook and convert it to occupancy records in one step
pub fn read_occupancy(path: &Path, sheet: Option<&str>) -> Result<Vec<OccupancyRecord>, ReadError> {
    read_workbook(path, sheet)?.records()
}

/// Text of a cell as a report reader would see it.
///
/// Whole numbers stored as floats print without a fraction so an
/// enrollment of `20` reads as `"20"`, not `"20.0"`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(detect_format(Path::new("reporte.xlsx")), Some(FileFormat::Xlsx));
        assert_eq!(detect_format(Path::new("REPORTE.XLSX")), Some(FileFormat::Xlsx));
        assert_eq!(detect_format(Path::new("reporte.xls")), Some(FileFormat::Xls));
        assert_eq!(detect_format(Path::new("reporte.ods")), Some(FileFormat::Ods));
        assert_eq!(detect_format(Path::new("reporte.csv")), None);
        assert_eq!(detect_format(Path::new("reporte")), None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_workbook(Path::new("/nonexistent/reporte.xlsx"), None).unwrap_err();
        assert!(matches!(err, ReadError::NotFound(_)));
    }

    #[test]
    fn whole_numbers_read_without_fraction() {
        assert_eq!(cell_text(&Data::Float(20.0)), "20");
        assert_eq!(cell_text(&Data::Float(20.5)), "20.5");
        assert_eq!(cell_text(&Data::Int(-3)), "-3");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("Martes".into())), "Martes");
    }

    #[test]
    fn missing_columns_are_listed_in_the_message() {
        let err = ReadError::MissingColumn(vec!["Hora".into(), "Día".into()]);
        assert_eq!(err.to_string(), "Missing required column(s): Hora, Día");
    }
}
