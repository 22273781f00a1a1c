//! Excel schedule renderer
//!
//! Generates one XLSX worksheet per laboratory, laid out as a weekly grid:
//! - Title row with the lab name
//! - `Hora` column with one row per hourly slot, one column per day
//! - Sessions spanning several slots drawn as one merged cell
//! - Double bookings drawn in red with every contending booking listed
//!
//! ## Optional Sheets
//!
//! - **Resumen**: sessions, occupied hours and conflicts per lab
//! - **Avisos**: every diagnostic raised while building the timetable
//!
//! ## Failure Isolation
//!
//! Each lab's worksheet is built on its own before it is added to the
//! workbook. A lab whose sheet cannot be written is skipped and reported
//! as a [`LabFailure`]; the remaining labs are still written.

use std::collections::HashSet;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use labsched_core::{Diagnostic, DiagnosticCode, RenderError, Renderer, Severity, Timetable};

use crate::plan::{plan_timetable, CellStyle, SheetPlan, Band, FIRST_SLOT_ROW, TITLE_ROW};

/// Maximum sheet name length accepted by Excel
pub const MAX_SHEET_NAME: usize = 31;

/// Characters Excel rejects in sheet names
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

pub const SUMMARY_SHEET: &str = "Resumen";
pub const DIAGNOSTICS_SHEET: &str = "Avisos";

/// Note written on the summary sheet when no lab has bookings
pub const NO_DATA_NOTE: &str = "Sin datos para los laboratorios configurados";

fn xlsx_error(e: XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}

// ============================================================================
// Palette
// ============================================================================

/// Fill colors, as `0xRRGGBB`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Monday, Wednesday and Friday columns
    pub even: u32,
    /// Tuesday, Thursday and Saturday columns
    pub odd: u32,
    /// Sessions of two or more hours on even days
    pub even_long: u32,
    /// Sessions of two or more hours on odd days
    pub odd_long: u32,
    pub conflict: u32,
    pub header: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            even: 0xE8F5E8,      // Light green
            odd: 0xE8F0FF,       // Light blue
            even_long: 0xC8E6C9, // Darker green
            odd_long: 0xC5D5F5,  // Darker blue
            conflict: 0xFFC7CE,  // Light red
            header: 0x4472C4,
        }
    }
}

/// Reusable cell formats for one workbook
struct SheetFormats {
    title: Format,
    header: Format,
    slot_label: Format,
    blank_even: Format,
    blank_odd: Format,
    session_even: Format,
    session_odd: Format,
    long_even: Format,
    long_odd: Format,
    conflict: Format,
    legend: Format,
    text: Format,
    number: Format,
}

impl SheetFormats {
    fn new(palette: &Palette) -> Self {
        let grid = || {
            Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::VerticalCenter)
        };
        let session = |color: u32| {
            grid()
                .set_text_wrap()
                .set_align(FormatAlign::Center)
                .set_background_color(color)
        };

        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin),
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(palette.header)
                .set_font_color(0xFFFFFF)
                .set_border(FormatBorder::Thin),
            slot_label: grid().set_bold().set_align(FormatAlign::Center),
            blank_even: grid().set_background_color(palette.even),
            blank_odd: grid().set_background_color(palette.odd),
            session_even: session(palette.even),
            session_odd: session(palette.odd),
            long_even: session(palette.even_long).set_bold(),
            long_odd: session(palette.odd_long).set_bold(),
            conflict: session(palette.conflict).set_bold().set_font_color(0x9C0006),
            legend: Format::new().set_italic().set_align(FormatAlign::Left),
            text: Format::new().set_border(FormatBorder::Thin).set_text_wrap(),
            number: Format::new()
                .set_num_format("#,##0")
                .set_border(FormatBorder::Thin),
        }
    }

    fn for_style(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Title => &self.title,
            CellStyle::Header => &self.header,
            CellStyle::SlotLabel => &self.slot_label,
            CellStyle::Blank(Band::Even) => &self.blank_even,
            CellStyle::Blank(Band::Odd) => &self.blank_odd,
            CellStyle::Session { band: Band::Even, long: false } => &self.session_even,
            CellStyle::Session { band: Band::Odd, long: false } => &self.session_odd,
            CellStyle::Session { band: Band::Even, long: true } => &self.long_even,
            CellStyle::Session { band: Band::Odd, long: true } => &self.long_odd,
            CellStyle::Conflict => &self.conflict,
            CellStyle::Legend => &self.legend,
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// A lab whose worksheet could not be written
#[derive(Debug)]
pub struct LabFailure {
    pub lab: String,
    pub error: RenderError,
}

impl LabFailure {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::W006LabRenderFailed,
            format!("sheet for {} skipped: {}", self.lab, self.error),
        )
        .with_lab(self.lab.clone())
    }
}

/// Rendered workbook plus the labs that were left out of it
#[derive(Debug)]
pub struct SheetReport {
    pub bytes: Vec<u8>,
    /// Worksheet names written for labs, in lab order
    pub sheets: Vec<String>,
    pub failures: Vec<LabFailure>,
}

// ============================================================================
// Renderer
// ============================================================================

/// Weekly lab schedule renderer
#[derive(Clone, Debug)]
pub struct SheetRenderer {
    /// Whether to include the Resumen sheet
    pub include_summary: bool,
    /// Whether to include the Avisos sheet
    pub include_diagnostics: bool,
    pub palette: Palette,
    diagnostics: Vec<Diagnostic>,
}

impl Default for SheetRenderer {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_diagnostics: false,
            palette: Palette::default(),
            diagnostics: Vec::new(),
        }
    }
}

impl SheetRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the Resumen sheet
    pub fn no_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    /// Include an Avisos sheet listing these diagnostics
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.include_diagnostics = true;
        self.diagnostics = diagnostics;
        self
    }

    /// Render every lab, skipping the ones whose sheet fails
    pub fn render_report(&self, timetable: &Timetable) -> Result<SheetReport, RenderError> {
        let mut workbook = Workbook::new();
        let formats = SheetFormats::new(&self.palette);

        let mut used: HashSet<String> = HashSet::new();
        used.insert(SUMMARY_SHEET.to_lowercase());
        used.insert(DIAGNOSTICS_SHEET.to_lowercase());

        let mut sheets = Vec::new();
        let mut failures = Vec::new();

        for (lab, plan) in plan_timetable(timetable) {
            let name = sheet_name(&lab, &used);
            match plan.and_then(|plan| self.build_lab_sheet(&plan, &name, &formats)) {
                Ok(sheet) => {
                    workbook.push_worksheet(sheet);
                    used.insert(name.to_lowercase());
                    sheets.push(name);
                }
                Err(error) => {
                    warn!(lab = %lab, error = %error, "skipping lab sheet");
                    failures.push(LabFailure { lab, error });
                }
            }
        }

        if self.include_summary || timetable.is_empty() {
            self.add_summary_sheet(&mut workbook, timetable, &sheets, &failures, &formats)?;
        }

        if self.include_diagnostics {
            let mut diagnostics = self.diagnostics.clone();
            diagnostics.extend(failures.iter().map(LabFailure::to_diagnostic));
            self.add_diagnostics_sheet(&mut workbook, &diagnostics, &formats)?;
        }

        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;

        debug!(
            sheets = sheets.len(),
            failures = failures.len(),
            bytes = bytes.len(),
            "rendered schedule workbook"
        );

        Ok(SheetReport {
            bytes,
            sheets,
            failures,
        })
    }

    fn build_lab_sheet(
        &self,
        plan: &SheetPlan,
        name: &str,
        formats: &SheetFormats,
    ) -> Result<Worksheet, RenderError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(name).map_err(xlsx_error)?;

        for cell in &plan.cells {
            let format = formats.for_style(cell.style);
            if cell.is_merged() {
                sheet
                    .merge_range(
                        cell.first_row,
                        cell.first_col,
                        cell.last_row,
                        cell.last_col,
                        &cell.text,
                        format,
                    )
                    .map_err(xlsx_error)?;
            } else if cell.text.is_empty() {
                sheet
                    .write_blank(cell.first_row, cell.first_col, format)
                    .map_err(xlsx_error)?;
            } else {
                sheet
                    .write_string_with_format(cell.first_row, cell.first_col, &cell.text, format)
                    .map_err(xlsx_error)?;
            }
        }

        for (col, width) in plan.column_widths.iter().enumerate() {
            sheet.set_column_width(col as u16, *width).map_err(xlsx_error)?;
        }
        for (row, height) in &plan.row_heights {
            sheet.set_row_height(*row, *height).map_err(xlsx_error)?;
        }
        sheet.set_row_height(TITLE_ROW, 24).map_err(xlsx_error)?;

        sheet.set_freeze_panes(FIRST_SLOT_ROW, 1).map_err(xlsx_error)?;
        sheet.set_landscape();
        sheet.set_print_fit_to_pages(1, 1);

        Ok(sheet)
    }

    fn add_summary_sheet(
        &self,
        workbook: &mut Workbook,
        timetable: &Timetable,
        sheets: &[String],
        failures: &[LabFailure],
        formats: &SheetFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(SUMMARY_SHEET)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let headers = ["Laboratorio", "Hoja", "Sesiones", "Horas ocupadas", "Conflictos"];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        sheet.set_column_width(0, 30).ok(); // Laboratorio
        sheet.set_column_width(1, 30).ok(); // Hoja
        sheet.set_column_width(2, 12).ok(); // Sesiones
        sheet.set_column_width(3, 16).ok(); // Horas ocupadas
        sheet.set_column_width(4, 12).ok(); // Conflictos

        if timetable.is_empty() {
            sheet
                .write_with_format(1, 0, NO_DATA_NOTE, &formats.legend)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            return Ok(());
        }

        let mut written = sheets.iter();
        let mut totals = (0usize, 0usize, 0usize);

        for (i, (lab, grid)) in timetable.grids.iter().enumerate() {
            let row = (i + 1) as u32;
            let sessions = grid.records().len();
            let hours = grid.occupied_slots();
            let conflicts = timetable.conflicts_for(lab).count();
            totals = (totals.0 + sessions, totals.1 + hours, totals.2 + conflicts);

            // Failed labs get no sheet; sheet names follow lab order otherwise
            let sheet_cell = if failures.iter().any(|f| &f.lab == lab) {
                "(omitida)".to_string()
            } else {
                written.next().cloned().unwrap_or_default()
            };

            sheet
                .write_with_format(row, 0, lab.as_str(), &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 1, sheet_cell.as_str(), &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_number_with_format(row, 2, sessions as f64, &formats.number)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_number_with_format(row, 3, hours as f64, &formats.number)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            let conflict_format = if conflicts > 0 {
                &formats.conflict
            } else {
                &formats.number
            };
            sheet
                .write_number_with_format(row, 4, conflicts as f64, conflict_format)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        let total_row = (timetable.grids.len() + 1) as u32;
        sheet
            .write_with_format(total_row, 0, "TOTAL", &formats.header)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        for (col, value) in [(2u16, totals.0), (3, totals.1), (4, totals.2)] {
            sheet
                .write_number_with_format(total_row, col, value as f64, &formats.number)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        Ok(())
    }

    fn add_diagnostics_sheet(
        &self,
        workbook: &mut Workbook,
        diagnostics: &[Diagnostic],
        formats: &SheetFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(DIAGNOSTICS_SHEET)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let headers = ["Código", "Severidad", "Fila", "Laboratorio", "Mensaje"];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        sheet.set_column_width(0, 8).ok(); // Código
        sheet.set_column_width(1, 10).ok(); // Severidad
        sheet.set_column_width(2, 6).ok(); // Fila
        sheet.set_column_width(3, 24).ok(); // Laboratorio
        sheet.set_column_width(4, 80).ok(); // Mensaje

        // Errors first, input order within a severity
        let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
        sorted.sort_by_key(|d| d.severity);

        for (i, diag) in sorted.iter().enumerate() {
            let row = (i + 1) as u32;

            let severity_format = match diag.severity {
                Severity::Error => Format::new()
                    .set_background_color(0xFFCCCC)
                    .set_border(FormatBorder::Thin),
                Severity::Warning => Format::new()
                    .set_background_color(0xFFFFCC)
                    .set_border(FormatBorder::Thin),
                Severity::Info => Format::new()
                    .set_background_color(0xCCCCFF)
                    .set_border(FormatBorder::Thin),
            };

            let mut message = diag.message.clone();
            for note in &diag.notes {
                message.push('\n');
                message.push_str(note);
            }

            sheet
                .write_with_format(row, 0, diag.code.as_str(), &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 1, diag.severity.as_str(), &severity_format)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            match diag.row {
                Some(source_row) => sheet
                    .write_number_with_format(row, 2, source_row as f64, &formats.number)
                    .map_err(|e| RenderError::Format(e.to_string()))?,
                None => sheet
                    .write_blank(row, 2, &formats.text)
                    .map_err(|e| RenderError::Format(e.to_string()))?,
            };
            sheet
                .write_with_format(row, 3, diag.lab.as_deref().unwrap_or(""), &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 4, message.as_str(), &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        Ok(())
    }
}

impl Renderer for SheetRenderer {
    type Output = Vec<u8>;

    fn render(&self, timetable: &Timetable) -> Result<Vec<u8>, RenderError> {
        Ok(self.render_report(timetable)?.bytes)
    }
}

// ============================================================================
// Sheet names
// ============================================================================

/// Excel-safe, unique worksheet name for a lab.
///
/// Forbidden characters become `_`, names are cut to 31 characters, and a
/// ` (n)` suffix is added when the name (case-insensitively) is in `used`.
pub fn sheet_name(lab: &str, used: &HashSet<String>) -> String {
    let cleaned: String = lab
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let base = if cleaned.is_empty() { "Laboratorio" } else { cleaned };

    let candidate = truncate(base, MAX_SHEET_NAME);
    if !used.contains(&candidate.to_lowercase()) {
        return candidate;
    }

    let mut n = 2;
    loop {
        let suffix = format!(" ({n})");
        let candidate = format!(
            "{}{}",
            truncate(base, MAX_SHEET_NAME - suffix.chars().count()),
            suffix
        );
        if !used.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars()
        .take(max)
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsched_core::{Day, NormalizedRecord, ScheduleGrid, SlotSpan};
    use pretty_assertions::assert_eq;

    fn record(lab: &str, day: Day, hours: &str, subject: &str) -> NormalizedRecord {
        NormalizedRecord {
            lab: lab.into(),
            day,
            span: SlotSpan::parse(hours).unwrap(),
            subject: subject.into(),
            group: "A1".into(),
            project: String::new(),
            instructor: String::new(),
            enrolled: 20,
            period: String::new(),
            room: String::new(),
            source_rows: vec![2],
        }
    }

    fn timetable(records: Vec<NormalizedRecord>) -> Timetable {
        let mut table = Timetable {
            days: Day::ALL.to_vec(),
            ..Timetable::default()
        };
        for r in records {
            table
                .grids
                .entry(r.lab.clone())
                .or_insert_with(|| ScheduleGrid::new(r.lab.clone()))
                .place(r);
        }
        table.conflicts = table.grids.values().flat_map(ScheduleGrid::conflicts).collect();
        table
    }

    #[test]
    fn render_produces_xlsx_bytes() {
        let table = timetable(vec![record("GEIO (321) TECHNE", Day::Tuesday, "6:00-8:00", "Simulación")]);
        let bytes = SheetRenderer::new().render(&table).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn report_lists_sheets_in_lab_order() {
        let table = timetable(vec![
            record("HAS-200 (317) TECHNE", Day::Monday, "6:00-7:00", "X"),
            record("GEIO (321) TECHNE", Day::Monday, "6:00-7:00", "Y"),
        ]);
        let report = SheetRenderer::new().render_report(&table).unwrap();
        assert_eq!(report.sheets, vec!["GEIO (321) TECHNE", "HAS-200 (317) TECHNE"]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn oversized_cell_skips_only_that_lab() {
        let huge = "x".repeat(40_000);
        let table = timetable(vec![
            record("GEIO (321) TECHNE", Day::Monday, "6:00-7:00", &huge),
            record("HAS-200 (317) TECHNE", Day::Monday, "6:00-7:00", "Redes"),
        ]);
        let report = SheetRenderer::new().render_report(&table).unwrap();

        assert_eq!(report.sheets, vec!["HAS-200 (317) TECHNE"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].lab, "GEIO (321) TECHNE");
        let diagnostic = report.failures[0].to_diagnostic();
        assert_eq!(diagnostic.code, DiagnosticCode::W006LabRenderFailed);
        assert_eq!(diagnostic.lab.as_deref(), Some("GEIO (321) TECHNE"));
        assert_eq!(&report.bytes[..2], b"PK");
    }

    #[test]
    fn empty_timetable_still_renders() {
        let report = SheetRenderer::new()
            .no_summary()
            .render_report(&Timetable::default())
            .unwrap();
        assert!(report.sheets.is_empty());
        assert_eq!(&report.bytes[..2], b"PK");
    }

    #[test]
    fn sheet_names_are_sanitized() {
        let used = HashSet::new();
        assert_eq!(sheet_name("GEIO (321) TECHNE", &used), "GEIO (321) TECHNE");
        assert_eq!(sheet_name("LAB 1/2 [A]", &used), "LAB 1_2 _A_");
        assert_eq!(sheet_name("'  '", &used), "Laboratorio");
        assert_eq!(
            sheet_name("LABORATORIO DE SIMULACION Y OPTIMIZACION", &used),
            "LABORATORIO DE SIMULACION Y OPT"
        );
    }

    #[test]
    fn sheet_names_are_unique_ignoring_case() {
        let mut used = HashSet::new();
        used.insert("lab a".to_string());
        assert_eq!(sheet_name("LAB A", &used), "LAB A (2)");
        used.insert("lab a (2)".to_string());
        assert_eq!(sheet_name("Lab A", &used), "Lab A (3)");

        let long = "A".repeat(40);
        used.insert("a".repeat(31));
        let name = sheet_name(&long, &used);
        assert_eq!(name.chars().count(), 31);
        assert!(name.ends_with(" (2)"));
    }

    #[test]
    fn reserved_sheet_names_are_avoided() {
        let table = timetable(vec![record("Resumen", Day::Monday, "6:00-7:00", "X")]);
        let report = SheetRenderer::new().render_report(&table).unwrap();
        assert_eq!(report.sheets, vec!["Resumen (2)"]);
    }
}
