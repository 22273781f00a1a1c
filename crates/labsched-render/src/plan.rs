//! Backend-independent sheet layout.
//!
//! A [`SheetPlan`] is the list of styled, possibly merged cells that make up
//! one lab's printed schedule. Building it is a pure forward walk over the
//! grid; writing it to a real workbook is the backend's job.
//!
//! ```text
//! row 0   | GEIO (321) TECHNE                                  (title, merged)
//! row 1   | Hora     | LUNES | MARTES               | ...      (header)
//! row 2   | 6AM-7AM  |       | Simulación / A1 / 20 | ...
//! row 3   | 7AM-8AM  |       |   (merged with row 2)| ...
//! ...
//! row n+3 | Asignatura / Grupo / Inscritos — Docente          (legend, merged)
//! ```

use labsched_core::{BlockContent, Day, RenderError, ScheduleGrid, SlotWindow, Timetable};

/// Row of the title banner
pub const TITLE_ROW: u32 = 0;
/// Row with the day headers
pub const HEADER_ROW: u32 = 1;
/// First slot row
pub const FIRST_SLOT_ROW: u32 = 2;

/// Marker placed above contending bookings in a conflicted cell
pub const CONFLICT_MARKER: &str = "CONFLICTO";

/// Legend explaining the cell text
pub const LEGEND: &str = "Asignatura / Grupo / Inscritos — Docente";

/// Fill band, alternating by weekday (Monday even)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Even,
    Odd,
}

impl Band {
    /// Band of a weekday; independent of which days are displayed
    pub fn for_day(day: Day) -> Self {
        if day.index() % 2 == 0 {
            Band::Even
        } else {
            Band::Odd
        }
    }
}

/// Visual role of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStyle {
    Title,
    Header,
    SlotLabel,
    Blank(Band),
    /// A booked session; `long` for sessions of two or more slots
    Session { band: Band, long: bool },
    Conflict,
    Legend,
}

/// One write instruction: a cell or a merged rectangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCell {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
    pub text: String,
    pub style: CellStyle,
}

impl PlannedCell {
    fn single(row: u32, col: u16, text: impl Into<String>, style: CellStyle) -> Self {
        Self {
            first_row: row,
            first_col: col,
            last_row: row,
            last_col: col,
            text: text.into(),
            style,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.first_row != self.last_row || self.first_col != self.last_col
    }

    pub fn rows(&self) -> u32 {
        self.last_row - self.first_row + 1
    }
}

/// Complete layout of one lab's worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub lab: String,
    pub cells: Vec<PlannedCell>,
    /// Width per column, in characters
    pub column_widths: Vec<f64>,
    /// Height per row that needs one, in points
    pub row_heights: Vec<(u32, f64)>,
}

impl SheetPlan {
    /// Cell (or merged region) whose top-left corner is at `(row, col)`
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&PlannedCell> {
        self.cells
            .iter()
            .find(|c| c.first_row == row && c.first_col == col)
    }
}

/// Lay out one lab's grid
pub fn plan_sheet(
    grid: &ScheduleGrid,
    days: &[Day],
    window: SlotWindow,
) -> Result<SheetPlan, RenderError> {
    if days.is_empty() {
        return Err(RenderError::InvalidData("no days to display".into()));
    }
    let last_col = days.len() as u16;
    let slot_rows = window.len() as u32;
    let mut cells = Vec::new();

    cells.push(PlannedCell {
        first_row: TITLE_ROW,
        first_col: 0,
        last_row: TITLE_ROW,
        last_col,
        text: grid.lab.clone(),
        style: CellStyle::Title,
    });

    cells.push(PlannedCell::single(HEADER_ROW, 0, "Hora", CellStyle::Header));
    for (position, day) in days.iter().enumerate() {
        cells.push(PlannedCell::single(
            HEADER_ROW,
            position as u16 + 1,
            day.label(),
            CellStyle::Header,
        ));
    }

    for (offset, slot) in window.slots().enumerate() {
        cells.push(PlannedCell::single(
            FIRST_SLOT_ROW + offset as u32,
            0,
            slot.label(),
            CellStyle::SlotLabel,
        ));
    }

    let mut widths = vec![12.0_f64; days.len() + 1];
    let mut heights = vec![30.0_f64; window.len()];

    for (position, day) in days.iter().enumerate() {
        let col = position as u16 + 1;
        let band = Band::for_day(*day);

        for block in grid.blocks(*day, window) {
            let offset = window
                .offset(block.span.start)
                .ok_or_else(|| RenderError::InvalidData(format!("block outside window in {}", grid.lab)))?;
            let first_row = FIRST_SLOT_ROW + offset as u32;
            let last_row = first_row + block.span.len() as u32 - 1;

            let (text, style) = match &block.content {
                BlockContent::Empty => (String::new(), CellStyle::Blank(band)),
                BlockContent::Session(id) => {
                    let record = grid.record(*id).ok_or_else(|| {
                        RenderError::InvalidData(format!("unknown record {id} in {}", grid.lab))
                    })?;
                    (
                        record.label(),
                        CellStyle::Session {
                            band,
                            long: record.is_long(),
                        },
                    )
                }
                BlockContent::Conflict(ids) => {
                    let mut text = CONFLICT_MARKER.to_string();
                    for id in ids {
                        let record = grid.record(*id).ok_or_else(|| {
                            RenderError::InvalidData(format!("unknown record {id} in {}", grid.lab))
                        })?;
                        text.push('\n');
                        text.push_str(&record.label());
                    }
                    (text, CellStyle::Conflict)
                }
            };

            let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            widths[col as usize] = widths[col as usize].max(longest as f64 + 2.0);

            let lines = text.lines().count().max(1) as u32;
            let per_row = f64::from(lines.div_ceil(block.span.len() as u32)) * 15.0;
            for h in &mut heights[offset..offset + block.span.len()] {
                *h = h.max(per_row);
            }

            cells.push(PlannedCell {
                first_row,
                first_col: col,
                last_row,
                last_col: col,
                text,
                style,
            });
        }
    }

    cells.push(PlannedCell {
        first_row: FIRST_SLOT_ROW + slot_rows + 1,
        first_col: 0,
        last_row: FIRST_SLOT_ROW + slot_rows + 1,
        last_col,
        text: LEGEND.to_string(),
        style: CellStyle::Legend,
    });

    for width in widths.iter_mut().skip(1) {
        *width = width.clamp(18.0, 50.0);
    }

    Ok(SheetPlan {
        lab: grid.lab.clone(),
        cells,
        column_widths: widths,
        row_heights: heights
            .into_iter()
            .enumerate()
            .map(|(i, h)| (FIRST_SLOT_ROW + i as u32, h))
            .collect(),
    })
}

/// Plan every lab, in name order
pub fn plan_timetable(timetable: &Timetable) -> Vec<(String, Result<SheetPlan, RenderError>)> {
    timetable
        .grids
        .iter()
        .map(|(lab, grid)| (lab.clone(), plan_sheet(grid, &timetable.days, timetable.window)))
        .collect()
}
