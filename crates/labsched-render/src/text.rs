//! Plain-text schedule preview
//!
//! Renders each lab as a fixed-width table for the terminal:
//!
//! ```text
//! == GEIO (321) TECHNE ==
//! Hora      | LUNES            | MARTES
//! ----------+------------------+-----------------
//! 6AM-7AM   |                  | Simulación / A1 / 20
//! 7AM-8AM   |                  | |
//! ```
//!
//! A session is printed once on its first slot; the rows it continues over
//! show `|`. Conflicted slots show `!! CONFLICTO` and are listed in full
//! below the table.

use labsched_core::{BlockContent, Day, RenderError, Renderer, ScheduleGrid, SlotWindow, Timetable};

use crate::excel::NO_DATA_NOTE;

const SLOT_COLUMN: usize = 9;

/// Fixed-width text renderer for console output
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Width of each day column, in characters
    pub column_width: usize,
    /// Render only this lab
    pub lab: Option<String>,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            column_width: 22,
            lab: None,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the day column width (minimum 4)
    pub fn column_width(mut self, width: usize) -> Self {
        self.column_width = width.max(4);
        self
    }

    /// Render a single lab instead of all of them
    pub fn only_lab(mut self, lab: impl Into<String>) -> Self {
        self.lab = Some(lab.into());
        self
    }

    fn render_lab(&self, timetable: &Timetable, grid: &ScheduleGrid, output: &mut String) {
        let days = &timetable.days;
        let window = timetable.window;
        let width = self.column_width;

        output.push_str(&format!("== {} ==\n", grid.lab));

        let mut header = format!("{:<w$}", "Hora", w = SLOT_COLUMN);
        for day in days {
            header.push_str(&format!(" | {:<width$}", day.label()));
        }
        output.push_str(header.trim_end());
        output.push('\n');

        let mut rule = "-".repeat(SLOT_COLUMN + 1);
        for _ in days {
            rule.push('+');
            rule.push_str(&"-".repeat(width + 2));
        }
        output.push_str(&rule);
        output.push('\n');

        let columns: Vec<Vec<String>> = days
            .iter()
            .map(|day| day_column(grid, *day, window))
            .collect();

        for (offset, slot) in window.slots().enumerate() {
            let mut line = format!("{:<w$}", slot.label(), w = SLOT_COLUMN);
            for column in &columns {
                line.push_str(&format!(" | {:<width$}", fit(&column[offset], width)));
            }
            output.push_str(line.trim_end());
            output.push('\n');
        }

        for conflict in timetable.conflicts_for(&grid.lab) {
            let bookings: Vec<String> = conflict
                .records
                .iter()
                .filter_map(|id| grid.record(*id))
                .map(|r| one_line(&r.label()))
                .collect();
            output.push_str(&format!(
                "!! {} {}: {}\n",
                conflict.day.label(),
                conflict.slot.label(),
                bookings.join(" | ")
            ));
        }
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, timetable: &Timetable) -> Result<String, RenderError> {
        if let Some(lab) = &self.lab {
            let grid = timetable
                .lab(lab)
                .ok_or_else(|| RenderError::InvalidData(format!("Unknown lab: {lab}")))?;
            let mut output = String::new();
            self.render_lab(timetable, grid, &mut output);
            return Ok(output);
        }

        if timetable.is_empty() {
            return Ok(format!("{NO_DATA_NOTE}\n"));
        }

        let mut output = String::new();
        for (i, grid) in timetable.grids.values().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            self.render_lab(timetable, grid, &mut output);
        }
        Ok(output)
    }
}

/// One text cell per slot of the window for a single day
fn day_column(grid: &ScheduleGrid, day: Day, window: SlotWindow) -> Vec<String> {
    let mut column = vec![String::new(); window.len()];
    for block in grid.blocks(day, window) {
        let Some(offset) = window.offset(block.span.start) else {
            continue;
        };
        match &block.content {
            BlockContent::Empty => {}
            BlockContent::Session(id) => {
                column[offset] = grid
                    .record(*id)
                    .map(|r| one_line(&r.label()))
                    .unwrap_or_default();
                for cell in &mut column[offset + 1..offset + block.span.len()] {
                    *cell = "|".to_string();
                }
            }
            BlockContent::Conflict(ids) => {
                column[offset] = format!("!! CONFLICTO ({})", ids.len());
            }
        }
    }
    column
}

fn one_line(label: &str) -> String {
    label.replace('\n', " - ")
}

fn fit(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
