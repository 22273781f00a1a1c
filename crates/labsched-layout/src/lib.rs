//! # labsched-layout
//!
//! From occupancy rows to per-lab weekly grids.
//!
//! This crate provides:
//! - `RecordFilter`: building/lab selection and field normalization
//! - `coalesce`: joining per-hour rows of the same class into one session
//! - `GridLayout`: placing sessions on each lab's day × slot grid and
//!   surfacing double bookings as conflicts
//!
//! ## Example
//!
//! ```rust
//! use labsched_core::{Config, OccupancyRecord};
//! use labsched_layout::lay_out;
//!
//! let rows = vec![OccupancyRecord::new(2)
//!     .day("Martes")
//!     .hour("6:00-8:00")
//!     .subject("Simulación")
//!     .group("A1")
//!     .room("LABORATORIO GEIO CAP(25)")
//!     .building("TECHNE")
//!     .enrolled("20")];
//!
//! let layout = lay_out(&Config::default(), &rows);
//! assert!(layout.timetable.lab("GEIO (321) TECHNE").is_some());
//! assert!(layout.timetable.conflicts.is_empty());
//! ```

pub mod filter;
pub mod session;

pub use filter::{parse_enrollment, FilterOutcome, FilterStats, RecordFilter, Rejection};
pub use session::coalesce;

use labsched_core::{
    Config, Conflict, Day, Diagnostic, DiagnosticCode, LabName, NormalizedRecord,
    OccupancyRecord, ScheduleGrid, SlotWindow, Timetable,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Places normalized records on per-lab grids
#[derive(Debug, Clone)]
pub struct GridLayout {
    days: Vec<Day>,
    window: SlotWindow,
}

impl GridLayout {
    pub fn new(config: &Config) -> Self {
        Self {
            days: config.days.clone(),
            window: config.window().unwrap_or_default(),
        }
    }

    /// Build one grid per lab and collect every conflicting cell.
    ///
    /// Labs are independent, so their grids are built in parallel; the
    /// result is keyed by lab name and does not depend on scheduling order.
    pub fn build(&self, records: Vec<NormalizedRecord>) -> Timetable {
        let mut by_lab: BTreeMap<LabName, Vec<NormalizedRecord>> = BTreeMap::new();
        for record in records {
            by_lab.entry(record.lab.clone()).or_default().push(record);
        }

        let grids: BTreeMap<LabName, ScheduleGrid> = by_lab
            .into_par_iter()
            .map(|(lab, records)| {
                let mut grid = ScheduleGrid::new(lab.clone());
                for record in records {
                    grid.place(record);
                }
                (lab, grid)
            })
            .collect();

        let conflicts: Vec<Conflict> = grids.values().flat_map(ScheduleGrid::conflicts).collect();
        for conflict in &conflicts {
            warn!(
                lab = %conflict.lab,
                day = %conflict.day,
                slot = %conflict.slot,
                bookings = conflict.records.len(),
                "room booking conflict"
            );
        }
        debug!(labs = grids.len(), conflicts = conflicts.len(), "grid layout complete");

        Timetable {
            grids,
            conflicts,
            days: self.days.clone(),
            window: self.window,
        }
    }
}

/// Describe a conflict for operators: which rows collide where
pub fn conflict_diagnostic(timetable: &Timetable, conflict: &Conflict) -> Diagnostic {
    let mut diagnostic = Diagnostic::new(
        DiagnosticCode::W005ConflictDetected,
        format!(
            "{} bookings overlap in {} on {} {}",
            conflict.records.len(),
            conflict.lab,
            conflict.day,
            conflict.slot.label()
        ),
    )
    .with_lab(conflict.lab.clone());

    if let Some(grid) = timetable.lab(&conflict.lab) {
        for record in conflict.records.iter().filter_map(|id| grid.record(*id)) {
            let rows: Vec<String> = record.source_rows.iter().map(|r| r.to_string()).collect();
            diagnostic = diagnostic.with_note(format!(
                "row {}: {} / {} ({})",
                rows.join(","),
                record.subject,
                record.group,
                record.span
            ));
        }
    }
    diagnostic
}

/// Everything the pipeline produced for one input table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub timetable: Timetable,
    pub rejected: Vec<Rejection>,
    pub stats: FilterStats,
    /// Record count after coalescing
    pub sessions: usize,
}

impl Layout {
    /// Per-record rejections followed by conflicts, in a stable order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.rejected
            .iter()
            .map(Rejection::to_diagnostic)
            .chain(
                self.timetable
                    .conflicts
                    .iter()
                    .map(|c| conflict_diagnostic(&self.timetable, c)),
            )
            .collect()
    }
}

/// Run filter → coalesce → grid layout
pub fn lay_out(config: &Config, raw: &[OccupancyRecord]) -> Layout {
    let outcome = RecordFilter::new(config).normalize(raw);

    let records = if config.coalesce_sessions {
        coalesce(outcome.records)
    } else {
        outcome.records
    };
    let sessions = records.len();

    Layout {
        timetable: GridLayout::new(config).build(records),
        rejected: outcome.rejected,
        stats: outcome.stats,
        sessions,
    }
}
