//! # labsched-core
//!
//! Core domain model and traits for the labsched timetable generator.
//!
//! This crate provides:
//! - Domain types: `OccupancyRecord`, `NormalizedRecord`, `ScheduleGrid`, `Timetable`
//! - The weekly time axis: `Day`, `TimeSlot`, `SlotSpan`, `SlotWindow`
//! - Lab name mapping and run configuration
//! - Diagnostics, error types and the `Renderer` trait
//!
//! ## Example
//!
//! ```rust
//! use labsched_core::{Day, NameMapper, SlotSpan};
//!
//! let mapper = NameMapper::from_pairs([("LABORATORIO GEIO CAP(25)", "GEIO (321) TECHNE")]);
//! assert_eq!(mapper.translate("LABORATORIO GEIO CAP(25)"), Some("GEIO (321) TECHNE"));
//!
//! let span = SlotSpan::parse("6:00-8:00").unwrap();
//! assert_eq!(span.len(), 2);
//! assert_eq!(Day::parse("Martes").unwrap(), Day::Tuesday);
//! ```

pub mod config;
pub mod diagnostics;
pub mod grid;
pub mod mapping;
pub mod time;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use grid::{BlockContent, Cell, Conflict, RenderBlock, ScheduleGrid, Timetable};
pub use mapping::NameMapper;
pub use time::{fold_text, Day, SlotSpan, SlotWindow, TimeSlot, DAY_COUNT, SLOT_COUNT};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Canonical display name of a laboratory
pub type LabName = String;

/// Index of a record inside its lab's [`ScheduleGrid`]
pub type RecordId = usize;

// ============================================================================
// Records
// ============================================================================

/// One raw row of the occupancy report.
///
/// All fields are kept as read; trimming and type coercion happen when the
/// row is normalized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    /// 1-based row number in the source sheet (header is row 1)
    pub row: usize,
    pub period: String,
    pub day: String,
    pub hour: String,
    pub subject: String,
    pub group: String,
    pub project: String,
    pub room: String,
    pub area: String,
    pub building: String,
    pub campus: String,
    pub enrolled: String,
    pub instructor: String,
}

impl OccupancyRecord {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            ..Self::default()
        }
    }

    pub fn day(mut self, day: impl Into<String>) -> Self {
        self.day = day.into();
        self
    }

    pub fn hour(mut self, hour: impl Into<String>) -> Self {
        self.hour = hour.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    pub fn building(mut self, building: impl Into<String>) -> Self {
        self.building = building.into();
        self
    }

    pub fn enrolled(mut self, enrolled: impl Into<String>) -> Self {
        self.enrolled = enrolled.into();
        self
    }

    pub fn instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = instructor.into();
        self
    }
}

/// A filtered, typed booking ready to be placed on a lab grid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Canonical lab name (from the name mapping)
    pub lab: LabName,
    pub day: Day,
    pub span: SlotSpan,
    pub subject: String,
    pub group: String,
    pub project: String,
    pub instructor: String,
    pub enrolled: u32,
    pub period: String,
    /// Raw room name as it appeared in the report
    pub room: String,
    /// Source rows this record was built from (more than one after coalescing)
    pub source_rows: Vec<usize>,
}

impl NormalizedRecord {
    /// First source row, used for stable ordering
    pub fn first_row(&self) -> usize {
        self.source_rows.first().copied().unwrap_or(0)
    }

    /// Sessions of two or more slots are highlighted differently
    pub fn is_long(&self) -> bool {
        self.span.len() >= 2
    }

    /// Cell label: `Subject / Group / Enrolled`, instructor on a second line
    pub fn label(&self) -> String {
        let mut label = format!("{} / {} / {}", self.subject, self.group, self.enrolled);
        if !self.instructor.is_empty() {
            label.push('\n');
            label.push_str(&self.instructor);
        }
        label
    }

    /// Fields that identify the same class across per-hour rows
    pub fn session_key(&self) -> (&str, Day, &str, &str, &str, &str) {
        (
            &self.lab,
            self.day,
            &self.subject,
            &self.group,
            &self.project,
            &self.instructor,
        )
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a laid-out timetable to the output format
    fn render(&self, timetable: &Timetable) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Per-record normalization failure; the record is dropped, the run goes on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Malformed hour range: {0:?}")]
    MalformedHour(String),

    #[error("Malformed day: {0:?}")]
    MalformedDay(String),

    #[error("Day {0} is not part of the configured schedule")]
    DayNotScheduled(Day),

    #[error("Invalid enrollment count: {0:?}")]
    InvalidEnrollment(String),
}

impl RecordError {
    /// Diagnostic code reported for this failure
    pub fn code(&self) -> DiagnosticCode {
        match self {
            RecordError::MalformedHour(_) => DiagnosticCode::W001MalformedHour,
            RecordError::InvalidEnrollment(_) => DiagnosticCode::W002InvalidEnrollment,
            RecordError::MalformedDay(_) => DiagnosticCode::W003MalformedDay,
            RecordError::DayNotScheduled(_) => DiagnosticCode::W004DayNotScheduled,
        }
    }
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str, instructor: &str, hour: &str) -> NormalizedRecord {
        NormalizedRecord {
            lab: "GEIO (321) TECHNE".into(),
            day: Day::Tuesday,
            span: SlotSpan::parse(hour).unwrap(),
            subject: subject.into(),
            group: "A1".into(),
            project: String::new(),
            instructor: instructor.into(),
            enrolled: 20,
            period: "2025-1".into(),
            room: "LABORATORIO GEIO CAP(25)".into(),
            source_rows: vec![2],
        }
    }

    #[test]
    fn occupancy_record_builder() {
        let rec = OccupancyRecord::new(5)
            .day("Martes")
            .hour("6:00-8:00")
            .room("LABORATORIO GEIO CAP(25)")
            .building("TECHNE")
            .enrolled("20");

        assert_eq!(rec.row, 5);
        assert_eq!(rec.day, "Martes");
        assert_eq!(rec.building, "TECHNE");
        assert!(rec.subject.is_empty());
    }

    #[test]
    fn label_without_instructor() {
        let rec = record("Simulación", "", "6:00-8:00");
        assert_eq!(rec.label(), "Simulación / A1 / 20");
    }

    #[test]
    fn label_with_instructor() {
        let rec = record("Simulación", "Ana Pérez", "6:00-8:00");
        assert_eq!(rec.label(), "Simulación / A1 / 20\nAna Pérez");
    }

    #[test]
    fn long_sessions() {
        assert!(record("S", "", "6:00-8:00").is_long());
        assert!(!record("S", "", "6:00-7:00").is_long());
    }

    #[test]
    fn record_error_codes() {
        assert_eq!(
            RecordError::MalformedHour("x".into()).code(),
            DiagnosticCode::W001MalformedHour
        );
        assert_eq!(
            RecordError::DayNotScheduled(Day::Saturday).code(),
            DiagnosticCode::W004DayNotScheduled
        );
    }

    #[test]
    fn record_error_display() {
        let err = RecordError::InvalidEnrollment("-3".into());
        assert_eq!(err.to_string(), "Invalid enrollment count: \"-3\"");
        let err = RecordError::DayNotScheduled(Day::Saturday);
        assert_eq!(err.to_string(), "Day SABADO is not part of the configured schedule");
    }
}
