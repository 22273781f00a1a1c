//! Record selection and normalization.
//!
//! Turns raw report rows into [`NormalizedRecord`]s: keeps only the target
//! building and mapped rooms, then parses day, hour range and enrollment.
//! Rows from other buildings or unmapped rooms are dropped silently; rows
//! that fail to parse are dropped and returned as [`Rejection`]s.

use labsched_core::{
    Config, Day, Diagnostic, NameMapper, NormalizedRecord, OccupancyRecord, RecordError,
    SlotSpan, SlotWindow,
};
use tracing::debug;

/// A row dropped because it could not be normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub row: usize,
    /// Canonical lab the row would have gone to
    pub lab: String,
    pub error: RecordError,
}

impl Rejection {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            self.error.code(),
            format!("row {} dropped: {}", self.row, self.error),
        )
        .with_row(self.row)
        .with_lab(self.lab.clone())
    }
}

/// Counters for one normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub other_building: usize,
    pub unmapped: usize,
    pub rejected: usize,
    pub kept: usize,
}

/// Result of [`RecordFilter::normalize`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Kept records, in input order
    pub records: Vec<NormalizedRecord>,
    pub rejected: Vec<Rejection>,
    pub stats: FilterStats,
}

enum Verdict {
    Kept(NormalizedRecord),
    OtherBuilding,
    Unmapped,
    Rejected(Rejection),
}

/// Selects and normalizes occupancy rows for one building
#[derive(Debug, Clone)]
pub struct RecordFilter {
    target_building: String,
    mapper: NameMapper,
    days: Vec<Day>,
    window: SlotWindow,
}

impl RecordFilter {
    pub fn new(config: &Config) -> Self {
        Self {
            target_building: config.target_building.trim().to_string(),
            mapper: config.labs.clone(),
            days: config.days.clone(),
            window: config.window().unwrap_or_default(),
        }
    }

    /// Normalize every row; never fails as a whole
    pub fn normalize(&self, raw: &[OccupancyRecord]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        outcome.stats.total = raw.len();

        for record in raw {
            match self.normalize_one(record) {
                Verdict::Kept(normalized) => outcome.records.push(normalized),
                Verdict::OtherBuilding => outcome.stats.other_building += 1,
                Verdict::Unmapped => outcome.stats.unmapped += 1,
                Verdict::Rejected(rejection) => outcome.rejected.push(rejection),
            }
        }

        outcome.stats.kept = outcome.records.len();
        outcome.stats.rejected = outcome.rejected.len();
        debug!(
            total = outcome.stats.total,
            kept = outcome.stats.kept,
            other_building = outcome.stats.other_building,
            unmapped = outcome.stats.unmapped,
            rejected = outcome.stats.rejected,
            "normalized occupancy rows"
        );
        outcome
    }

    fn normalize_one(&self, raw: &OccupancyRecord) -> Verdict {
        if raw.building.trim() != self.target_building {
            return Verdict::OtherBuilding;
        }

        let room = raw.room.trim();
        let Some(lab) = self.mapper.translate(room) else {
            return Verdict::Unmapped;
        };

        match self.parse_fields(raw) {
            Ok((day, span, enrolled)) => Verdict::Kept(NormalizedRecord {
                lab: lab.to_string(),
                day,
                span,
                subject: raw.subject.trim().to_string(),
                group: raw.group.trim().to_string(),
                project: raw.project.trim().to_string(),
                instructor: raw.instructor.trim().to_string(),
                enrolled,
                period: raw.period.trim().to_string(),
                room: room.to_string(),
                source_rows: vec![raw.row],
            }),
            Err(error) => Verdict::Rejected(Rejection {
                row: raw.row,
                lab: lab.to_string(),
                error,
            }),
        }
    }

    fn parse_fields(&self, raw: &OccupancyRecord) -> Result<(Day, SlotSpan, u32), RecordError> {
        let day = Day::parse(&raw.day)?;
        if !self.days.contains(&day) {
            return Err(RecordError::DayNotScheduled(day));
        }

        let hour = raw.hour.trim();
        let span = SlotSpan::parse(hour)?;
        if !self.window.contains(&span) {
            return Err(RecordError::MalformedHour(hour.to_string()));
        }

        let enrolled = parse_enrollment(&raw.enrolled)?;
        Ok((day, span, enrolled))
    }
}

/// Coerce an enrollment cell to a non-negative integer.
///
/// Spreadsheet numbers often arrive as `"20.0"`; whole floats are accepted,
/// fractions and negatives are not.
pub fn parse_enrollment(text: &str) -> Result<u32, RecordError> {
    let trimmed = text.trim();
    if let Ok(count) = trimmed.parse::<u32>() {
        return Ok(count);
    }
    match trimmed.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value <= f64::from(u32::MAX) =>
        {
            Ok(value as u32)
        }
        _ => Err(RecordError::InvalidEnrollment(text.to_string())),
    }
}
