//! Weekly time axis: days, one-hour slots and slot spans.
//!
//! The grid is fixed at compile time: six days (Monday to Saturday) and
//! sixteen one-hour slots starting at 06:00. Everything that indexes the
//! grid goes through [`Day::index`] and [`TimeSlot::index`], so an
//! out-of-range position can only be built through the checked
//! constructors below.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RecordError;

/// First displayed clock hour (inclusive)
pub const FIRST_HOUR: u8 = 6;

/// Last displayed clock hour (exclusive end of the final slot)
pub const LAST_HOUR: u8 = 22;

/// Number of one-hour slots between [`FIRST_HOUR`] and [`LAST_HOUR`]
pub const SLOT_COUNT: usize = (LAST_HOUR - FIRST_HOUR) as usize;

/// Number of scheduled weekdays
pub const DAY_COUNT: usize = 6;

// ============================================================================
// Day
// ============================================================================

/// A scheduled weekday
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    /// All days in display order
    pub const ALL: [Day; DAY_COUNT] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// Position in the grid (Monday = 0)
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column header used in the printed schedule
    pub const fn label(self) -> &'static str {
        match self {
            Day::Monday => "LUNES",
            Day::Tuesday => "MARTES",
            Day::Wednesday => "MIERCOLES",
            Day::Thursday => "JUEVES",
            Day::Friday => "VIERNES",
            Day::Saturday => "SABADO",
        }
    }

    /// Parse a Spanish or English day name.
    ///
    /// Case, accents and surrounding whitespace are ignored, so `"Miércoles"`,
    /// `"MIERCOLES"` and `"wednesday"` all parse to [`Day::Wednesday`].
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        match fold_text(text).as_str() {
            "lunes" | "monday" => Ok(Day::Monday),
            "martes" | "tuesday" => Ok(Day::Tuesday),
            "miercoles" | "wednesday" => Ok(Day::Wednesday),
            "jueves" | "thursday" => Ok(Day::Thursday),
            "viernes" | "friday" => Ok(Day::Friday),
            "sabado" | "saturday" => Ok(Day::Saturday),
            _ => Err(RecordError::MalformedDay(text.to_string())),
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercase a string, strip Spanish accents and trim it.
///
/// Used wherever free text is compared loosely (day names, column headers).
/// Lab names are never folded: the name mapping is an exact match.
pub fn fold_text(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

// ============================================================================
// TimeSlot
// ============================================================================

/// One clock-hour row of the schedule
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Slot starting at the given clock hour, if it lies on the grid
    pub fn from_hour(hour: u8) -> Option<Self> {
        (FIRST_HOUR..LAST_HOUR)
            .contains(&hour)
            .then(|| Self(hour - FIRST_HOUR))
    }

    /// Position in the grid (06:00 = 0)
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Clock hour at which this slot starts
    pub const fn hour(self) -> u8 {
        self.0 + FIRST_HOUR
    }

    /// All slots in order
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..SLOT_COUNT as u8).map(TimeSlot)
    }

    /// Row label in the style of the occupancy report, e.g. `11AM-12M`
    pub fn label(self) -> String {
        format!("{}-{}", twelve_hour(self.hour()), twelve_hour(self.hour() + 1))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.hour())
    }
}

fn twelve_hour(hour: u8) -> String {
    match hour {
        0 | 24 => "12AM".to_string(),
        12 => "12M".to_string(),
        h if h < 12 => format!("{h}AM"),
        h => format!("{}PM", h - 12),
    }
}

// ============================================================================
// SlotSpan
// ============================================================================

/// Inclusive run of slots occupied by one session
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotSpan {
    pub start: TimeSlot,
    pub end: TimeSlot,
}

impl SlotSpan {
    /// Single-slot span
    pub fn single(slot: TimeSlot) -> Self {
        Self { start: slot, end: slot }
    }

    /// Number of slots covered
    pub fn len(&self) -> usize {
        self.end.index() - self.start.index() + 1
    }

    /// Spans always cover at least one slot
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the covered slots in order
    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> {
        (self.start.0..=self.end.0).map(TimeSlot)
    }

    /// True when `next` starts right after this span ends
    pub fn is_followed_by(&self, next: &SlotSpan) -> bool {
        self.end.index() + 1 == next.start.index()
    }

    /// Parse an hour range from the occupancy report.
    ///
    /// Accepts 24-hour ranges (`6:00-8:00`, `14:00 - 16:00`) and the
    /// report's own labels (`6AM-7AM`, `11AM-12M`, `12M-1PM`). The end
    /// is exclusive and a partial final hour still occupies its slot, so
    /// `6:00-7:50` covers 06:00 and 07:00.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let malformed = || RecordError::MalformedHour(text.to_string());

        let (start, end) = text.split_once('-').ok_or_else(malformed)?;
        let start = parse_clock(start).ok_or_else(malformed)?;
        let end = parse_clock(end).ok_or_else(malformed)?;
        if start >= end {
            return Err(malformed());
        }

        let first_hour = start / 60;
        let end_hour = end.div_ceil(60);
        let start_slot = u8::try_from(first_hour)
            .ok()
            .and_then(TimeSlot::from_hour)
            .ok_or_else(malformed)?;
        let end_slot = u8::try_from(end_hour - 1)
            .ok()
            .and_then(TimeSlot::from_hour)
            .ok_or_else(malformed)?;

        Ok(Self { start: start_slot, end: end_slot })
    }
}

impl fmt::Display for SlotSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start.hour(), self.end.hour() + 1)
    }
}

/// Minutes since midnight for one side of an hour range
fn parse_clock(text: &str) -> Option<u32> {
    let text = text.trim().to_ascii_uppercase();

    let (body, meridiem) = if let Some(body) = text.strip_suffix("AM") {
        (body, Some("AM"))
    } else if let Some(body) = text.strip_suffix("PM") {
        (body, Some("PM"))
    } else if let Some(body) = text.strip_suffix('M') {
        (body, Some("M"))
    } else {
        (text.as_str(), None)
    };

    let body = body.trim();
    let (hours, minutes) = match body.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        Some(_) => return None,
        None => (body.parse::<u32>().ok()?, 0),
    };
    if minutes >= 60 {
        return None;
    }

    let hours = match meridiem {
        None if hours < 24 || (hours == 24 && minutes == 0) => hours,
        Some("M") if hours == 12 => 12,
        Some("AM") if (1..=12).contains(&hours) => hours % 12,
        Some("PM") if (1..=12).contains(&hours) => hours % 12 + 12,
        _ => return None,
    };

    Some(hours * 60 + minutes)
}

// ============================================================================
// SlotWindow
// ============================================================================

/// Range of slots actually displayed (a sub-range of the fixed grid)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub first: TimeSlot,
    pub last: TimeSlot,
}

impl SlotWindow {
    /// Window covering `[first_hour, last_hour)`
    pub fn from_hours(first_hour: u8, last_hour: u8) -> Option<Self> {
        if first_hour >= last_hour {
            return None;
        }
        Some(Self {
            first: TimeSlot::from_hour(first_hour)?,
            last: TimeSlot::from_hour(last_hour.checked_sub(1)?)?,
        })
    }

    pub fn contains(&self, span: &SlotSpan) -> bool {
        self.first <= span.start && span.end <= self.last
    }

    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> {
        SlotSpan { start: self.first, end: self.last }.slots()
    }

    pub fn len(&self) -> usize {
        self.last.index() - self.first.index() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Row offset of a slot inside the window
    pub fn offset(&self, slot: TimeSlot) -> Option<usize> {
        (self.first <= slot && slot <= self.last).then(|| slot.index() - self.first.index())
    }
}

impl Default for SlotWindow {
    fn default() -> Self {
        Self {
            first: TimeSlot(0),
            last: TimeSlot(SLOT_COUNT as u8 - 1),
        }
    }
}
