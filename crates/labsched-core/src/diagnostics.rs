//! Diagnostics reported during a run.
//!
//! Per-record problems and booking conflicts never stop the pipeline; they
//! are collected as [`Diagnostic`]s and handed to a [`DiagnosticEmitter`]
//! chosen by the caller (terminal, JSON, or a plain `Vec` in tests).

use serde::Serialize;
use std::fmt;

/// Severity of a diagnostic
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// A required input column is missing (fatal)
    E001MissingColumn,
    W001MalformedHour,
    W002InvalidEnrollment,
    W003MalformedDay,
    W004DayNotScheduled,
    /// Two or more bookings share a lab, day and slot
    W005ConflictDetected,
    /// One lab's sheet could not be written; the others were
    W006LabRenderFailed,
    /// Run summary
    I001Summary,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::E001MissingColumn => "E001",
            DiagnosticCode::W001MalformedHour => "W001",
            DiagnosticCode::W002InvalidEnrollment => "W002",
            DiagnosticCode::W003MalformedDay => "W003",
            DiagnosticCode::W004DayNotScheduled => "W004",
            DiagnosticCode::W005ConflictDetected => "W005",
            DiagnosticCode::W006LabRenderFailed => "W006",
            DiagnosticCode::I001Summary => "I001",
        }
    }

    /// Default severity for this code
    pub fn severity(self) -> Severity {
        match self.as_str().as_bytes().first() {
            Some(b'E') => Severity::Error,
            Some(b'W') => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported problem or notice
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Source row in the occupancy report, when the problem is row-specific
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Canonical lab the problem belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab: Option<String>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// New diagnostic with the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            row: None,
            lab: None,
            notes: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_lab(mut self, lab: impl Into<String>) -> Self {
        self.lab = Some(lab.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Sink for diagnostics
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_severity_follows_code_prefix() {
        assert_eq!(DiagnosticCode::E001MissingColumn.severity(), Severity::Error);
        assert_eq!(DiagnosticCode::W005ConflictDetected.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::I001Summary.severity(), Severity::Info);
    }

    #[test]
    fn builder_sets_context() {
        let d = Diagnostic::new(DiagnosticCode::W001MalformedHour, "bad hour")
            .with_row(7)
            .with_lab("GEIO")
            .with_note("expected H:MM-H:MM");

        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.row, Some(7));
        assert_eq!(d.lab.as_deref(), Some("GEIO"));
        assert_eq!(d.notes.len(), 1);
    }

    #[test]
    fn vec_collects_diagnostics() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.emit(Diagnostic::new(DiagnosticCode::I001Summary, "done"));
        assert_eq!(sink.len(), 1);
    }
}
