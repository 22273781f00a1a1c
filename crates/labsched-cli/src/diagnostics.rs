//! Diagnostic formatting for CLI output
//!
//! This module implements diagnostic emitters for different output formats:
//! - `TerminalEmitter`: rustc-style output to stderr
//! - `JsonEmitter`: machine-readable JSON output
//!
//! Both emitters support:
//! - `--strict` mode: escalates warnings to errors
//! - `--quiet` mode: suppresses all output except errors
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings/info allowed) |
//! | 1 | Failure: a fatal error, or any effective error after policy |
//!
//! - **Default mode**: dropped rows and conflicts are warnings and exit 0
//! - **`--strict` mode**: a run with any warning exits 1
//! - **`--quiet` mode**: does NOT affect exit code, only output visibility
//! - **`--format=json`**: exit code semantics identical to text mode

use std::io::Write;
use std::process;

use labsched_core::{Diagnostic, DiagnosticEmitter, Severity};
use serde::Serialize;

// ============================================================================
// Exit Code
// ============================================================================

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success: no errors (warnings/info allowed)
    Success = 0,
    /// Failure: one or more errors emitted
    Failure = 1,
}

impl ExitCode {
    /// Determine exit code from an error count that already reflects policy
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Diagnostic Config
// ============================================================================

/// Configuration for diagnostic output
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticConfig {
    /// Escalate warnings to errors
    pub strict: bool,
    /// Suppress all output except errors
    pub quiet: bool,
}

impl DiagnosticConfig {
    /// Escalate severity according to strict mode rules
    pub fn effective_severity(&self, severity: Severity) -> Severity {
        match severity {
            Severity::Warning if self.strict => Severity::Error,
            s => s,
        }
    }

    /// In quiet mode only effective errors are shown
    pub fn should_show(&self, severity: Severity) -> bool {
        if self.quiet {
            matches!(self.effective_severity(severity), Severity::Error)
        } else {
            true
        }
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Terminal emitter that writes rustc-style diagnostics
pub struct TerminalEmitter<W: Write> {
    writer: W,
    config: DiagnosticConfig,
    error_count: usize,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, config: DiagnosticConfig) -> Self {
        Self {
            writer,
            config,
            error_count: 0,
        }
    }

    /// Exit code for everything emitted so far (after policy)
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let effective_severity = self.config.effective_severity(diagnostic.severity);

        // Counted even when quiet hides it
        if effective_severity == Severity::Error {
            self.error_count += 1;
        }

        if !self.config.should_show(diagnostic.severity) {
            return Ok(());
        }

        // Header line: severity[CODE]: message
        writeln!(
            self.writer,
            "{}[{}]: {}",
            effective_severity.as_str(),
            diagnostic.code.as_str(),
            diagnostic.message
        )?;

        // Location: --> lab, row
        match (&diagnostic.lab, diagnostic.row) {
            (Some(lab), Some(row)) => writeln!(self.writer, "  --> {lab}, row {row}")?,
            (Some(lab), None) => writeln!(self.writer, "  --> {lab}")?,
            (None, Some(row)) => writeln!(self.writer, "  --> row {row}")?,
            (None, None) => {}
        }

        if !diagnostic.notes.is_empty() {
            writeln!(self.writer, "   |")?;
            for note in &diagnostic.notes {
                writeln!(self.writer, "   = {}", note)?;
            }
        }

        writeln!(self.writer)?;

        Ok(())
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        // Ignore write errors (stderr may be closed)
        let _ = self.write_diagnostic(&diagnostic);
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON emitter that collects diagnostics for machine-readable output
pub struct JsonEmitter {
    diagnostics: Vec<JsonDiagnostic>,
    config: DiagnosticConfig,
    error_count: usize,
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab: Option<String>,
    pub notes: Vec<String>,
}

impl JsonEmitter {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            diagnostics: Vec::new(),
            config,
            error_count: 0,
        }
    }

    pub fn diagnostics(&self) -> &[JsonDiagnostic] {
        &self.diagnostics
    }

    /// Exit code for everything collected so far (after policy)
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.diagnostics).unwrap_or(serde_json::Value::Null)
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let effective_severity = self.config.effective_severity(diagnostic.severity);
        if effective_severity == Severity::Error {
            self.error_count += 1;
        }

        if !self.config.should_show(diagnostic.severity) {
            return;
        }

        self.diagnostics.push(JsonDiagnostic {
            code: diagnostic.code.as_str().to_string(),
            severity: effective_severity.as_str().to_string(),
            message: diagnostic.message,
            row: diagnostic.row,
            lab: diagnostic.lab,
            notes: diagnostic.notes,
        });
    }
}
