//! labsched CLI - Weekly laboratory schedule generator
//!
//! Reads a room-occupancy report and writes one weekly timetable per lab.

mod diagnostics;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use diagnostics::{DiagnosticConfig, ExitCode, JsonEmitter, TerminalEmitter};
use labsched_core::{Config, Diagnostic, DiagnosticCode, DiagnosticEmitter, Renderer, Timetable};
use labsched_layout::{lay_out, Layout};
use labsched_reader::{read_occupancy, ReadError};
use labsched_render::{SheetRenderer, TextRenderer};

const DEFAULT_OUTPUT: &str = "HORARIO_LABORATORIOS.xlsx";
const DEFAULT_CONFIG: &str = "labsched.toml";

#[derive(Parser)]
#[command(name = "labsched")]
#[command(author, version, about = "Weekly laboratory schedule generator", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Occupancy report (.xlsx, .xlsm, .xls, .ods)
    #[arg(value_name = "INPUT", env = "LABSCHED_INPUT")]
    input: PathBuf,

    /// Configuration file (built-in defaults if not specified)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Worksheet to read (first sheet if not specified)
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// Diagnostic output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,
}

impl ReportArgs {
    fn diagnostic_config(&self) -> DiagnosticConfig {
        DiagnosticConfig {
            strict: self.strict,
            quiet: self.quiet,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the timetable workbook
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Output workbook path
        #[arg(short, long, env = "LABSCHED_OUTPUT", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        #[command(flatten)]
        report: ReportArgs,

        /// Leave out the Resumen sheet
        #[arg(long)]
        no_summary: bool,

        /// Leave out the Avisos sheet
        #[arg(long)]
        no_warnings_sheet: bool,
    },

    /// Run the whole pipeline without writing, and report what was found
    Check {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Print the timetable as plain text
    Preview {
        #[command(flatten)]
        input: InputArgs,

        /// Only this lab (canonical name)
        #[arg(long)]
        lab: Option<String>,

        /// Day column width
        #[arg(long, default_value_t = 22)]
        width: usize,
    },

    /// Write the default configuration file
    Init {
        /// Where to write it
        #[arg(value_name = "PATH", default_value = DEFAULT_CONFIG)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli.command) {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::Failure.into()
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Generate {
            input,
            output,
            report,
            no_summary,
            no_warnings_sheet,
        } => cmd_generate(&input, &output, &report, no_summary, no_warnings_sheet),
        Commands::Check { input, report } => cmd_check(&input, &report),
        Commands::Preview { input, lab, width } => cmd_preview(&input, lab, width),
        Commands::Init { path, force } => cmd_init(&path, force),
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Outcome of reading and laying out the input
enum Loaded {
    Ready(Layout),
    /// Input rejected before any row was processed
    Fatal(Diagnostic),
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn load(input: &InputArgs) -> Result<Loaded> {
    let config = load_config(input.config.as_deref())?;

    let records = match read_occupancy(&input.input, input.sheet.as_deref()) {
        Ok(records) => records,
        Err(ReadError::MissingColumn(columns)) => {
            return Ok(Loaded::Fatal(
                Diagnostic::new(
                    DiagnosticCode::E001MissingColumn,
                    format!("missing required column(s): {}", columns.join(", ")),
                )
                .with_note(format!("input: {}", input.input.display())),
            ));
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", input.input.display()))
        }
    };
    info!(rows = records.len(), input = %input.input.display(), "read occupancy report");

    Ok(Loaded::Ready(lay_out(&config, &records)))
}

fn summary(layout: &Layout, sheets: usize) -> Diagnostic {
    Diagnostic::new(
        DiagnosticCode::I001Summary,
        format!(
            "{} lab sheet(s), {} session(s), {} conflict(s), {} row(s) dropped",
            sheets,
            layout.sessions,
            layout.timetable.conflicts.len(),
            layout.rejected.len()
        ),
    )
    .with_note(format!(
        "{} row(s) read, {} from other buildings, {} in unmapped rooms",
        layout.stats.total, layout.stats.other_building, layout.stats.unmapped
    ))
}

#[derive(Serialize)]
struct LabStats {
    lab: String,
    sessions: usize,
    occupied_slots: usize,
    conflicts: usize,
}

fn lab_stats(timetable: &Timetable) -> Vec<LabStats> {
    timetable
        .grids
        .iter()
        .map(|(lab, grid)| LabStats {
            lab: lab.clone(),
            sessions: grid.records().len(),
            occupied_slots: grid.occupied_slots(),
            conflicts: timetable.conflicts_for(lab).count(),
        })
        .collect()
}

/// Emit diagnostics in the requested format and decide the exit code
fn report_diagnostics(
    diagnostics: Vec<Diagnostic>,
    report: &ReportArgs,
    extra: serde_json::Value,
) -> Result<ExitCode> {
    match report.format {
        OutputFormat::Text => {
            let mut emitter = TerminalEmitter::new(std::io::stderr(), report.diagnostic_config());
            for diagnostic in diagnostics {
                emitter.emit(diagnostic);
            }
            Ok(emitter.exit_code())
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(report.diagnostic_config());
            for diagnostic in diagnostics {
                emitter.emit(diagnostic);
            }
            let exit = emitter.exit_code();
            let mut document = json!({
                "success": exit.is_success(),
                "diagnostics": emitter.to_json_value(),
            });
            if let (Some(doc), serde_json::Value::Object(fields)) = (document.as_object_mut(), extra) {
                doc.extend(fields);
            }
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(exit)
        }
    }
}

/// Write through a temp file in the target directory, then rename into place
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_generate(
    input: &InputArgs,
    output: &Path,
    report: &ReportArgs,
    no_summary: bool,
    no_warnings_sheet: bool,
) -> Result<ExitCode> {
    let layout = match load(input)? {
        Loaded::Ready(layout) => layout,
        Loaded::Fatal(diagnostic) => {
            report_diagnostics(vec![diagnostic], report, json!({}))?;
            return Ok(ExitCode::Failure);
        }
    };

    let mut diagnostics = layout.diagnostics();

    let mut renderer = SheetRenderer::new();
    if no_summary {
        renderer = renderer.no_summary();
    }
    if !no_warnings_sheet && !diagnostics.is_empty() {
        renderer = renderer.with_diagnostics(diagnostics.clone());
    }
    let rendered = renderer
        .render_report(&layout.timetable)
        .context("failed to render the timetable workbook")?;

    write_atomically(output, &rendered.bytes)?;
    debug!(output = %output.display(), bytes = rendered.bytes.len(), "workbook written");

    diagnostics.extend(rendered.failures.iter().map(|f| f.to_diagnostic()));
    diagnostics.push(
        summary(&layout, rendered.sheets.len()).with_note(format!("output: {}", output.display())),
    );

    report_diagnostics(
        diagnostics,
        report,
        json!({
            "output": output.display().to_string(),
            "sheets": rendered.sheets,
        }),
    )
}

fn cmd_check(input: &InputArgs, report: &ReportArgs) -> Result<ExitCode> {
    let layout = match load(input)? {
        Loaded::Ready(layout) => layout,
        Loaded::Fatal(diagnostic) => {
            report_diagnostics(vec![diagnostic], report, json!({}))?;
            return Ok(ExitCode::Failure);
        }
    };

    let mut diagnostics = layout.diagnostics();
    let rendered = SheetRenderer::new()
        .render_report(&layout.timetable)
        .context("failed to render the timetable workbook")?;
    diagnostics.extend(rendered.failures.iter().map(|f| f.to_diagnostic()));
    diagnostics.push(summary(&layout, rendered.sheets.len()));

    let stats = lab_stats(&layout.timetable);
    if report.format == OutputFormat::Text && !report.quiet {
        println!("{:<50} {:>8} {:>6} {:>10}", "Laboratorio", "Sesiones", "Horas", "Conflictos");
        for lab in &stats {
            println!(
                "{:<50} {:>8} {:>6} {:>10}",
                lab.lab, lab.sessions, lab.occupied_slots, lab.conflicts
            );
        }
    }

    report_diagnostics(diagnostics, report, json!({ "labs": stats }))
}

fn cmd_preview(input: &InputArgs, lab: Option<String>, width: usize) -> Result<ExitCode> {
    let layout = match load(input)? {
        Loaded::Ready(layout) => layout,
        Loaded::Fatal(diagnostic) => {
            let mut emitter = TerminalEmitter::new(std::io::stderr(), DiagnosticConfig::default());
            emitter.emit(diagnostic);
            return Ok(ExitCode::Failure);
        }
    };

    let mut renderer = TextRenderer::new().column_width(width);
    if let Some(lab) = lab {
        renderer = renderer.only_lab(lab);
    }
    let text = renderer.render(&layout.timetable)?;
    print!("{text}");
    Ok(ExitCode::Success)
}

fn cmd_init(path: &Path, force: bool) -> Result<ExitCode> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let content = Config::default()
        .to_toml_string()
        .context("failed to serialize the default configuration")?;
    write_atomically(path, content.as_bytes())?;

    println!("Created: {}", path.display());
    Ok(ExitCode::Success)
}
