//! # labsched-render
//!
//! Rendering backends for laid-out lab timetables.
//!
//! This crate provides:
//! - Excel schedule workbooks, one sheet per lab (for printing and posting)
//! - Plain-text previews (for the terminal)
//! - A backend-independent sheet plan shared by both
//!
//! ## Example
//!
//! ```rust,ignore
//! use labsched_core::Renderer;
//! use labsched_layout::lay_out;
//! use labsched_render::{SheetRenderer, TextRenderer};
//!
//! let layout = lay_out(&config, &rows);
//!
//! // Terminal preview
//! let preview = TextRenderer::new().render(&layout.timetable)?;
//! println!("{preview}");
//!
//! // Excel workbook, with a warnings sheet
//! let report = SheetRenderer::new()
//!     .with_diagnostics(layout.diagnostics())
//!     .render_report(&layout.timetable)?;
//! std::fs::write("HORARIO_LABORATORIOS.xlsx", report.bytes)?;
//! ```

pub mod excel;
pub mod plan;
pub mod text;

pub use excel::{sheet_name, LabFailure, Palette, SheetRenderer, SheetReport};
pub use plan::{plan_sheet, plan_timetable, Band, CellStyle, PlannedCell, SheetPlan};
pub use text::TextRenderer;
