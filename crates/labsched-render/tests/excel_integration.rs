//! Integration tests for Excel rendering, read back through calamine

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use labsched_core::{Config, Day, OccupancyRecord, Renderer};
use labsched_layout::lay_out;
use labsched_render::SheetRenderer;
use pretty_assertions::assert_eq;

const GEIO: &str = "GEIO (321) TECHNE";

fn row(n: usize, room: &str, day: &str, hour: &str, subject: &str) -> OccupancyRecord {
    OccupancyRecord::new(n)
        .day(day)
        .hour(hour)
        .subject(subject)
        .group("A1")
        .room(room)
        .building("TECHNE")
        .enrolled("20")
}

fn report() -> Vec<OccupancyRecord> {
    vec![
        row(2, "LABORATORIO GEIO CAP(25)", "Martes", "6:00-8:00", "Simulación"),
        row(3, "LABORATORIO GEIO CAP(25)", "Miércoles", "14:00-16:00", "Logística")
            .instructor("Ana Pérez"),
        row(4, "LABORATORIO GEIO CAP(25)", "Miércoles", "15:00-16:00", "Calidad"),
        row(5, "LABORATORIO FMS CAP(18)", "Lunes", "7AM-8AM", "Manufactura"),
        row(6, "LABORATORIO GEIO CAP(25)", "Jueves", "hora rota", "Descartada"),
    ]
}

fn open(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs(Cursor::new(bytes)).unwrap()
}

fn text(range: &Range<Data>, row: u32, col: u32) -> String {
    range
        .get_value((row, col))
        .map(|d| d.to_string())
        .unwrap_or_default()
}

#[test]
fn one_sheet_per_lab_plus_summary() {
    let layout = lay_out(&Config::default(), &report());
    let bytes = SheetRenderer::new().render(&layout.timetable).unwrap();
    let workbook = open(bytes);

    assert_eq!(
        workbook.sheet_names(),
        vec!["FMS-200 (320) TECHNE", GEIO, "Resumen"]
    );
}

#[test]
fn geio_sheet_layout() {
    let layout = lay_out(&Config::default(), &report());
    let bytes = SheetRenderer::new().render(&layout.timetable).unwrap();
    let mut workbook = open(bytes);
    let range = workbook.worksheet_range(GEIO).unwrap();

    assert_eq!(text(&range, 0, 0), GEIO);
    assert_eq!(text(&range, 1, 0), "Hora");
    assert_eq!(text(&range, 1, 1), "LUNES");
    assert_eq!(text(&range, 1, 6), "SABADO");
    assert_eq!(text(&range, 2, 0), "6AM-7AM");
    assert_eq!(text(&range, 8, 0), "12M-1PM");

    // Tuesday 6-8 is one merged block: text on the first row only
    assert_eq!(text(&range, 2, 2), "Simulación / A1 / 20");
    assert_eq!(text(&range, 3, 2), "");
    assert_eq!(text(&range, 4, 2), "");

    assert_eq!(text(&range, 19, 0), "Asignatura / Grupo / Inscritos — Docente");
}

#[test]
fn conflicts_are_visible_in_the_sheet() {
    let layout = lay_out(&Config::default(), &report());
    let bytes = SheetRenderer::new().render(&layout.timetable).unwrap();
    let mut workbook = open(bytes);
    let range = workbook.worksheet_range(GEIO).unwrap();

    // Wednesday 14:00 holds Logística alone, 15:00 holds both bookings
    assert_eq!(text(&range, 2 + 8, 3), "Logística / A1 / 20\nAna Pérez");
    assert_eq!(
        text(&range, 2 + 9, 3),
        "CONFLICTO\nLogística / A1 / 20\nAna Pérez\nCalidad / A1 / 20"
    );
}

#[test]
fn summary_sheet_counts_sessions_and_conflicts() {
    let layout = lay_out(&Config::default(), &report());
    let bytes = SheetRenderer::new().render(&layout.timetable).unwrap();
    let mut workbook = open(bytes);
    let range = workbook.worksheet_range("Resumen").unwrap();

    assert_eq!(text(&range, 0, 0), "Laboratorio");
    assert_eq!(text(&range, 1, 0), "FMS-200 (320) TECHNE");
    assert_eq!(text(&range, 2, 0), GEIO);
    assert_eq!(range.get_value((2, 2)), Some(&Data::Float(3.0)));
    assert_eq!(range.get_value((2, 3)), Some(&Data::Float(4.0)));
    assert_eq!(range.get_value((2, 4)), Some(&Data::Float(1.0)));
    assert_eq!(text(&range, 3, 0), "TOTAL");
}

#[test]
fn diagnostics_sheet_lists_rejections_and_conflicts() {
    let layout = lay_out(&Config::default(), &report());
    let bytes = SheetRenderer::new()
        .with_diagnostics(layout.diagnostics())
        .render(&layout.timetable)
        .unwrap();
    let mut workbook = open(bytes);
    let range = workbook.worksheet_range("Avisos").unwrap();

    assert_eq!(text(&range, 0, 0), "Código");
    assert_eq!(text(&range, 1, 0), "W001");
    assert_eq!(range.get_value((1, 2)), Some(&Data::Float(6.0)));
    assert_eq!(text(&range, 2, 0), "W005");
    assert_eq!(text(&range, 2, 3), GEIO);
}

#[test]
fn failed_lab_is_reported_and_others_still_written() {
    let mut rows = report();
    rows.push(row(7, "LABORATORIO HAS CAP(22)", "Viernes", "10:00-11:00", &"x".repeat(40_000)));
    let layout = lay_out(&Config::default(), &rows);

    let result = SheetRenderer::new()
        .with_diagnostics(layout.diagnostics())
        .render_report(&layout.timetable)
        .unwrap();

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].lab, "HAS-200 (317) TECHNE");
    assert_eq!(result.sheets, vec!["FMS-200 (320) TECHNE", GEIO]);

    let mut workbook = open(result.bytes);
    assert!(!workbook.sheet_names().contains(&"HAS-200 (317) TECHNE".to_string()));

    let avisos = workbook.worksheet_range("Avisos").unwrap();
    let codes: Vec<String> = (1..avisos.height() as u32).map(|r| text(&avisos, r, 0)).collect();
    assert!(codes.contains(&"W006".to_string()));

    let resumen = workbook.worksheet_range("Resumen").unwrap();
    assert_eq!(text(&resumen, 3, 0), "HAS-200 (317) TECHNE");
    assert_eq!(text(&resumen, 3, 1), "(omitida)");
}

#[test]
fn configured_days_and_hours_shape_the_grid() {
    let config = Config {
        days: vec![Day::Monday, Day::Tuesday],
        first_hour: 7,
        last_hour: 12,
        ..Config::default()
    };
    let rows = vec![row(2, "LABORATORIO FMS CAP(18)", "Lunes", "7AM-8AM", "Manufactura")];
    let layout = lay_out(&config, &rows);
    let bytes = SheetRenderer::new().no_summary().render(&layout.timetable).unwrap();
    let mut workbook = open(bytes);

    assert_eq!(workbook.sheet_names(), vec!["FMS-200 (320) TECHNE"]);
    let range = workbook.worksheet_range("FMS-200 (320) TECHNE").unwrap();
    assert_eq!(text(&range, 1, 2), "MARTES");
    assert_eq!(text(&range, 1, 3), "");
    assert_eq!(text(&range, 2, 0), "7AM-8AM");
    assert_eq!(text(&range, 6, 0), "11AM-12M");
    assert_eq!(text(&range, 2, 1), "Manufactura / A1 / 20");
}

#[test]
fn empty_input_yields_summary_only_workbook() {
    let layout = lay_out(&Config::default(), &[]);
    let bytes = SheetRenderer::new().no_summary().render(&layout.timetable).unwrap();
    let mut workbook = open(bytes);

    assert_eq!(workbook.sheet_names(), vec!["Resumen"]);
    let range = workbook.worksheet_range("Resumen").unwrap();
    assert_eq!(text(&range, 1, 0), "Sin datos para los laboratorios configurados");
}
