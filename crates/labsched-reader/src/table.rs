//! In-memory table and column resolution.

use labsched_core::{fold_text, OccupancyRecord};

use crate::ReadError;

/// Columns of the occupancy report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Period,
    Day,
    Hour,
    Subject,
    Group,
    Project,
    Room,
    Area,
    Building,
    Campus,
    Enrolled,
    Instructor,
}

impl Column {
    /// All required columns, in report order
    pub const ALL: [Column; 12] = [
        Column::Period,
        Column::Day,
        Column::Hour,
        Column::Subject,
        Column::Group,
        Column::Project,
        Column::Room,
        Column::Area,
        Column::Building,
        Column::Campus,
        Column::Enrolled,
        Column::Instructor,
    ];

    /// Header text as it appears in the report
    pub const fn header(self) -> &'static str {
        match self {
            Column::Period => "Periodo",
            Column::Day => "Día",
            Column::Hour => "Hora",
            Column::Subject => "Asignatura",
            Column::Group => "Grupo",
            Column::Project => "Proyecto",
            Column::Room => "Salón",
            Column::Area => "Área",
            Column::Building => "Edificio",
            Column::Campus => "Sede",
            Column::Enrolled => "Inscritos",
            Column::Instructor => "Docente",
        }
    }
}

/// Header row plus data rows, all as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based sheet row of the first data row
    pub first_row: usize,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            first_row: 2,
        }
    }

    /// Locate every required column.
    ///
    /// Headers match ignoring case, accents and surrounding whitespace;
    /// order and extra columns do not matter. All missing columns are
    /// reported together.
    pub fn column_indices(&self) -> Result<[usize; 12], ReadError> {
        let folded: Vec<String> = self.headers.iter().map(|h| fold_text(h)).collect();

        let mut indices = [0usize; 12];
        let mut missing = Vec::new();
        for (slot, column) in indices.iter_mut().zip(Column::ALL) {
            let wanted = fold_text(column.header());
            match folded.iter().position(|h| *h == wanted) {
                Some(index) => *slot = index,
                None => missing.push(column.header().to_string()),
            }
        }

        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(ReadError::MissingColumn(missing))
        }
    }

    /// Convert data rows into occupancy records.
    ///
    /// Fails before looking at any row if a column is missing. Rows with
    /// every cell blank are skipped.
    pub fn records(&self) -> Result<Vec<OccupancyRecord>, ReadError> {
        let idx = self.column_indices()?;

        let records = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|(offset, row)| {
                let field = |column: Column| {
                    row.get(idx[column as usize]).cloned().unwrap_or_default()
                };
                OccupancyRecord {
                    row: self.first_row + offset,
                    period: field(Column::Period),
                    day: field(Column::Day),
                    hour: field(Column::Hour),
                    subject: field(Column::Subject),
                    group: field(Column::Group),
                    project: field(Column::Project),
                    room: field(Column::Room),
                    area: field(Column::Area),
                    building: field(Column::Building),
                    campus: field(Column::Campus),
                    enrolled: field(Column::Enrolled),
                    instructor: field(Column::Instructor),
                }
            })
            .collect();

        Ok(records)
    }
}
