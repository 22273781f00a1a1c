//! Per-lab weekly grid and the blocks derived from it for rendering.

use std::collections::BTreeMap;

use crate::time::{Day, SlotSpan, SlotWindow, TimeSlot, DAY_COUNT, SLOT_COUNT};
use crate::{LabName, NormalizedRecord, RecordId};

/// Contents of one (day, slot) position
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Empty,
    Single(RecordId),
    /// Two or more sessions booked into the same lab at the same time
    Conflicted(Vec<RecordId>),
}

impl Cell {
    fn insert(&mut self, id: RecordId) {
        *self = match std::mem::take(self) {
            Cell::Empty => Cell::Single(id),
            Cell::Single(existing) => Cell::Conflicted(vec![existing, id]),
            Cell::Conflicted(mut ids) => {
                ids.push(id);
                Cell::Conflicted(ids)
            }
        };
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// What a render block shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockContent {
    Empty,
    Session(RecordId),
    Conflict(Vec<RecordId>),
}

/// A rectangular run of cells drawn as one merged region
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderBlock {
    pub day: Day,
    pub span: SlotSpan,
    pub content: BlockContent,
}

/// A cell holding more than one booking
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub lab: LabName,
    pub day: Day,
    pub slot: TimeSlot,
    pub records: Vec<RecordId>,
}

/// Day × slot grid for one laboratory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleGrid {
    pub lab: LabName,
    records: Vec<NormalizedRecord>,
    cells: [[Cell; SLOT_COUNT]; DAY_COUNT],
}

impl ScheduleGrid {
    pub fn new(lab: impl Into<LabName>) -> Self {
        Self {
            lab: lab.into(),
            records: Vec::new(),
            cells: std::array::from_fn(|_| std::array::from_fn(|_| Cell::Empty)),
        }
    }

    /// Add a record and mark every slot of its span.
    ///
    /// Existing bookings are kept: an occupied cell becomes
    /// [`Cell::Conflicted`] instead of being overwritten.
    pub fn place(&mut self, record: NormalizedRecord) -> RecordId {
        let id = self.records.len();
        let row = &mut self.cells[record.day.index()];
        for slot in record.span.slots() {
            row[slot.index()].insert(id);
        }
        self.records.push(record);
        id
    }

    pub fn cell(&self, day: Day, slot: TimeSlot) -> &Cell {
        &self.cells[day.index()][slot.index()]
    }

    pub fn record(&self, id: RecordId) -> Option<&NormalizedRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Number of occupied (day, slot) positions
    pub fn occupied_slots(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// Every conflicted cell, once, in day then slot order
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for day in Day::ALL {
            for slot in TimeSlot::all() {
                if let Cell::Conflicted(ids) = self.cell(day, slot) {
                    conflicts.push(Conflict {
                        lab: self.lab.clone(),
                        day,
                        slot,
                        records: ids.clone(),
                    });
                }
            }
        }
        conflicts
    }

    /// Scan one day column and collapse it into render blocks.
    ///
    /// A maximal run of slots holding the same single record becomes one
    /// block. Empty and conflicted cells are always one-slot blocks.
    pub fn blocks(&self, day: Day, window: SlotWindow) -> Vec<RenderBlock> {
        let mut blocks = Vec::new();
        let mut run: Option<(RecordId, SlotSpan)> = None;

        let flush = |run: &mut Option<(RecordId, SlotSpan)>, blocks: &mut Vec<RenderBlock>| {
            if let Some((id, span)) = run.take() {
                blocks.push(RenderBlock {
                    day,
                    span,
                    content: BlockContent::Session(id),
                });
            }
        };

        for slot in window.slots() {
            match self.cell(day, slot) {
                Cell::Single(id) => {
                    if let Some((current, span)) = run.as_mut() {
                        if *current == *id {
                            span.end = slot;
                            continue;
                        }
                    }
                    flush(&mut run, &mut blocks);
                    run = Some((*id, SlotSpan::single(slot)));
                }
                Cell::Empty => {
                    flush(&mut run, &mut blocks);
                    blocks.push(RenderBlock {
                        day,
                        span: SlotSpan::single(slot),
                        content: BlockContent::Empty,
                    });
                }
                Cell::Conflicted(ids) => {
                    flush(&mut run, &mut blocks);
                    blocks.push(RenderBlock {
                        day,
                        span: SlotSpan::single(slot),
                        content: BlockContent::Conflict(ids.clone()),
                    });
                }
            }
        }
        flush(&mut run, &mut blocks);

        blocks
    }
}

/// The laid-out week for every lab, ready to render
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timetable {
    pub grids: BTreeMap<LabName, ScheduleGrid>,
    pub conflicts: Vec<Conflict>,
    /// Days to display, in order
    pub days: Vec<Day>,
    pub window: SlotWindow,
}

impl Timetable {
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn lab(&self, name: &str) -> Option<&ScheduleGrid> {
        self.grids.get(name)
    }

    /// Conflicts recorded for one lab
    pub fn conflicts_for<'a>(&'a self, lab: &'a str) -> impl Iterator<Item = &'a Conflict> + 'a {
        self.conflicts.iter().filter(move |c| c.lab == lab)
    }
}
