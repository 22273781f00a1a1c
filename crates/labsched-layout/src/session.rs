//! Session coalescing.
//!
//! Occupancy reports commonly carry one row per booked hour. One-hour rows
//! of the same class (lab, day, subject, group, project, instructor) on
//! consecutive hours are joined into a single record so the class renders
//! as one merged block. Rows that already span several hours are separate
//! bookings and are never joined, even when they touch. Overlapping rows are
//! left alone: they are a real double booking and must show up as a conflict.

use labsched_core::{Day, NormalizedRecord};
use std::collections::HashMap;

type SessionKey = (String, Day, String, String, String, String);

/// Join consecutive one-hour records of the same class.
///
/// The joined record keeps the enrollment of its earliest slot and lists
/// every source row. Output is ordered by first source row.
pub fn coalesce(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let mut order: Vec<Vec<NormalizedRecord>> = Vec::new();
    let mut index: HashMap<SessionKey, usize> = HashMap::new();

    for record in records {
        let (lab, day, subject, group, project, instructor) = record.session_key();
        let key = (
            lab.to_string(),
            day,
            subject.to_string(),
            group.to_string(),
            project.to_string(),
            instructor.to_string(),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            order.push(Vec::new());
            order.len() - 1
        });
        order[slot].push(record);
    }

    let mut merged: Vec<NormalizedRecord> = order.into_iter().flat_map(merge_group).collect();
    merged.sort_by_key(NormalizedRecord::first_row);
    merged
}

fn merge_group(mut group: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    group.sort_by_key(|r| (r.span.start, r.first_row()));

    // (record, built only from one-hour rows)
    let mut out: Vec<(NormalizedRecord, bool)> = Vec::with_capacity(group.len());
    for record in group {
        let hourly = record.span.len() == 1;
        match out.last_mut() {
            Some((last, true)) if hourly && last.span.is_followed_by(&record.span) => {
                last.span.end = record.span.end;
                last.source_rows.extend(record.source_rows);
                last.source_rows.sort_unstable();
            }
            _ => out.push((record, hourly)),
        }
    }
    out.into_iter().map(|(record, _)| record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsched_core::SlotSpan;
    use pretty_assertions::assert_eq;

    fn hour(row: usize, subject: &str, hours: &str) -> NormalizedRecord {
        NormalizedRecord {
            lab: "GEIO (321) TECHNE".into(),
            day: Day::Monday,
            span: SlotSpan::parse(hours).unwrap(),
            subject: subject.into(),
            group: "A1".into(),
            project: "Producción".into(),
            instructor: "Ana".into(),
            enrolled: 20,
            period: "2025-1".into(),
            room: "LABORATORIO GEIO CAP(25)".into(),
            source_rows: vec![row],
        }
    }

    #[test]
    fn joins_consecutive_hours() {
        let merged = coalesce(vec![
            hour(2, "Simulación", "6AM-7AM"),
            hour(3, "Simulación", "7AM-8AM"),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].span, SlotSpan::parse("6:00-8:00").unwrap());
        assert_eq!(merged[0].source_rows, vec![2, 3]);
    }

    #[test]
    fn joins_out_of_order_rows() {
        let merged = coalesce(vec![
            hour(5, "Simulación", "8AM-9AM"),
            hour(2, "Simulación", "6AM-7AM"),
            hour(3, "Simulación", "7AM-8AM"),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].span, SlotSpan::parse("6:00-9:00").unwrap());
        assert_eq!(merged[0].source_rows, vec![2, 3, 5]);
    }

    #[test]
    fn gaps_and_other_classes_stay_apart() {
        let merged = coalesce(vec![
            hour(2, "Simulación", "6AM-7AM"),
            hour(3, "Simulación", "8AM-9AM"),
            hour(4, "Logística", "7AM-8AM"),
        ]);

        assert_eq!(merged.len(), 3);
        let rows: Vec<_> = merged.iter().map(|r| r.first_row()).collect();
        assert_eq!(rows, vec![2, 3, 4]);
    }

    #[test]
    fn overlapping_rows_are_not_joined() {
        let merged = coalesce(vec![
            hour(2, "Simulación", "6:00-8:00"),
            hour(3, "Simulación", "7:00-9:00"),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn multi_hour_bookings_are_not_joined() {
        let merged = coalesce(vec![
            hour(2, "Simulación", "6:00-8:00"),
            hour(3, "Simulación", "8:00-10:00"),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].span, SlotSpan::parse("6:00-8:00").unwrap());
        assert_eq!(merged[1].span, SlotSpan::parse("8:00-10:00").unwrap());
    }

    #[test]
    fn hourly_row_does_not_extend_a_multi_hour_booking() {
        let merged = coalesce(vec![
            hour(2, "Simulación", "6:00-8:00"),
            hour(3, "Simulación", "8AM-9AM"),
            hour(4, "Simulación", "9AM-10AM"),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source_rows, vec![2]);
        assert_eq!(merged[1].span, SlotSpan::parse("8:00-10:00").unwrap());
        assert_eq!(merged[1].source_rows, vec![3, 4]);
    }

    #[test]
    fn different_days_are_not_joined() {
        let mut tuesday = hour(3, "Simulación", "7AM-8AM");
        tuesday.day = Day::Tuesday;
        let merged = coalesce(vec![hour(2, "Simulación", "6AM-7AM"), tuesday]);
        assert_eq!(merged.len(), 2);
    }
}
