//! Report eligibility and per-class aggregation
//!
//! A class is report-eligible only when every slot has submitted at least
//! one attendance record for it; a class some slot has not yet covered is
//! left out entirely rather than reported half-empty. For each eligible
//! class the student counts are summed across all of its records and the
//! teacher names are resolved from the admins assigned to the contributing
//! slots.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use maktab_shared::models::admin::Admin;
use maktab_shared::models::attendance::AttendanceSummary;
use maktab_shared::models::class::Class;
use maktab_shared::models::slot::Slot;

/// Aggregated attendance for one report-eligible class
#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    /// The class being reported
    pub class: Class,

    /// Number of attendance records contributing to the totals
    pub record_count: usize,

    /// Sum of total students across all records
    pub total_students: i64,

    /// Sum of present counts
    pub students_present: i64,

    /// Sum of absent counts
    pub students_absent: i64,

    /// Sum of on-leave counts
    pub students_on_leave: i64,

    /// Admins assigned to the contributing slots, sorted by name
    pub teacher_names: Vec<String>,
}

/// Slot IDs that have submitted attendance for a class
fn covered_slots(class_id: Uuid, records: &[AttendanceSummary]) -> HashSet<Uuid> {
    records
        .iter()
        .filter(|record| record.class_id == class_id)
        .map(|record| record.slot_id)
        .collect()
}

/// Whether every slot has covered this class
pub fn is_eligible(class_id: Uuid, slots: &[Slot], records: &[AttendanceSummary]) -> bool {
    if slots.is_empty() {
        // Nothing can have contributed; an empty report section is useless.
        return false;
    }

    let covered = covered_slots(class_id, records);
    slots.iter().all(|slot| covered.contains(&slot.id))
}

/// Filters a class list down to the report-eligible ones
pub fn eligible_classes(
    classes: Vec<Class>,
    slots: &[Slot],
    records: &[AttendanceSummary],
) -> Vec<Class> {
    classes
        .into_iter()
        .filter(|class| is_eligible(class.id, slots, records))
        .collect()
}

/// Builds one [`ClassReport`] per eligible class
///
/// Classes keep their input order; ineligible ones are dropped.
pub fn summarize(
    classes: Vec<Class>,
    slots: &[Slot],
    admins: &[Admin],
    records: &[AttendanceSummary],
) -> Vec<ClassReport> {
    let mut by_slot: HashMap<Uuid, Vec<&str>> = HashMap::new();
    for admin in admins {
        if let Some(slot_id) = admin.assigned_slot_id {
            by_slot.entry(slot_id).or_default().push(&admin.username);
        }
    }

    eligible_classes(classes, slots, records)
        .into_iter()
        .map(|class| {
            let class_records: Vec<&AttendanceSummary> = records
                .iter()
                .filter(|record| record.class_id == class.id)
                .collect();

            let contributing: HashSet<Uuid> =
                class_records.iter().map(|record| record.slot_id).collect();

            let mut teacher_names: Vec<String> = contributing
                .iter()
                .filter_map(|slot_id| by_slot.get(slot_id))
                .flatten()
                .map(|name| name.to_string())
                .collect();
            teacher_names.sort();
            teacher_names.dedup();

            ClassReport {
                record_count: class_records.len(),
                total_students: class_records
                    .iter()
                    .map(|r| i64::from(r.total_students))
                    .sum(),
                students_present: class_records
                    .iter()
                    .map(|r| i64::from(r.students_present))
                    .sum(),
                students_absent: class_records
                    .iter()
                    .map(|r| i64::from(r.students_absent))
                    .sum(),
                students_on_leave: class_records
                    .iter()
                    .map(|r| i64::from(r.students_on_leave))
                    .sum(),
                teacher_names,
                class,
            }
        })
        .collect()
}
