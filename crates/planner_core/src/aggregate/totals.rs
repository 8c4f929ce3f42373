//! Derived hour totals over a plan snapshot.
//!
//! # Responsibility
//! - Sum assignment hours per teacher, per course and per unit.
//! - Derive remaining allowance and over-budget flags.
//!
//! # Invariants
//! - Every function is pure and recomputes from scratch.
//! - Teacher ids found only inside assignments are ignored by
//!   `teacher_totals`, but still count toward course and unit totals.
//! - No clamping: a negative remaining allowance is reported as-is.

use crate::model::plan::{Course, Teacher, TeacherId, Unit};
use std::collections::BTreeMap;

/// Tolerance used when comparing summed hour values.
pub const HOURS_EPSILON: f64 = 1e-9;

/// Maps every known teacher id to its summed assigned hours.
///
/// Teachers without assignments map to `0.0`.
pub fn teacher_totals(teachers: &[Teacher], courses: &[Course]) -> BTreeMap<TeacherId, f64> {
    let mut totals: BTreeMap<TeacherId, f64> = teachers
        .iter()
        .map(|teacher| (teacher.id.clone(), 0.0))
        .collect();

    for unit in courses.iter().flat_map(|course| course.units.iter()) {
        for (teacher_id, hours) in unit.assignments.iter() {
            if let Some(total) = totals.get_mut(teacher_id) {
                *total += hours;
            }
        }
    }

    totals
}

/// Remaining allowance for one teacher given precomputed totals.
///
/// A teacher missing from `totals` is treated as having nothing assigned.
pub fn remaining(teacher: &Teacher, totals: &BTreeMap<TeacherId, f64>) -> f64 {
    teacher.allowance - totals.get(&teacher.id).copied().unwrap_or(0.0)
}

/// Sum of every assignment value across the course's units.
pub fn course_assigned(course: &Course) -> f64 {
    course.units.iter().map(unit_assigned).sum()
}

/// `true` iff the course has a target and its assigned hours exceed it.
pub fn is_over_budget(course: &Course) -> bool {
    match course.target_hours {
        Some(target) => course_assigned(course) > target + HOURS_EPSILON,
        None => false,
    }
}

/// Sum of one unit's assignment values.
pub fn unit_assigned(unit: &Unit) -> f64 {
    unit.assignments.total()
}

/// Rounds to the one-decimal display convention.
pub fn round_display(hours: f64) -> f64 {
    // `+ 0.0` folds negative zero so small overdrafts never print as "-0.0".
    (hours * 10.0).round() / 10.0 + 0.0
}

/// Formats hours with exactly one decimal place.
pub fn format_hours(hours: f64) -> String {
    format!("{:.1}", round_display(hours))
}

/// Epsilon comparison for summed hour values.
pub fn hours_eq(left: f64, right: f64) -> bool {
    (left - right).abs() <= HOURS_EPSILON * left.abs().max(right.abs()).max(1.0)
}
