//! Planning grid domain model.
//!
//! # Responsibility
//! - Define teachers, courses, units and the sparse assignment map.
//! - Keep the "non-positive hours are never stored" rule in one place.
//!
//! # Invariants
//! - `Assignments` never maps a teacher id to a non-positive or non-finite value.
//! - `Teacher::allowance` is finite and `>= 0`.
//! - A `Unit` is owned by exactly one `Course`; it has no independent lifecycle.
//!
//! # See also
//! - `service::plan_service` for state transitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable teacher identifier, unique within one snapshot.
pub type TeacherId = String;
/// Stable course identifier, unique within one snapshot.
pub type CourseId = String;
/// Stable unit identifier, unique within its owning course.
pub type UnitId = String;

/// A staff member with a maximum assignable hour budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    /// Maximum total assignable hours across every course.
    #[serde(deserialize_with = "deserialize_allowance")]
    pub allowance: f64,
}

impl Teacher {
    /// Creates a teacher with a caller-provided id.
    ///
    /// Negative or non-finite allowances are normalized to `0`.
    pub fn new(id: impl Into<TeacherId>, name: impl Into<String>, allowance: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            allowance: normalize_allowance(allowance),
        }
    }
}

/// Sparse teacher id -> hours map for one unit.
///
/// Entries are only ever written through [`Assignments::set_or_clear`], so a
/// stored value is always strictly positive. Deserialization drops entries
/// that violate this rule instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<TeacherId, f64>", into = "BTreeMap<TeacherId, f64>")]
pub struct Assignments {
    hours: BTreeMap<TeacherId, f64>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `teacher_id` to `hours` when positive, otherwise removes it.
    ///
    /// Returns `true` when an entry is present after the call.
    pub fn set_or_clear(&mut self, teacher_id: &str, hours: f64) -> bool {
        if is_assignable(hours) {
            self.hours.insert(teacher_id.to_string(), hours);
            true
        } else {
            self.hours.remove(teacher_id);
            false
        }
    }

    /// Removes one teacher entry. Returns the removed hours, if any.
    pub fn remove(&mut self, teacher_id: &str) -> Option<f64> {
        self.hours.remove(teacher_id)
    }

    pub fn get(&self, teacher_id: &str) -> Option<f64> {
        self.hours.get(teacher_id).copied()
    }

    pub fn contains(&self, teacher_id: &str) -> bool {
        self.hours.contains_key(teacher_id)
    }

    pub fn clear(&mut self) {
        self.hours.clear();
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Iterates `(teacher_id, hours)` pairs in teacher id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.hours.iter().map(|(id, hours)| (id.as_str(), *hours))
    }

    /// Sum of every stored hour value.
    pub fn total(&self) -> f64 {
        self.hours.values().sum()
    }
}

impl From<BTreeMap<TeacherId, f64>> for Assignments {
    fn from(value: BTreeMap<TeacherId, f64>) -> Self {
        let hours = value
            .into_iter()
            .filter(|(_, hours)| is_assignable(*hours))
            .collect();
        Self { hours }
    }
}

impl From<Assignments> for BTreeMap<TeacherId, f64> {
    fn from(value: Assignments) -> Self {
        value.hours
    }
}

impl<const N: usize> From<[(&str, f64); N]> for Assignments {
    fn from(value: [(&str, f64); N]) -> Self {
        let mut assignments = Self::new();
        for (teacher_id, hours) in value {
            assignments.set_or_clear(teacher_id, hours);
        }
        assignments
    }
}

/// A subdivision of a course to which teaching hours are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    #[serde(default)]
    pub assignments: Assignments,
}

impl Unit {
    pub fn new(id: impl Into<UnitId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            assignments: Assignments::new(),
        }
    }

    /// Builder-style helper used by seed data and tests.
    pub fn with_assignments(mut self, assignments: impl Into<Assignments>) -> Self {
        self.assignments = assignments.into();
        self
    }
}

/// A top-level program of study composed of ordered units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Optional budget used to flag over-assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_hours: Option<f64>,
    /// Insertion order is display order.
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl Course {
    pub fn new(id: impl Into<CourseId>, name: impl Into<String>, target_hours: Option<f64>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_hours: normalize_target_hours(target_hours),
            units: Vec::new(),
        }
    }

    pub fn with_units(mut self, units: Vec<Unit>) -> Self {
        self.units = units;
        self
    }

    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == unit_id)
    }
}

/// Full teacher + course state for one user at a point in time.
///
/// Stored as `{teachers, courses}` JSON under the user's data key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl PlanSnapshot {
    pub fn new(teachers: Vec<Teacher>, courses: Vec<Course>) -> Self {
        Self { teachers, courses }
    }

    /// Returns whether the snapshot holds no teachers and no courses.
    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty() && self.courses.is_empty()
    }

    pub fn teacher(&self, teacher_id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|teacher| teacher.id == teacher_id)
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == course_id)
    }

    pub fn unit(&self, course_id: &str, unit_id: &str) -> Option<&Unit> {
        self.course(course_id).and_then(|course| course.unit(unit_id))
    }

    /// Total number of assignment entries across every unit.
    pub fn assignment_count(&self) -> usize {
        self.courses
            .iter()
            .flat_map(|course| course.units.iter())
            .map(|unit| unit.assignments.len())
            .sum()
    }
}

/// Returns whether `hours` may be stored as an assignment value.
pub fn is_assignable(hours: f64) -> bool {
    hours.is_finite() && hours > 0.0
}

pub(crate) fn normalize_allowance(allowance: f64) -> f64 {
    if allowance.is_finite() && allowance > 0.0 {
        allowance
    } else {
        0.0
    }
}

pub(crate) fn normalize_target_hours(target_hours: Option<f64>) -> Option<f64> {
    target_hours
        .filter(|hours| hours.is_finite())
        .map(|hours| hours.max(0.0))
}

fn deserialize_allowance<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(normalize_allowance(raw))
}
