//! Plan mutation use-case service.
//!
//! # Responsibility
//! - Provide every teacher/course/unit/assignment state transition.
//! - Generate fresh entity ids through an injected `IdGenerator`.
//!
//! # Invariants
//! - Every operation takes the current snapshot by reference and returns a
//!   new snapshot; the input is never modified.
//! - Operations are total. Unknown ids are silent no-ops that return an
//!   unchanged copy.
//! - Deleting a teacher removes that teacher's entries from every unit.

use crate::model::plan::{
    normalize_allowance, normalize_target_hours, Course, PlanSnapshot, Teacher, Unit,
};
use crate::service::ids::{IdGenerator, IdKind, UuidIdGenerator};

/// Mutation API over plan snapshots.
pub struct PlanService<G: IdGenerator = UuidIdGenerator> {
    ids: G,
}

impl Default for PlanService<UuidIdGenerator> {
    fn default() -> Self {
        Self::new(UuidIdGenerator)
    }
}

impl<G: IdGenerator> PlanService<G> {
    /// Creates a service using the provided id generator.
    pub fn new(ids: G) -> Self {
        Self { ids }
    }

    /// Appends a teacher with a fresh id.
    ///
    /// Empty names are accepted; callers validate before calling.
    pub fn add_teacher(&self, snapshot: &PlanSnapshot, name: &str, allowance: f64) -> PlanSnapshot {
        let mut next = snapshot.clone();
        next.teachers.push(Teacher::new(
            self.ids.next_id(IdKind::Teacher),
            name,
            allowance,
        ));
        next
    }

    /// Replaces name and allowance of one teacher.
    pub fn update_teacher(
        &self,
        snapshot: &PlanSnapshot,
        teacher_id: &str,
        name: &str,
        allowance: f64,
    ) -> PlanSnapshot {
        let mut next = snapshot.clone();
        if let Some(teacher) = next.teachers.iter_mut().find(|t| t.id == teacher_id) {
            teacher.name = name.to_string();
            teacher.allowance = normalize_allowance(allowance);
        }
        next
    }

    /// Removes one teacher and every assignment entry keyed by its id.
    pub fn delete_teacher(&self, snapshot: &PlanSnapshot, teacher_id: &str) -> PlanSnapshot {
        let mut next = snapshot.clone();
        next.teachers.retain(|teacher| teacher.id != teacher_id);
        for unit in next
            .courses
            .iter_mut()
            .flat_map(|course| course.units.iter_mut())
        {
            unit.assignments.remove(teacher_id);
        }
        next
    }

    /// Appends a course with a fresh id and no units.
    pub fn add_course(
        &self,
        snapshot: &PlanSnapshot,
        name: &str,
        target_hours: Option<f64>,
    ) -> PlanSnapshot {
        let mut next = snapshot.clone();
        next.courses.push(Course::new(
            self.ids.next_id(IdKind::Course),
            name,
            target_hours,
        ));
        next
    }

    /// Replaces name and target hours of one course.
    pub fn update_course(
        &self,
        snapshot: &PlanSnapshot,
        course_id: &str,
        name: &str,
        target_hours: Option<f64>,
    ) -> PlanSnapshot {
        let mut next = snapshot.clone();
        if let Some(course) = find_course(&mut next, course_id) {
            course.name = name.to_string();
            course.target_hours = normalize_target_hours(target_hours);
        }
        next
    }

    /// Removes one course together with its units and assignments.
    pub fn delete_course(&self, snapshot: &PlanSnapshot, course_id: &str) -> PlanSnapshot {
        let mut next = snapshot.clone();
        next.courses.retain(|course| course.id != course_id);
        next
    }

    /// Appends a unit with a fresh id to one course.
    pub fn add_unit(&self, snapshot: &PlanSnapshot, course_id: &str, name: &str) -> PlanSnapshot {
        let mut next = snapshot.clone();
        if let Some(course) = find_course(&mut next, course_id) {
            course
                .units
                .push(Unit::new(self.ids.next_id(IdKind::Unit), name));
        }
        next
    }

    /// Renames one unit.
    pub fn update_unit(
        &self,
        snapshot: &PlanSnapshot,
        course_id: &str,
        unit_id: &str,
        name: &str,
    ) -> PlanSnapshot {
        let mut next = snapshot.clone();
        if let Some(unit) = find_unit(&mut next, course_id, unit_id) {
            unit.name = name.to_string();
        }
        next
    }

    /// Removes one unit from its course.
    pub fn delete_unit(
        &self,
        snapshot: &PlanSnapshot,
        course_id: &str,
        unit_id: &str,
    ) -> PlanSnapshot {
        let mut next = snapshot.clone();
        if let Some(course) = find_course(&mut next, course_id) {
            course.units.retain(|unit| unit.id != unit_id);
        }
        next
    }

    /// Sets or clears one assignment.
    ///
    /// # Contract
    /// - `hours > 0` stores (overwrites) the value.
    /// - `hours <= 0` (or non-finite) removes the entry if present.
    /// - The teacher id is not checked against the teacher list.
    pub fn update_assignment(
        &self,
        snapshot: &PlanSnapshot,
        course_id: &str,
        unit_id: &str,
        teacher_id: &str,
        hours: f64,
    ) -> PlanSnapshot {
        let mut next = snapshot.clone();
        if let Some(unit) = find_unit(&mut next, course_id, unit_id) {
            unit.assignments.set_or_clear(teacher_id, hours);
        }
        next
    }

    /// Empties every unit's assignments across every course.
    pub fn clear_all_assignments(&self, snapshot: &PlanSnapshot) -> PlanSnapshot {
        let mut next = snapshot.clone();
        for unit in next
            .courses
            .iter_mut()
            .flat_map(|course| course.units.iter_mut())
        {
            unit.assignments.clear();
        }
        next
    }
}

fn find_course<'a>(snapshot: &'a mut PlanSnapshot, course_id: &str) -> Option<&'a mut Course> {
    snapshot
        .courses
        .iter_mut()
        .find(|course| course.id == course_id)
}

fn find_unit<'a>(
    snapshot: &'a mut PlanSnapshot,
    course_id: &str,
    unit_id: &str,
) -> Option<&'a mut Unit> {
    find_course(snapshot, course_id)?
        .units
        .iter_mut()
        .find(|unit| unit.id == unit_id)
}
