//! Planning grid summary rows.
//!
//! Builds everything the grid header and course rows display from one
//! snapshot: allowance / assigned / left per teacher, assigned vs. target per
//! course, and a total per unit.

use super::totals::{course_assigned, is_over_budget, remaining, teacher_totals, unit_assigned};
use crate::model::plan::{CourseId, PlanSnapshot, TeacherId, UnitId};

/// Summary of one teacher column.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherSummary {
    pub id: TeacherId,
    pub name: String,
    pub allowance: f64,
    pub assigned: f64,
    /// `allowance - assigned`, negative when over-allocated.
    pub remaining: f64,
}

impl TeacherSummary {
    pub fn is_over_allocated(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Summary of one unit row.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub id: UnitId,
    pub name: String,
    pub assigned: f64,
}

/// Summary of one course header row and its units.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSummary {
    pub id: CourseId,
    pub name: String,
    pub assigned: f64,
    pub target_hours: Option<f64>,
    pub over_budget: bool,
    pub units: Vec<UnitSummary>,
}

/// Derived, read-only view of a whole snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSummary {
    /// Same order as `PlanSnapshot::teachers`.
    pub teachers: Vec<TeacherSummary>,
    /// Same order as `PlanSnapshot::courses`.
    pub courses: Vec<CourseSummary>,
}

impl GridSummary {
    /// Recomputes every summary row from scratch.
    pub fn build(snapshot: &PlanSnapshot) -> Self {
        let totals = teacher_totals(&snapshot.teachers, &snapshot.courses);

        let teachers = snapshot
            .teachers
            .iter()
            .map(|teacher| TeacherSummary {
                id: teacher.id.clone(),
                name: teacher.name.clone(),
                allowance: teacher.allowance,
                assigned: totals.get(&teacher.id).copied().unwrap_or(0.0),
                remaining: remaining(teacher, &totals),
            })
            .collect();

        let courses = snapshot
            .courses
            .iter()
            .map(|course| CourseSummary {
                id: course.id.clone(),
                name: course.name.clone(),
                assigned: course_assigned(course),
                target_hours: course.target_hours,
                over_budget: is_over_budget(course),
                units: course
                    .units
                    .iter()
                    .map(|unit| UnitSummary {
                        id: unit.id.clone(),
                        name: unit.name.clone(),
                        assigned: unit_assigned(unit),
                    })
                    .collect(),
            })
            .collect();

        Self { teachers, courses }
    }

    pub fn teacher(&self, teacher_id: &str) -> Option<&TeacherSummary> {
        self.teachers.iter().find(|row| row.id == teacher_id)
    }

    pub fn course(&self, course_id: &str) -> Option<&CourseSummary> {
        self.courses.iter().find(|row| row.id == course_id)
    }

    /// Teachers whose assigned hours exceed their allowance.
    pub fn over_allocated_teachers(&self) -> impl Iterator<Item = &TeacherSummary> {
        self.teachers.iter().filter(|row| row.is_over_allocated())
    }

    /// Courses whose assigned hours exceed their target.
    pub fn over_budget_courses(&self) -> impl Iterator<Item = &CourseSummary> {
        self.courses.iter().filter(|row| row.over_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::GridSummary;
    use crate::aggregate::totals::hours_eq;
    use crate::model::plan::{Course, PlanSnapshot, Teacher, Unit};

    #[test]
    fn build_keeps_snapshot_order_and_flags() {
        let snapshot = PlanSnapshot::new(
            vec![Teacher::new("NM", "NM", 3.0), Teacher::new("AB", "AB", 18.4)],
            vec![Course::new("c1", "Course", Some(4.0)).with_units(vec![
                Unit::new("u1", "One").with_assignments([("NM", 4.0)]),
                Unit::new("u2", "Two").with_assignments([("AB", 1.5)]),
            ])],
        );

        let summary = GridSummary::build(&snapshot);
        assert_eq!(summary.teachers[0].id, "NM");
        assert_eq!(summary.teachers[1].id, "AB");

        let over: Vec<_> = summary.over_allocated_teachers().map(|row| row.id.as_str()).collect();
        assert_eq!(over, vec!["NM"]);

        let course = summary.course("c1").unwrap();
        assert!(hours_eq(course.assigned, 5.5));
        assert!(course.over_budget);
        assert!(hours_eq(course.units[1].assigned, 1.5));
    }

    #[test]
    fn empty_snapshot_builds_empty_summary() {
        let summary = GridSummary::build(&PlanSnapshot::default());
        assert_eq!(summary, GridSummary::default());
    }
}
