//! Bundled sample plan.
//!
//! Demo data for a fresh workspace: a computing department with seventeen
//! teacher slots and three courses. Used when
//! `PlannerConfig::seed_new_accounts` is enabled and by the CLI smoke probe.

use crate::model::plan::{Course, PlanSnapshot, Teacher, Unit};

const SAMPLE_TEACHERS: &[(&str, f64)] = &[
    ("AB", 18.4),
    ("AH", 23.0),
    ("AI", 23.0),
    ("AS", 23.0),
    ("FA", 9.0),
    ("GM", 23.0),
    ("IK", 13.0),
    ("JK", 23.0),
    ("MA", 23.0),
    ("MR", 23.0),
    ("NM", 3.0),
    ("PC", 18.4),
    ("RG", 23.0),
    ("SS", 23.0),
    ("V-TA", 23.0),
    ("VAC-2", 0.0),
    ("VAC-3", 0.0),
];

/// Returns the sample plan snapshot.
pub fn sample_plan() -> PlanSnapshot {
    let teachers = SAMPLE_TEACHERS
        .iter()
        .map(|(initials, allowance)| Teacher::new(*initials, *initials, *allowance))
        .collect();

    let courses = vec![
        Course::new("c1", "BTEC Level 2 - Gp1", Some(360.0)).with_units(vec![
            Unit::new("c1u1", "The Online World").with_assignments([("SS", 2.0)]),
            Unit::new("c1u2", "Technology Systems"),
            Unit::new("c1u3", "Digital Portfolio").with_assignments([("FA", 1.5)]),
            Unit::new("c1u4", "Spreadsheet Development"),
            Unit::new("c1u5", "Database Development").with_assignments([("JK", 1.5)]),
            Unit::new("c1u6", "Software Development").with_assignments([("RG", 2.0)]),
            Unit::new("c1u7", "Installing & Maintaining Hardware")
                .with_assignments([("AI", 2.0), ("SS", 2.0)]),
            Unit::new("c1u8", "Computer Networks").with_assignments([("IK", 1.0)]),
        ]),
        Course::new("c2", "AAQ - IT", Some(360.0)).with_units(vec![
            Unit::new("c2u1", "Information Technology Systems")
                .with_assignments([("AH", 4.0), ("MA", 4.0)]),
            Unit::new("c2u2", "Cybersecurity & Incident Management"),
            Unit::new("c2u3", "Website Development").with_assignments([("AB", 1.5)]),
            Unit::new("c2u4", "Relational Database Development")
                .with_assignments([("RG", 3.0), ("IK", 1.0)]),
        ]),
        Course::new("c3", "Other", None).with_units(vec![
            Unit::new("c3u1", "Lead IV").with_assignments([("FA", 3.0)]),
            Unit::new("c3u2", "FEYA").with_assignments([("AH", 2.0)]),
            Unit::new("c3u3", "Coordination").with_assignments([("GM", 2.0), ("MA", 2.0)]),
            Unit::new("c3u4", "Union").with_assignments([("AI", 2.0)]),
            Unit::new("c3u5", "Hackney WD L5").with_assignments([("AB", 5.0)]),
            Unit::new("c3u6", "Hackney SD L3").with_assignments([("PC", 6.0)]),
        ]),
    ];

    PlanSnapshot::new(teachers, courses)
}
