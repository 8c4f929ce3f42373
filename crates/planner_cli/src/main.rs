//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `planner_core` linkage.
//! - Print the bundled sample plan's totals in a deterministic layout.

use planner_core::seed::sample_plan;
use planner_core::{format_hours, GridSummary};

fn main() {
    println!("planner_core ping={}", planner_core::ping());
    println!("planner_core version={}", planner_core::core_version());

    let summary = GridSummary::build(&sample_plan());
    for teacher in &summary.teachers {
        println!(
            "teacher={} allowance={} assigned={} left={}",
            teacher.name,
            format_hours(teacher.allowance),
            format_hours(teacher.assigned),
            format_hours(teacher.remaining)
        );
    }
    for course in &summary.courses {
        let target = course
            .target_hours
            .map(format_hours)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "course={} assigned={} target={} over_budget={}",
            course.name,
            format_hours(course.assigned),
            target,
            course.over_budget
        );
    }
}
