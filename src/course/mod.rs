//! Course graph extraction from a course-design XML export.
//!
//! Courses named `<root>.1`, `<root>.2`, ... are the problems of station
//! `<root>`. For each problem we locate the first normal control reachable
//! from the course start and derive where its circle lands on the printed
//! page, and which page that is.

pub mod error;
pub mod extract;
mod index;

pub use error::ExtractError;
pub use extract::extract_course_layout;

use serde::Serialize;

/// One printed circle for a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// Circle centre in cm, origin at the bottom-left of the print area.
    pub x: f64,
    pub y: f64,
    /// 1-based page in the combined course PDF.
    pub page: usize,
    /// Non-normal controls (start, crossing points, ...) before the circle.
    pub controls_skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedStation {
    /// Course-name root, e.g. `Start` for `Start.1`.
    pub name: String,
    /// Declared order value of the `.1` course.
    pub order: i64,
    /// Print scale shared by every problem of the station.
    pub print_scale: f64,
    pub problems: Vec<Problem>,
}

impl ExtractedStation {
    pub fn num_problems(&self) -> usize {
        self.problems.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseLayout {
    /// Scale of the underlying map file.
    pub map_scale: f64,
    /// Stations in ascending order of their first course's order value.
    pub stations: Vec<ExtractedStation>,
}
