//! Extraction algorithm.
//!
//! Phases:
//! 1) Parse, read the map file scale and the document-wide print scale.
//! 2) Stage every course (name, kind, order) and rank the distinct order
//!    values; a course's page is its order's 1-based rank.
//! 3) For each `<root>.1` course, collect `<root>.2`, `<root>.3`, ... until
//!    the first gap, validating each and walking its control chain.
//!
//! Nothing is returned until every station has been read, so a failure
//! leaves the caller's station collection untouched.

use super::index::NodeIndex;
use super::{CourseLayout, ExtractError, ExtractedStation, Problem};
use crate::diagnostics;

use roxmltree::{Document, Node};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

const PROBLEM_SUFFIX_SEPARATOR: char = '.';
const FIRST_PROBLEM_SUFFIX: &str = ".1";

/// Course element plus the attributes every phase needs.
struct StagedCourse<'a, 'input> {
    node: Node<'a, 'input>,
    name: String,
    /// Raw `order` attribute, kept for error messages.
    raw_order: Option<&'a str>,
    /// Parsed order; `None` when absent or not an integer.
    order: Option<i64>,
}

/// Geometry shared by the problems of one station.
struct StationScale {
    map_file: f64,
    print: f64,
}

pub fn extract_course_layout(xml: &str) -> Result<CourseLayout, ExtractError> {
    let doc = Document::parse(xml)?;

    // Phase 1: scales.
    let map_scale = doc
        .descendants()
        .find(|n| n.has_tag_name("map"))
        .and_then(|n| n.attribute("scale"))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .ok_or(ExtractError::MapScale)?;

    let document_print_scale = doc
        .descendants()
        .find(|n| n.has_tag_name("all-controls"))
        .and_then(|n| positive_attribute(n, "print-scale"));

    // Phase 2: stage courses and rank order values.
    let courses = stage_courses(&doc)?;
    let pages = page_ranking(&courses);

    let mut by_name: HashMap<&str, &StagedCourse<'_, '_>> = HashMap::new();
    for course in &courses {
        by_name.entry(course.name.as_str()).or_insert(course);
    }

    let index = NodeIndex::build(&doc);

    // Phase 3: stations.
    let mut stations = Vec::new();
    for first in courses.iter().filter(|c| c.name.ends_with(FIRST_PROBLEM_SUFFIX)) {
        let root = &first.name[..first.name.len() - FIRST_PROBLEM_SUFFIX.len()];
        let station = read_station(
            root,
            first,
            &by_name,
            &pages,
            &index,
            map_scale,
            document_print_scale,
        )?;

        warn_on_gaps(root, station.num_problems(), &courses);
        stations.push(station);
    }

    if stations.is_empty() {
        return Err(ExtractError::NoStations);
    }

    // Stable, so equal orders keep document order.
    stations.sort_by_key(|s| s.order);

    info!(
        stations = stations.len(),
        courses = courses.len(),
        map_scale,
        "extracted course layout"
    );

    Ok(CourseLayout {
        map_scale,
        stations,
    })
}

fn stage_courses<'a, 'input>(
    doc: &'a Document<'input>,
) -> Result<Vec<StagedCourse<'a, 'input>>, ExtractError> {
    let mut out = Vec::new();
    for (position, node) in doc
        .descendants()
        .filter(|n| n.has_tag_name("course"))
        .enumerate()
    {
        let name = node
            .descendants()
            .find(|n| n.has_tag_name("name"))
            .map(|n| text_content(&n))
            .ok_or(ExtractError::MissingCourseName {
                position: position + 1,
            })?;

        let raw_order = node.attribute("order");
        let order = raw_order.and_then(|raw| raw.trim().parse::<i64>().ok());
        if let (Some(raw), None) = (raw_order, order) {
            diagnostics::warn(format!(
                "course {} has a non-numeric order {:?}; left out of page numbering",
                name, raw
            ));
        }

        out.push(StagedCourse {
            node,
            name,
            raw_order,
            order,
        });
    }
    Ok(out)
}

/// Sorted, deduplicated order values. Computed before any station is read
/// because every page number depends on the full set.
fn page_ranking(courses: &[StagedCourse]) -> Vec<i64> {
    courses
        .iter()
        .filter_map(|c| c.order)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn read_station<'a, 'input>(
    root: &str,
    first: &StagedCourse<'a, 'input>,
    by_name: &HashMap<&str, &StagedCourse<'a, 'input>>,
    pages: &[i64],
    index: &NodeIndex<'a, 'input>,
    map_scale: f64,
    document_print_scale: Option<f64>,
) -> Result<ExtractedStation, ExtractError> {
    let order = course_order(first)?;

    check_course_setup(first)?;
    let scale = StationScale {
        map_file: map_scale,
        print: effective_print_scale(first, document_print_scale, map_scale)?,
    };

    let mut problems = vec![read_problem(root, first, pages, index, &scale)?];

    loop {
        let next_name = format!("{}{}{}", root, PROBLEM_SUFFIX_SEPARATOR, problems.len() + 1);
        let Some(course) = by_name.get(next_name.as_str()) else {
            break;
        };

        check_course_setup(course)?;
        let print = effective_print_scale(course, document_print_scale, map_scale)?;
        if print != scale.print {
            return Err(ExtractError::ScaleMismatch {
                course: course.name.clone(),
                expected: scale.print,
                found: print,
            });
        }

        problems.push(read_problem(root, course, pages, index, &scale)?);
    }

    debug!(station = root, problems = problems.len(), "read station");

    Ok(ExtractedStation {
        name: root.to_string(),
        order,
        print_scale: scale.print,
        problems,
    })
}

/// Kind must be score; print area must exist, be manual and have no margin.
fn check_course_setup(course: &StagedCourse) -> Result<(), ExtractError> {
    if course.node.attribute("kind") != Some("score") {
        return Err(ExtractError::NotScore {
            course: course.name.clone(),
        });
    }

    let area = print_area(course)?;

    let margin = area
        .attribute("page-margins")
        .and_then(|m| m.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    if margin > 0.0 {
        return Err(ExtractError::NonZeroMargin {
            course: course.name.clone(),
        });
    }

    if area.attribute("automatic") == Some("true") {
        return Err(ExtractError::AutomaticPrintArea {
            course: course.name.clone(),
        });
    }

    Ok(())
}

fn print_area<'a, 'input>(
    course: &StagedCourse<'a, 'input>,
) -> Result<Node<'a, 'input>, ExtractError> {
    course
        .node
        .descendants()
        .find(|n| n.has_tag_name("print-area"))
        .ok_or_else(|| ExtractError::MissingPrintArea {
            course: course.name.clone(),
        })
}

/// Course's own print scale, else the document-wide one, else the map scale.
/// A course scale that is present but not a positive finite number is an
/// error rather than a silent fallback.
fn effective_print_scale(
    course: &StagedCourse,
    document_print_scale: Option<f64>,
    map_scale: f64,
) -> Result<f64, ExtractError> {
    let own = course
        .node
        .descendants()
        .find(|n| n.has_tag_name("options"))
        .filter(|n| n.has_attribute("print-scale"));

    match own {
        Some(options) => {
            let scale = numeric_attribute(course, options, "print-scale")?;
            if scale <= 0.0 {
                return Err(ExtractError::BadAttribute {
                    course: course.name.clone(),
                    attribute: "print-scale",
                    value: options.attribute("print-scale").unwrap_or_default().to_string(),
                });
            }
            Ok(scale)
        }
        None => Ok(document_print_scale.unwrap_or(map_scale)),
    }
}

fn read_problem<'a, 'input>(
    station: &str,
    course: &StagedCourse<'a, 'input>,
    pages: &[i64],
    index: &NodeIndex<'a, 'input>,
    scale: &StationScale,
) -> Result<Problem, ExtractError> {
    let area = print_area(course)?;
    let left = numeric_attribute(course, area, "left")?;
    let bottom = numeric_attribute(course, area, "bottom")?;

    let (control, controls_skipped) = first_normal_control(station, course, index)?;

    let location = control.descendants().find(|n| n.has_tag_name("location"));
    let coord = |axis: &str| {
        location
            .and_then(|l| l.attribute(axis))
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| ExtractError::MissingLocation {
                course: course.name.clone(),
                control: control.attribute("id").unwrap_or_default().to_string(),
            })
    };
    let x = coord("x")?;
    let y = coord("y")?;

    // Source units are tenths of a centimetre at map file scale.
    let ratio = scale.map_file / scale.print;
    let problem = Problem {
        x: 0.1 * (x - left) * ratio,
        y: 0.1 * (y - bottom) * ratio,
        page: page_number(course, pages)?,
        controls_skipped,
    };

    debug!(
        course = course.name.as_str(),
        x = problem.x,
        y = problem.y,
        page = problem.page,
        skipped = controls_skipped,
        "read problem"
    );

    Ok(problem)
}

fn page_number(course: &StagedCourse, pages: &[i64]) -> Result<usize, ExtractError> {
    let order = course_order(course)?;
    // Every staged order is in the ranking, so the search cannot miss.
    let rank = pages.binary_search(&order).unwrap_or_else(|pos| pos);
    Ok(rank + 1)
}

/// Follow `first` then `next` links until a control of kind `normal`.
///
/// Chains come from the design tool and are trusted to be acyclic.
fn first_normal_control<'a, 'input>(
    station: &str,
    course: &StagedCourse<'a, 'input>,
    index: &NodeIndex<'a, 'input>,
) -> Result<(Node<'a, 'input>, usize), ExtractError> {
    let broken = |element: &'static str, id: &str| ExtractError::BrokenReference {
        course: course.name.clone(),
        element,
        id: id.to_string(),
    };

    let mut link = course
        .node
        .descendants()
        .find(|n| n.has_tag_name("first"))
        .and_then(|n| n.attribute("course-control"))
        .ok_or_else(|| ExtractError::NoNormalControl {
            station: station.to_string(),
            course: course.name.clone(),
        })?;

    let mut skipped = 0usize;
    loop {
        let course_control = index
            .course_control(link)
            .ok_or_else(|| broken("course-control", link))?;
        let control_id = course_control.attribute("control").unwrap_or_default();
        let control = index
            .control(control_id)
            .ok_or_else(|| broken("control", control_id))?;

        if control.attribute("kind") == Some("normal") {
            return Ok((control, skipped));
        }

        debug!(
            course = course.name.as_str(),
            control = control_id,
            kind = control.attribute("kind").unwrap_or(""),
            "skipping non-normal control"
        );
        skipped += 1;

        link = course_control
            .descendants()
            .find(|n| n.has_tag_name("next"))
            .and_then(|n| n.attribute("course-control"))
            .ok_or_else(|| ExtractError::NoNormalControl {
                station: station.to_string(),
                course: course.name.clone(),
            })?;
    }
}

/// Courses such as `A.3` with no `A.2` are never reached by the walk.
fn warn_on_gaps(root: &str, found: usize, courses: &[StagedCourse]) {
    let prefix = format!("{}{}", root, PROBLEM_SUFFIX_SEPARATOR);
    for course in courses {
        let stranded = course
            .name
            .strip_prefix(prefix.as_str())
            .and_then(|suffix| suffix.parse::<usize>().ok())
            .is_some_and(|n| n > found + 1);
        if stranded {
            diagnostics::warn(format!(
                "course {} ignored: station {} stops after problem {}",
                course.name, root, found
            ));
        }
    }
}

/// Order of a course that becomes a problem; only these must carry one.
fn course_order(course: &StagedCourse) -> Result<i64, ExtractError> {
    match (course.order, course.raw_order) {
        (Some(order), _) => Ok(order),
        (None, Some(raw)) => Err(ExtractError::BadAttribute {
            course: course.name.clone(),
            attribute: "order",
            value: raw.to_string(),
        }),
        (None, None) => Err(ExtractError::MissingOrder {
            course: course.name.clone(),
        }),
    }
}

fn positive_attribute(node: Node, name: &str) -> Option<f64> {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn numeric_attribute(
    course: &StagedCourse,
    node: Node,
    attribute: &'static str,
) -> Result<f64, ExtractError> {
    let raw = node.attribute(attribute).unwrap_or_default();
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ExtractError::BadAttribute {
            course: course.name.clone(),
            attribute,
            value: raw.to_string(),
        })
}

fn text_content(node: &Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}
