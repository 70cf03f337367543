use thiserror::Error;

/// Structural problems with a course export. Extraction stops at the first
/// one, and the message names the course or station at fault.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read course file: its XML is invalid ({0})")]
    MalformedXml(#[from] roxmltree::Error),

    #[error("could not read map scale")]
    MapScale,

    #[error("course element {position} has no name")]
    MissingCourseName { position: usize },

    #[error("course {course} has a non-numeric {attribute} attribute: {value:?}")]
    BadAttribute {
        course: String,
        attribute: &'static str,
        value: String,
    },

    #[error("no station courses found: no course name ends in .1")]
    NoStations,

    #[error("course {course} has no order attribute")]
    MissingOrder { course: String },

    #[error("course {course} type must be set to score")]
    NotScore { course: String },

    #[error("page setup not complete for course {course}")]
    MissingPrintArea { course: String },

    #[error("the page margin must be set to 0 on course {course}; then recreate the course PDF")]
    NonZeroMargin { course: String },

    #[error(
        "the print area selection must be set to manual on course {course}; then recreate the course PDF"
    )]
    AutomaticPrintArea { course: String },

    #[error("the print scale is different on course {course} (expected 1:{expected}, found 1:{found})")]
    ScaleMismatch {
        course: String,
        expected: f64,
        found: f64,
    },

    #[error("course {course} refers to missing {element} {id:?}")]
    BrokenReference {
        course: String,
        element: &'static str,
        id: String,
    },

    #[error("no control added to course {course} of station {station}")]
    NoNormalControl { station: String, course: String },

    #[error("control {control} used by course {course} has no usable location")]
    MissingLocation { course: String, control: String },
}
