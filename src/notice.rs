//! User-facing indicators for a station's fields: errors for invalid values
//! and rule-of-thumb warnings for valid but unusual ones.

use crate::field::{FieldName, FieldStatus, ValidityRule};
use crate::station::Station;

use serde::Serialize;

/// Kites per station expected by competition rules.
pub const STANDARD_KITES: f64 = 6.0;
/// Smallest recommended map size in centimetres.
pub const MIN_RECOMMENDED_MAP_SIZE_CM: f64 = 5.0;
pub const RECOMMENDED_MAP_SCALES: [f64; 2] = [4000.0, 5000.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldNotice {
    pub field: FieldName,
    pub severity: Severity,
    pub message: String,
}

impl FieldNotice {
    fn error(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Build the notices for `station`.
///
/// `matches_all` answers whether a field agrees with every sibling station
/// (hidden stations ignored); it is only consulted for fields that warn on
/// disagreement.
pub fn station_notices(
    station: &Station,
    matches_all: impl Fn(FieldName) -> bool,
) -> Vec<FieldNotice> {
    let mut out = Vec::new();

    for field in station.fields() {
        let name = field.name();
        if !field.is_valid() {
            out.push(FieldNotice::error(name, error_text(name, field.status())));
            continue;
        }

        let hidden = station.is_non_default_hidden();
        let agrees = || station.is_defaults() || matches_all(name);
        let number = field.value().as_number().unwrap_or(f64::NAN);

        let warning = match name {
            FieldName::NumKites if number != STANDARD_KITES && !hidden => {
                Some("competition rules specify 6 kites".to_string())
            }
            FieldName::Zeroes
            | FieldName::MapShape
            | FieldName::NumTasks
            | FieldName::ContourInterval
                if !agrees() =>
            {
                Some(format!("{} differs between stations", name.label()))
            }
            FieldName::MapSize
                if !(hidden || (number >= MIN_RECOMMENDED_MAP_SIZE_CM && agrees())) =>
            {
                Some("map size should be at least 5 cm and the same at every station".to_string())
            }
            FieldName::MapScale
                if !(hidden || (RECOMMENDED_MAP_SCALES.contains(&number) && agrees())) =>
            {
                Some(
                    "map scale should be 1:4000 or 1:5000 and the same at every station"
                        .to_string(),
                )
            }
            _ => None,
        };

        if let Some(message) = warning {
            out.push(FieldNotice::warning(name, message));
        }
    }

    out
}

fn error_text(name: FieldName, status: FieldStatus) -> String {
    match status {
        FieldStatus::BadSyntax => "station name must start with a letter or digit and contain only letters, digits, spaces and ,.-+=_".to_string(),
        FieldStatus::Duplicate => "station name is already used by another station".to_string(),
        FieldStatus::Valid | FieldStatus::Invalid => match name.rule() {
            ValidityRule::TaskCount => "number of tasks must be a whole number of at least 1".to_string(),
            ValidityRule::Heading => "map heading is required for a shown station".to_string(),
            ValidityRule::MapSize => "map size must be greater than 0 and at most 12 cm".to_string(),
            ValidityRule::NonNegative => format!("{} must be zero or greater", name.label()),
            ValidityRule::StrictlyPositive => format!("{} must be greater than zero", name.label()),
            ValidityRule::Always | ValidityRule::StationName => format!("{} is invalid", name.label()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn complete(name: &str) -> Station {
        let defaults = Station::defaults_record();
        let mut s = Station::from_template(&defaults);
        for (field, v) in [
            (FieldName::NumTasks, 4.0),
            (FieldName::Heading, 0.0),
            (FieldName::MapSize, 6.0),
            (FieldName::MapScale, 4000.0),
            (FieldName::ContourInterval, 2.5),
        ] {
            s.set_value(field, v.into()).unwrap();
        }
        s.set_value(FieldName::StationName, name.into()).unwrap();
        s
    }

    #[test]
    fn clean_station_has_no_notices() {
        let s = complete("A");
        assert_eq!(station_notices(&s, |_| true), vec![]);
    }

    #[test]
    fn disagreement_warns_on_comparable_fields() {
        let s = complete("A");
        let fields: Vec<FieldName> = station_notices(&s, |_| false)
            .into_iter()
            .map(|n| n.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                FieldName::Zeroes,
                FieldName::NumTasks,
                FieldName::MapShape,
                FieldName::MapSize,
                FieldName::MapScale,
                FieldName::ContourInterval,
            ]
        );
    }

    #[test]
    fn defaults_never_warn_about_disagreement() {
        let mut d = Station::defaults_record();
        d.set_value(FieldName::MapScale, 5000.0.into()).unwrap();
        let notices = station_notices(&d, |_| false);
        assert!(notices.iter().all(|n| n.severity == Severity::Error));
    }

    #[test]
    fn unusual_values_warn() {
        let mut s = complete("A");
        s.set_value(FieldName::NumKites, 4.0.into()).unwrap();
        s.set_value(FieldName::MapScale, 7500.0.into()).unwrap();
        s.set_value(FieldName::MapSize, 4.0.into()).unwrap();
        let notices = station_notices(&s, |_| true);
        let fields: Vec<FieldName> = notices.iter().map(|n| n.field).collect();
        assert_eq!(
            fields,
            vec![FieldName::NumKites, FieldName::MapSize, FieldName::MapScale]
        );
        assert_eq!(notices[0].message, "competition rules specify 6 kites");
    }

    #[test]
    fn invalid_fields_report_errors_only() {
        let mut s = complete("#bad");
        s.set_value(FieldName::CheckFontSize, 0.0.into()).unwrap();
        let notices = station_notices(&s, |_| true);
        assert_eq!(
            notices,
            vec![
                FieldNotice::error(
                    FieldName::StationName,
                    "station name must start with a letter or digit and contain only letters, digits, spaces and ,.-+=_"
                ),
                FieldNotice::error(
                    FieldName::CheckFontSize,
                    "check number font size must be greater than zero"
                ),
            ]
        );
    }
}
