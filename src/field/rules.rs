//! Validity predicates, one per rule.
//!
//! Hidden, non-default stations are exempt from most numeric checks because
//! nothing is printed for them. The Defaults record is exempt from the name
//! checks and from the heading check.

use super::FieldValue;

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Starts with a letter or digit, then letters, digits, underscore, space
/// and `,.-+=` only. Anything else would leak into the typeset output.
const STATION_NAME_PATTERN: &str = r"^[A-Za-z0-9][,.\-+= A-Za-z0-9_]*$";

/// Compiled once. A pattern that fails to compile rejects every name.
static STATION_NAME_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(STATION_NAME_PATTERN));

/// Largest permitted map size in centimetres.
pub const MAX_MAP_SIZE_CM: f64 = 12.0;

/// Sibling and station state a predicate may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityContext {
    pub is_defaults: bool,
    pub show_station: bool,
    /// Another real station carries the same name.
    pub duplicate_name: bool,
}

impl ValidityContext {
    pub fn is_non_default_hidden(&self) -> bool {
        !(self.show_station || self.is_defaults)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityRule {
    Always,
    NonNegative,
    StrictlyPositive,
    StationName,
    MapSize,
    TaskCount,
    Heading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Valid,
    Invalid,
    /// Station name does not match the permitted pattern.
    BadSyntax,
    /// Station name is already used by another station.
    Duplicate,
}

impl FieldStatus {
    pub fn is_valid(self) -> bool {
        self == FieldStatus::Valid
    }

    fn from_bool(valid: bool) -> Self {
        if valid {
            FieldStatus::Valid
        } else {
            FieldStatus::Invalid
        }
    }
}

pub fn is_valid_station_name(name: &str) -> bool {
    STATION_NAME_RE
        .as_ref()
        .is_ok_and(|re| re.is_match(name))
}

impl ValidityRule {
    pub fn evaluate(self, value: &FieldValue, ctx: &ValidityContext) -> FieldStatus {
        let exempt = ctx.is_non_default_hidden();
        let number = value.as_number().unwrap_or(f64::NAN);

        match self {
            ValidityRule::Always => FieldStatus::Valid,
            ValidityRule::NonNegative => {
                FieldStatus::from_bool((number.is_finite() && number >= 0.0) || exempt)
            }
            // A zero font size crashes the typesetter, so zero is rejected.
            ValidityRule::StrictlyPositive => {
                FieldStatus::from_bool((number.is_finite() && number > 0.0) || exempt)
            }
            ValidityRule::MapSize => FieldStatus::from_bool(
                (number.is_finite() && number > 0.0 && number <= MAX_MAP_SIZE_CM) || exempt,
            ),
            ValidityRule::TaskCount => FieldStatus::from_bool(
                (number.is_finite() && number.fract() == 0.0 && number >= 1.0) || exempt,
            ),
            ValidityRule::Heading => FieldStatus::from_bool(
                number.is_finite() || !ctx.show_station || ctx.is_defaults,
            ),
            ValidityRule::StationName => {
                if ctx.is_defaults {
                    return FieldStatus::Valid;
                }
                // Syntax is checked even for hidden stations.
                let syntax_ok = value.as_text().is_some_and(is_valid_station_name);
                if !syntax_ok {
                    FieldStatus::BadSyntax
                } else if ctx.duplicate_name {
                    FieldStatus::Duplicate
                } else {
                    FieldStatus::Valid
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHOWN: ValidityContext = ValidityContext {
        is_defaults: false,
        show_station: true,
        duplicate_name: false,
    };
    const HIDDEN: ValidityContext = ValidityContext {
        is_defaults: false,
        show_station: false,
        duplicate_name: false,
    };
    const DEFAULTS: ValidityContext = ValidityContext {
        is_defaults: true,
        show_station: true,
        duplicate_name: false,
    };

    fn num(v: f64) -> FieldValue {
        FieldValue::Number(v)
    }

    #[test]
    fn strictly_positive_zero_depends_on_visibility() {
        let rule = ValidityRule::StrictlyPositive;
        assert_eq!(rule.evaluate(&num(0.0), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&num(0.0), &HIDDEN), FieldStatus::Valid);
        assert_eq!(rule.evaluate(&num(0.1), &SHOWN), FieldStatus::Valid);
    }

    #[test]
    fn hidden_defaults_is_not_exempt() {
        let hidden_defaults = ValidityContext {
            is_defaults: true,
            show_station: false,
            duplicate_name: false,
        };
        assert!(!hidden_defaults.is_non_default_hidden());
        assert_eq!(
            ValidityRule::NonNegative.evaluate(&num(-1.0), &hidden_defaults),
            FieldStatus::Invalid
        );
    }

    #[test]
    fn non_negative_accepts_zero_rejects_unset() {
        let rule = ValidityRule::NonNegative;
        assert_eq!(rule.evaluate(&num(0.0), &SHOWN), FieldStatus::Valid);
        assert_eq!(rule.evaluate(&num(-0.5), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&FieldValue::unset(), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&num(f64::INFINITY), &SHOWN), FieldStatus::Invalid);
    }

    #[test]
    fn map_size_bounds() {
        let rule = ValidityRule::MapSize;
        assert_eq!(rule.evaluate(&num(12.0), &SHOWN), FieldStatus::Valid);
        assert_eq!(rule.evaluate(&num(12.01), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&num(0.0), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&num(40.0), &HIDDEN), FieldStatus::Valid);
    }

    #[test]
    fn task_count_must_be_a_positive_integer() {
        let rule = ValidityRule::TaskCount;
        assert_eq!(rule.evaluate(&num(1.0), &SHOWN), FieldStatus::Valid);
        assert_eq!(rule.evaluate(&num(2.5), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&num(0.0), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&FieldValue::unset(), &DEFAULTS), FieldStatus::Invalid);
    }

    #[test]
    fn heading_exemptions() {
        let rule = ValidityRule::Heading;
        assert_eq!(rule.evaluate(&FieldValue::unset(), &SHOWN), FieldStatus::Invalid);
        assert_eq!(rule.evaluate(&FieldValue::unset(), &HIDDEN), FieldStatus::Valid);
        assert_eq!(rule.evaluate(&FieldValue::unset(), &DEFAULTS), FieldStatus::Valid);
        assert_eq!(rule.evaluate(&num(-45.0), &SHOWN), FieldStatus::Valid);
    }

    #[test]
    fn station_name_pattern_compiles() {
        assert!(STATION_NAME_RE.as_ref().is_ok());
    }

    #[test]
    fn station_name_syntax() {
        for good in ["A", "1", "Start 2", "B.1,x-y+z=w", "a_b"] {
            assert!(is_valid_station_name(good), "{good}");
        }
        for bad in ["", " A", "-A", "A#", "A\\B", "Å", "A\n"] {
            assert!(!is_valid_station_name(bad), "{bad:?}");
        }
    }

    #[test]
    fn station_name_reports_syntax_before_duplicate() {
        let dup = ValidityContext {
            duplicate_name: true,
            ..SHOWN
        };
        let rule = ValidityRule::StationName;
        assert_eq!(rule.evaluate(&"#".into(), &dup), FieldStatus::BadSyntax);
        assert_eq!(rule.evaluate(&"A".into(), &dup), FieldStatus::Duplicate);
        assert_eq!(rule.evaluate(&"A".into(), &SHOWN), FieldStatus::Valid);
        // Hidden stations still need a clean name.
        assert_eq!(rule.evaluate(&"#".into(), &HIDDEN), FieldStatus::BadSyntax);
    }

    #[test]
    fn defaults_name_is_always_valid() {
        let dup_defaults = ValidityContext {
            duplicate_name: true,
            ..DEFAULTS
        };
        assert_eq!(
            ValidityRule::StationName.evaluate(&"".into(), &dup_defaults),
            FieldStatus::Valid
        );
    }
}
