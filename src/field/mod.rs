//! Field taxonomy: the typed, validated scalar holders a station is made of.
//!
//! Every field has a fixed name, a kind (which value variant it accepts), a
//! validity rule and a default value. All of that lives in one static table
//! (`FIELD_SPECS`) so the per-kind policy stays plain data.
//!
//! Number-family fields represent "unset" with NaN. Two NaN values are never
//! reported as a change, while NaN versus a real number always is.

pub mod rules;

pub use rules::{FieldStatus, ValidityContext, ValidityRule};

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Number of named fields carried by every station.
pub const FIELD_COUNT: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Text,
    Boolean,
    Number,
    NonNegativeNumber,
    StrictlyPositiveNumber,
}

impl FieldKind {
    pub fn is_number(self) -> bool {
        matches!(
            self,
            FieldKind::Number | FieldKind::NonNegativeNumber | FieldKind::StrictlyPositiveNumber
        )
    }

    fn describe(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
            FieldKind::Number | FieldKind::NonNegativeNumber | FieldKind::StrictlyPositiveNumber => {
                "number"
            }
        }
    }
}

/// Value held by a field. Serializes untagged: unset numbers become `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Number(f64),
}

impl FieldValue {
    pub fn unset() -> Self {
        FieldValue::Number(f64::NAN)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Number(v) if v.is_nan())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    fn fits(&self, kind: FieldKind) -> bool {
        match self {
            FieldValue::Text(_) => kind == FieldKind::Text,
            FieldValue::Bool(_) => kind == FieldKind::Boolean,
            FieldValue::Number(_) => kind.is_number(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

/// Result of `Field::set_value`, used by callers to track unsaved edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Changed,
    Unchanged,
}

impl SetOutcome {
    pub fn is_changed(self) -> bool {
        self == SetOutcome::Changed
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("field '{field}' expects a {expected} value")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown field key '{0}'")]
    UnknownKey(String),
}

/// The fixed, exhaustive set of field names. Declaration order is the
/// station's field order and the index into `FIELD_SPECS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    StationName,
    ShowStation,
    NumKites,
    Zeroes,
    NumTasks,
    Heading,
    MapShape,
    MapSize,
    MapScale,
    ContourInterval,
    IdFontSize,
    CheckWidth,
    CheckHeight,
    CheckFontSize,
    RemoveFontSize,
    PointHeight,
    LetterFontSize,
    PhoneticFontSize,
}

#[derive(Debug, Clone, Copy)]
enum DefaultValue {
    Text(&'static str),
    Bool(bool),
    Number(f64),
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
    rule: ValidityRule,
    default: DefaultValue,
    apply_to_all: bool,
}

const fn spec(
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
    rule: ValidityRule,
    default: DefaultValue,
    apply_to_all: bool,
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind,
        rule,
        default,
        apply_to_all,
    }
}

use DefaultValue as D;
use FieldKind as K;
use ValidityRule as R;

const FIELD_SPECS: [FieldSpec; FIELD_COUNT] = [
    spec("stationName", "station name", K::Text, R::StationName, D::Text(""), false),
    spec("showStation", "show station", K::Boolean, R::Always, D::Bool(true), true),
    spec("numKites", "number of kites", K::Number, R::Always, D::Number(6.0), true),
    spec("zeroes", "zero answer allowed", K::Boolean, R::Always, D::Bool(false), true),
    spec("numTasks", "number of tasks", K::Number, R::TaskCount, D::Number(f64::NAN), true),
    spec("heading", "map heading", K::Number, R::Heading, D::Number(f64::NAN), false),
    spec("mapShape", "map shape", K::Text, R::Always, D::Text("Circle"), true),
    spec("mapSize", "map size", K::Number, R::MapSize, D::Number(f64::NAN), true),
    spec("mapScale", "map scale", K::StrictlyPositiveNumber, R::StrictlyPositive, D::Number(f64::NAN), true),
    spec("contourInterval", "contour interval", K::StrictlyPositiveNumber, R::StrictlyPositive, D::Number(f64::NAN), true),
    spec("IDFontSize", "station ID font size", K::StrictlyPositiveNumber, R::StrictlyPositive, D::Number(0.7), true),
    spec("checkWidth", "check box width", K::NonNegativeNumber, R::NonNegative, D::Number(1.5), true),
    spec("checkHeight", "check box height", K::NonNegativeNumber, R::NonNegative, D::Number(1.5), true),
    spec("checkFontSize", "check number font size", K::StrictlyPositiveNumber, R::StrictlyPositive, D::Number(0.8), true),
    spec("removeFontSize", "removal instruction font size", K::StrictlyPositiveNumber, R::StrictlyPositive, D::Number(0.3), true),
    spec("pointHeight", "pointing box height", K::NonNegativeNumber, R::NonNegative, D::Number(2.5), true),
    spec("letterFontSize", "pointing letter font size", K::StrictlyPositiveNumber, R::StrictlyPositive, D::Number(1.8), true),
    spec("phoneticFontSize", "phonetic font size", K::StrictlyPositiveNumber, R::StrictlyPositive, D::Number(0.6), true),
];

impl FieldName {
    pub const ALL: [FieldName; FIELD_COUNT] = [
        FieldName::StationName,
        FieldName::ShowStation,
        FieldName::NumKites,
        FieldName::Zeroes,
        FieldName::NumTasks,
        FieldName::Heading,
        FieldName::MapShape,
        FieldName::MapSize,
        FieldName::MapScale,
        FieldName::ContourInterval,
        FieldName::IdFontSize,
        FieldName::CheckWidth,
        FieldName::CheckHeight,
        FieldName::CheckFontSize,
        FieldName::RemoveFontSize,
        FieldName::PointHeight,
        FieldName::LetterFontSize,
        FieldName::PhoneticFontSize,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    fn spec(self) -> &'static FieldSpec {
        &FIELD_SPECS[self.index()]
    }

    /// Stable camelCase key used in parameter files and reports.
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    pub fn rule(self) -> ValidityRule {
        self.spec().rule
    }

    /// Whether "apply to all stations" makes sense for this field. Name and
    /// heading are inherently per-station.
    pub fn supports_apply_to_all(self) -> bool {
        self.spec().apply_to_all
    }

    pub fn default_value(self) -> FieldValue {
        match self.spec().default {
            DefaultValue::Text(s) => FieldValue::Text(s.to_string()),
            DefaultValue::Bool(b) => FieldValue::Bool(b),
            DefaultValue::Number(n) => FieldValue::Number(n),
        }
    }

    pub fn from_key(key: &str) -> Result<FieldName, FieldError> {
        FieldName::ALL
            .into_iter()
            .find(|name| name.key() == key)
            .ok_or_else(|| FieldError::UnknownKey(key.to_string()))
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// One editable value. The owning station supplies the `ValidityContext`
/// whenever validity is recomputed.
#[derive(Debug, Clone)]
pub struct Field {
    name: FieldName,
    value: FieldValue,
    status: FieldStatus,
}

impl Field {
    pub fn new(name: FieldName) -> Self {
        Self {
            name,
            value: name.default_value(),
            status: FieldStatus::Invalid,
        }
    }

    pub fn name(&self) -> FieldName {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.name.kind()
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn status(&self) -> FieldStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    /// Store a new value and classify the edit. Does not revalidate: the
    /// owning station does that with the right context.
    pub fn set_value(&mut self, value: FieldValue) -> Result<SetOutcome, FieldError> {
        let kind = self.kind();
        if !value.fits(kind) {
            return Err(FieldError::TypeMismatch {
                field: self.name.key(),
                expected: kind.describe(),
            });
        }

        let changed = match (&self.value, &value) {
            (FieldValue::Number(old), FieldValue::Number(new)) => {
                old != new && !(old.is_nan() && new.is_nan())
            }
            (old, new) => old != new,
        };

        if changed {
            self.value = value;
            Ok(SetOutcome::Changed)
        } else {
            Ok(SetOutcome::Unchanged)
        }
    }

    pub fn check_validity(&mut self, ctx: &ValidityContext) {
        self.status = self.name.rule().evaluate(&self.value, ctx);
    }
}
