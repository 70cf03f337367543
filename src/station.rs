//! A station: one instance of every named field, plus the problems placed
//! for it by course extraction.
//!
//! Cross-station facts (is my name taken?) are pushed in by the owning
//! collection, so a station can always validate itself without looking at
//! its siblings.

use crate::course::Problem;
use crate::field::{
    Field, FieldError, FieldName, FieldValue, SetOutcome, ValidityContext, FIELD_COUNT,
};

#[derive(Debug, Clone)]
pub struct Station {
    /// Indexed by `FieldName::index`.
    fields: Vec<Field>,
    is_defaults: bool,
    duplicate_name: bool,
    valid: bool,
    problems: Vec<Problem>,
}

impl Station {
    /// The Defaults record, holding every field's built-in default.
    pub fn defaults_record() -> Self {
        let mut station = Self {
            fields: FieldName::ALL.into_iter().map(Field::new).collect(),
            is_defaults: true,
            duplicate_name: false,
            valid: false,
            problems: Vec::new(),
        };
        station.check_validity();
        station
    }

    /// A real station seeded with independent copies of `template`'s values.
    pub fn from_template(template: &Station) -> Self {
        let mut station = Self {
            fields: template.fields.clone(),
            is_defaults: false,
            duplicate_name: false,
            valid: false,
            problems: Vec::new(),
        };
        station.check_validity();
        station
    }

    pub fn field(&self, name: FieldName) -> &Field {
        &self.fields[name.index()]
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn value(&self, name: FieldName) -> &FieldValue {
        self.field(name).value()
    }

    pub fn name(&self) -> &str {
        self.value(FieldName::StationName).as_text().unwrap_or_default()
    }

    pub fn is_shown(&self) -> bool {
        self.value(FieldName::ShowStation)
            .as_bool()
            .unwrap_or(true)
    }

    pub fn is_defaults(&self) -> bool {
        self.is_defaults
    }

    /// Hidden and not the Defaults record: most numeric checks are waived.
    pub fn is_non_default_hidden(&self) -> bool {
        !(self.is_shown() || self.is_defaults)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn display_label(&self) -> String {
        if self.is_defaults {
            "Defaults".to_string()
        } else {
            self.name().to_string()
        }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn num_problems(&self) -> usize {
        self.problems.len()
    }

    pub(crate) fn set_problems(&mut self, problems: Vec<Problem>) {
        self.problems = problems;
    }

    fn context(&self) -> ValidityContext {
        ValidityContext {
            is_defaults: self.is_defaults,
            show_station: self.is_shown(),
            duplicate_name: self.duplicate_name,
        }
    }

    /// Record whether another real station shares this name and recheck the
    /// name field.
    pub(crate) fn set_duplicate_name(&mut self, duplicate: bool) {
        self.duplicate_name = duplicate;
        self.check_field(FieldName::StationName);
    }

    /// Store a value and revalidate what it affects.
    ///
    /// Visibility feeds several predicates, so changing it rechecks every
    /// other field of this station in field order.
    pub fn set_value(
        &mut self,
        name: FieldName,
        value: FieldValue,
    ) -> Result<SetOutcome, FieldError> {
        let outcome = self.fields[name.index()].set_value(value)?;
        if outcome.is_changed() {
            if name == FieldName::ShowStation {
                self.check_validity();
            } else {
                self.check_field(name);
            }
        }
        Ok(outcome)
    }

    pub fn check_field(&mut self, name: FieldName) {
        let ctx = self.context();
        self.fields[name.index()].check_validity(&ctx);
        self.refresh_aggregate();
    }

    /// Recheck every field, then the aggregate.
    pub fn check_validity(&mut self) {
        let ctx = self.context();
        for field in &mut self.fields {
            field.check_validity(&ctx);
        }
        self.refresh_aggregate();
    }

    fn refresh_aggregate(&mut self) {
        debug_assert_eq!(self.fields.len(), FIELD_COUNT);
        self.valid = self.fields.iter().all(Field::is_valid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldStatus;
    use pretty_assertions::assert_eq;

    fn named(name: &str) -> Station {
        let defaults = Station::defaults_record();
        let mut s = Station::from_template(&defaults);
        s.set_value(FieldName::StationName, name.into()).unwrap();
        s
    }

    #[test]
    fn defaults_record_shape() {
        let d = Station::defaults_record();
        assert!(d.is_defaults());
        assert_eq!(d.display_label(), "Defaults");
        assert_eq!(d.fields().count(), FIELD_COUNT);
        assert_eq!(d.value(FieldName::NumKites), &FieldValue::Number(6.0));
        assert_eq!(d.value(FieldName::MapShape), &FieldValue::Text("Circle".into()));
        // Unset map size/scale/contour/tasks keep the defaults invalid.
        assert!(!d.is_valid());
        assert!(d.field(FieldName::StationName).is_valid());
        assert!(d.field(FieldName::Heading).is_valid());
        assert!(!d.field(FieldName::MapScale).is_valid());
    }

    #[test]
    fn template_copy_is_independent() {
        let mut defaults = Station::defaults_record();
        let copy = Station::from_template(&defaults);
        defaults
            .set_value(FieldName::CheckWidth, 3.0.into())
            .unwrap();
        assert_eq!(copy.value(FieldName::CheckWidth), &FieldValue::Number(1.5));
        assert!(!copy.is_defaults());
    }

    #[test]
    fn hiding_cascades_to_every_field() {
        let mut s = named("A");
        s.set_value(FieldName::LetterFontSize, 0.0.into()).unwrap();
        assert!(!s.field(FieldName::LetterFontSize).is_valid());
        assert!(!s.field(FieldName::Heading).is_valid());

        s.set_value(FieldName::ShowStation, false.into()).unwrap();
        assert!(s.field(FieldName::LetterFontSize).is_valid());
        assert!(s.field(FieldName::Heading).is_valid());
        assert!(s.field(FieldName::MapScale).is_valid());
        assert!(s.is_valid());

        s.set_value(FieldName::ShowStation, true.into()).unwrap();
        assert!(!s.field(FieldName::LetterFontSize).is_valid());
        assert!(!s.is_valid());
    }

    #[test]
    fn duplicate_flag_feeds_name_status() {
        let mut s = named("A");
        assert_eq!(s.field(FieldName::StationName).status(), FieldStatus::Valid);
        s.set_duplicate_name(true);
        assert_eq!(
            s.field(FieldName::StationName).status(),
            FieldStatus::Duplicate
        );
        s.set_duplicate_name(false);
        assert_eq!(s.field(FieldName::StationName).status(), FieldStatus::Valid);
    }

    #[test]
    fn fully_specified_station_is_valid() {
        let mut s = named("A");
        for (name, v) in [
            (FieldName::NumTasks, 4.0),
            (FieldName::Heading, 90.0),
            (FieldName::MapSize, 6.0),
            (FieldName::MapScale, 4000.0),
            (FieldName::ContourInterval, 2.5),
        ] {
            s.set_value(name, v.into()).unwrap();
        }
        assert!(s.is_valid());
    }
}
