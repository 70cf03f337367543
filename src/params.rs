//! Parameter overrides (JSON): values from a previous session or a
//! hand-written file, fed into the model through the normal `set_value`
//! path so every validation rule still applies.
//!
//! JSON shape:
//! {
//!   "defaults": { "mapScale": 4000, "contourInterval": 2.5 },
//!   "apply_defaults_to_all": true,
//!   "stations": {
//!     "Start": { "heading": 45, "numTasks": 4 },
//!     "B":     { "showStation": false, "mapSize": null }
//!   }
//! }
//!
//! `null` clears a number back to unset.

use crate::collection::{CollectionError, StationCollection, StationRef};
use crate::diagnostics;
use crate::field::{FieldError, FieldKind, FieldName, FieldValue};
use crate::Result;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamOverrides {
    #[serde(default)]
    pub defaults: BTreeMap<String, OverrideValue>,

    #[serde(default)]
    pub apply_defaults_to_all: bool,

    #[serde(default)]
    pub stations: BTreeMap<String, BTreeMap<String, OverrideValue>>,
}

/// Raw value as written in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Unset,
    Flag(bool),
    Number(f64),
    Text(String),
}

impl OverrideValue {
    /// Convert to the field's value type; numbers only accept numbers or null.
    pub fn into_field_value(self, field: FieldName) -> std::result::Result<FieldValue, FieldError> {
        let kind = field.kind();
        match (self, kind) {
            (OverrideValue::Unset, k) if k.is_number() => Ok(FieldValue::unset()),
            (OverrideValue::Number(n), k) if k.is_number() => Ok(FieldValue::Number(n)),
            (OverrideValue::Flag(b), FieldKind::Boolean) => Ok(FieldValue::Bool(b)),
            (OverrideValue::Text(s), FieldKind::Text) => Ok(FieldValue::Text(s)),
            (_, k) => Err(FieldError::TypeMismatch {
                field: field.key(),
                expected: match k {
                    FieldKind::Text => "text",
                    FieldKind::Boolean => "boolean",
                    _ => "number",
                },
            }),
        }
    }
}

impl ParamOverrides {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .with_context(|| diagnostics::error_message("parse parameter overrides"))
    }

    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| {
            diagnostics::error_message(format!("read parameter file {}", path))
        })?;
        Self::from_json(&text).with_context(|| format!("in parameter file {}", path))
    }

    /// Apply, in order: defaults, optional bulk copy of defaults, then
    /// per-station values. Stations are resolved by name before any of
    /// their values change, so renaming inside the file is safe.
    pub fn apply(&self, collection: &mut StationCollection) -> Result<()> {
        apply_values(collection, StationRef::Defaults, &self.defaults)
            .context("apply default overrides")?;

        if self.apply_defaults_to_all {
            collection.apply_all_defaults_to_all_stations()?;
        }

        let mut targets = Vec::with_capacity(self.stations.len());
        for (name, values) in &self.stations {
            let index = collection
                .position_of(name)
                .ok_or_else(|| CollectionError::UnknownStation(name.clone()))?;
            targets.push((index, name, values));
        }

        for (index, name, values) in targets {
            apply_values(collection, StationRef::Index(index), values)
                .with_context(|| format!("apply overrides for station {}", name))?;
        }

        Ok(())
    }
}

fn apply_values(
    collection: &mut StationCollection,
    target: StationRef,
    values: &BTreeMap<String, OverrideValue>,
) -> Result<()> {
    for (key, raw) in values {
        let field = FieldName::from_key(key)?;
        let value = raw.clone().into_field_value(field)?;
        let outcome = collection.set_value(target, field, value)?;
        debug!(?target, field = key.as_str(), changed = outcome.is_changed(), "override");
    }

    let station = collection.get(target)?;
    if !station.is_valid() && station.is_shown() && !station.is_defaults() {
        diagnostics::warn(format!(
            "station {} is still incomplete after applying overrides",
            station.display_label()
        ));
    }
    Ok(())
}

/// Reject files that would silently do nothing.
pub fn ensure_not_empty(overrides: &ParamOverrides) -> Result<()> {
    if overrides.defaults.is_empty()
        && overrides.stations.is_empty()
        && !overrides.apply_defaults_to_all
    {
        bail!(
            "{}",
            diagnostics::error_message("parameter file sets no values")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_stations() -> StationCollection {
        let mut c = StationCollection::new();
        c.add_station().unwrap();
        c.add_station().unwrap();
        c
    }

    #[test]
    fn parses_all_value_shapes() {
        let p = ParamOverrides::from_json(
            r#"{
                "defaults": {"mapScale": 4000, "mapShape": "Square", "zeroes": true, "mapSize": null},
                "apply_defaults_to_all": true
            }"#,
        )
        .unwrap();
        assert_eq!(p.defaults["mapScale"], OverrideValue::Number(4000.0));
        assert_eq!(p.defaults["mapShape"], OverrideValue::Text("Square".into()));
        assert_eq!(p.defaults["zeroes"], OverrideValue::Flag(true));
        assert_eq!(p.defaults["mapSize"], OverrideValue::Unset);
        assert!(p.apply_defaults_to_all);
        assert!(p.stations.is_empty());
    }

    #[test]
    fn applies_defaults_then_stations() {
        let mut c = two_stations();
        let p = ParamOverrides::from_json(
            r#"{
                "defaults": {"contourInterval": 2.5},
                "apply_defaults_to_all": true,
                "stations": {"2": {"stationName": "B", "contourInterval": 5, "heading": 90}}
            }"#,
        )
        .unwrap();
        p.apply(&mut c).unwrap();

        let names: Vec<&str> = c.stations().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["1", "B"]);
        assert_eq!(
            c.stations()[0].value(FieldName::ContourInterval),
            &FieldValue::Number(2.5)
        );
        assert_eq!(
            c.stations()[1].value(FieldName::ContourInterval),
            &FieldValue::Number(5.0)
        );
        assert_eq!(
            c.stations()[1].value(FieldName::Heading),
            &FieldValue::Number(90.0)
        );
    }

    #[test]
    fn null_clears_a_number() {
        let mut c = two_stations();
        c.set_value(StationRef::Index(0), FieldName::MapSize, 6.0.into())
            .unwrap();
        let p = ParamOverrides::from_json(r#"{"stations": {"1": {"mapSize": null}}}"#).unwrap();
        p.apply(&mut c).unwrap();
        assert!(c.stations()[0].value(FieldName::MapSize).is_unset());
    }

    #[test]
    fn unknown_station_or_key_fails() {
        let mut c = two_stations();
        let p = ParamOverrides::from_json(r#"{"stations": {"Z": {"heading": 1}}}"#).unwrap();
        let err = p.apply(&mut c).unwrap_err();
        assert_eq!(err.to_string(), r#"no station named "Z""#);

        let p = ParamOverrides::from_json(r#"{"defaults": {"colour": 1}}"#).unwrap();
        let err = p.apply(&mut c).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown field key 'colour'"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert_eq!(
            OverrideValue::Text("x".into()).into_field_value(FieldName::MapScale),
            Err(FieldError::TypeMismatch {
                field: "mapScale",
                expected: "number"
            })
        );
        assert!(OverrideValue::Unset
            .into_field_value(FieldName::ShowStation)
            .is_err());
        assert_eq!(
            OverrideValue::Flag(false).into_field_value(FieldName::ShowStation),
            Ok(FieldValue::Bool(false))
        );
    }

    #[test]
    fn empty_file_is_rejected() {
        let p = ParamOverrides::from_json("{}").unwrap();
        assert!(ensure_not_empty(&p).is_err());
    }
}
