//! The ordered station list, its Defaults record and the editing focus.
//!
//! Every mutating operation either completes or leaves the collection as it
//! was. Indices are positions in the list, so removing or moving a station
//! renumbers the rest in one step.

use crate::course::{CourseLayout, ExtractError, extract_course_layout};
use crate::field::{FieldError, FieldName, FieldValue, SetOutcome};
use crate::notice::{station_notices, FieldNotice};
use crate::station::Station;

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Either the Defaults record or a real station by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationRef {
    Defaults,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectionError {
    #[error("no station at position {index} (collection has {len})")]
    NoSuchStation { index: usize, len: usize },

    #[error("no station named {0:?}")]
    UnknownStation(String),

    #[error("cannot move station {index} by {offset}: position out of bounds")]
    OutOfBounds { index: usize, offset: isize },

    #[error("please give station {label:?} a valid and unique name first")]
    InvalidStationName { label: String },

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Failure of `replace_from_course`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

#[derive(Debug, Clone)]
pub struct StationCollection {
    stations: Vec<Station>,
    defaults: Station,
    focus: StationRef,
    indicators: Vec<FieldNotice>,
    saved: bool,
}

impl Default for StationCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl StationCollection {
    /// Empty collection focused on the Defaults record.
    pub fn new() -> Self {
        let mut collection = Self {
            stations: Vec::new(),
            defaults: Station::defaults_record(),
            focus: StationRef::Defaults,
            indicators: Vec::new(),
            saved: true,
        };
        collection.refresh_indicators();
        collection
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn defaults(&self) -> &Station {
        &self.defaults
    }

    pub fn focus(&self) -> StationRef {
        self.focus
    }

    /// Notices for the focused record, as of the last mutation.
    pub fn indicators(&self) -> &[FieldNotice] {
        &self.indicators
    }

    /// False once any edit changed a value since the last `mark_saved`.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    pub fn get(&self, target: StationRef) -> Result<&Station, CollectionError> {
        match target {
            StationRef::Defaults => Ok(&self.defaults),
            StationRef::Index(index) => {
                self.stations
                    .get(index)
                    .ok_or(CollectionError::NoSuchStation {
                        index,
                        len: self.stations.len(),
                    })
            }
        }
    }

    fn get_mut(&mut self, target: StationRef) -> Result<&mut Station, CollectionError> {
        let len = self.stations.len();
        match target {
            StationRef::Defaults => Ok(&mut self.defaults),
            StationRef::Index(index) => self
                .stations
                .get_mut(index)
                .ok_or(CollectionError::NoSuchStation { index, len }),
        }
    }

    pub fn focused(&self) -> Option<&Station> {
        self.get(self.focus).ok()
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.stations.iter().position(|s| s.name() == name)
    }

    /// Set one field and revalidate whatever depends on it.
    pub fn set_value(
        &mut self,
        target: StationRef,
        field: FieldName,
        value: FieldValue,
    ) -> Result<SetOutcome, CollectionError> {
        let outcome = self.get_mut(target)?.set_value(field, value)?;
        if outcome.is_changed() {
            self.saved = false;
            if field == FieldName::StationName {
                self.refresh_duplicate_names();
            }
            self.refresh_indicators();
        }
        Ok(outcome)
    }

    /// Recompute every field of `target`.
    pub fn check_validity(&mut self, target: StationRef) -> Result<bool, CollectionError> {
        let station = self.get_mut(target)?;
        station.check_validity();
        let valid = station.is_valid();
        self.refresh_indicators();
        Ok(valid)
    }

    /// Does another real station hold the same value? With `ignore_hidden`,
    /// a hidden `target` never duplicates and hidden stations are skipped.
    pub fn is_duplicate(
        &self,
        target: StationRef,
        field: FieldName,
        ignore_hidden: bool,
    ) -> Result<bool, CollectionError> {
        let station = self.get(target)?;
        if ignore_hidden && !station.is_shown() {
            return Ok(false);
        }
        let value = station.value(field);
        let own_index = match target {
            StationRef::Index(i) => Some(i),
            StationRef::Defaults => None,
        };

        Ok(self.stations.iter().enumerate().any(|(i, other)| {
            Some(i) != own_index
                && (!ignore_hidden || other.is_shown())
                && other.value(field) == value
        }))
    }

    /// Does every real station agree with `target` on `field`? Unset numbers
    /// on either side count as agreement. With `ignore_hidden`, a hidden
    /// `target` always agrees and hidden stations are skipped.
    pub fn matches_all(
        &self,
        target: StationRef,
        field: FieldName,
        ignore_hidden: bool,
    ) -> Result<bool, CollectionError> {
        let station = self.get(target)?;
        if ignore_hidden && !station.is_shown() {
            return Ok(true);
        }
        let value = station.value(field);
        if value.is_unset() {
            return Ok(true);
        }

        Ok(self.stations.iter().all(|other| {
            let theirs = other.value(field);
            theirs == value || theirs.is_unset() || (ignore_hidden && !other.is_shown())
        }))
    }

    /// Copy the Defaults record's current value for `field` into `target`.
    pub fn reset_to_default(
        &mut self,
        target: StationRef,
        field: FieldName,
    ) -> Result<SetOutcome, CollectionError> {
        let value = self.defaults.value(field).clone();
        self.set_value(target, field, value)
    }

    /// Copy `source`'s value for `field` into every real station. The
    /// Defaults record is never written.
    pub fn apply_to_all(
        &mut self,
        source: StationRef,
        field: FieldName,
    ) -> Result<(), CollectionError> {
        let value = self.get(source)?.value(field).clone();
        let mut changed = false;
        for station in &mut self.stations {
            changed |= station.set_value(field, value.clone())?.is_changed();
        }

        if changed {
            self.saved = false;
            if field == FieldName::StationName {
                self.refresh_duplicate_names();
            }
        }
        self.refresh_indicators();
        debug!(field = field.key(), stations = self.stations.len(), "applied to all stations");
        Ok(())
    }

    /// Push every "apply to all" capable default into every real station.
    pub fn apply_all_defaults_to_all_stations(&mut self) -> Result<(), CollectionError> {
        for field in FieldName::ALL {
            if field.supports_apply_to_all() {
                self.apply_to_all(StationRef::Defaults, field)?;
            }
        }
        Ok(())
    }

    /// Append a copy of the Defaults record named after its position and
    /// focus it. Rejected if the currently focused station's name is invalid.
    pub fn add_station(&mut self) -> Result<usize, CollectionError> {
        self.ensure_focus_can_leave()?;

        let mut station = Station::from_template(&self.defaults);
        let index = self.stations.len();
        station.set_value(
            FieldName::StationName,
            FieldValue::Text((index + 1).to_string()),
        )?;
        station.check_validity();
        self.stations.push(station);

        self.saved = false;
        self.focus = StationRef::Index(index);
        self.refresh_duplicate_names();
        self.refresh_indicators();
        debug!(index, "added station");
        Ok(index)
    }

    /// Remove a station and focus the first one. Confirmation and the
    /// "keep at least one station" policy belong to the caller.
    pub fn delete_station(&mut self, index: usize) -> Result<Station, CollectionError> {
        self.get(StationRef::Index(index))?;
        let removed = self.stations.remove(index);

        self.saved = false;
        self.focus = if self.stations.is_empty() {
            StationRef::Defaults
        } else {
            StationRef::Index(0)
        };
        self.refresh_duplicate_names();
        self.refresh_indicators();
        debug!(index, name = removed.name(), "deleted station");
        Ok(removed)
    }

    /// Move a station by `offset` places; focus follows it.
    pub fn move_station(&mut self, index: usize, offset: isize) -> Result<usize, CollectionError> {
        self.get(StationRef::Index(index))?;
        let new_pos = index
            .checked_add_signed(offset)
            .filter(|p| *p < self.stations.len())
            .ok_or(CollectionError::OutOfBounds { index, offset })?;

        let station = self.stations.remove(index);
        self.stations.insert(new_pos, station);

        self.saved = false;
        self.focus = StationRef::Index(new_pos);
        self.refresh_indicators();
        debug!(from = index, to = new_pos, "moved station");
        Ok(new_pos)
    }

    /// Switch the editing target. Leaving a real station whose name is
    /// invalid is refused and the focus stays put.
    pub fn set_focus(&mut self, target: StationRef) -> Result<(), CollectionError> {
        self.get(target)?;
        if target == self.focus {
            return Ok(());
        }
        self.ensure_focus_can_leave()?;

        self.focus = target;
        self.refresh_indicators();
        Ok(())
    }

    /// Replace every real station with those extracted from a course file.
    /// The Defaults record keeps its current values and seeds the new ones.
    pub fn replace_from_layout(&mut self, layout: &CourseLayout) -> Result<(), CollectionError> {
        let mut stations = Vec::with_capacity(layout.stations.len());
        for extracted in &layout.stations {
            let mut station = Station::from_template(&self.defaults);
            station.set_value(FieldName::StationName, extracted.name.as_str().into())?;
            station.set_value(FieldName::ShowStation, true.into())?;
            station.set_value(FieldName::MapScale, extracted.print_scale.into())?;
            station.set_problems(extracted.problems.clone());
            station.check_validity();
            stations.push(station);
        }

        self.stations = stations;
        self.saved = false;
        self.focus = if self.stations.is_empty() {
            StationRef::Defaults
        } else {
            StationRef::Index(0)
        };
        self.refresh_duplicate_names();
        self.refresh_indicators();
        debug!(stations = self.stations.len(), "replaced stations from course layout");
        Ok(())
    }

    /// Extract a course file and replace the stations with its layout.
    /// Extraction finishes before anything is touched, so a failing file
    /// leaves the collection exactly as it was.
    pub fn replace_from_course(&mut self, xml: &str) -> Result<usize, LoadError> {
        let layout = extract_course_layout(xml)?;
        self.replace_from_layout(&layout)?;
        Ok(self.stations.len())
    }

    pub fn notices(&self, target: StationRef) -> Result<Vec<FieldNotice>, CollectionError> {
        let station = self.get(target)?;
        Ok(station_notices(station, |field| {
            self.matches_all(target, field, true).unwrap_or(true)
        }))
    }

    fn ensure_focus_can_leave(&self) -> Result<(), CollectionError> {
        if let StationRef::Index(_) = self.focus {
            if let Some(current) = self.focused() {
                if !current.field(FieldName::StationName).is_valid() {
                    return Err(CollectionError::InvalidStationName {
                        label: current.display_label(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Recompute every real station's duplicate-name flag.
    fn refresh_duplicate_names(&mut self) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for station in &self.stations {
            *counts.entry(station.name().to_string()).or_default() += 1;
        }
        for station in &mut self.stations {
            let duplicate = counts.get(station.name()).copied().unwrap_or(0) > 1;
            station.set_duplicate_name(duplicate);
        }
    }

    fn refresh_indicators(&mut self) {
        self.indicators = self.notices(self.focus).unwrap_or_default();
    }
}
