//! Report model: the serializable view of a validated station collection,
//! handed to whatever writes the typesetting parameter file.

use crate::collection::{StationCollection, StationRef};
use crate::course::Problem;
use crate::field::FieldValue;
use crate::notice::{FieldNotice, Severity};
use crate::station::Station;
use crate::Result;

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationView {
    /// Position in the collection; absent for the Defaults record.
    pub index: Option<usize>,
    pub label: String,
    pub valid: bool,

    /// Every field keyed by its camelCase key. Unset numbers are `null`.
    pub fields: BTreeMap<&'static str, FieldValue>,

    pub notices: Vec<FieldNotice>,

    pub problems: Vec<Problem>,
    pub num_problems: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsView {
    pub stations: usize,
    pub shown: usize,
    pub invalid: usize,
    pub warnings: usize,
    pub problems: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub defaults: StationView,
    pub stations: Vec<StationView>,
    pub totals: TotalsView,
}

impl ReportData {
    /// Labels of real stations that are not ready to print.
    pub fn invalid_stations(&self) -> Vec<&str> {
        self.stations
            .iter()
            .filter(|s| !s.valid)
            .map(|s| s.label.as_str())
            .collect()
    }
}

/// Build the report for every real station in collection order.
pub fn build_report_data(collection: &StationCollection) -> Result<ReportData> {
    let defaults = station_view(collection, StationRef::Defaults, collection.defaults())?;

    let mut stations = Vec::with_capacity(collection.len());
    for (index, station) in collection.stations().iter().enumerate() {
        stations.push(station_view(collection, StationRef::Index(index), station)?);
    }

    let totals = TotalsView {
        stations: stations.len(),
        shown: collection.stations().iter().filter(|s| s.is_shown()).count(),
        invalid: stations.iter().filter(|s| !s.valid).count(),
        warnings: stations
            .iter()
            .flat_map(|s| &s.notices)
            .filter(|n| n.severity == Severity::Warning)
            .count(),
        problems: stations.iter().map(|s| s.num_problems).sum(),
    };

    Ok(ReportData {
        defaults,
        stations,
        totals,
    })
}

fn station_view(
    collection: &StationCollection,
    target: StationRef,
    station: &Station,
) -> Result<StationView> {
    let fields = station
        .fields()
        .map(|f| (f.name().key(), f.value().clone()))
        .collect();

    Ok(StationView {
        index: match target {
            StationRef::Index(i) => Some(i),
            StationRef::Defaults => None,
        },
        label: station.display_label(),
        valid: station.is_valid(),
        fields,
        notices: collection.notices(target)?,
        problems: station.problems().to_vec(),
        num_problems: station.num_problems(),
    })
}

/// Render the report as pretty JSON.
pub fn render_json_report(data: &ReportData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}
