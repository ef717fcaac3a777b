use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{ProcessingError, Result};

/// One of the two fixed daily observation times (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "0000")]
    Midnight,
    #[serde(rename = "1200")]
    Noon,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 2] = [TimeSlot::Midnight, TimeSlot::Noon];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "0000" => Some(TimeSlot::Midnight),
            "1200" => Some(TimeSlot::Noon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Midnight => "0000",
            TimeSlot::Noon => "1200",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationObservation {
    pub station_id: u32,
    pub station_name: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    /// Raw cell text per measurement, `None` where the table cell was empty.
    pub measurements: BTreeMap<String, Option<String>>,
}

impl StationObservation {
    pub fn new(
        station_id: u32,
        station_name: String,
        date: NaiveDate,
        time_slot: TimeSlot,
        measurements: BTreeMap<String, Option<String>>,
    ) -> Self {
        Self {
            station_id,
            station_name,
            date,
            time_slot,
            measurements,
        }
    }

    pub fn raw_value(&self, measurement: &str) -> Option<&str> {
        self.measurements
            .get(measurement)
            .and_then(|v| v.as_deref())
    }

    /// Numeric reading for a measurement; non-numeric cells count as missing.
    pub fn numeric_value(&self, measurement: &str) -> Option<f64> {
        self.raw_value(measurement)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

/// The tabular observation dataset: ordered measurement columns plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub measurements: Vec<String>,
    pub rows: Vec<StationObservation>,
}

impl ObservationTable {
    pub fn new(measurements: Vec<String>) -> Self {
        Self {
            measurements,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append one day's rows. Every table of a month must carry the same
    /// measurement columns and must not repeat a (station, date, slot) key.
    pub fn append(&mut self, measurements: &[String], rows: Vec<StationObservation>) -> Result<()> {
        if self.measurements.is_empty() && self.rows.is_empty() {
            self.measurements = measurements.to_vec();
        } else if self.measurements != measurements {
            return Err(ProcessingError::SourceFormat(format!(
                "Measurement columns {:?} differ from earlier tables {:?}",
                measurements, self.measurements
            )));
        }

        let existing: BTreeSet<(u32, NaiveDate, TimeSlot)> =
            self.rows.iter().map(|r| (r.station_id, r.date, r.time_slot)).collect();
        if let Some(dup) = rows
            .iter()
            .find(|r| existing.contains(&(r.station_id, r.date, r.time_slot)))
        {
            return Err(ProcessingError::SourceFormat(format!(
                "Duplicate observation for station {} on {} at {}",
                dup.station_id, dup.date, dup.time_slot
            )));
        }

        self.rows.extend(rows);
        Ok(())
    }

    /// Distinct station names in first-seen order.
    pub fn station_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        for row in &self.rows {
            if seen.insert(row.station_name.as_str()) {
                names.push(row.station_name.clone());
            }
        }
        names
    }

    /// Distinct dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows
            .iter()
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
