use crate::error::{ProcessingError, Result};
use crate::models::{DailyTableBlock, StationObservation, TimeSlot};
use crate::processors::table_parser::WideTable;
use crate::utils::constants::SLOT_SEPARATOR;
use crate::utils::dates::parse_summary_date;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// One cell of the wide table after pivoting to long form.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub station_id: u32,
    pub station_name: String,
    pub measurement: String,
    pub time_slot: TimeSlot,
    pub value: Option<String>,
}

/// A day's table in narrow form: one row per station and time slot.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub date: NaiveDate,
    pub measurements: Vec<String>,
    pub rows: Vec<StationObservation>,
}

pub struct FormatNormalizer;

impl FormatNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize_block(&self, block: &DailyTableBlock, table: &WideTable) -> Result<NormalizedTable> {
        let date_line = block.date_line.as_deref().ok_or_else(|| {
            ProcessingError::SourceFormat(format!(
                "Page {} has no 'for <day> <month> <year>' date line",
                block.page_index
            ))
        })?;
        self.normalize(table, date_line)
    }

    pub fn normalize(&self, table: &WideTable, date_line: &str) -> Result<NormalizedTable> {
        let date = parse_summary_date(date_line)?;
        let long = self.to_long(table)?;
        let (measurements, rows) = self.widen(long, date)?;

        let expected = table.rows.len() * TimeSlot::ALL.len();
        if rows.len() != expected {
            return Err(ProcessingError::SourceFormat(format!(
                "Normalized {} rows for {} stations on {}, expected {}",
                rows.len(),
                table.rows.len(),
                date,
                expected
            )));
        }

        Ok(NormalizedTable {
            date,
            measurements,
            rows,
        })
    }

    /// Pivot to one record per (station, measurement, slot).
    pub fn to_long(&self, table: &WideTable) -> Result<Vec<LongRecord>> {
        let slots = table
            .measurement_columns()
            .iter()
            .map(|c| decompose_column(c))
            .collect::<Result<Vec<_>>>()?;
        check_slot_symmetry(&slots)?;

        let mut seen_ids = HashSet::new();
        let mut long = Vec::with_capacity(table.rows.len() * slots.len());

        for row in &table.rows {
            let (station_id, station_name) = station_identity(row)?;
            if !seen_ids.insert(station_id) {
                return Err(ProcessingError::SourceFormat(format!(
                    "Station {} appears more than once in the table",
                    station_id
                )));
            }

            for (offset, (measurement, time_slot)) in slots.iter().enumerate() {
                let cell = row
                    .get(table.id_columns + offset)
                    .map(|v| v.trim())
                    .unwrap_or("");
                long.push(LongRecord {
                    station_id,
                    station_name: station_name.clone(),
                    measurement: measurement.clone(),
                    time_slot: *time_slot,
                    value: (!cell.is_empty()).then(|| cell.to_string()),
                });
            }
        }

        Ok(long)
    }

    /// Re-widen long records into one row per (station, slot) with a
    /// measurement map, keeping first-seen station order.
    pub fn widen(
        &self,
        long: Vec<LongRecord>,
        date: NaiveDate,
    ) -> Result<(Vec<String>, Vec<StationObservation>)> {
        let mut measurements: Vec<String> = Vec::new();
        let mut rows: Vec<StationObservation> = Vec::new();
        let mut index: HashMap<(u32, TimeSlot), usize> = HashMap::new();
        let mut station_order: HashMap<u32, usize> = HashMap::new();

        for record in long {
            let next = station_order.len();
            station_order.entry(record.station_id).or_insert(next);

            if !measurements.contains(&record.measurement) {
                measurements.push(record.measurement.clone());
            }

            let key = (record.station_id, record.time_slot);
            let position = *index.entry(key).or_insert_with(|| {
                rows.push(StationObservation::new(
                    record.station_id,
                    record.station_name.clone(),
                    date,
                    record.time_slot,
                    BTreeMap::new(),
                ));
                rows.len() - 1
            });

            if rows[position]
                .measurements
                .insert(record.measurement.clone(), record.value)
                .is_some()
            {
                return Err(ProcessingError::SourceFormat(format!(
                    "Measurement {} repeated for station {} at {}",
                    record.measurement, record.station_id, record.time_slot
                )));
            }
        }

        rows.sort_by_key(|r| (station_order[&r.station_id], r.time_slot));

        Ok((measurements, rows))
    }
}

impl Default for FormatNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// `CLOUD_0000` -> (`CLOUD`, Midnight). Splits on the last separator so
/// measurement names may contain it.
pub fn decompose_column(column: &str) -> Result<(String, TimeSlot)> {
    let (measurement, slot) = column.rsplit_once(SLOT_SEPARATOR).ok_or_else(|| {
        ProcessingError::SourceFormat(format!("Column '{}' has no time slot suffix", column))
    })?;

    let slot = TimeSlot::parse(slot).ok_or_else(|| {
        ProcessingError::SourceFormat(format!("Column '{}' has unknown time slot '{}'", column, slot))
    })?;

    if measurement.trim().is_empty() {
        return Err(ProcessingError::SourceFormat(format!(
            "Column '{}' has no measurement name",
            column
        )));
    }

    Ok((measurement.to_string(), slot))
}

/// Every measurement must be present for every slot.
fn check_slot_symmetry(slots: &[(String, TimeSlot)]) -> Result<()> {
    let mut per_slot: BTreeMap<TimeSlot, BTreeSet<&str>> = BTreeMap::new();
    for (measurement, slot) in slots {
        per_slot.entry(*slot).or_default().insert(measurement.as_str());
    }

    let midnight = per_slot.get(&TimeSlot::Midnight);
    let noon = per_slot.get(&TimeSlot::Noon);
    match (midnight, noon) {
        (Some(a), Some(b)) if a == b => Ok(()),
        _ => Err(ProcessingError::SourceFormat(format!(
            "Measurement columns differ between time slots: 0000 {:?}, 1200 {:?}",
            midnight, noon
        ))),
    }
}

fn station_identity(row: &[String]) -> Result<(u32, String)> {
    let raw_id = row.first().map(|s| s.trim()).unwrap_or("");
    let station_id = raw_id.parse::<u32>().map_err(|_| {
        ProcessingError::SourceFormat(format!("Invalid station number '{}'", raw_id))
    })?;

    let station_name = row.get(1).map(|s| s.trim()).unwrap_or("");
    if station_name.is_empty() {
        return Err(ProcessingError::SourceFormat(format!(
            "Station {} has no site name",
            station_id
        )));
    }

    Ok((station_id, station_name.to_string()))
}
