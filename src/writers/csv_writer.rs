use crate::error::{ProcessingError, Result};
use crate::models::{
    ObservationTable, RegionDailyAggregate, ResolvedStation, StationLocation, StationObservation,
    TimeSlot,
};
use crate::utils::constants::{
    LOCATIONS_FILE, OBSERVATIONS_FILE, REGION_DAILY_FILE, RESOLVED_STATIONS_FILE,
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Writer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed leading columns of the observation file; measurement columns follow.
const OBSERVATION_ID_COLUMNS: [&str; 4] = ["station_id", "station_name", "date", "time"];

/// Writes the run's tabular outputs as CSV.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// One row per station, date and time slot. Missing cells are empty.
    pub fn write_observations(&self, table: &ObservationTable, path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;

        let header: Vec<&str> = OBSERVATION_ID_COLUMNS
            .iter()
            .copied()
            .chain(table.measurements.iter().map(String::as_str))
            .collect();
        writer.write_record(&header)?;

        for row in &table.rows {
            let mut record = vec![
                row.station_id.to_string(),
                row.station_name.clone(),
                row.date.format("%Y-%m-%d").to_string(),
                row.time_slot.to_string(),
            ];
            record.extend(
                table
                    .measurements
                    .iter()
                    .map(|m| row.raw_value(m).unwrap_or("").to_string()),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        info!(rows = table.len(), path = %path.display(), "wrote observations");
        Ok(())
    }

    pub fn read_observations(&self, path: &Path) -> Result<ObservationTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let leading: Vec<&str> = headers.iter().take(OBSERVATION_ID_COLUMNS.len()).collect();
        if leading != OBSERVATION_ID_COLUMNS {
            return Err(ProcessingError::InvalidFormat(format!(
                "{} does not start with columns {:?}",
                path.display(),
                OBSERVATION_ID_COLUMNS
            )));
        }

        let measurements: Vec<String> = headers
            .iter()
            .skip(OBSERVATION_ID_COLUMNS.len())
            .map(str::to_string)
            .collect();

        let mut table = ObservationTable::new(measurements);
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let row = parse_observation(&record, &table.measurements)
                .map_err(|e| ProcessingError::InvalidFormat(format!("row {}: {}", index + 1, e)))?;
            table.rows.push(row);
        }

        Ok(table)
    }

    pub fn write_locations(&self, locations: &[StationLocation], path: &Path) -> Result<()> {
        self.write_serialized(locations, path)?;
        info!(rows = locations.len(), path = %path.display(), "wrote station locations");
        Ok(())
    }

    pub fn write_resolved_stations(&self, stations: &[ResolvedStation], path: &Path) -> Result<()> {
        self.write_serialized(stations, path)?;
        info!(rows = stations.len(), path = %path.display(), "wrote resolved stations");
        Ok(())
    }

    pub fn write_region_daily(&self, aggregates: &[RegionDailyAggregate], path: &Path) -> Result<()> {
        self.write_serialized(aggregates, path)?;
        info!(rows = aggregates.len(), path = %path.display(), "wrote region daily aggregates");
        Ok(())
    }

    /// Write every output under `dir`, creating it if needed.
    pub fn write_all(
        &self,
        dir: &Path,
        observations: &ObservationTable,
        locations: &[StationLocation],
        stations: &[ResolvedStation],
        aggregates: &[RegionDailyAggregate],
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let paths = [
            dir.join(OBSERVATIONS_FILE),
            dir.join(LOCATIONS_FILE),
            dir.join(RESOLVED_STATIONS_FILE),
            dir.join(REGION_DAILY_FILE),
        ];

        self.write_observations(observations, &paths[0])?;
        self.write_locations(locations, &paths[1])?;
        self.write_resolved_stations(stations, &paths[2])?;
        self.write_region_daily(aggregates, &paths[3])?;

        Ok(paths.to_vec())
    }

    fn write_serialized<T: Serialize>(&self, rows: &[T], path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn writer(&self, path: &Path) -> Result<Writer<fs::File>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)?)
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_observation(record: &StringRecord, measurements: &[String]) -> Result<StationObservation> {
    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let station_id = field(0)
        .parse::<u32>()
        .map_err(|_| ProcessingError::InvalidFormat(format!("invalid station_id '{}'", field(0))))?;
    let date = NaiveDate::parse_from_str(field(2), "%Y-%m-%d")?;
    let time_slot = TimeSlot::parse(field(3))
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("invalid time '{}'", field(3))))?;

    let values: BTreeMap<String, Option<String>> = measurements
        .iter()
        .enumerate()
        .map(|(offset, name)| {
            let value = field(OBSERVATION_ID_COLUMNS.len() + offset);
            (name.clone(), (!value.is_empty()).then(|| value.to_string()))
        })
        .collect();

    Ok(StationObservation::new(
        station_id,
        field(1).to_string(),
        date,
        time_slot,
        values,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchTier;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn observation(slot: TimeSlot, cloud: Option<&str>) -> StationObservation {
        let mut measurements = BTreeMap::new();
        measurements.insert("CLOUD".to_string(), cloud.map(str::to_string));
        measurements.insert("WIND DIR".to_string(), Some("SW".to_string()));
        StationObservation::new(
            3862,
            "Filton and Almondsbury".to_string(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            slot,
            measurements,
        )
    }

    #[test]
    fn test_observations_read_back_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(OBSERVATIONS_FILE);

        let table = ObservationTable {
            measurements: vec!["CLOUD".to_string(), "WIND DIR".to_string()],
            rows: vec![
                observation(TimeSlot::Midnight, Some("n/a")),
                observation(TimeSlot::Noon, None),
            ],
        };

        let writer = CsvWriter::new();
        writer.write_observations(&table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("station_id,station_name,date,time,CLOUD,WIND DIR\n"));
        assert!(content.contains("3862,Filton and Almondsbury,2020-01-01,1200,,SW"));

        assert_eq!(writer.read_observations(&path).unwrap(), table);
    }

    #[test]
    fn test_read_rejects_foreign_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("other.csv");
        fs::write(&path, "a,b,c,d\n1,2,3,4\n").unwrap();

        let result = CsvWriter::new().read_observations(&path);
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }

    #[test]
    fn test_write_all_creates_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("out");

        let location = StationLocation::new(
            "Filton".to_string(),
            "England".to_string(),
            "Automatic".to_string(),
            51.521,
            -2.576,
        );
        let stations = vec![
            ResolvedStation::matched("Filton and Almondsbury".to_string(), &location, MatchTier::Substring),
            ResolvedStation::unmatched("Nowhere".to_string()),
        ];
        let aggregates = vec![RegionDailyAggregate {
            region_id: "Bristol".to_string(),
            closest_station_id: Some(3862),
            closest_station: Some("Filton and Almondsbury".to_string()),
            day: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            aggregated_value: None,
        }];

        let paths = CsvWriter::new()
            .write_all(&dir, &ObservationTable::default(), &[location], &stations, &aggregates)
            .unwrap();

        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.exists()));

        let resolved = fs::read_to_string(dir.join(RESOLVED_STATIONS_FILE)).unwrap();
        assert!(resolved.contains("Nowhere,,,,"));

        let daily = fs::read_to_string(dir.join(REGION_DAILY_FILE)).unwrap();
        assert!(daily.contains("Bristol,3862,Filton and Almondsbury,2020-01-01,"));
    }
}
