use crate::error::{ProcessingError, Result};
use crate::models::StationLocation;
use crate::utils::constants::LOCATION_ROW_FIELDS;
use crate::utils::coordinates::parse_coordinate_pair;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use validator::Validate;

/// A location row that could not be turned into a `StationLocation`.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub row_index: usize,
    pub row: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LocationParse {
    pub locations: Vec<StationLocation>,
    pub rejected: Vec<RejectedRow>,
}

/// Parses scraped station-list rows. Each row is one text block with the
/// fields name, country, "latitude,longitude" and station type on separate
/// lines.
pub struct LocationReader;

impl LocationReader {
    pub fn new() -> Self {
        Self
    }

    /// Read row blocks from a file; blocks are separated by blank lines.
    pub fn read_rows(&self, path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)?;
        Ok(split_row_blocks(&content))
    }

    pub fn read_locations(&self, path: &Path) -> Result<LocationParse> {
        let rows = self.read_rows(path)?;
        Ok(self.parse_rows(&rows))
    }

    /// Malformed rows are rejected individually and the rest kept.
    pub fn parse_rows(&self, rows: &[String]) -> LocationParse {
        let mut parse = LocationParse::default();

        for (row_index, row) in rows.iter().enumerate() {
            match self.parse_row(row) {
                Ok(location) => parse.locations.push(location),
                Err(e) => {
                    warn!(row_index, error = %e, "rejected station location row");
                    parse.rejected.push(RejectedRow {
                        row_index,
                        row: row.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            accepted = parse.locations.len(),
            rejected = parse.rejected.len(),
            "parsed station location rows"
        );
        parse
    }

    pub fn parse_row(&self, row: &str) -> Result<StationLocation> {
        let fields: Vec<&str> = row
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        if fields.len() != LOCATION_ROW_FIELDS {
            return Err(ProcessingError::InvalidFormat(format!(
                "Expected {} fields in location row, found {}: {:?}",
                LOCATION_ROW_FIELDS,
                fields.len(),
                fields
            )));
        }

        let (latitude, longitude) = parse_coordinate_pair(fields[2])?;

        let location = StationLocation::new(
            fields[0].to_string(),
            fields[1].to_string(),
            fields[3].to_string(),
            latitude,
            longitude,
        );
        location.validate()?;

        Ok(location)
    }
}

impl Default for LocationReader {
    fn default() -> Self {
        Self::new()
    }
}

fn split_row_blocks(content: &str) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                rows.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        rows.push(current.join("\n"));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_row() {
        let reader = LocationReader::new();
        let location = reader
            .parse_row("Filton\nEngland\n51.521,-2.576\nAutomatic")
            .unwrap();

        assert_eq!(location.station_name, "Filton");
        assert_eq!(location.country, "England");
        assert_eq!(location.station_type, "Automatic");
        assert!((location.latitude - 51.521).abs() < 1e-9);
        assert!((location.longitude - -2.576).abs() < 1e-9);
    }

    #[test]
    fn test_parse_row_rejects_wrong_field_count() {
        let reader = LocationReader::new();
        assert!(reader.parse_row("Filton\nEngland\n51.521,-2.576").is_err());
        assert!(reader.parse_row("Filton\nEngland\n51.5,-2.5\nAutomatic\nextra").is_err());
    }

    #[test]
    fn test_parse_rows_keeps_good_rows() {
        let reader = LocationReader::new();
        let rows = vec![
            "Lerwick\nScotland\n60.139,-1.183\nAutomatic".to_string(),
            "Broken\nScotland\nnot-a-coordinate\nAutomatic".to_string(),
            "Valley\nWales\n53.252,-4.535\nManual".to_string(),
        ];

        let parse = reader.parse_rows(&rows);
        assert_eq!(parse.locations.len(), 2);
        assert_eq!(parse.rejected.len(), 1);
        assert_eq!(parse.rejected[0].row_index, 1);
    }

    #[test]
    fn test_read_locations_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Lerwick\nScotland\n60.139,-1.183\nAutomatic\n")?;
        writeln!(file, "")?;
        writeln!(file, "  Filton  \nEngland\n51.521,-2.576\nAutomatic")?;

        let parse = LocationReader::new().read_locations(file.path())?;
        assert_eq!(parse.locations.len(), 2);
        assert_eq!(parse.locations[1].station_name, "Filton");

        Ok(())
    }
}
