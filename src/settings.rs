use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Structural assumptions about a daily table page.
///
/// Line indices count non-blank lines of the page. `column_count` covers the
/// identifier columns plus every measurement twice, once per time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub marker: String,
    pub header_line: usize,
    pub skip_head: usize,
    pub skip_tail: usize,
    pub column_count: usize,
    pub id_columns: usize,
    pub min_stations: usize,
    pub expected_pages: Option<usize>,
}

impl TableLayout {
    pub fn measurement_count(&self) -> usize {
        self.column_count.saturating_sub(self.id_columns) / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.marker.trim().is_empty() {
            return Err(ProcessingError::Config("layout.marker must not be empty".to_string()));
        }
        if self.id_columns < 2 {
            return Err(ProcessingError::Config(format!(
                "layout.id_columns must be at least 2 (station id and name), got {}",
                self.id_columns
            )));
        }
        if self.column_count <= self.id_columns
            || (self.column_count - self.id_columns) % 2 != 0
        {
            return Err(ProcessingError::Config(format!(
                "layout.column_count {} must exceed id_columns {} by an even number",
                self.column_count, self.id_columns
            )));
        }
        if self.header_line >= self.skip_head {
            return Err(ProcessingError::Config(format!(
                "layout.header_line {} must fall inside the {} skipped head lines",
                self.header_line, self.skip_head
            )));
        }
        if self.min_stations == 0 {
            return Err(ProcessingError::Config(
                "layout.min_stations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            marker: DEFAULT_TABLE_MARKER.to_string(),
            header_line: DEFAULT_HEADER_LINE,
            skip_head: DEFAULT_SKIP_HEAD,
            skip_tail: DEFAULT_SKIP_TAIL,
            column_count: DEFAULT_COLUMN_COUNT,
            id_columns: DEFAULT_ID_COLUMNS,
            min_stations: DEFAULT_MIN_STATIONS,
            expected_pages: None,
        }
    }
}

/// Explicit rename applied to an observation station name before matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCorrection {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    pub station_type: String,
    pub corrections: Vec<NameCorrection>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            station_type: DEFAULT_STATION_TYPE.to_string(),
            corrections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSettings {
    pub measurement: String,
    pub region_name_property: String,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            measurement: DEFAULT_MEASUREMENT.to_string(),
            region_name_property: DEFAULT_REGION_NAME_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub layout: TableLayout,
    pub resolver: ResolverSettings,
    pub aggregate: AggregateSettings,
}

impl Settings {
    /// Built-in defaults, overlaid by an optional TOML file, overlaid by
    /// `WXSUMMARY_<SECTION>__<KEY>` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;

        if self.aggregate.measurement.trim().is_empty() {
            return Err(ProcessingError::Config(
                "aggregate.measurement must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for correction in &self.resolver.corrections {
            if correction.from.trim().is_empty() || correction.to.trim().is_empty() {
                return Err(ProcessingError::Config(
                    "resolver.corrections entries need both 'from' and 'to'".to_string(),
                ));
            }
            if !seen.insert(correction.from.as_str()) {
                return Err(ProcessingError::Config(format!(
                    "resolver.corrections lists '{}' more than once",
                    correction.from
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.layout.measurement_count(), 5);
    }

    #[test]
    fn test_measurement_count_without_validation() {
        let layout = TableLayout {
            column_count: 1,
            id_columns: 2,
            ..TableLayout::default()
        };
        assert_eq!(layout.measurement_count(), 0);
    }

    #[test]
    fn test_layout_validation() {
        let layout = TableLayout {
            column_count: 11,
            ..TableLayout::default()
        };
        assert!(layout.validate().is_err());

        let layout = TableLayout {
            header_line: 4,
            skip_head: 4,
            ..TableLayout::default()
        };
        assert!(layout.validate().is_err());

        let layout = TableLayout {
            id_columns: 1,
            column_count: 3,
            ..TableLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_duplicate_corrections_rejected() {
        let mut settings = Settings::default();
        settings.resolver.corrections = vec![
            NameCorrection {
                from: "Filton and Almondsbury".to_string(),
                to: "Filton".to_string(),
            },
            NameCorrection {
                from: "Filton and Almondsbury".to_string(),
                to: "Almondsbury".to_string(),
            },
        ];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            r#"
[layout]
column_count = 6
min_stations = 2

[resolver]
corrections = [{{ from = "Filton and Almondsbury", to = "Filton" }}]

[aggregate]
measurement = "TEMP"
"#
        )?;

        let settings = Settings::load(Some(file.path()))?;
        assert_eq!(settings.layout.column_count, 6);
        assert_eq!(settings.layout.min_stations, 2);
        assert_eq!(settings.layout.marker, DEFAULT_TABLE_MARKER);
        assert_eq!(settings.resolver.corrections.len(), 1);
        assert_eq!(settings.resolver.station_type, DEFAULT_STATION_TYPE);
        assert_eq!(settings.aggregate.measurement, "TEMP");

        Ok(())
    }
}
