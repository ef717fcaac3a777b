/// Marker phrase that identifies a daily station table page
pub const DEFAULT_TABLE_MARKER: &str = "Selected UK readings at";

/// Table layout defaults (line indices count non-blank lines only)
pub const DEFAULT_HEADER_LINE: usize = 2;
pub const DEFAULT_SKIP_HEAD: usize = 4;
pub const DEFAULT_SKIP_TAIL: usize = 1;
pub const DEFAULT_ID_COLUMNS: usize = 2;
pub const DEFAULT_COLUMN_COUNT: usize = 12;
pub const DEFAULT_MIN_STATIONS: usize = 5;

/// Separator between measurement name and time slot in wide column names
pub const SLOT_SEPARATOR: char = '_';

/// Station type comparable to the automated observation network
pub const DEFAULT_STATION_TYPE: &str = "Automatic";

/// Measurement aggregated per region and day
pub const DEFAULT_MEASUREMENT: &str = "CLOUD";

/// GeoJSON feature property holding the region name
pub const DEFAULT_REGION_NAME_PROPERTY: &str = "name";

/// Page separator emitted by pdftotext
pub const PAGE_SEPARATOR: char = '\u{000C}';

/// Fields per location row: name, country, "lat,lon", station type
pub const LOCATION_ROW_FIELDS: usize = 4;

/// Prefix for environment overrides of settings
pub const ENV_PREFIX: &str = "WXSUMMARY";

/// Output file names
pub const OBSERVATIONS_FILE: &str = "observations.csv";
pub const LOCATIONS_FILE: &str = "locations.csv";
pub const RESOLVED_STATIONS_FILE: &str = "resolved_stations.csv";
pub const REGION_DAILY_FILE: &str = "region_daily.csv";

/// HTTP user agent for the station list fetch
pub const USER_AGENT: &str = concat!("weather-summary-processor/", env!("CARGO_PKG_VERSION"));
