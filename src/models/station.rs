use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// A station location row as scraped from the station list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationLocation {
    #[validate(length(min = 1))]
    pub station_name: String,

    pub country: String,

    pub station_type: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl StationLocation {
    pub fn new(
        station_name: String,
        country: String,
        station_type: String,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            station_name,
            country,
            station_type,
            latitude,
            longitude,
        }
    }

    pub fn is_station_type(&self, station_type: &str) -> bool {
        self.station_type.trim().eq_ignore_ascii_case(station_type.trim())
    }

    /// Bitwise coordinate key, used to detect the same site listed twice.
    pub fn coordinate_key(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// How a station name was matched against the location list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchTier {
    Exact,
    Normalized,
    Substring,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTier::Exact => write!(f, "exact"),
            MatchTier::Normalized => write!(f, "normalized"),
            MatchTier::Substring => write!(f, "substring"),
        }
    }
}

/// Observation station name with its resolved coordinate, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ResolvedStation {
    pub station_name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub tier: Option<MatchTier>,

    pub location_name: Option<String>,
}

impl ResolvedStation {
    pub fn matched(station_name: String, location: &StationLocation, tier: MatchTier) -> Self {
        Self {
            station_name,
            latitude: Some(location.latitude),
            longitude: Some(location.longitude),
            tier: Some(tier),
            location_name: Some(location.station_name.clone()),
        }
    }

    pub fn unmatched(station_name: String) -> Self {
        Self {
            station_name,
            latitude: None,
            longitude: None,
            tier: None,
            location_name: None,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn is_resolved(&self) -> bool {
        self.coordinates().is_some()
    }
}
