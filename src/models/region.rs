use chrono::NaiveDate;
use geo::{Area, Centroid, MultiPolygon, Point};
use serde::{Deserialize, Serialize};

/// A named administrative polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    pub name: String,
    /// WGS84 coordinates, x = longitude, y = latitude.
    pub geometry: MultiPolygon<f64>,
}

impl RegionGeometry {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Centroid in degrees, `None` for empty or zero-area geometry.
    pub fn centroid(&self) -> Option<Point<f64>> {
        if self.geometry.unsigned_area() <= 0.0 {
            return None;
        }
        self.geometry
            .centroid()
            .filter(|p| p.x().is_finite() && p.y().is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDailyAggregate {
    pub region_id: String,
    pub closest_station_id: Option<u32>,
    pub closest_station: Option<String>,
    pub day: NaiveDate,
    pub aggregated_value: Option<f64>,
}
