use crate::error::{ProcessingError, Result};
use crate::models::{ObservationTable, RegionDailyAggregate, RegionGeometry, ResolvedStation};
use crate::utils::coordinates::haversine_distance;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Closest resolved station for one region. `station_id` is the identifier
/// the station's name first appears with in the observation table.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAssignment {
    pub region: String,
    pub station: Option<String>,
    pub station_id: Option<u32>,
    pub distance_km: Option<f64>,
}

/// A region whose aggregate stays undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryIssue {
    pub region: String,
    pub message: String,
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region '{}': {}", self.region, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateOutput {
    pub assignments: Vec<RegionAssignment>,
    pub aggregates: Vec<RegionDailyAggregate>,
    pub issues: Vec<GeometryIssue>,
}

/// Assigns each region its nearest station and joins the station's daily
/// mean of one measurement onto every region and day.
///
/// Centroids and station coordinates are both WGS84 degrees; distances are
/// great-circle kilometres.
pub struct RegionAggregator {
    measurement: String,
}

impl RegionAggregator {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
        }
    }

    pub fn assign_stations(
        &self,
        regions: &[RegionGeometry],
        stations: &[ResolvedStation],
    ) -> (Vec<RegionAssignment>, Vec<GeometryIssue>) {
        let mut assignments = Vec::with_capacity(regions.len());
        let mut issues = Vec::new();

        for region in regions {
            let assignment = match region.centroid() {
                None => {
                    issues.push(GeometryIssue {
                        region: region.name.clone(),
                        message: "degenerate geometry, no centroid".to_string(),
                    });
                    None
                }
                Some(centroid) => {
                    let nearest = nearest_station(centroid.y(), centroid.x(), stations);
                    if nearest.is_none() {
                        issues.push(GeometryIssue {
                            region: region.name.clone(),
                            message: "no station with resolved coordinates".to_string(),
                        });
                    }
                    nearest
                }
            };

            let (station, distance_km) = match assignment {
                Some((station, distance)) => (Some(station.station_name.clone()), Some(distance)),
                None => (None, None),
            };
            assignments.push(RegionAssignment {
                region: region.name.clone(),
                station,
                station_id: None,
                distance_km,
            });
        }

        for issue in &issues {
            warn!(%issue, "region left without aggregate");
        }
        (assignments, issues)
    }

    /// Mean of the measurement per (station id, day) over the slots with a
    /// numeric value; `None` when every slot is missing.
    pub fn daily_means(&self, table: &ObservationTable) -> BTreeMap<(u32, NaiveDate), Option<f64>> {
        let mut sums: BTreeMap<(u32, NaiveDate), (f64, usize)> = BTreeMap::new();

        for row in &table.rows {
            let entry = sums
                .entry((row.station_id, row.date))
                .or_insert((0.0, 0));
            if let Some(value) = row.numeric_value(&self.measurement) {
                entry.0 += value;
                entry.1 += 1;
            }
        }

        sums.into_iter()
            .map(|(key, (sum, count))| (key, (count > 0).then(|| sum / count as f64)))
            .collect()
    }

    pub fn aggregate(
        &self,
        regions: &[RegionGeometry],
        stations: &[ResolvedStation],
        table: &ObservationTable,
    ) -> Result<AggregateOutput> {
        if !table.measurements.iter().any(|m| m == &self.measurement) {
            return Err(ProcessingError::MissingData(format!(
                "Measurement '{}' is not one of {:?}",
                self.measurement, table.measurements
            )));
        }

        let mut station_ids: HashMap<&str, u32> = HashMap::new();
        for row in &table.rows {
            station_ids.entry(row.station_name.as_str()).or_insert(row.station_id);
        }

        let (mut assignments, issues) = self.assign_stations(regions, stations);
        for assignment in &mut assignments {
            assignment.station_id = assignment
                .station
                .as_deref()
                .and_then(|s| station_ids.get(s).copied());
        }

        let means = self.daily_means(table);
        let days = table.dates();

        let mut aggregates = Vec::with_capacity(assignments.len() * days.len());
        for assignment in &assignments {
            for day in &days {
                let aggregated_value = assignment
                    .station_id
                    .and_then(|id| means.get(&(id, *day)).copied().flatten());
                aggregates.push(RegionDailyAggregate {
                    region_id: assignment.region.clone(),
                    closest_station_id: assignment.station_id,
                    closest_station: assignment.station.clone(),
                    day: *day,
                    aggregated_value,
                });
            }
        }

        debug!(
            regions = assignments.len(),
            days = days.len(),
            rows = aggregates.len(),
            measurement = %self.measurement,
            "aggregated region values"
        );

        Ok(AggregateOutput {
            assignments,
            aggregates,
            issues,
        })
    }
}

/// Strictly closer wins, so ties keep the earliest station.
fn nearest_station(lat: f64, lon: f64, stations: &[ResolvedStation]) -> Option<(&ResolvedStation, f64)> {
    let mut best: Option<(&ResolvedStation, f64)> = None;

    for station in stations {
        let Some((station_lat, station_lon)) = station.coordinates() else {
            continue;
        };
        let distance = haversine_distance(lat, lon, station_lat, station_lon);
        if !distance.is_finite() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((station, distance)),
        }
    }

    best
}
