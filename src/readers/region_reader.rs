use crate::error::{ProcessingError, Result};
use crate::models::RegionGeometry;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    geometry: Option<GeometryObject>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryObject {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

/// Reads region polygons from a GeoJSON FeatureCollection in WGS84.
pub struct RegionReader {
    name_property: String,
}

impl RegionReader {
    pub fn new(name_property: impl Into<String>) -> Self {
        Self {
            name_property: name_property.into(),
        }
    }

    pub fn read_regions(&self, path: &Path) -> Result<Vec<RegionGeometry>> {
        let content = fs::read_to_string(path)?;
        let regions = self.parse_regions(&content)?;
        debug!(path = %path.display(), regions = regions.len(), "read region geometries");
        Ok(regions)
    }

    /// Features without usable geometry, including malformed positions, become
    /// regions with empty geometry so the aggregation step reports them
    /// instead of dropping them. Only an unreadable collection is an error.
    pub fn parse_regions(&self, content: &str) -> Result<Vec<RegionGeometry>> {
        let collection: FeatureCollection = serde_json::from_str(content)?;

        let regions = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                let name = self.feature_name(&feature).unwrap_or_else(|| {
                    warn!(index, property = %self.name_property, "region feature has no name");
                    format!("region_{}", index)
                });
                let geometry = match feature.geometry.map(|g| to_multi_polygon(&name, g)) {
                    Some(Ok(geometry)) => geometry,
                    Some(Err(e)) => {
                        warn!(region = %name, error = %e, "malformed region geometry, treating as empty");
                        MultiPolygon::new(Vec::new())
                    }
                    None => MultiPolygon::new(Vec::new()),
                };
                RegionGeometry::new(name, geometry)
            })
            .collect();
        Ok(regions)
    }

    fn feature_name(&self, feature: &Feature) -> Option<String> {
        let value = feature.properties.as_ref()?.get(&self.name_property)?;
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn to_multi_polygon(region: &str, geometry: GeometryObject) -> Result<MultiPolygon<f64>> {
    match geometry {
        GeometryObject::Polygon { coordinates } => {
            Ok(MultiPolygon::new(vec![to_polygon(region, coordinates)?]))
        }
        GeometryObject::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .map(|rings| to_polygon(region, rings))
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon::new),
        GeometryObject::Unsupported => {
            warn!(region, "unsupported geometry type, treating as empty");
            Ok(MultiPolygon::new(Vec::new()))
        }
    }
}

fn to_polygon(region: &str, rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>> {
    let mut rings = rings
        .into_iter()
        .map(|ring| to_line_string(region, ring))
        .collect::<Result<Vec<_>>>()?;

    if rings.is_empty() {
        return Ok(Polygon::new(LineString::new(Vec::new()), Vec::new()));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn to_line_string(region: &str, ring: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    ring.into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(ProcessingError::Geometry {
                region: region.to_string(),
                message: format!("position needs longitude and latitude, got {:?}", position),
            }),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}
