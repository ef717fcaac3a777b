use crate::error::{ProcessingError, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Convert a `D:M:S` coordinate to decimal degrees. A leading minus sign
/// applies to the whole value, so `-0:07:39` is west of Greenwich.
///
/// # Examples
/// ```
/// use weather_summary_processor::utils::dms_to_decimal;
///
/// let decimal = dms_to_decimal("51:31:15").unwrap();
/// assert!((decimal - 51.520833).abs() < 0.000001);
/// ```
pub fn dms_to_decimal(dms: &str) -> Result<f64> {
    let trimmed = dms.trim();
    let parts = trimmed
        .split(':')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| {
            ProcessingError::InvalidCoordinate(format!("Non-numeric DMS component in '{}'", dms))
        })?;

    let &[degrees, minutes, seconds] = parts.as_slice() else {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Expected 'DD:MM:SS', got '{}'",
            dms
        )));
    };

    if !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Minutes and seconds must be in [0, 60) in '{}'",
            dms
        )));
    }

    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    Ok(if trimmed.starts_with('-') { -magnitude } else { magnitude })
}

/// Decimal degrees or `D:M:S`.
pub fn parse_coordinate(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.contains(':') {
        return dms_to_decimal(trimmed);
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProcessingError::InvalidCoordinate(format!("Invalid coordinate '{}'", value)))
}

/// Parse the scraped "latitude,longitude" composite field
pub fn parse_coordinate_pair(pair: &str) -> Result<(f64, f64)> {
    let (lat, lon) = pair.split_once(',').ok_or_else(|| {
        ProcessingError::InvalidCoordinate(format!(
            "Expected 'latitude,longitude', got: '{}'",
            pair
        ))
    })?;

    let latitude = parse_coordinate(lat)?;
    let longitude = parse_coordinate(lon)?;
    validate_coordinate_range(latitude, longitude)?;

    Ok((latitude, longitude))
}

pub fn validate_coordinate_range(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Latitude {} is outside [-90, 90]",
            latitude
        )));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Longitude {} is outside [-180, 180]",
            longitude
        )));
    }

    Ok(())
}

/// Great-circle distance in kilometres between two WGS84 points.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let half_dphi = (lat2 - lat1).to_radians() / 2.0;
    let half_dlambda = (lon2 - lon1).to_radians() / 2.0;

    let h = half_dphi.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlambda.sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
