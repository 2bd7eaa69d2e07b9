use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AttendanceError;

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = 10.3157)]
    pub lat: f64,
    #[schema(example = 123.8854)]
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, AttendanceError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AttendanceError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

/// Great-circle distance in meters between two validated coordinates.
/// Pure and symmetric: distance(a, b) == distance(b, a).
pub fn distance_meters(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
) -> Result<f64, AttendanceError> {
    let from = Coordinate::new(lat1, lon1)?;
    let to = Coordinate::new(lat2, lon2)?;

    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    Ok(EARTH_RADIUS_M * c)
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct GeofenceCheck {
    #[schema(example = 24.7)]
    pub distance_m: f64,
    pub within: bool,
}

/// Radius check around the registered workplace. The radius is a single
/// configured value; no extra tolerance margin is applied.
#[derive(Debug, Clone, Copy)]
pub struct GeofenceVerifier {
    pub radius_m: f64,
}

impl GeofenceVerifier {
    pub fn new(radius_m: f64) -> Self {
        Self { radius_m }
    }

    /// Boundary is inclusive: a reported point exactly on the radius passes.
    pub fn check(
        &self,
        workplace: Coordinate,
        reported: Coordinate,
    ) -> Result<GeofenceCheck, AttendanceError> {
        let distance_m = distance_meters(workplace.lat, workplace.lon, reported.lat, reported.lon)?;
        Ok(GeofenceCheck {
            distance_m,
            within: distance_m <= self.radius_m,
        })
    }
}
