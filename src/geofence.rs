//! Circular authorization zones for clock events.

use serde::{Deserialize, Serialize};

use crate::{consts::{EARTH_RADIUS_METERS, GEOFENCE_RADIUS_METERS}, error::{CoreError, CoreResult}};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting anything outside `[-90, 90]` / `[-180, 180]` or non-finite
    pub fn new(latitude: f64, longitude: f64) -> CoreResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidCoordinate(format!("latitude {latitude} is outside [-90, 90]")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidCoordinate(format!("longitude {longitude} is outside [-180, 180]")));
        }

        Ok(Self { latitude, longitude })
    }

    /// Great-circle distance in meters (Haversine)
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_METERS * c
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub center: GeoPoint,
    pub radius_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneCheck {
    pub distance_m: f64,
    pub within_zone: bool,
}

impl Geofence {
    /// A missing or non-positive radius falls back to the system default
    pub fn new(center: GeoPoint, radius_m: Option<f64>) -> Self {
        let radius_m = radius_m
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(GEOFENCE_RADIUS_METERS);

        Self { center, radius_m }
    }

    pub fn check(&self, point: &GeoPoint) -> ZoneCheck {
        let distance_m = self.center.distance_to(point);

        ZoneCheck {
            distance_m,
            within_zone: distance_m <= self.radius_m,
        }
    }

    /// Validates raw coordinates and rejects points outside the zone
    pub fn authorize(&self, latitude: f64, longitude: f64) -> CoreResult<ZoneCheck> {
        let point = GeoPoint::new(latitude, longitude)?;
        let check = self.check(&point);

        if !check.within_zone {
            return Err(CoreError::LocationNotAllowed {
                distance_m: check.distance_m,
                radius_m: self.radius_m,
            });
        }

        Ok(check)
    }
}
