//! Geometric distance/time estimator (fallback when the external
//! travel-time source is unavailable).
//!
//! Uses great-circle distance plus a piecewise effective-speed model.
//! Less accurate than a road-network lookup but deterministic, free of
//! I/O, and always available.

use crate::model::{Coordinates, DistanceRecord, DistanceSource};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Floor applied to every estimated distance, so downstream ratios
/// never divide by zero.
const MIN_DISTANCE_KM: f64 = 0.1;

/// Effective speed for short intra-city hops, stops included.
const CITY_SPEED_KMH: f64 = 24.0;
/// Effective speed for 20-100 km regional legs.
const REGIONAL_SPEED_KMH: f64 = 35.0;
/// Effective highway speed for long legs.
const HIGHWAY_SPEED_KMH: f64 = 50.0;

const CITY_LIMIT_KM: f64 = 20.0;
const REGIONAL_LIMIT_KM: f64 = 100.0;

/// Haversine-based travel estimator.
#[derive(Debug, Clone)]
pub struct GeoEstimator {
    /// Multiplier on top of raw driving time, covering parking, stops
    /// and traffic variance.
    pub buffer_factor: f64,
}

impl Default for GeoEstimator {
    fn default() -> Self {
        Self { buffer_factor: 1.25 }
    }
}

impl GeoEstimator {
    pub fn new(buffer_factor: f64) -> Self {
        Self { buffer_factor }
    }

    /// Great-circle distance in kilometers, floored at `MIN_DISTANCE_KM`.
    pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lng = (to.lng - from.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        (EARTH_RADIUS_KM * c).max(MIN_DISTANCE_KM)
    }

    fn speed_kmh(distance_km: f64) -> f64 {
        if distance_km <= CITY_LIMIT_KM {
            CITY_SPEED_KMH
        } else if distance_km <= REGIONAL_LIMIT_KM {
            REGIONAL_SPEED_KMH
        } else {
            HIGHWAY_SPEED_KMH
        }
    }

    /// Full estimate: distance plus buffered travel time, floored at
    /// one minute.
    pub fn estimate(&self, from: Coordinates, to: Coordinates) -> DistanceRecord {
        let distance_km = Self::distance_km(from, to);
        let hours = distance_km / Self::speed_kmh(distance_km);
        let duration_min = (hours * 60.0 * self.buffer_factor).max(1.0);

        DistanceRecord {
            distance_km,
            duration_min,
            source: DistanceSource::Estimated,
        }
    }
}
