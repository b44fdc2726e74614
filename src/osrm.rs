//! OSRM HTTP adapter for point-to-point travel lookups.

use serde::Deserialize;

use crate::error::SourceError;
use crate::model::{Coordinates, DistanceRecord, DistanceSource};
use crate::traits::TravelTimeSource;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TravelTimeSource for OsrmClient {
    fn lookup(&self, from: Coordinates, to: Coordinates) -> Result<DistanceRecord, SourceError> {
        let url = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.config.base_url, self.config.profile, from.lng, from.lat, to.lng, to.lat
        );

        let body: OsrmRouteResponse = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())?;

        if body.code != "Ok" {
            return Err(SourceError::Rejected(body.code));
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::BadResponse("no routes in response".to_string()))?;

        Ok(DistanceRecord {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
            source: DistanceSource::Provider,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}
