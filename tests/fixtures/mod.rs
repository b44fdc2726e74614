//! Test fixtures for tour-planner.
//!
//! Provides real Paris sightseeing locations plus builders for places,
//! preferences and scripted travel-time sources.

pub mod paris_locations;

pub use paris_locations::*;

use std::sync::Arc;

use chrono::{NaiveTime, Weekday};

use tour_planner::availability::{DaySchedule, OpeningHours};
use tour_planner::cache::DistanceCache;
use tour_planner::error::SourceError;
use tour_planner::estimator::GeoEstimator;
use tour_planner::model::{
    Coordinates, DistanceRecord, DistanceSource, Place, SchedulingPreferences,
};
use tour_planner::provider::{ProviderConfig, TravelTimeProvider};
use tour_planner::traits::TravelTimeSource;

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn window(open: (u32, u32), close: (u32, u32)) -> DaySchedule {
    DaySchedule::Window {
        open: t(open.0, open.1),
        close: t(close.0, close.1),
    }
}

/// All-week window with the same daily hours.
pub fn daily_hours(open: (u32, u32), close: (u32, u32)) -> OpeningHours {
    let mut hours = OpeningHours::always_open();
    for weekday in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ] {
        hours = hours.with_day(weekday, window(open, close));
    }
    hours
}

pub fn place(id: &str, location: Location) -> Place {
    Place {
        id: id.to_string(),
        name: location.name.to_string(),
        category: "sight".to_string(),
        coordinates: Coordinates {
            lat: location.lat,
            lng: location.lng,
        },
        visit_duration_min: 60,
        rating: 4.0,
        entry_fee: 0.0,
        opening_hours: OpeningHours::always_open(),
    }
}

pub fn prefs(weekday: Weekday, hour: u32, minute: u32, budget_min: u32) -> SchedulingPreferences {
    SchedulingPreferences::new(weekday, t(hour, minute), budget_min)
}

/// Provider with no external source; every lookup is estimated.
pub fn offline_provider() -> TravelTimeProvider {
    TravelTimeProvider::offline(Arc::new(DistanceCache::default())).with_config(fast_batches())
}

pub fn fast_batches() -> ProviderConfig {
    ProviderConfig {
        batch_size: 5,
        batch_delay: std::time::Duration::ZERO,
    }
}

/// Source that fails every lookup, simulating the external service
/// being down or out of quota.
pub struct DownSource;

impl TravelTimeSource for DownSource {
    fn lookup(&self, _: Coordinates, _: Coordinates) -> Result<DistanceRecord, SourceError> {
        Err(SourceError::Rejected("quota exhausted".to_string()))
    }
}

/// Deterministic "road network": haversine distance at a fixed speed,
/// answered as if from the external provider.
pub struct FixedSpeedSource {
    pub speed_kmh: f64,
}

impl TravelTimeSource for FixedSpeedSource {
    fn lookup(&self, from: Coordinates, to: Coordinates) -> Result<DistanceRecord, SourceError> {
        let distance_km = GeoEstimator::distance_km(from, to);
        Ok(DistanceRecord {
            distance_km,
            duration_min: distance_km / self.speed_kmh * 60.0,
            source: DistanceSource::Provider,
        })
    }
}
