//! Core domain records consumed and produced by the optimizer.
//!
//! Places and preferences are immutable inputs supplied by the caller
//! (whatever repository or API feeds them is not this crate's concern).

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::availability::OpeningHours;
use crate::error::PlanError;

/// Minutes in a day / a week, used for clock arithmetic.
pub const MINUTES_PER_DAY: i64 = 24 * 60;
pub const MINUTES_PER_WEEK: i64 = 7 * MINUTES_PER_DAY;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A validated geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, PlanError> {
        let candidate = Self { lat, lng };
        candidate.validate()?;
        Ok(candidate)
    }

    /// Checks standard ranges. Non-finite values fail too.
    pub fn validate(&self) -> Result<(), PlanError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(PlanError::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Cache / dedup key rounded to 6 decimal places (~0.1 m).
    pub fn key(&self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lng)
    }
}

/// A candidate sightseeing stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub coordinates: Coordinates,
    /// Average visit duration in minutes. Must be positive.
    pub visit_duration_min: u32,
    /// Used only for scoring; not an invariant.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub entry_fee: f64,
    #[serde(default)]
    pub opening_hours: OpeningHours,
}

/// A weekday plus a time-of-day, with wrapping minute arithmetic.
///
/// The optimizer's running clock is a `TimePoint` advanced by travel,
/// wait and visit durations; arithmetic wraps across midnight and
/// across the end of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl TimePoint {
    pub fn new(weekday: Weekday, time: NaiveTime) -> Self {
        Self { weekday, time }
    }

    /// Minutes since Monday 00:00.
    pub fn week_minutes(&self) -> i64 {
        i64::from(self.weekday.num_days_from_monday()) * MINUTES_PER_DAY
            + i64::from(self.time.hour()) * 60
            + i64::from(self.time.minute())
    }

    fn from_week_minutes(minutes: i64) -> Self {
        let wrapped = minutes.rem_euclid(MINUTES_PER_WEEK);
        let day = (wrapped / MINUTES_PER_DAY) as usize;
        let of_day = wrapped % MINUTES_PER_DAY;
        let hour = (of_day / 60) as u32;
        let minute = (of_day % 60) as u32;
        Self {
            weekday: WEEKDAYS[day % 7],
            time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Advances (or rewinds, for negative input) by whole minutes.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        Self::from_week_minutes(self.week_minutes() + minutes)
    }

    /// Forward distance in minutes to `other`, in `[0, MINUTES_PER_WEEK)`.
    pub fn minutes_until(&self, other: &Self) -> i64 {
        (other.week_minutes() - self.week_minutes()).rem_euclid(MINUTES_PER_WEEK)
    }
}

/// Where a distance/duration figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceSource {
    /// External mapping service.
    Provider,
    /// Local haversine estimate (provider unavailable or unconfigured).
    Estimated,
}

/// One directed origin->destination leg.
///
/// Direction matters: routing is not symmetric, so the provider queries
/// both directions of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub distance_km: f64,
    pub duration_min: f64,
    pub source: DistanceSource,
}

impl DistanceRecord {
    /// Diagonal entry of a travel matrix: a place to itself.
    pub fn zero() -> Self {
        Self {
            distance_km: 0.0,
            duration_min: 0.0,
            source: DistanceSource::Estimated,
        }
    }
}

/// Relative weighting of the greedy step score terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Priority given to place rating.
    pub rating: f64,
    /// Priority given to short travel legs.
    pub proximity: f64,
    /// Priority given to being open at the projected arrival.
    pub hours: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rating: 1.0,
            proximity: 1.0,
            hours: 1.0,
        }
    }
}

/// Read-only trip configuration supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingPreferences {
    /// Where in the week the trip starts.
    pub start: TimePoint,
    /// Total time budget in minutes, start to last departure.
    pub budget_min: u32,
    #[serde(default)]
    pub weights: ScoreWeights,
}

impl SchedulingPreferences {
    pub fn new(weekday: Weekday, time: NaiveTime, budget_min: u32) -> Self {
        Self {
            start: TimePoint::new(weekday, time),
            budget_min,
            weights: ScoreWeights::default(),
        }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.budget_min == 0 {
            return Err(PlanError::InvalidPreferences(
                "time budget must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
