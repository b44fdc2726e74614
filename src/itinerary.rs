//! Turns a finished route into the authoritative timed schedule.
//!
//! A pure transform over `RouteResult` + preferences: no lookups, no
//! mutation, identical output on every call for the same inputs.

use serde::Serialize;

use crate::availability::{is_open, next_open};
use crate::model::{DistanceRecord, Place, SchedulingPreferences, TimePoint};
use crate::solver::RouteResult;

/// One scheduled stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItineraryEntry {
    pub place_id: String,
    pub place_name: String,
    pub arrival: TimePoint,
    /// Minutes spent waiting for the place to open. Zero when it is
    /// already open on arrival.
    pub wait_min: i64,
    pub visit_start: TimePoint,
    pub visit_end: TimePoint,
    pub departure: TimePoint,
    /// Leg to the next stop; `None` on the last entry.
    pub travel_to_next: Option<DistanceRecord>,
}

/// Aggregate totals over a whole itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItinerarySummary {
    pub total_travel_min: f64,
    pub total_visit_min: i64,
    pub total_wait_min: i64,
    /// Minutes from the preference start to the last departure.
    pub elapsed_min: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub entries: Vec<ItineraryEntry>,
    pub summary: ItinerarySummary,
}

/// Walks the route with a running clock from the preference start.
///
/// Travel legs are ceiled to whole minutes for the clock, matching the
/// solver's schedule simulation, so an itinerary never lands earlier
/// than the feasibility check assumed. Routes produced by the relaxed
/// retry treat opening hours as advisory and record no waits.
pub fn build_itinerary(result: &RouteResult, prefs: &SchedulingPreferences) -> Itinerary {
    let mut entries = Vec::with_capacity(result.places.len());
    let mut elapsed = 0i64;
    let mut total_wait = 0i64;
    let mut total_visit = 0i64;

    for (idx, place) in result.places.iter().enumerate() {
        if idx > 0 {
            elapsed += result.legs[idx - 1].duration_min.ceil() as i64;
        }

        let arrival = prefs.start.plus_minutes(elapsed);
        let wait_min = if result.relaxed {
            0
        } else {
            wait_for_opening(place, &arrival)
        };
        let visit_min = i64::from(place.visit_duration_min);

        let visit_start = arrival.plus_minutes(wait_min);
        let visit_end = visit_start.plus_minutes(visit_min);

        elapsed += wait_min + visit_min;
        total_wait += wait_min;
        total_visit += visit_min;

        entries.push(ItineraryEntry {
            place_id: place.id.clone(),
            place_name: place.name.clone(),
            arrival,
            wait_min,
            visit_start,
            visit_end,
            departure: visit_end,
            travel_to_next: result.legs.get(idx).copied(),
        });
    }

    let total_travel_min = result.legs.iter().map(|leg| leg.duration_min).sum();

    Itinerary {
        entries,
        summary: ItinerarySummary {
            total_travel_min,
            total_visit_min: total_visit,
            total_wait_min: total_wait,
            elapsed_min: elapsed,
        },
    }
}

fn wait_for_opening(place: &Place, arrival: &TimePoint) -> i64 {
    if is_open(&place.opening_hours, arrival) {
        return 0;
    }
    // The solver only schedules places that open inside the horizon;
    // a missing opening here would mean the result was tampered with.
    next_open(&place.opening_hours, arrival)
        .map_or(0, |opening| arrival.minutes_until(&opening))
}
