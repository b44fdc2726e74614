//! Itinerary assembly tests: the timed schedule derived from a route.

mod fixtures;

use chrono::Weekday;

use tour_planner::itinerary::build_itinerary;
use tour_planner::solver::{optimize, SolveOptions};

use fixtures::*;

#[test]
fn entries_line_up_with_the_route() {
    let places = vec![
        place("eiffel", EIFFEL_TOWER),
        place("louvre", LOUVRE),
        place("notre-dame", NOTRE_DAME),
    ];
    let prefs = prefs(Weekday::Sat, 9, 0, 480);
    let result = optimize(&places, &prefs, &offline_provider(), &SolveOptions::default()).unwrap();

    let itinerary = build_itinerary(&result, &prefs);

    assert_eq!(itinerary.entries.len(), result.places.len());
    for (entry, place) in itinerary.entries.iter().zip(&result.places) {
        assert_eq!(entry.place_id, place.id);
        assert_eq!(
            entry.visit_start.plus_minutes(i64::from(place.visit_duration_min)),
            entry.visit_end
        );
        assert_eq!(entry.departure, entry.visit_end);
    }
    assert!(itinerary.entries.last().unwrap().travel_to_next.is_none());
    for entry in &itinerary.entries[..itinerary.entries.len() - 1] {
        assert!(entry.travel_to_next.is_some());
    }
}

#[test]
fn idempotent_for_the_same_route() {
    let places = vec![place("orsay", ORSAY), place("pantheon", PANTHEON)];
    let prefs = prefs(Weekday::Thu, 10, 0, 300);
    let result = optimize(&places, &prefs, &offline_provider(), &SolveOptions::default()).unwrap();

    let first = build_itinerary(&result, &prefs);
    let second = build_itinerary(&result, &prefs);
    assert_eq!(first, second);
}

#[test]
fn last_departure_stays_inside_the_budget() {
    let places = vec![
        place("eiffel", EIFFEL_TOWER),
        place("louvre", LOUVRE),
        place("notre-dame", NOTRE_DAME),
    ];
    let prefs = prefs(Weekday::Sat, 9, 0, 480);
    let result = optimize(&places, &prefs, &offline_provider(), &SolveOptions::default()).unwrap();
    assert_eq!(result.places.len(), 3);

    let itinerary = build_itinerary(&result, &prefs);
    assert!(itinerary.summary.elapsed_min <= 480);

    let last = itinerary.entries.last().unwrap();
    assert_eq!(
        prefs.start.minutes_until(&last.departure),
        itinerary.summary.elapsed_min
    );
}

#[test]
fn wait_recorded_before_an_opening() {
    let mut museum = place("orsay", ORSAY);
    museum.opening_hours = daily_hours((10, 0), (18, 0));

    let prefs = prefs(Weekday::Tue, 9, 0, 240);
    let result = optimize(&[museum], &prefs, &offline_provider(), &SolveOptions::default()).unwrap();
    let itinerary = build_itinerary(&result, &prefs);

    let entry = &itinerary.entries[0];
    assert_eq!(entry.wait_min, 60);
    assert_eq!(entry.arrival.time, t(9, 0));
    assert_eq!(entry.visit_start.time, t(10, 0));
    assert_eq!(entry.visit_end.time, t(11, 0));
    assert_eq!(itinerary.summary.total_wait_min, 60);
    assert_eq!(itinerary.summary.total_visit_min, 60);
}

#[test]
fn summary_totals_add_up() {
    let places = vec![
        place("arc", ARC_DE_TRIOMPHE),
        place("sacre", SACRE_COEUR),
        place("louvre", LOUVRE),
    ];
    let prefs = prefs(Weekday::Sun, 9, 0, 600);
    let result = optimize(&places, &prefs, &offline_provider(), &SolveOptions::default()).unwrap();
    let itinerary = build_itinerary(&result, &prefs);

    let visit_sum: i64 = result
        .places
        .iter()
        .map(|p| i64::from(p.visit_duration_min))
        .sum();
    assert_eq!(itinerary.summary.total_visit_min, visit_sum);

    let travel_sum: f64 = result.legs.iter().map(|leg| leg.duration_min).sum();
    assert!((itinerary.summary.total_travel_min - travel_sum).abs() < 1e-9);

    // Elapsed = ceiled travel + waits + visits.
    let ceiled_travel: i64 = result.legs.iter().map(|l| l.duration_min.ceil() as i64).sum();
    assert_eq!(
        itinerary.summary.elapsed_min,
        ceiled_travel + itinerary.summary.total_wait_min + itinerary.summary.total_visit_min
    );
}
