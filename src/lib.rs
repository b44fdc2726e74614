//! tour-planner: sightseeing itinerary optimizer
//!
//! Selects and orders a feasible subset of candidate places inside a
//! time budget, respecting weekly opening hours, and turns the result
//! into a timed schedule. Travel times come from an external source
//! when one is configured, with a geometric estimator as fallback.

pub mod availability;
pub mod cache;
pub mod deadline;
pub mod error;
pub mod estimator;
pub mod itinerary;
pub mod model;
pub mod osrm;
pub mod provider;
pub mod refine;
pub mod solver;
pub mod traits;
