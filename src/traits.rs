//! Seam between the optimizer and external travel-time services.
//!
//! Concrete adapters (OSRM, or a scripted mock in tests) implement
//! `TravelTimeSource`; the provider layers caching and fallback on top.

use crate::error::SourceError;
use crate::model::{Coordinates, DistanceRecord};

/// Point-to-point travel-time/distance lookup against an external
/// service. Queried directionally: `lookup(a, b)` and `lookup(b, a)`
/// may legitimately differ.
pub trait TravelTimeSource: Sync {
    fn lookup(&self, from: Coordinates, to: Coordinates) -> Result<DistanceRecord, SourceError>;
}

impl<T: TravelTimeSource + ?Sized> TravelTimeSource for &T {
    fn lookup(&self, from: Coordinates, to: Coordinates) -> Result<DistanceRecord, SourceError> {
        (**self).lookup(from, to)
    }
}
