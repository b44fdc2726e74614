//! Real Paris sightseeing locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. Distances between these are
//! a few kilometers, so estimated intra-city travel legs stay short.

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }
}

// ============================================================================
// Central landmarks
// ============================================================================

pub const EIFFEL_TOWER: Location = Location::new("Eiffel Tower", 48.8582602, 2.2944991);
pub const LOUVRE: Location = Location::new("Louvre Museum", 48.8606111, 2.3376431);
pub const NOTRE_DAME: Location = Location::new("Notre-Dame", 48.8529682, 2.3499021);
pub const ARC_DE_TRIOMPHE: Location = Location::new("Arc de Triomphe", 48.8737917, 2.2950275);
pub const SACRE_COEUR: Location = Location::new("Sacre-Coeur", 48.8867229, 2.3431043);
pub const PANTHEON: Location = Location::new("Pantheon", 48.8462218, 2.3464138);
pub const ORSAY: Location = Location::new("Musee d'Orsay", 48.8599614, 2.3265614);
pub const LUXEMBOURG: Location = Location::new("Luxembourg Gardens", 48.8462453, 2.3371665);

pub const LANDMARKS: &[Location] = &[
    EIFFEL_TOWER,
    LOUVRE,
    NOTRE_DAME,
    ARC_DE_TRIOMPHE,
    SACRE_COEUR,
    PANTHEON,
    ORSAY,
    LUXEMBOURG,
];
