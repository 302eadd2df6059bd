//! Real Paris-area locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use dispatch_geo::geo::{GeoPoint, Waypoint};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::named(self.lat, self.lng, self.name)
    }

    pub fn waypoint(&self) -> Waypoint {
        Waypoint::new(self.point())
    }
}

// ============================================================================
// Hubs (depots)
// ============================================================================

pub const HUBS: &[Location] = &[
    Location::new("Rungis Marché International", 48.7494, 2.3522),
    Location::new("Gare de Lyon", 48.8443, 2.3744),
    Location::new("La Défense", 48.8918, 2.2362),
];

// ============================================================================
// Delivery addresses inside Paris
// ============================================================================

pub const DELIVERIES: &[Location] = &[
    Location::new("Place de la Bastille", 48.8532, 2.3692),
    Location::new("Place de la République", 48.8674, 2.3636),
    Location::new("Hôtel de Ville", 48.8566, 2.3522),
    Location::new("Jardin du Luxembourg", 48.8462, 2.3372),
    Location::new("Tour Montparnasse", 48.8421, 2.3219),
    Location::new("Tour Eiffel", 48.8584, 2.2945),
    Location::new("Arc de Triomphe", 48.8738, 2.2950),
    Location::new("Opéra Garnier", 48.8720, 2.3316),
    Location::new("Sacré-Cœur", 48.8867, 2.3431),
    Location::new("Gare du Nord", 48.8809, 2.3553),
    Location::new("Parc des Buttes-Chaumont", 48.8809, 2.3828),
    Location::new("Cimetière du Père-Lachaise", 48.8614, 2.3933),
    Location::new("Bibliothèque François-Mitterrand", 48.8338, 2.3761),
    Location::new("Place d'Italie", 48.8310, 2.3555),
    Location::new("Parc Montsouris", 48.8222, 2.3380),
    Location::new("Porte de Versailles", 48.8322, 2.2876),
    Location::new("Trocadéro", 48.8616, 2.2893),
    Location::new("Parc Monceau", 48.8797, 2.3088),
    Location::new("Canal Saint-Martin", 48.8710, 2.3660),
    Location::new("Place de la Nation", 48.8483, 2.3959),
    Location::new("Bercy Village", 48.8329, 2.3860),
    Location::new("Institut du Monde Arabe", 48.8490, 2.3572),
];

pub fn hub() -> GeoPoint {
    HUBS[1].point()
}

pub fn deliveries(n: usize) -> Vec<Waypoint> {
    DELIVERIES.iter().take(n).map(Location::waypoint).collect()
}
