//! Distance between two stations for the purpose of interpolation.
//!
//! Horizontal separation is the great-circle distance on a spherical earth.
//! Vertical separation is scaled by an altitude weight before both are combined
//! euclidean-style, so that a station a few hundred meters higher counts as far
//! away even when it is horizontally adjacent.

use crate::types::station::GeoPoint;
use haversine::{distance, Location as HaversineLocation, Units};
use std::cmp::Ordering;

/// Great-circle distance between two latitude/longitude pairs, in meters.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let km = distance(
        HaversineLocation {
            latitude: lat1,
            longitude: lon1,
        },
        HaversineLocation {
            latitude: lat2,
            longitude: lon2,
        },
        Units::Kilometers,
    );
    km * 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoMetric {
    altitude_weight: f64,
}

impl GeoMetric {
    /// `altitude_weight` multiplies the altitude difference (m) before it is
    /// combined with the horizontal distance (m). Negative weights are taken by
    /// magnitude.
    pub fn new(altitude_weight: f64) -> Self {
        Self {
            altitude_weight: altitude_weight.abs(),
        }
    }

    pub fn altitude_weight(&self) -> f64 {
        self.altitude_weight
    }

    /// Combined distance in meters.
    pub fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        // Evaluate in a canonical order so that d(a, b) and d(b, a) are bit-identical.
        let (p, q) = if canonical_order(a, b) == Ordering::Greater {
            (b, a)
        } else {
            (a, b)
        };
        let horizontal = great_circle_distance(p.latitude, p.longitude, q.latitude, q.longitude);
        let vertical = (p.altitude - q.altitude).abs() * self.altitude_weight;
        horizontal.hypot(vertical)
    }
}

fn canonical_order(a: &GeoPoint, b: &GeoPoint) -> Ordering {
    a.latitude
        .total_cmp(&b.latitude)
        .then(a.longitude.total_cmp(&b.longitude))
        .then(a.altitude.total_cmp(&b.altitude))
}
