//! Exact and proxy distance estimation.

use geo::{Distance, HaversineMeasure, Point};
use rand::Rng;

use crate::models::{GeoPoint, ResolvedLocation};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

const EARTH: HaversineMeasure = HaversineMeasure::new(EARTH_RADIUS_KM * 1000.0);

/// Same postal code: distance sampled in `[0, SAME_CODE_MAX_KM)`
pub const SAME_CODE_MAX_KM: f64 = 3.0;
/// Kilometres per unit of postal code difference
pub const KM_PER_CODE_STEP: f64 = 3.0;
/// Upper bound (exclusive) of the jitter added to a stepped estimate
pub const STEP_JITTER_KM: f64 = 2.0;
/// Margin past the radius for records outside the nearby band
pub const OUT_OF_BAND_MARGIN_KM: f64 = 1.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (a, b): (Point<f64>, Point<f64>) = (a.into(), b.into());
    EARTH.distance(a, b) / 1000.0
}

/// Cheap distance estimate from postal codes alone.
///
/// Postal codes are not laid out geometrically, so this can misplace records
/// in both directions. It exists to avoid geocoding every registry record.
pub fn proxy_km<R: Rng>(
    postal_code: &str,
    location: &ResolvedLocation,
    radius_km: f64,
    rng: &mut R,
) -> f64 {
    let postal_code = postal_code.trim();

    if postal_code == location.postal_code {
        return rng.random_range(0.0..SAME_CODE_MAX_KM);
    }

    if location.is_nearby(postal_code) {
        if let (Ok(code), Ok(base)) = (
            postal_code.parse::<i64>(),
            location.postal_code.parse::<i64>(),
        ) {
            let steps = (code - base).unsigned_abs() as f64;
            return steps * KM_PER_CODE_STEP + rng.random_range(0.0..STEP_JITTER_KM);
        }
    }

    radius_km + OUT_OF_BAND_MARGIN_KM
}
