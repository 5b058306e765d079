use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon, degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lon, p.lat)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(p: geo::Point<f64>) -> Self {
        GeoPoint::new(p.y(), p.x())
    }
}

/// Outcome of resolving the caller's free-text location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub center: GeoPoint,
    /// Commune (administrative area) name
    pub area: String,
    pub postal_code: String,
    /// Ascending, always contains `postal_code`
    pub nearby_postal_codes: Vec<String>,
}

impl ResolvedLocation {
    pub fn is_nearby(&self, postal_code: &str) -> bool {
        self.nearby_postal_codes.iter().any(|c| c == postal_code)
    }
}
