//! Coordinate conversion and distance estimation.

mod distance;
mod projection;

pub use distance::{haversine_km, proxy_km, EARTH_RADIUS_KM};
pub use projection::{lambert93_to_wgs84, LambertParams, LAMBERT_93};
