//! Inverse Lambert conformal conic projection (Lambert-93, EPSG:2154).
//!
//! Constants follow the IGN "tangent cone" formulation: `c` and `ys` are the
//! projection constant and the ordinate of the pole, not the false northing.

use crate::models::{GeoPoint, LambertPoint};

/// Parameters of a Lambert conformal conic projection.
#[derive(Debug, Clone, Copy)]
pub struct LambertParams {
    /// Cone constant
    pub n: f64,
    /// Projection constant (m)
    pub c: f64,
    /// False easting (m)
    pub xs: f64,
    /// Ordinate of the pole (m)
    pub ys: f64,
    /// First eccentricity of the ellipsoid
    pub e: f64,
    /// Central meridian (degrees east of Greenwich)
    pub lon0: f64,
}

/// Lambert-93 on GRS80.
pub const LAMBERT_93: LambertParams = LambertParams {
    n: 0.725_607_765_053_267,
    c: 11_754_255.426_1,
    xs: 700_000.0,
    ys: 12_655_612.049_9,
    e: 0.081_819_191_042_815_8,
    lon0: 3.0,
};

const LATITUDE_ITERATIONS: usize = 6;

impl LambertParams {
    /// Project planar coordinates back to latitude/longitude.
    pub fn to_geographic(&self, point: LambertPoint) -> GeoPoint {
        let dx = point.x - self.xs;
        let dy = self.ys - point.y;

        let r = dx.hypot(dy);
        let gamma = dx.atan2(dy);
        let lon = self.lon0.to_radians() + gamma / self.n;

        let iso_lat = -(r / self.c).abs().ln() / self.n;
        let exp_iso = iso_lat.exp();

        let mut lat = 2.0 * exp_iso.atan() - std::f64::consts::FRAC_PI_2;
        for _ in 0..LATITUDE_ITERATIONS {
            let es = self.e * lat.sin();
            lat = 2.0 * (((1.0 + es) / (1.0 - es)).powf(self.e / 2.0) * exp_iso).atan()
                - std::f64::consts::FRAC_PI_2;
        }

        GeoPoint::new(lat.to_degrees(), lon.to_degrees())
    }
}

/// Convert Lambert-93 coordinates to geographic coordinates.
pub fn lambert93_to_wgs84(point: LambertPoint) -> GeoPoint {
    LAMBERT_93.to_geographic(point)
}
