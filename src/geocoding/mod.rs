//! Free-text location resolution.

mod postal;
mod resolver;

pub use postal::nearby_postal_codes;
pub use resolver::{GeocodingError, GeocodingResolver};
