//! Raw establishment records as returned by the business registry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Planar Lambert-93 coordinates (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertPoint {
    pub x: f64,
    pub y: f64,
}

impl LambertPoint {
    /// Only yields a point when both ordinates are present and non-zero;
    /// the inverse projection is undefined otherwise.
    pub fn from_raw(x: Option<f64>, y: Option<f64>) -> Option<Self> {
        match (x, y) {
            (Some(x), Some(y)) if x != 0.0 && y != 0.0 && x.is_finite() && y.is_finite() => {
                Some(Self { x, y })
            }
            _ => None,
        }
    }
}

/// Address components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordAddress {
    pub number: Option<String>,
    pub street_type: Option<String>,
    pub street: Option<String>,
    pub postal_code: String,
    pub commune: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// SIRET
    pub id: String,
    pub name: String,
    pub address: RecordAddress,
    /// NAF code, e.g. "56.10A"
    pub activity_code: Option<String>,
    pub creation_date: Option<NaiveDate>,
    /// Administrative status code ("A" active, "F" closed)
    pub status: String,
    pub lambert: Option<LambertPoint>,
}
