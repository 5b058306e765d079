use std::time::Duration;

use thiserror::Error;

use crate::geocoding::GeocodingError;
use crate::models::CriteriaError;

/// Failures surfaced to the caller of a search. Registry and probe failures
/// never appear here: they are recovered inside the pipeline.
#[derive(Debug, Error)]
pub enum ProspectError {
    #[error("Location '{0}' could not be resolved")]
    LocationNotFound(String),

    #[error("Invalid search criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),

    #[error("Geocoding failed: {0}")]
    Geocoding(GeocodingError),

    #[error("Search did not complete within {0:?}")]
    DeadlineExceeded(Duration),
}

impl From<GeocodingError> for ProspectError {
    fn from(e: GeocodingError) -> Self {
        match e {
            GeocodingError::NotFound(text) => ProspectError::LocationNotFound(text),
            other => ProspectError::Geocoding(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProspectError>;
