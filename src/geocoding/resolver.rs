//! Forward geocoding against a Nominatim-compatible endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use super::postal::nearby_postal_codes;
use crate::config::GeocoderConfig;
use crate::models::{GeoPoint, RadiusBucket, ResolvedLocation};
use crate::resilience::{with_retry, CircuitBreaker, RetryPolicy, Transient};

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Location '{0}' could not be resolved")]
    NotFound(String),
    #[error("Geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Geocoder returned status {0}")]
    Status(StatusCode),
    #[error("Geocoder returned an unusable coordinate for '{0}'")]
    BadCoordinate(String),
    #[error("Geocoder circuit is open")]
    CircuitOpen,
    #[error("Invalid geocoder endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl Transient for GeocodingError {
    fn is_transient(&self) -> bool {
        match self {
            GeocodingError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            GeocodingError::Status(s) => s.is_server_error() || *s == StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    postcode: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
}

impl NominatimAddress {
    fn commune(&self) -> Option<&str> {
        [&self.city, &self.town, &self.village, &self.municipality]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    /// Nominatim joins multi-valued postcodes with ';' or ','
    fn first_postcode(&self) -> Option<&str> {
        self.postcode
            .as_deref()?
            .split([';', ','])
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Resolves free text to a base coordinate and its nearby postal codes.
pub struct GeocodingResolver {
    client: Client,
    endpoint: Url,
    country_codes: String,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl GeocodingResolver {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            country_codes: config.country_codes.clone(),
            retry: config.retry.clone(),
            breaker: CircuitBreaker::new("geocoder", &config.breaker),
        })
    }

    /// Resolve `text` to its single best match.
    #[instrument(skip(self), fields(radius_km = radius.km()))]
    pub async fn resolve(
        &self,
        text: &str,
        radius: RadiusBucket,
    ) -> Result<ResolvedLocation, GeocodingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GeocodingError::NotFound(text.to_string()));
        }

        if !self.breaker.allow() {
            return Err(GeocodingError::CircuitOpen);
        }

        let result = with_retry(&self.retry, "Geocoder lookup", || self.lookup(text)).await;
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(e) if e.is_transient() => self.breaker.record_failure(),
            Err(_) => {}
        }

        let place = result?.ok_or_else(|| GeocodingError::NotFound(text.to_string()))?;
        let location = build_location(text, &place, radius)?;

        info!(
            "Resolved '{}' to {} ({}), {} nearby postal codes",
            text,
            location.area,
            location.postal_code,
            location.nearby_postal_codes.len()
        );

        Ok(location)
    }

    async fn lookup(&self, text: &str) -> Result<Option<NominatimPlace>, GeocodingError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("format", "jsonv2")
            .append_pair("addressdetails", "1")
            .append_pair("limit", "1")
            .append_pair("countrycodes", &self.country_codes);

        debug!("Geocoder request: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GeocodingError::Status(response.status()));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        Ok(places.into_iter().next())
    }
}

fn build_location(
    text: &str,
    place: &NominatimPlace,
    radius: RadiusBucket,
) -> Result<ResolvedLocation, GeocodingError> {
    let lat = place.lat.trim().parse::<f64>();
    let lon = place.lon.trim().parse::<f64>();
    let center = match (lat, lon) {
        (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => GeoPoint::new(lat, lon),
        _ => return Err(GeocodingError::BadCoordinate(text.to_string())),
    };

    // Without a postal code there is nothing to anchor the registry query on
    let postal_code = place
        .address
        .first_postcode()
        .ok_or_else(|| GeocodingError::NotFound(text.to_string()))?
        .to_string();

    let area = place
        .address
        .commune()
        .or(place.name.as_deref())
        .unwrap_or(text)
        .to_string();

    Ok(ResolvedLocation {
        center,
        area,
        nearby_postal_codes: nearby_postal_codes(&postal_code, radius),
        postal_code,
    })
}
