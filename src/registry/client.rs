//! Sirene establishment search client.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::{form_urlencoded, Url};

use super::query::Clause;
use crate::config::RegistryConfig;
use crate::models::{LambertPoint, RecordAddress, RegistryRecord};
use crate::resilience::{with_retry, CircuitBreaker, RetryPolicy, Transient};
use crate::text::non_blank;

const API_KEY_HEADER: &str = "X-INSEE-Api-Key-Integration";

/// Longer search URLs are sent as a POST form instead.
const MAX_GET_URL_LEN: usize = 2_000;

/// Reasons a registry call produced no usable records. All of them are
/// recovered by the caller.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No registry API key configured")]
    MissingCredential,
    #[error("Registry request failed: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("Registry returned status {0}")]
    Status(StatusCode),
    #[error("Registry circuit is open")]
    CircuitOpen,
    #[error("Invalid registry URL: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl Transient for RegistryError {
    fn is_transient(&self) -> bool {
        match self {
            RegistryError::Unavailable(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            RegistryError::Status(s) => s.is_server_error() || *s == StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SiretResponse {
    #[serde(default)]
    etablissements: Vec<Etablissement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Etablissement {
    siret: String,
    date_creation_etablissement: Option<String>,
    #[serde(default)]
    unite_legale: UniteLegale,
    #[serde(default)]
    adresse_etablissement: Adresse,
    #[serde(default)]
    periodes_etablissement: Vec<Periode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniteLegale {
    denomination_unite_legale: Option<String>,
    denomination_usuelle1_unite_legale: Option<String>,
    nom_unite_legale: Option<String>,
    prenom1_unite_legale: Option<String>,
    activite_principale_unite_legale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Adresse {
    numero_voie_etablissement: Option<String>,
    type_voie_etablissement: Option<String>,
    libelle_voie_etablissement: Option<String>,
    code_postal_etablissement: Option<String>,
    libelle_commune_etablissement: Option<String>,
    coordonnee_lambert_abscisse_etablissement: Option<String>,
    coordonnee_lambert_ordonnee_etablissement: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Periode {
    etat_administratif_etablissement: Option<String>,
    activite_principale_etablissement: Option<String>,
    enseigne1_etablissement: Option<String>,
    denomination_usuelle_etablissement: Option<String>,
}

impl Etablissement {
    fn into_record(self) -> RegistryRecord {
        // The current period comes first
        let current = self
            .periodes_etablissement
            .into_iter()
            .next()
            .unwrap_or_default();
        let ul = self.unite_legale;
        let addr = self.adresse_etablissement;

        let person = match (
            non_blank(ul.prenom1_unite_legale.as_deref()),
            non_blank(ul.nom_unite_legale.as_deref()),
        ) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (None, Some(last)) => Some(last),
            _ => None,
        };

        let name = non_blank(current.enseigne1_etablissement.as_deref())
            .or_else(|| non_blank(current.denomination_usuelle_etablissement.as_deref()))
            .or_else(|| non_blank(ul.denomination_unite_legale.as_deref()))
            .or_else(|| non_blank(ul.denomination_usuelle1_unite_legale.as_deref()))
            .or(person)
            .unwrap_or_default();

        let parse_coord = |raw: Option<&str>| non_blank(raw).and_then(|v| v.parse::<f64>().ok());

        RegistryRecord {
            id: self.siret,
            name,
            address: RecordAddress {
                number: non_blank(addr.numero_voie_etablissement.as_deref()),
                street_type: non_blank(addr.type_voie_etablissement.as_deref()),
                street: non_blank(addr.libelle_voie_etablissement.as_deref()),
                postal_code: non_blank(addr.code_postal_etablissement.as_deref())
                    .unwrap_or_default(),
                commune: non_blank(addr.libelle_commune_etablissement.as_deref())
                    .unwrap_or_default(),
            },
            activity_code: non_blank(current.activite_principale_etablissement.as_deref())
                .or_else(|| non_blank(ul.activite_principale_unite_legale.as_deref())),
            creation_date: self
                .date_creation_etablissement
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            status: non_blank(current.etat_administratif_etablissement.as_deref())
                .unwrap_or_default(),
            lambert: LambertPoint::from_raw(
                parse_coord(addr.coordonnee_lambert_abscisse_etablissement.as_deref()),
                parse_coord(addr.coordonnee_lambert_ordonnee_etablissement.as_deref()),
            ),
        }
    }
}

/// Executes composed queries against the registry.
pub struct RegistryClient {
    client: Client,
    search_url: Url,
    api_key: Option<String>,
    max_results: usize,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .user_agent(concat!("prospect/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let base = format!("{}/siret", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            search_url: Url::parse(&base)?,
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from),
            max_results: config.max_results,
            retry: config.retry.clone(),
            breaker: CircuitBreaker::new("registry", &config.breaker),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run `query`, capped at the configured result count. A "no match"
    /// answer is `Ok(vec![])`.
    #[instrument(skip_all)]
    pub async fn search(&self, query: &Clause) -> Result<Vec<RegistryRecord>, RegistryError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RegistryError::MissingCredential)?;

        if !self.breaker.allow() {
            return Err(RegistryError::CircuitOpen);
        }

        let q = query.to_string();
        let result = with_retry(&self.retry, "Registry search", || self.fetch(&q, api_key)).await;

        match &result {
            Ok(records) => {
                self.breaker.record_success();
                info!("Registry returned {} establishments", records.len());
            }
            Err(e) if e.is_transient() => self.breaker.record_failure(),
            Err(_) => {}
        }

        result
    }

    async fn fetch(&self, q: &str, api_key: &str) -> Result<Vec<RegistryRecord>, RegistryError> {
        let nombre = self.max_results.to_string();
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", q)
            .append_pair("nombre", &nombre);

        debug!("Registry query: {}", q);

        // Wide radii expand to a hundred postal codes, too long for a URL
        let request = if url.as_str().len() <= MAX_GET_URL_LEN {
            self.client.get(url)
        } else {
            let form = form_urlencoded::Serializer::new(String::new())
                .append_pair("q", q)
                .append_pair("nombre", &nombre)
                .finish();
            debug!("Query of {} bytes sent as a form", form.len());
            self.client
                .post(self.search_url.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(form)
        };

        let response = request
            .header(API_KEY_HEADER, api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            s if !s.is_success() => return Err(RegistryError::Status(s)),
            _ => {}
        }

        let body: SiretResponse = response.json().await?;
        Ok(body
            .etablissements
            .into_iter()
            .map(Etablissement::into_record)
            .collect())
    }
}
