//! Search orchestration: geocode, query the registry (or fall back to the
//! synthetic dataset), rank, and optionally probe for websites.

use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{ProspectError, Result};
use crate::geocoding::GeocodingResolver;
use crate::models::{DataSource, RegistryRecord, ResolvedLocation, SearchCriteria, SearchOutcome};
use crate::probe::WebsiteProbe;
use crate::ranking::rank;
use crate::registry::{build_query, synthetic_records, Clause, RegistryClient, RegistryError};

pub struct ProspectPipeline {
    geocoder: GeocodingResolver,
    registry: RegistryClient,
    probe: Option<WebsiteProbe>,
    deadline: Duration,
    seed: Option<u64>,
    today: Option<NaiveDate>,
}

impl ProspectPipeline {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let geocoder =
            GeocodingResolver::new(&config.geocoder).context("Failed to create geocoder client")?;
        let registry =
            RegistryClient::new(&config.registry).context("Failed to create registry client")?;
        let probe = if config.probe.enabled {
            Some(WebsiteProbe::new(&config.probe).context("Failed to create probe client")?)
        } else {
            None
        };

        Ok(Self {
            geocoder,
            registry,
            probe,
            deadline: Duration::from_millis(config.server.request_deadline_ms),
            seed: None,
            today: None,
        })
    }

    /// Seed the proxy distance jitter, for reproducible rankings.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fix the date relative age filters are computed from.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Which data source a search would use if the registry is reachable.
    pub fn registry_mode(&self) -> DataSource {
        if self.registry.has_credential() {
            DataSource::Live
        } else {
            DataSource::Synthetic
        }
    }

    /// Run one search, bounded by the configured deadline.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchOutcome> {
        tokio::time::timeout(self.deadline, self.run(criteria))
            .await
            .map_err(|_| ProspectError::DeadlineExceeded(self.deadline))?
    }

    #[instrument(skip_all, fields(location = %criteria.location, radius_km = criteria.radius.km()))]
    async fn run(&self, criteria: &SearchCriteria) -> Result<SearchOutcome> {
        let location = self
            .geocoder
            .resolve(&criteria.location, criteria.radius)
            .await?;

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let query = build_query(criteria, &location, today);
        let (records, data_source) = self.fetch_records(&query, &location).await;

        let ranked = {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            rank(records, &location, criteria.radius, &mut rng)
        };

        let mut results = ranked.candidates;
        if let Some(probe) = &self.probe {
            probe.annotate(&mut results).await;
        }

        info!(
            "Search returned {} of {} matches ({})",
            results.len(),
            ranked.total,
            data_source
        );

        Ok(SearchOutcome {
            total: ranked.total,
            data_source,
            results,
        })
    }

    /// Registry records, or the synthetic dataset when the registry has
    /// nothing usable to offer.
    async fn fetch_records(
        &self,
        query: &Clause,
        location: &ResolvedLocation,
    ) -> (Vec<RegistryRecord>, DataSource) {
        match self.registry.search(query).await {
            Ok(records) if !records.is_empty() => (records, DataSource::Live),
            Ok(_) => {
                info!("Registry returned no match, using synthetic dataset");
                (synthetic_records(location), DataSource::Synthetic)
            }
            Err(RegistryError::MissingCredential) => {
                info!("No registry credential, using synthetic dataset");
                (synthetic_records(location), DataSource::Synthetic)
            }
            Err(e) => {
                warn!("Registry unavailable ({}), using synthetic dataset", e);
                (synthetic_records(location), DataSource::Synthetic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    async fn mock_reims(geocoder: &MockServer) {
        geocoder
            .mock_async(|when, then| {
                when.method(GET).path("/search").query_param("q", "Reims");
                then.status(200).json_body(json!([{
                    "lat": "49.2577886",
                    "lon": "4.031926",
                    "name": "Reims",
                    "address": { "city": "Reims", "postcode": "51100" }
                }]));
            })
            .await;
    }

    fn config(geocoder: &MockServer, registry: &MockServer, api_key: Option<&str>) -> Config {
        let mut config = Config::default();
        config.geocoder.endpoint = geocoder.url("/search");
        config.geocoder.retry.max_retries = 0;
        config.registry.base_url = registry.base_url();
        config.registry.api_key = api_key.map(String::from);
        config.registry.retry.max_retries = 0;
        config.probe.enabled = false;
        config
    }

    fn criteria(location: &str, radius: &str) -> SearchCriteria {
        SearchCriteria::parse(location, radius, "all", "all", "all").unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_uses_synthetic_dataset() {
        let geocoder = MockServer::start_async().await;
        let registry = MockServer::start_async().await;
        mock_reims(&geocoder).await;
        let registry_mock = registry
            .mock_async(|when, then| {
                when.method(GET).path("/siret");
                then.status(200);
            })
            .await;

        let pipeline = ProspectPipeline::from_config(&config(&geocoder, &registry, None))
            .unwrap()
            .with_seed(1);
        assert_eq!(pipeline.registry_mode(), DataSource::Synthetic);

        let outcome = pipeline.search(&criteria("Reims", "25")).await.unwrap();
        assert_eq!(outcome.data_source, DataSource::Synthetic);
        assert_eq!(outcome.total, 2);
        assert!(outcome.results.iter().all(|c| c.distance <= 25.0));
        assert!(outcome.results.iter().all(|c| c.id.starts_with("DEMO")));
        assert!(outcome.results[0].distance <= outcome.results[1].distance);
        registry_mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_unknown_location_is_not_found() {
        let geocoder = MockServer::start_async().await;
        let registry = MockServer::start_async().await;
        geocoder
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200).json_body(json!([]));
            })
            .await;

        let pipeline =
            ProspectPipeline::from_config(&config(&geocoder, &registry, Some("key"))).unwrap();
        let err = pipeline
            .search(&criteria("Xyzzyville", "10"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProspectError::LocationNotFound(ref text) if text == "Xyzzyville"));
    }

    #[tokio::test]
    async fn test_live_registry_results_are_ranked_and_filtered() {
        let geocoder = MockServer::start_async().await;
        let registry = MockServer::start_async().await;
        mock_reims(&geocoder).await;
        let registry_mock = registry
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/siret")
                    .header("x-insee-api-key-integration", "test-key")
                    .query_param("nombre", "500")
                    .query_param_exists("q");
                then.status(200).json_body(json!({
                    "header": { "statut": 200, "total": 2 },
                    "etablissements": [
                        {
                            "siret": "11111111100011",
                            "dateCreationEtablissement": "2020-01-15",
                            "uniteLegale": { "denominationUniteLegale": "FAR AWAY SAS" },
                            "adresseEtablissement": {
                                "codePostalEtablissement": "75004",
                                "libelleCommuneEtablissement": "PARIS",
                                "coordonneeLambertAbscisseEtablissement": "652469",
                                "coordonneeLambertOrdonneeEtablissement": "6862035"
                            },
                            "periodesEtablissement": [{
                                "etatAdministratifEtablissement": "A",
                                "activitePrincipaleEtablissement": "56.10A"
                            }]
                        },
                        {
                            "siret": "22222222200022",
                            "dateCreationEtablissement": "2022-06-01",
                            "uniteLegale": { "denominationUniteLegale": "BISTROT DU CENTRE" },
                            "adresseEtablissement": {
                                "numeroVoieEtablissement": "3",
                                "typeVoieEtablissement": "PL",
                                "libelleVoieEtablissement": "DROUET D ERLON",
                                "codePostalEtablissement": "51100",
                                "libelleCommuneEtablissement": "REIMS",
                                "coordonneeLambertAbscisseEtablissement": "776000",
                                "coordonneeLambertOrdonneeEtablissement": "6906000"
                            },
                            "periodesEtablissement": [{
                                "etatAdministratifEtablissement": "A",
                                "activitePrincipaleEtablissement": "56.10A"
                            }]
                        }
                    ]
                }));
            })
            .await;

        let config = config(&geocoder, &registry, Some("test-key"));
        let pipeline = ProspectPipeline::from_config(&config)
            .unwrap()
            .with_seed(3)
            .with_today(today());
        assert_eq!(pipeline.registry_mode(), DataSource::Live);

        let outcome = pipeline.search(&criteria("Reims", "25")).await.unwrap();
        registry_mock.assert_hits_async(1).await;

        assert_eq!(outcome.data_source, DataSource::Live);
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].id, "22222222200022");
        assert!(outcome.results[0].distance < 3.0);
    }

    #[tokio::test]
    async fn test_registry_no_match_uses_synthetic_dataset() {
        let geocoder = MockServer::start_async().await;
        let registry = MockServer::start_async().await;
        mock_reims(&geocoder).await;
        registry
            .mock_async(|when, then| {
                when.method(GET).path("/siret");
                then.status(404)
                    .json_body(json!({ "header": { "statut": 404 } }));
            })
            .await;

        let pipeline = ProspectPipeline::from_config(&config(&geocoder, &registry, Some("key")))
            .unwrap()
            .with_seed(5);
        let outcome = pipeline.search(&criteria("Reims", "10")).await.unwrap();
        assert_eq!(outcome.data_source, DataSource::Synthetic);
        assert_eq!(outcome.total, 2);
    }

    #[tokio::test]
    async fn test_registry_breaker_opens_after_repeated_failures() {
        let geocoder = MockServer::start_async().await;
        let registry = MockServer::start_async().await;
        mock_reims(&geocoder).await;
        let registry_mock = registry
            .mock_async(|when, then| {
                when.method(GET).path("/siret");
                then.status(503);
            })
            .await;

        let mut config = config(&geocoder, &registry, Some("key"));
        config.registry.breaker.failure_threshold = 2;
        let pipeline = ProspectPipeline::from_config(&config).unwrap().with_seed(9);

        for _ in 0..3 {
            let outcome = pipeline.search(&criteria("Reims", "25")).await.unwrap();
            assert_eq!(outcome.data_source, DataSource::Synthetic);
        }
        registry_mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_seeded_searches_are_reproducible() {
        let geocoder = MockServer::start_async().await;
        let registry = MockServer::start_async().await;
        mock_reims(&geocoder).await;

        let pipeline = ProspectPipeline::from_config(&config(&geocoder, &registry, None))
            .unwrap()
            .with_seed(42);

        let first = pipeline.search(&criteria("Reims", "50")).await.unwrap();
        let second = pipeline.search(&criteria("Reims", "50")).await.unwrap();
        let distances =
            |o: &SearchOutcome| o.results.iter().map(|c| c.distance).collect::<Vec<_>>();
        assert_eq!(distances(&first), distances(&second));
    }

    #[tokio::test]
    async fn test_slow_geocoder_exceeds_deadline() {
        let geocoder = MockServer::start_async().await;
        let registry = MockServer::start_async().await;
        geocoder
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!([]));
            })
            .await;

        let mut config = config(&geocoder, &registry, None);
        config.server.request_deadline_ms = 50;
        let pipeline = ProspectPipeline::from_config(&config).unwrap();

        let err = pipeline.search(&criteria("Reims", "10")).await.unwrap_err();
        assert!(matches!(err, ProspectError::DeadlineExceeded(_)));
    }
}
