//! Best-effort check for an existing website per candidate.
//!
//! A negative answer only means no presence was proven: the domain guesses
//! are naive and every failure or timeout counts as "not found".

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, instrument, warn};

use crate::config::ProbeConfig;
use crate::models::Candidate;
use crate::text::slug;

/// Plausible domains for a business: `<name>.<tld>` for each TLD, then
/// `<name><city>.<first tld>`.
pub fn domain_guesses(name: &str, city: &str, tlds: &[String]) -> Vec<String> {
    let name = slug(name);
    if name.is_empty() {
        return Vec::new();
    }

    let mut guesses: Vec<String> = tlds.iter().map(|tld| format!("{}.{}", name, tld)).collect();

    let city = slug(city);
    if let Some(tld) = tlds.first() {
        if !city.is_empty() && !name.ends_with(&city) {
            guesses.push(format!("{}{}.{}", name, city, tld));
        }
    }

    guesses.dedup();
    guesses
}

pub struct WebsiteProbe {
    client: Client,
    url_template: String,
    tlds: Vec<String>,
    timeout: Duration,
    budget: Duration,
    limit: Arc<Semaphore>,
}

impl WebsiteProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("prospect/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url_template: config.url_template.clone(),
            tlds: config.tlds.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            budget: Duration::from_millis(config.budget_ms),
            limit: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
        })
    }

    /// Set `has_website` on every candidate whose probe succeeds within the
    /// overall budget. Probes still running at the deadline are abandoned.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn annotate(&self, candidates: &mut [Candidate]) {
        let deadline = Instant::now() + self.budget;

        let found: Vec<usize> = {
            let mut pending: FuturesUnordered<_> = candidates
                .iter()
                .enumerate()
                .map(|(i, c)| async move { (i, self.has_website(&c.name, &c.city).await) })
                .collect();

            let mut found = Vec::new();
            loop {
                let next = timeout_at(deadline, pending.next()).await;
                match next {
                    Ok(Some((i, true))) => found.push(i),
                    Ok(Some((_, false))) => {}
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            "Website probe budget of {:?} exhausted, {} probes abandoned",
                            self.budget,
                            pending.len()
                        );
                        break;
                    }
                }
            }
            found
        };

        debug!(
            "{} of {} candidates have a website",
            found.len(),
            candidates.len()
        );
        for i in found {
            candidates[i].has_website = true;
        }
    }

    pub async fn has_website(&self, name: &str, city: &str) -> bool {
        let guesses = domain_guesses(name, city, &self.tlds);
        let mut probes: FuturesUnordered<_> = guesses
            .iter()
            .map(|domain| self.probe_domain(domain))
            .collect();

        while let Some(found) = probes.next().await {
            if found {
                return true;
            }
        }
        false
    }

    async fn probe_domain(&self, domain: &str) -> bool {
        let Ok(_permit) = self.limit.acquire().await else {
            return false;
        };

        let url = self.url_template.replace("{domain}", domain);
        match self.client.head(&url).timeout(self.timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Probe {} inconclusive: {}", url, e);
                false
            }
        }
    }
}
