use serde::{Deserialize, Serialize};

/// Caller-facing prospect. Field names match the CRM "create client" payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub activity: String,
    pub creation_date: Option<String>,
    pub status: String,
    pub has_website: bool,
    /// Kilometres from the resolved location, one decimal
    pub distance: f64,
}

/// Whether results came from the registry or the built-in demo dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Synthetic,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Live => write!(f, "live"),
            DataSource::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Ranked, truncated result of one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Matches before truncation
    pub total: usize,
    pub data_source: DataSource,
    pub results: Vec<Candidate>,
}
