//! Caller-supplied search criteria.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value accepted by every optional filter to mean "no filter".
pub const ALL: &str = "all";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("unsupported radius '{0}', expected one of 5, 10, 25, 50, 100")]
    Radius(String),
    #[error("unknown sector '{0}'")]
    Sector(String),
    #[error("unknown creation filter '{0}'")]
    CreatedSince(String),
    #[error("unknown company size '{0}'")]
    CompanySize(String),
}

/// Search radius, restricted to the buckets the UI offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RadiusBucket {
    Km5,
    Km10,
    Km25,
    Km50,
    Km100,
}

impl RadiusBucket {
    pub fn all() -> &'static [RadiusBucket] {
        &[
            RadiusBucket::Km5,
            RadiusBucket::Km10,
            RadiusBucket::Km25,
            RadiusBucket::Km50,
            RadiusBucket::Km100,
        ]
    }

    pub fn km(&self) -> f64 {
        match self {
            RadiusBucket::Km5 => 5.0,
            RadiusBucket::Km10 => 10.0,
            RadiusBucket::Km25 => 25.0,
            RadiusBucket::Km50 => 50.0,
            RadiusBucket::Km100 => 100.0,
        }
    }

    /// Half-width of the postal code band considered "nearby" for this radius.
    pub fn postal_offset(&self) -> u32 {
        match self {
            RadiusBucket::Km5 => 2,
            RadiusBucket::Km10 => 5,
            RadiusBucket::Km25 => 10,
            RadiusBucket::Km50 => 20,
            RadiusBucket::Km100 => 50,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CriteriaError> {
        match raw.trim() {
            "5" => Ok(RadiusBucket::Km5),
            "10" => Ok(RadiusBucket::Km10),
            "25" => Ok(RadiusBucket::Km25),
            "50" => Ok(RadiusBucket::Km50),
            "100" => Ok(RadiusBucket::Km100),
            other => Err(CriteriaError::Radius(other.to_string())),
        }
    }
}

/// Business sectors exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Restaurants,
    Commerce,
    Artisans,
    Services,
    Health,
}

impl Sector {
    /// NAF activity code prefixes covered by the sector.
    pub fn naf_prefixes(&self) -> &'static [&'static str] {
        match self {
            Sector::Restaurants => &["56"],
            Sector::Commerce => &["47"],
            Sector::Artisans => &["43", "95", "96.02"],
            Sector::Services => &["69", "70", "73", "74", "82"],
            Sector::Health => &["86"],
        }
    }

    fn parse(raw: &str) -> Result<Option<Self>, CriteriaError> {
        match raw.trim().to_lowercase().as_str() {
            "" | ALL => Ok(None),
            "restaurants" => Ok(Some(Sector::Restaurants)),
            "commerce" => Ok(Some(Sector::Commerce)),
            "artisans" => Ok(Some(Sector::Artisans)),
            "services" => Ok(Some(Sector::Services)),
            "health" | "sante" => Ok(Some(Sector::Health)),
            _ => Err(CriteriaError::Sector(raw.to_string())),
        }
    }
}

/// Relative minimum-age filter on the creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeFilter {
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
}

impl AgeFilter {
    fn months(&self) -> u32 {
        match self {
            AgeFilter::SixMonths => 6,
            AgeFilter::OneYear => 12,
            AgeFilter::TwoYears => 24,
            AgeFilter::FiveYears => 60,
            AgeFilter::TenYears => 120,
        }
    }

    /// Earliest creation date admitted when searching on `today`.
    pub fn lower_bound(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }

    fn parse(raw: &str) -> Result<Option<Self>, CriteriaError> {
        match raw.trim().to_lowercase().as_str() {
            "" | ALL => Ok(None),
            "6m" | "6months" => Ok(Some(AgeFilter::SixMonths)),
            "1y" | "1year" => Ok(Some(AgeFilter::OneYear)),
            "2y" | "2years" => Ok(Some(AgeFilter::TwoYears)),
            "5y" | "5years" => Ok(Some(AgeFilter::FiveYears)),
            "10y" | "10years" => Ok(Some(AgeFilter::TenYears)),
            _ => Err(CriteriaError::CreatedSince(raw.to_string())),
        }
    }
}

/// Company size buckets. The registry only distinguishes SMEs from larger
/// categories, so only `Micro` narrows the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanySize {
    Micro,
    Small,
    Medium,
    Large,
}

impl CompanySize {
    fn parse(raw: &str) -> Result<Option<Self>, CriteriaError> {
        match raw.trim().to_lowercase().as_str() {
            "" | ALL => Ok(None),
            "micro" => Ok(Some(CompanySize::Micro)),
            "small" => Ok(Some(CompanySize::Small)),
            "medium" => Ok(Some(CompanySize::Medium)),
            "large" => Ok(Some(CompanySize::Large)),
            _ => Err(CriteriaError::CompanySize(raw.to_string())),
        }
    }
}

/// Immutable criteria for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub location: String,
    pub radius: RadiusBucket,
    pub sector: Option<Sector>,
    pub created_since: Option<AgeFilter>,
    pub company_size: Option<CompanySize>,
}

impl SearchCriteria {
    /// Build criteria from the raw strings of a search request.
    pub fn parse(
        location: &str,
        radius: &str,
        sector: &str,
        created_since: &str,
        company_size: &str,
    ) -> Result<Self, CriteriaError> {
        Ok(Self {
            location: location.trim().to_string(),
            radius: RadiusBucket::parse(radius)?,
            sector: Sector::parse(sector)?,
            created_since: AgeFilter::parse(created_since)?,
            company_size: CompanySize::parse(company_size)?,
        })
    }
}
