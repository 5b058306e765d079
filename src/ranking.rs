//! Distance computation, filtering, and ordering of registry records.

use rand::Rng;
use tracing::{debug, warn};

use crate::models::{Candidate, RadiusBucket, RegistryRecord, ResolvedLocation};
use crate::naf::activity_label;
use crate::spatial::{haversine_km, lambert93_to_wgs84, proxy_km};

/// Maximum number of candidates returned by one search
pub const MAX_RESULTS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    /// Matches within the radius, before truncation
    pub total: usize,
    pub candidates: Vec<Candidate>,
}

/// Distance from the resolved location: exact when the record carries
/// projected coordinates, postal code proxy otherwise.
pub fn record_distance<R: Rng>(
    record: &RegistryRecord,
    location: &ResolvedLocation,
    radius: RadiusBucket,
    rng: &mut R,
) -> (f64, bool) {
    match record.lambert {
        Some(point) => (
            haversine_km(location.center, lambert93_to_wgs84(point)),
            true,
        ),
        None => (
            proxy_km(&record.address.postal_code, location, radius.km(), rng),
            false,
        ),
    }
}

pub fn rank<R: Rng>(
    records: Vec<RegistryRecord>,
    location: &ResolvedLocation,
    radius: RadiusBucket,
    rng: &mut R,
) -> Ranked {
    let fetched = records.len();
    let mut estimated = 0usize;

    let mut within: Vec<(f64, RegistryRecord)> = records
        .into_iter()
        .filter_map(|record| {
            let (distance, exact) = record_distance(&record, location, radius, rng);
            if !exact {
                estimated += 1;
            }
            (distance <= radius.km()).then_some((distance, record))
        })
        .collect();

    if estimated > 0 {
        warn!(
            "{} of {} records ranked by postal code proximity, distances are approximate",
            estimated, fetched
        );
    }

    // sort_by is stable, equal distances keep registry order
    within.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total = within.len();
    debug!("{} of {} records within {} km", total, fetched, radius.km());

    let candidates = within
        .into_iter()
        .take(MAX_RESULTS)
        .map(|(distance, record)| to_candidate(record, distance))
        .collect();

    Ranked { total, candidates }
}

fn to_candidate(record: RegistryRecord, distance: f64) -> Candidate {
    let name = record.name.trim();

    Candidate {
        address: format_address(&record),
        name: if name.is_empty() {
            "Unnamed business".to_string()
        } else {
            name.to_string()
        },
        city: record.address.commune.trim().to_string(),
        postal_code: record.address.postal_code.trim().to_string(),
        activity: activity_label(record.activity_code.as_deref()),
        creation_date: record
            .creation_date
            .map(|d| d.format("%Y-%m-%d").to_string()),
        status: status_label(&record.status).to_string(),
        has_website: false,
        distance: (distance.max(0.0) * 10.0).round() / 10.0,
        id: record.id,
    }
}

fn status_label(code: &str) -> &'static str {
    if code.trim().eq_ignore_ascii_case("A") {
        "Active"
    } else {
        "Inactive"
    }
}

fn street_type(abbrev: &str) -> &str {
    match abbrev {
        "RUE" => "Rue",
        "AV" => "Avenue",
        "BD" => "Boulevard",
        "PL" => "Place",
        "CHE" => "Chemin",
        "RTE" => "Route",
        "ALL" => "Allée",
        "IMP" => "Impasse",
        "QUAI" => "Quai",
        "CRS" => "Cours",
        "FG" => "Faubourg",
        other => other,
    }
}

fn format_address(record: &RegistryRecord) -> String {
    let a = &record.address;
    [
        a.number.as_deref(),
        a.street_type.as_deref().map(street_type),
        a.street.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}
