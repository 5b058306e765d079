//! Deterministic demo dataset used when the registry cannot be queried.

use chrono::NaiveDate;

use crate::models::{RecordAddress, RegistryRecord, ResolvedLocation};

/// Two establishments around the resolved location: one at the base postal
/// code and one at the neighbouring code of the nearby band.
pub fn synthetic_records(location: &ResolvedLocation) -> Vec<RegistryRecord> {
    let base = location.postal_code.as_str();
    let neighbour = neighbour_code(location);
    let area = location.area.as_str();

    vec![
        RegistryRecord {
            id: synthetic_id(base, 1),
            name: format!("Le Comptoir de {}", area),
            address: RecordAddress {
                number: Some("12".to_string()),
                street_type: Some("RUE".to_string()),
                street: Some("DE LA REPUBLIQUE".to_string()),
                postal_code: base.to_string(),
                commune: area.to_uppercase(),
            },
            activity_code: Some("56.10A".to_string()),
            creation_date: NaiveDate::from_ymd_opt(2021, 3, 15),
            status: "A".to_string(),
            lambert: None,
        },
        RegistryRecord {
            id: synthetic_id(neighbour, 2),
            name: format!("Atelier {} Renovation", area),
            address: RecordAddress {
                number: Some("4".to_string()),
                street_type: Some("AV".to_string()),
                street: Some("JEAN JAURES".to_string()),
                postal_code: neighbour.to_string(),
                commune: area.to_uppercase(),
            },
            activity_code: Some("43.32A".to_string()),
            creation_date: NaiveDate::from_ymd_opt(2018, 9, 1),
            status: "A".to_string(),
            lambert: None,
        },
    ]
}

fn neighbour_code(location: &ResolvedLocation) -> &str {
    let codes = &location.nearby_postal_codes;
    let idx = codes.iter().position(|c| *c == location.postal_code);

    let next = |i: usize| codes.get(i + 1);
    let previous = |i: usize| i.checked_sub(1).and_then(|j| codes.get(j));

    idx.and_then(|i| next(i).or_else(|| previous(i)))
        .map(String::as_str)
        .unwrap_or(location.postal_code.as_str())
}

/// 14 characters like a SIRET, prefixed so it can never collide with one
fn synthetic_id(postal_code: &str, n: u32) -> String {
    let digits: String = postal_code.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("DEMO{:0>5}{:05}", digits, n)
}
