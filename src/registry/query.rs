//! Registry query composition.
//!
//! Queries are built as a small clause tree and rendered to the Sirene `q`
//! syntax. Every OR group and every nested AND group is parenthesized, so
//! operator precedence never depends on the server's parser.

use chrono::NaiveDate;
use std::fmt;

use crate::models::{CompanySize, ResolvedLocation, SearchCriteria};
use crate::text::fold_accents;

pub const FIELD_STATUS: &str = "etatAdministratifEtablissement";
pub const FIELD_DISCLOSURE: &str = "statutDiffusionEtablissement";
pub const FIELD_POSTAL_CODE: &str = "codePostalEtablissement";
pub const FIELD_COMMUNE: &str = "libelleCommuneEtablissement";
pub const FIELD_CREATION_DATE: &str = "dateCreationEtablissement";
pub const FIELD_ACTIVITY: &str = "activitePrincipaleEtablissement";
pub const FIELD_CATEGORY: &str = "categorieEntreprise";

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Term {
        field: &'static str,
        value: String,
    },
    Prefix {
        field: &'static str,
        prefix: String,
    },
    /// Inclusive lower bound, open upper bound
    AtLeast {
        field: &'static str,
        value: String,
    },
    /// Historized variable, matched against the current period
    Period(Box<Clause>),
    Any(Vec<Clause>),
    All(Vec<Clause>),
}

impl Clause {
    pub fn term(field: &'static str, value: impl Into<String>) -> Self {
        Clause::Term {
            field,
            value: value.into(),
        }
    }

    /// Depth-first search for a term clause.
    pub fn contains_term(&self, field: &str, value: &str) -> bool {
        match self {
            Clause::Term { field: f, value: v } => f == &field && v == value,
            Clause::Period(inner) => inner.contains_term(field, value),
            Clause::Any(items) | Clause::All(items) => {
                items.iter().any(|c| c.contains_term(field, value))
            }
            _ => false,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::All(items) if items.len() > 1 => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

fn fmt_value(value: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
        write!(f, "{}", value)
    } else {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "\"{}\"", escaped)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Term { field, value } => {
                write!(f, "{}:", field)?;
                fmt_value(value, f)
            }
            Clause::Prefix { field, prefix } => write!(f, "{}:{}*", field, prefix),
            Clause::AtLeast { field, value } => write!(f, "{}:[{} TO *]", field, value),
            Clause::Period(inner) => write!(f, "periode({})", inner),
            Clause::Any(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " OR ")?;
                    }
                    item.fmt_nested(f)?;
                }
                write!(f, ")")
            }
            Clause::All(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " AND ")?;
                    }
                    item.fmt_nested(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Compose the registry query for a search. `today` anchors relative age
/// filters.
pub fn build_query(
    criteria: &SearchCriteria,
    location: &ResolvedLocation,
    today: NaiveDate,
) -> Clause {
    let mut groups = vec![
        Clause::Period(Box::new(Clause::term(FIELD_STATUS, "A"))),
        // Partially disclosed establishments are mostly sole traders, keep them
        Clause::Any(vec![
            Clause::term(FIELD_DISCLOSURE, "O"),
            Clause::term(FIELD_DISCLOSURE, "P"),
        ]),
        geographic_clause(location),
    ];

    if let Some(age) = criteria.created_since {
        groups.push(Clause::AtLeast {
            field: FIELD_CREATION_DATE,
            value: age.lower_bound(today).format("%Y-%m-%d").to_string(),
        });
    }

    if let Some(sector) = criteria.sector {
        groups.push(Clause::Period(Box::new(Clause::Any(
            sector
                .naf_prefixes()
                .iter()
                .map(|p| Clause::Prefix {
                    field: FIELD_ACTIVITY,
                    prefix: (*p).to_string(),
                })
                .collect(),
        ))));
    }

    if let Some(CompanySize::Micro) = criteria.company_size {
        groups.push(Clause::term(FIELD_CATEGORY, "PME"));
    }

    Clause::All(groups)
}

/// Postal codes of the nearby band, or the commune name for partially
/// disclosed records whose postal code is not indexed.
fn geographic_clause(location: &ResolvedLocation) -> Clause {
    let postal = Clause::Any(
        location
            .nearby_postal_codes
            .iter()
            .map(|code| Clause::term(FIELD_POSTAL_CODE, code.as_str()))
            .collect(),
    );
    let commune = Clause::term(FIELD_COMMUNE, fold_accents(&location.area).to_uppercase());

    Clause::Any(vec![postal, commune])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeFilter, GeoPoint, RadiusBucket, Sector};

    fn location() -> ResolvedLocation {
        ResolvedLocation {
            center: GeoPoint::new(49.2583, 4.0317),
            area: "Reims".to_string(),
            postal_code: "51100".to_string(),
            nearby_postal_codes: vec!["51099".into(), "51100".into(), "51101".into()],
        }
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria::parse("Reims", "5", "all", "all", "all").unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_minimal_query() {
        let q = build_query(&criteria(), &location(), today());
        assert_eq!(
            q.to_string(),
            "periode(etatAdministratifEtablissement:A) \
             AND (statutDiffusionEtablissement:O OR statutDiffusionEtablissement:P) \
             AND ((codePostalEtablissement:51099 OR codePostalEtablissement:51100 \
             OR codePostalEtablissement:51101) OR libelleCommuneEtablissement:REIMS)"
        );
    }

    #[test]
    fn test_mandatory_clauses_survive_every_filter() {
        let mut c = criteria();
        c.sector = Some(Sector::Health);
        c.created_since = Some(AgeFilter::OneYear);
        c.company_size = Some(CompanySize::Micro);
        c.radius = RadiusBucket::Km100;

        let q = build_query(&c, &location(), today());
        assert!(q.contains_term(FIELD_STATUS, "A"));
        assert!(q.contains_term(FIELD_DISCLOSURE, "O"));
        assert!(q.contains_term(FIELD_DISCLOSURE, "P"));
        assert!(q.contains_term(FIELD_POSTAL_CODE, "51100"));

        let rendered = q.to_string();
        assert!(rendered.contains("dateCreationEtablissement:[2025-10-18 TO *]"));
        assert!(rendered.contains("periode((activitePrincipaleEtablissement:86*))"));
        assert!(rendered.ends_with("AND categorieEntreprise:PME"));
    }

    #[test]
    fn test_sector_prefixes_are_or_grouped() {
        let mut c = criteria();
        c.sector = Some(Sector::Artisans);
        let rendered = build_query(&c, &location(), today()).to_string();
        assert!(rendered.contains(
            "periode((activitePrincipaleEtablissement:43* \
             OR activitePrincipaleEtablissement:95* \
             OR activitePrincipaleEtablissement:96.02*))"
        ));
    }

    #[test]
    fn test_non_micro_sizes_add_nothing() {
        let mut c = criteria();
        c.company_size = Some(CompanySize::Large);
        let base = build_query(&criteria(), &location(), today());
        assert_eq!(build_query(&c, &location(), today()), base);
    }

    #[test]
    fn test_commune_is_folded_and_quoted() {
        let mut loc = location();
        loc.area = "Châlons-en-Champagne".to_string();
        let rendered = build_query(&criteria(), &loc, today()).to_string();
        assert!(rendered.contains("libelleCommuneEtablissement:\"CHALONS-EN-CHAMPAGNE\""));
    }
}
