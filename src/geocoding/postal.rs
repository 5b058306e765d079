use crate::models::RadiusBucket;

/// Postal codes treated as "nearby" `base` for a radius: every 5-digit code
/// within the radius' offset band that stays in the same department, always
/// including `base` itself. Ascending.
pub fn nearby_postal_codes(base: &str, radius: RadiusBucket) -> Vec<String> {
    let base = base.trim();

    let Ok(base_num) = base.parse::<u32>() else {
        return vec![base.to_string()];
    };
    if base.len() != 5 {
        return vec![base.to_string()];
    }

    let department = &base[..2];
    let offset = radius.postal_offset();
    let low = base_num.saturating_sub(offset);
    let high = (base_num + offset).min(99_999);

    let mut codes: Vec<String> = (low..=high)
        .map(|n| format!("{:05}", n))
        .filter(|code| code.starts_with(department))
        .collect();

    if !codes.iter().any(|c| c == base) {
        codes.push(base.to_string());
        codes.sort();
    }

    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_base_for_every_bucket() {
        for base in ["51100", "01000", "75001", "97400", "20090", "2A004"] {
            for radius in RadiusBucket::all() {
                let codes = nearby_postal_codes(base, *radius);
                assert!(
                    codes.iter().any(|c| c == base),
                    "{} missing for {:?}",
                    base,
                    radius
                );
            }
        }
    }

    #[test]
    fn test_band_width_follows_radius() {
        let codes = nearby_postal_codes("51100", RadiusBucket::Km5);
        assert_eq!(codes, vec!["51098", "51099", "51100", "51101", "51102"]);

        let codes = nearby_postal_codes("51100", RadiusBucket::Km25);
        assert_eq!(codes.len(), 21);
        assert_eq!(codes.first().unwrap(), "51090");
        assert_eq!(codes.last().unwrap(), "51110");
    }

    #[test]
    fn test_stays_within_department() {
        let codes = nearby_postal_codes("51005", RadiusBucket::Km25);
        assert!(codes.iter().all(|c| c.starts_with("51")));
        assert_eq!(codes.first().unwrap(), "51000");

        let codes = nearby_postal_codes("01000", RadiusBucket::Km100);
        assert!(codes.iter().all(|c| c.starts_with("01")));
        assert_eq!(codes.first().unwrap(), "01000");
    }

    #[test]
    fn test_non_numeric_base_is_kept_alone() {
        assert_eq!(
            nearby_postal_codes("2A004", RadiusBucket::Km50),
            vec!["2A004"]
        );
    }

    #[test]
    fn test_codes_are_ascending() {
        let codes = nearby_postal_codes("69003", RadiusBucket::Km50);
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }
}
