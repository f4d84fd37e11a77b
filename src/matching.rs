//! Ranks client profiles against an address or phone query.
//!
//! Results are always sorted by score, highest first, and never contain a
//! score below [`MATCH_THRESHOLD`].
use crate::address::{fold_text, normalize_postal_code};
use crate::contact::{last_digits, normalize_phone, NATIONAL_NUMBER_LEN};
use crate::errors::AppError;
use crate::models::{AddressQuery, ClientProfile, MatchResult};
use crate::similarity::similarity;
use std::cmp::Ordering;

pub const MATCH_THRESHOLD: f64 = 0.6;
/// Raw full-address similarity must exceed this to count.
pub const ADDRESS_SIMILARITY_CUTOFF: f64 = 0.6;
/// Raw street similarity must exceed this to count.
pub const STREET_SIMILARITY_CUTOFF: f64 = 0.7;
pub const STREET_WEIGHT: f64 = 0.9;
pub const POSTAL_CITY_SCORE: f64 = 0.7;

pub const PRIMARY_PHONE_SCORE: f64 = 1.0;
pub const ALTERNATE_PHONE_SCORE: f64 = 0.95;
pub const PHONE_TAIL_SCORE: f64 = 0.9;

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn sort_by_score(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// Finds profiles whose recorded address resembles the query.
///
/// # Errors
///
/// * `ValidationError` - street, postal code and city are all blank.
pub fn search_by_address(
    query: &AddressQuery,
    profiles: &[ClientProfile],
) -> Result<Vec<MatchResult>, AppError> {
    let street = non_blank(&query.street);
    let postal_code = non_blank(&query.postal_code);
    let city = non_blank(&query.city);

    if street.is_none() && postal_code.is_none() && city.is_none() {
        return Err(AppError::ValidationError(
            "At least one of street, postalCode or city is required".to_string(),
        ));
    }

    let combined = [street, postal_code, city]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
    tracing::debug!("Address search query: '{}'", combined);

    let mut results: Vec<MatchResult> = profiles
        .iter()
        .filter_map(|profile| {
            score_address(&combined, street, postal_code, city, profile).map(|(score, reason)| {
                MatchResult {
                    profile: profile.clone(),
                    match_score: score,
                    match_reason: reason,
                }
            })
        })
        .collect();

    sort_by_score(&mut results);
    tracing::info!(
        "Address search '{}' matched {} of {} profile(s)",
        combined,
        results.len(),
        profiles.len()
    );
    Ok(results)
}

/// Best-scoring address rule for one profile, if it clears the threshold.
fn score_address(
    combined: &str,
    street: Option<&str>,
    postal_code: Option<&str>,
    city: Option<&str>,
    profile: &ClientProfile,
) -> Option<(f64, String)> {
    let mut candidates: Vec<(f64, String)> = Vec::with_capacity(3);

    if !profile.address.trim().is_empty() {
        let score = similarity(combined, &profile.address);
        if score > ADDRESS_SIMILARITY_CUTOFF {
            candidates.push((score, format!("Address match ({:.0}%)", score * 100.0)));
        }
    }

    if let (Some(street), Some(profile_street)) = (street, non_blank(&profile.street)) {
        let raw = similarity(street, profile_street);
        if raw > STREET_SIMILARITY_CUTOFF {
            let score = raw * STREET_WEIGHT;
            candidates.push((score, format!("Street match ({:.0}%)", score * 100.0)));
        }
    }

    if let (Some(postal_code), Some(city), Some(profile_postal), Some(profile_city)) = (
        postal_code,
        city,
        non_blank(&profile.postal_code),
        non_blank(&profile.city),
    ) {
        let postal_matches = normalize_postal_code(postal_code) == normalize_postal_code(profile_postal)
            && !normalize_postal_code(postal_code).is_empty();
        if postal_matches && fold_text(city) == fold_text(profile_city) {
            candidates.push((POSTAL_CITY_SCORE, "Postal code and city match".to_string()));
        }
    }

    candidates
        .into_iter()
        .filter(|(score, _)| *score >= MATCH_THRESHOLD)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
}

/// Finds profiles that share a phone number with the query.
///
/// # Errors
///
/// * `ValidationError` - the query contains no digits.
pub fn search_by_phone(phone: &str, profiles: &[ClientProfile]) -> Result<Vec<MatchResult>, AppError> {
    let normalized = normalize_phone(phone);
    if normalized.is_empty() {
        return Err(AppError::ValidationError("Phone number is required".to_string()));
    }
    tracing::debug!("Phone search: '{}' normalized to '{}'", phone, normalized);

    let mut results: Vec<MatchResult> = profiles
        .iter()
        .filter_map(|profile| {
            score_phone(&normalized, profile).map(|(score, reason)| MatchResult {
                profile: profile.clone(),
                match_score: score,
                match_reason: reason.to_string(),
            })
        })
        .collect();

    sort_by_score(&mut results);
    tracing::info!(
        "Phone search matched {} of {} profile(s)",
        results.len(),
        profiles.len()
    );
    Ok(results)
}

/// First satisfied phone rule for one profile: primary, alternate, then tail.
fn score_phone(normalized_query: &str, profile: &ClientProfile) -> Option<(f64, &'static str)> {
    let primary = profile.primary_phone.as_deref().map(normalize_phone);
    let alternates: Vec<String> = profile
        .alternate_phones
        .iter()
        .map(|p| normalize_phone(p))
        .collect();

    if primary.is_none() && alternates.is_empty() {
        return None;
    }

    if primary.as_deref() == Some(normalized_query) {
        return Some((PRIMARY_PHONE_SCORE, "Primary phone match"));
    }
    if alternates.iter().any(|alt| alt == normalized_query) {
        return Some((ALTERNATE_PHONE_SCORE, "Alternate phone match"));
    }

    let query_tail = last_digits(normalized_query, NATIONAL_NUMBER_LEN)?;
    let tail_matches = primary
        .iter()
        .chain(alternates.iter())
        .any(|known| last_digits(known, NATIONAL_NUMBER_LEN) == Some(query_tail));
    if tail_matches {
        return Some((PHONE_TAIL_SCORE, "Phone match on last 9 digits"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, address: &str, primary: Option<&str>, alternates: &[&str]) -> ClientProfile {
        ClientProfile {
            client_id: id.to_string(),
            name: format!("Klient {}", id),
            email: None,
            primary_phone: primary.map(String::from),
            alternate_phones: alternates.iter().map(|p| p.to_string()).collect(),
            address: address.to_string(),
            street: address.split(',').next().map(|s| s.trim().to_string()),
            postal_code: Some("80-000".to_string()),
            city: Some("Gdańsk".to_string()),
            order_count: 1,
            last_order_date: None,
            order_history: vec![],
        }
    }

    fn address_query(street: &str, postal: &str, city: &str) -> AddressQuery {
        AddressQuery {
            street: Some(street.to_string()),
            postal_code: Some(postal.to_string()),
            city: Some(city.to_string()),
        }
    }

    #[test]
    fn test_exact_address_scores_one() {
        let profiles = vec![profile("c1", "ul. Długa 78, 80-000, Gdańsk", None, &[])];
        let results =
            search_by_address(&address_query("ul. Długa 78", "80-000", "Gdańsk"), &profiles).unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].match_score - 1.0).abs() < 1e-9);
        assert!(results[0].match_reason.starts_with("Address match"));
    }

    #[test]
    fn test_postal_and_city_rule() {
        let mut other_street = profile("c1", "", None, &[]);
        other_street.street = Some("Ogarna 5".to_string());

        let results = search_by_address(
            &address_query("Szeroka 1", "80000", "GDAŃSK"),
            &[other_street],
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_score, POSTAL_CITY_SCORE);
        assert_eq!(results[0].match_reason, "Postal code and city match");
    }

    #[test]
    fn test_street_rule_is_weighted() {
        let mut p = profile("c1", "", None, &[]);
        p.postal_code = None;
        p.street = Some("Długa 78".to_string());

        let query = AddressQuery {
            street: Some("Długa 78".to_string()),
            postal_code: None,
            city: None,
        };
        let results = search_by_address(&query, &[p]).unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].match_score - STREET_WEIGHT).abs() < 1e-9);
        assert!(results[0].match_reason.starts_with("Street match"));
    }

    #[test]
    fn test_unrelated_address_is_filtered_out() {
        let mut p = profile("c1", "Rynek Główny 1, 31-042, Kraków", None, &[]);
        p.postal_code = Some("31-042".to_string());
        p.city = Some("Kraków".to_string());

        let results =
            search_by_address(&address_query("Długa 78", "80-000", "Gdańsk"), &[p]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_empty_address_query_is_rejected() {
        let err = search_by_address(&AddressQuery::default(), &[]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let blank = AddressQuery {
            street: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(search_by_address(&blank, &[]).is_err());
    }

    #[test]
    fn test_phone_priority_order() {
        let profiles = vec![
            profile("tail", "", Some("+44 7600 234 567"), &[]),
            profile("alternate", "", Some("501 000 111"), &["600-234-567"]),
            profile("primary", "", Some("+48 600 234 567"), &[]),
            profile("none", "", None, &[]),
        ];

        let results = search_by_phone("48600234567", &profiles).unwrap();

        let ranked: Vec<(&str, f64)> = results
            .iter()
            .map(|r| (r.profile.client_id.as_str(), r.match_score))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("primary", PRIMARY_PHONE_SCORE),
                ("alternate", ALTERNATE_PHONE_SCORE),
                ("tail", PHONE_TAIL_SCORE),
            ]
        );
    }

    #[test]
    fn test_extension_and_trunk_marker_still_match_primary() {
        let profiles = vec![profile("c1", "", Some("+48 600 234 567"), &[])];

        for query in ["+48 600 234 567 wew. 12", "+48 (0) 600 234 567", "+48 600 234 567"] {
            let results = search_by_phone(query, &profiles).unwrap();
            assert_eq!(results.len(), 1, "query {}", query);
            assert_eq!(results[0].match_score, PRIMARY_PHONE_SCORE, "query {}", query);
        }
    }

    #[test]
    fn test_phone_without_digits_is_rejected() {
        let err = search_by_phone("brak", &[]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_no_phone_match_is_empty_not_error() {
        let profiles = vec![profile("c1", "", Some("501 000 111"), &[])];
        assert!(search_by_phone("600 234 567", &profiles).unwrap().is_empty());
    }
}
