/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use rust_booking_resolver::address::{enhance_address, normalize_address};
use rust_booking_resolver::aggregation::aggregate_clients;
use rust_booking_resolver::contact::normalize_phone;
use rust_booking_resolver::gazetteer::{FallbackGazetteer, JITTER_DEGREES};
use rust_booking_resolver::geocoding::clamp_confidence;
use rust_booking_resolver::matching::{search_by_address, search_by_phone, MATCH_THRESHOLD};
use rust_booking_resolver::models::{AccuracyTier, AddressQuery, ClientProfile, TransactionRecord};
use rust_booking_resolver::similarity::similarity;
use std::collections::HashSet;

const ADDRESS_TEXT: &str = "[A-Za-zĄĆĘŁŃÓŚŹŻąćęłńóśźż0-9 ,.\\-]{0,40}";

const STREETS: &[&str] = &["ul. Długa 78", "Długa 7", "al. Jerozolimskie 1", "Rynek Główny 1", "Ogarna 5"];
const CITIES: &[&str] = &["Gdańsk", "Kraków", "Warszawa"];
const POSTAL_CODES: &[&str] = &["80-000", "31-042", "00-001"];
const PHONES: &[&str] = &["+48 600 234 567", "600234567", "0048 501 000 111", "22 123 45 67", "+44 7600 234 567"];

fn profile_strategy() -> impl Strategy<Value = ClientProfile> {
    (
        "c[0-9]{1,3}",
        0..STREETS.len(),
        0..CITIES.len(),
        0..POSTAL_CODES.len(),
        proptest::option::of(0..PHONES.len()),
        proptest::collection::vec(0..PHONES.len(), 0..3),
    )
        .prop_map(|(id, street, city, postal, primary, alternates)| ClientProfile {
            client_id: id,
            name: "Klient".to_string(),
            email: None,
            primary_phone: primary.map(|i| PHONES[i].to_string()),
            alternate_phones: alternates.into_iter().map(|i| PHONES[i].to_string()).collect(),
            address: format!("{}, {}, {}", STREETS[street], POSTAL_CODES[postal], CITIES[city]),
            street: Some(STREETS[street].to_string()),
            postal_code: Some(POSTAL_CODES[postal].to_string()),
            city: Some(CITIES[city].to_string()),
            order_count: 1,
            last_order_date: None,
            order_history: vec![],
        })
}

// Property: normalizers are idempotent
proptest! {
    #[test]
    fn normalize_address_is_idempotent(address in ADDRESS_TEXT) {
        let once = normalize_address(&address);
        prop_assert_eq!(normalize_address(&once), once);
    }

    #[test]
    fn enhance_address_is_idempotent(address in ADDRESS_TEXT) {
        let once = enhance_address(&address);
        prop_assert_eq!(enhance_address(&once), once);
    }

    #[test]
    fn normalize_phone_never_panics_and_is_idempotent(phone in "\\PC*") {
        let once = normalize_phone(&phone);
        prop_assert!(once.chars().all(|c| c.is_ascii_digit()));
        prop_assert_eq!(normalize_phone(&once), once);
    }
}

// Property: similarity is bounded and reflexive
proptest! {
    #[test]
    fn similarity_with_itself_is_one(text in ADDRESS_TEXT) {
        prop_assume!(!normalize_address(&text).is_empty());
        prop_assert_eq!(similarity(&text, &text), 1.0);
    }

    #[test]
    fn similarity_stays_in_unit_interval(a in "\\PC*", b in "\\PC*") {
        let score = similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
    }
}

// Property: confidence is always within bounds
proptest! {
    #[test]
    fn clamp_confidence_is_bounded(raw in proptest::num::f64::ANY) {
        let clamped = clamp_confidence(raw);
        prop_assert!((0.1..=1.0).contains(&clamped));
    }

    #[test]
    fn gazetteer_never_fails(query in "\\PC*") {
        let gazetteer = FallbackGazetteer::default();
        let location = gazetteer.resolve(&query);

        prop_assert!((0.1..=1.0).contains(&location.confidence));
        prop_assert_eq!(location.accuracy_tier, AccuracyTier::Approximate);
        prop_assert!(location.external_id.is_none());
        prop_assert!(location.components.is_empty());
    }

    #[test]
    fn gazetteer_jitter_stays_near_matched_locality(street in "[A-Za-z ]{1,20}", number in 1u32..500) {
        let gazetteer = FallbackGazetteer::default();
        let location = gazetteer.resolve(&format!("{} {}, Gdańsk", street, number));
        let entry = gazetteer.lookup("Gdańsk").unwrap();

        if location.confidence == 0.7 && location.formatted_address.ends_with("(okolice: Gdańsk)") {
            prop_assert!((location.latitude - entry.latitude).abs() <= JITTER_DEGREES + 1e-9);
            prop_assert!((location.longitude - entry.longitude).abs() <= JITTER_DEGREES + 1e-9);
        }
    }
}

// Property: aggregation yields one profile per distinct client id
proptest! {
    #[test]
    fn aggregation_counts_are_consistent(
        rows in proptest::collection::vec(
            (proptest::option::of("c[0-4]|  "), proptest::option::of(0..PHONES.len())),
            0..40,
        )
    ) {
        let records: Vec<TransactionRecord> = rows
            .iter()
            .map(|(id, phone)| TransactionRecord {
                client_id: id.clone(),
                phone: phone.map(|i| PHONES[i].to_string()),
                ..Default::default()
            })
            .collect();

        let attributed: Vec<&str> = rows
            .iter()
            .filter_map(|(id, _)| id.as_deref().map(str::trim).filter(|id| !id.is_empty()))
            .collect();
        let distinct: HashSet<&str> = attributed.iter().copied().collect();

        let outcome = aggregate_clients(&records);

        prop_assert_eq!(outcome.profiles.len(), distinct.len());
        prop_assert_eq!(
            outcome.profiles.iter().map(|p| p.order_count).sum::<usize>(),
            attributed.len()
        );
        prop_assert_eq!(outcome.skipped_without_client_id, records.len() - attributed.len());
        for profile in &outcome.profiles {
            prop_assert_eq!(profile.order_history.len(), profile.order_count);
        }
    }
}

// Property: matcher output is sorted and above threshold
proptest! {
    #[test]
    fn address_matches_are_sorted_and_thresholded(
        profiles in proptest::collection::vec(profile_strategy(), 0..20),
        street in proptest::option::of(0..STREETS.len()),
        city in 0..CITIES.len(),
        postal in proptest::option::of(0..POSTAL_CODES.len()),
    ) {
        let query = AddressQuery {
            street: street.map(|i| STREETS[i].to_string()),
            postal_code: postal.map(|i| POSTAL_CODES[i].to_string()),
            city: Some(CITIES[city].to_string()),
        };

        let results = search_by_address(&query, &profiles).unwrap();

        prop_assert!(results.iter().all(|r| r.match_score >= MATCH_THRESHOLD));
        prop_assert!(results.windows(2).all(|w| w[0].match_score >= w[1].match_score));
    }

    #[test]
    fn phone_matches_are_sorted_and_thresholded(
        profiles in proptest::collection::vec(profile_strategy(), 0..20),
        phone in 0..PHONES.len(),
    ) {
        let results = search_by_phone(PHONES[phone], &profiles).unwrap();

        prop_assert!(results.iter().all(|r| r.match_score >= MATCH_THRESHOLD));
        prop_assert!(results.windows(2).all(|w| w[0].match_score >= w[1].match_score));
    }
}
