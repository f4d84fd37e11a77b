//! Offline locality table used when the geocoding provider cannot be used.
//!
//! Lookup precedence:
//! 1. keys that appear as whole words in the query, longest key first;
//! 2. keys that appear anywhere inside the query (so inflected forms such as
//!    "w Krakowie" still hit `krakow`), longest key first.
//!
//! Ties keep table order. Resolution never fails: an unknown locality yields
//! the default locality with the lowest confidence.
use crate::address::{correct_city_names, normalize_address, COUNTRY_NAME};
use crate::models::{AccuracyTier, Location, LocationSource};
use rand::Rng;

/// Maximum coordinate perturbation per axis for address-like queries.
pub const JITTER_DEGREES: f64 = 0.005;
pub const ADDRESS_MATCH_CONFIDENCE: f64 = 0.7;
pub const LOCALITY_MATCH_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_LOCALITY_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_LOCALITY_DISCLAIMER: &str =
    "lokalizacja domyślna: Warszawa, nie rozpoznano miejscowości";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazetteerEntry {
    /// Comparison-form locality name.
    pub key: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub label: &'static str,
}

const fn entry(key: &'static str, latitude: f64, longitude: f64, label: &'static str) -> GazetteerEntry {
    GazetteerEntry {
        key,
        latitude,
        longitude,
        label,
    }
}

pub const DEFAULT_LOCALITY: GazetteerEntry = entry("warszawa", 52.2297, 21.0122, "Warszawa");

pub const POLISH_LOCALITIES: &[GazetteerEntry] = &[
    entry("warszawa", 52.2297, 21.0122, "Warszawa"),
    entry("krakow", 50.0647, 19.9450, "Kraków"),
    entry("lodz", 51.7592, 19.4560, "Łódź"),
    entry("wroclaw", 51.1079, 17.0385, "Wrocław"),
    entry("poznan", 52.4064, 16.9252, "Poznań"),
    entry("gdansk", 54.3520, 18.6466, "Gdańsk"),
    entry("szczecin", 53.4285, 14.5528, "Szczecin"),
    entry("bydgoszcz", 53.1235, 18.0084, "Bydgoszcz"),
    entry("lublin", 51.2465, 22.5684, "Lublin"),
    entry("bialystok", 53.1325, 23.1688, "Białystok"),
    entry("katowice", 50.2649, 19.0238, "Katowice"),
    entry("gdynia", 54.5189, 18.5305, "Gdynia"),
    entry("czestochowa", 50.8118, 19.1203, "Częstochowa"),
    entry("radom", 51.4027, 21.1471, "Radom"),
    entry("torun", 53.0138, 18.5984, "Toruń"),
    entry("sosnowiec", 50.2863, 19.1041, "Sosnowiec"),
    entry("rzeszow", 50.0412, 21.9991, "Rzeszów"),
    entry("kielce", 50.8661, 20.6286, "Kielce"),
    entry("gliwice", 50.2945, 18.6714, "Gliwice"),
    entry("olsztyn", 53.7784, 20.4801, "Olsztyn"),
    entry("zabrze", 50.3249, 18.7857, "Zabrze"),
    entry("bielsko-biala", 49.8224, 19.0584, "Bielsko-Biała"),
    entry("bytom", 50.3484, 18.9157, "Bytom"),
    entry("zielona gora", 51.9356, 15.5062, "Zielona Góra"),
    entry("rybnik", 50.1022, 18.5463, "Rybnik"),
    entry("ruda slaska", 50.2558, 18.8556, "Ruda Śląska"),
    entry("opole", 50.6751, 17.9213, "Opole"),
    entry("tychy", 50.1218, 18.9866, "Tychy"),
    entry("gorzow wielkopolski", 52.7368, 15.2288, "Gorzów Wielkopolski"),
    entry("elblag", 54.1561, 19.4045, "Elbląg"),
    entry("plock", 52.5463, 19.7065, "Płock"),
    entry("walbrzych", 50.7714, 16.2843, "Wałbrzych"),
    entry("wloclawek", 52.6483, 19.0677, "Włocławek"),
    entry("tarnow", 50.0121, 20.9858, "Tarnów"),
    entry("chorzow", 50.2975, 18.9545, "Chorzów"),
    entry("koszalin", 54.1944, 16.1722, "Koszalin"),
    entry("kalisz", 51.7611, 18.0911, "Kalisz"),
    entry("legnica", 51.2070, 16.1553, "Legnica"),
    entry("sopot", 54.4418, 18.5601, "Sopot"),
    entry("pruszkow", 52.1706, 20.8119, "Pruszków"),
    entry("piaseczno", 52.0812, 21.0238, "Piaseczno"),
    entry("wieliczka", 49.9871, 20.0645, "Wieliczka"),
    entry("gora", 51.6667, 16.5333, "Góra"),
];

#[derive(Debug, Clone)]
pub struct FallbackGazetteer {
    /// Entries in lookup priority order (longest key first, then table order).
    entries: Vec<GazetteerEntry>,
    default: GazetteerEntry,
}

impl Default for FallbackGazetteer {
    fn default() -> Self {
        Self::with_entries(POLISH_LOCALITIES, DEFAULT_LOCALITY)
    }
}

impl FallbackGazetteer {
    pub fn with_entries(entries: &[GazetteerEntry], default: GazetteerEntry) -> Self {
        let mut entries = entries.to_vec();
        // Stable sort keeps table order between keys of equal length
        entries.sort_by(|a, b| b.key.len().cmp(&a.key.len()));
        Self { entries, default }
    }

    /// Finds the locality a query refers to, if any.
    pub fn lookup(&self, query: &str) -> Option<&GazetteerEntry> {
        let normalized = normalize_address(&correct_city_names(query));
        if normalized.is_empty() {
            return None;
        }

        let padded = format!(" {} ", normalized);
        self.entries
            .iter()
            .find(|e| padded.contains(&format!(" {} ", e.key)))
            .or_else(|| self.entries.iter().find(|e| normalized.contains(e.key)))
    }

    /// Resolves a query to an approximate location using the thread RNG for jitter.
    pub fn resolve(&self, query: &str) -> Location {
        self.resolve_with_rng(query, &mut rand::thread_rng())
    }

    /// Resolves a query to an approximate location.
    ///
    /// Address-like queries (containing a comma or a digit) get a jittered
    /// coordinate and confidence 0.7; bare locality names get the exact
    /// coordinate and 0.8; anything unknown gets the default locality and 0.3.
    pub fn resolve_with_rng<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> Location {
        let query = query.trim();

        let Some(found) = self.lookup(query) else {
            tracing::warn!(
                "Gazetteer: no locality recognized in '{}', using default locality {}",
                query,
                self.default.label
            );
            return approximate(
                self.default.latitude,
                self.default.longitude,
                format!("{} ({})", query, DEFAULT_LOCALITY_DISCLAIMER),
                DEFAULT_LOCALITY_CONFIDENCE,
            );
        };

        if looks_like_full_address(query) {
            let latitude = found.latitude + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES);
            let longitude = found.longitude + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES);
            tracing::info!("Gazetteer: '{}' matched {} (jittered)", query, found.label);
            approximate(
                latitude,
                longitude,
                format!("{} (okolice: {})", query, found.label),
                ADDRESS_MATCH_CONFIDENCE,
            )
        } else {
            tracing::info!("Gazetteer: '{}' matched {}", query, found.label);
            approximate(
                found.latitude,
                found.longitude,
                format!("{}, {}", found.label, COUNTRY_NAME),
                LOCALITY_MATCH_CONFIDENCE,
            )
        }
    }
}

fn looks_like_full_address(query: &str) -> bool {
    query.contains(',') || query.chars().any(|c| c.is_ascii_digit())
}

fn approximate(latitude: f64, longitude: f64, formatted_address: String, confidence: f64) -> Location {
    Location {
        latitude,
        longitude,
        formatted_address,
        accuracy_tier: AccuracyTier::Approximate,
        external_id: None,
        components: Vec::new(),
        confidence,
        source: LocationSource::Fallback,
    }
}
