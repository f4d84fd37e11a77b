//! Address canonicalization.
//!
//! Two forms come out of here:
//! - the *enhanced* form sent to the geocoding provider (abbreviations expanded,
//!   exonyms corrected, country appended), still human-readable;
//! - the *comparison* form used for matching (lowercase, no diacritics,
//!   punctuation folded to spaces).
//!
//! Both are idempotent.
use regex::{Captures, Regex};
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const COUNTRY_NAME: &str = "Polska";

/// ASCII spellings and foreign exonyms mapped to the native city name.
const CITY_CORRECTIONS: &[(&str, &str)] = &[
    ("warsaw", "Warszawa"),
    ("warschau", "Warszawa"),
    ("cracow", "Kraków"),
    ("krakow", "Kraków"),
    ("krakau", "Kraków"),
    ("gdansk", "Gdańsk"),
    ("danzig", "Gdańsk"),
    ("wroclaw", "Wrocław"),
    ("breslau", "Wrocław"),
    ("poznan", "Poznań"),
    ("posen", "Poznań"),
    ("lodz", "Łódź"),
    ("stettin", "Szczecin"),
    ("bialystok", "Białystok"),
    ("torun", "Toruń"),
    ("rzeszow", "Rzeszów"),
    ("czestochowa", "Częstochowa"),
    ("zielona gora", "Zielona Góra"),
    ("bielsko-biala", "Bielsko-Biała"),
    ("poland", "Polska"),
];

fn abbreviation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(ul|al|pl|os)\.\s*").expect("valid abbreviation regex"))
}

fn city_correction_regexes() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        CITY_CORRECTIONS
            .iter()
            .map(|(wrong, right)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(wrong));
                (
                    Regex::new(&pattern).expect("valid city correction regex"),
                    *right,
                )
            })
            .collect()
    })
}

/// Expands street-type abbreviations: `ul.` → `ulica`, `al.` → `aleja`,
/// `pl.` → `plac`, `os.` → `osiedle`.
///
/// Matching is case-insensitive and anchored at a word start, so `Kos.` or
/// `Wapl.` are left alone. A capitalized abbreviation yields a capitalized word.
pub fn expand_abbreviations(address: &str) -> String {
    abbreviation_regex()
        .replace_all(address, |caps: &Captures| {
            let abbreviation = &caps[1];
            let expanded = match abbreviation.to_lowercase().as_str() {
                "ul" => "ulica",
                "al" => "aleja",
                "pl" => "plac",
                _ => "osiedle",
            };
            if abbreviation.starts_with(char::is_uppercase) {
                format!("{}{} ", expanded[..1].to_uppercase(), &expanded[1..])
            } else {
                format!("{} ", expanded)
            }
        })
        .into_owned()
}

/// Replaces misspelled or foreign city names, whole words only.
pub fn correct_city_names(address: &str) -> String {
    city_correction_regexes()
        .iter()
        .fold(address.to_string(), |acc, (pattern, right)| {
            pattern.replace_all(&acc, *right).into_owned()
        })
}

/// Lowercases, strips diacritics and folds punctuation (except `-`) to spaces.
///
/// `ł` has no Unicode decomposition, so it is mapped explicitly.
pub fn fold_text(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'ł' | 'Ł' => 'l',
            c if c.is_alphanumeric() || c == '-' => c,
            _ => ' ',
        })
        .flat_map(char::to_lowercase)
        .collect();

    stripped
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Comparison form of an address.
pub fn normalize_address(address: &str) -> String {
    fold_text(&expand_abbreviations(address))
}

/// Provider-facing form of an address.
pub fn enhance_address(address: &str) -> String {
    let collapsed = address.split_whitespace().collect::<Vec<_>>().join(" ");
    let expanded = expand_abbreviations(&collapsed);
    let corrected = correct_city_names(&expanded);
    let trimmed = corrected
        .trim()
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string();

    let has_country = fold_text(&trimmed)
        .split(' ')
        .any(|token| token == "polska");

    let enhanced = if has_country || trimmed.is_empty() {
        trimmed
    } else {
        format!("{}, {}", trimmed, COUNTRY_NAME)
    };

    if enhanced != address {
        tracing::debug!("Address enhanced: '{}' → '{}'", address, enhanced);
    }
    enhanced
}

/// Postal codes compare on digits only (`80-000` == `80000`).
pub fn normalize_postal_code(postal_code: &str) -> String {
    postal_code.chars().filter(|c| c.is_ascii_digit()).collect()
}
