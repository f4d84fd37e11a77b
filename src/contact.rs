//! Phone canonicalization for identity comparison.
//!
//! The canonical form is a bare digit string without the Polish country
//! prefix. It is only ever compared, never shown to anyone.
use phonenumber::country::Id as CountryId;
use regex::Regex;
use std::sync::OnceLock;

/// Length of a Polish national (subscriber) number.
pub const NATIONAL_NUMBER_LEN: usize = 9;

/// Shortest and longest digit runs handed to the parser (`00` + E.164 maximum).
const PARSEABLE_DIGITS: std::ops::RangeInclusive<usize> = 7..=17;

/// Trailing extension: `wew. 12`, `w. 12`, `ext 12`, `x12`, `#12`.
fn extension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*(?:wew\.?|w\.|ext\.?|x|#)\s*\d{1,6}\s*$").expect("valid extension regex")
    })
}

/// Trunk marker written after an international prefix: `+48 (0) 600 ...`.
fn trunk_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\s*0\s*\)").expect("valid trunk marker regex"))
}

/// Canonical digit string for a phone as written by a customer or agent.
///
/// The extension and any `(0)` trunk marker are dropped, then the number is
/// parsed with Poland as the default region and its national number is used.
/// Strings the parser rejects (or numbers it deems invalid) fall back to their
/// bare digits. Either way a leading `48` / `0048` is stripped when the rest is
/// a full national number, so a 9-digit number that starts with `48` stays
/// intact.
///
/// Returns an empty string when the input has no digits.
pub fn normalize_phone(raw: &str) -> String {
    let without_extension = extension_regex().replace(raw, "");
    let cleaned = trunk_marker_regex().replace_all(&without_extension, "");

    let digits: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return digits;
    }

    // `+0...` is not an international number; read it as dialled
    let international = cleaned.trim_start().starts_with('+') && !digits.starts_with('0');
    let candidate = if international {
        format!("+{}", digits)
    } else {
        digits.clone()
    };

    let national = parse_national(&candidate).unwrap_or(digits);
    strip_country_prefix(national)
}

fn parse_national(candidate: &str) -> Option<String> {
    let digit_count = candidate.trim_start_matches('+').len();
    if !PARSEABLE_DIGITS.contains(&digit_count) {
        return None;
    }

    match phonenumber::parse(Some(CountryId::PL), candidate) {
        Ok(number) if phonenumber::is_valid(&number) => {
            Some(number.national().value().to_string())
        }
        Ok(_) => {
            tracing::debug!("Phone '{}' parsed but is not valid, using bare digits", candidate);
            None
        }
        Err(e) => {
            tracing::debug!("Failed to parse phone '{}': {:?}", candidate, e);
            None
        }
    }
}

fn strip_country_prefix(digits: String) -> String {
    if digits.len() == NATIONAL_NUMBER_LEN + 4 && digits.starts_with("0048") {
        return digits[4..].to_string();
    }
    if digits.len() == NATIONAL_NUMBER_LEN + 2 && digits.starts_with("48") {
        return digits[2..].to_string();
    }
    digits
}

/// Last `n` digits of an already normalized phone, if it has that many.
pub fn last_digits(normalized: &str, n: usize) -> Option<&str> {
    if normalized.len() < n {
        return None;
    }
    Some(&normalized[normalized.len() - n..])
}

/// Primary phone plus alternates, deduplicated by normalized value.
///
/// Values are stored exactly as they were received; normalization is only
/// used to decide whether two values are the same number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactRecord {
    primary: Option<String>,
    alternates: Vec<String>,
}

impl ContactRecord {
    pub fn new(primary: Option<&str>) -> Self {
        let mut record = Self::default();
        if let Some(phone) = primary {
            record.add(phone);
        }
        record
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn alternates(&self) -> &[String] {
        &self.alternates
    }

    /// Records a phone seen for this contact.
    ///
    /// The first usable phone becomes primary; later ones are appended as
    /// alternates unless they normalize to a number already known. Returns
    /// `true` when something new was stored.
    pub fn add(&mut self, raw: &str) -> bool {
        let normalized = normalize_phone(raw);
        if normalized.is_empty() {
            return false;
        }

        match &self.primary {
            None => {
                self.primary = Some(raw.trim().to_string());
                true
            }
            Some(primary) if normalize_phone(primary) == normalized => false,
            Some(_) => {
                if self
                    .alternates
                    .iter()
                    .any(|alt| normalize_phone(alt) == normalized)
                {
                    return false;
                }
                self.alternates.push(raw.trim().to_string());
                true
            }
        }
    }

    pub fn into_parts(self) -> (Option<String>, Vec<String>) {
        (self.primary, self.alternates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_formatting_and_prefix() {
        assert_eq!(normalize_phone("+48 600 234 567"), "600234567");
        assert_eq!(normalize_phone("48600234567"), "600234567");
        assert_eq!(normalize_phone("0048 600-234-567"), "600234567");
        assert_eq!(normalize_phone("(600) 234 567"), "600234567");
    }

    #[test]
    fn test_normalize_drops_extension() {
        assert_eq!(normalize_phone("+48 600 234 567 wew. 12"), "600234567");
        assert_eq!(normalize_phone("600 234 567 ext 4"), "600234567");
        assert_eq!(normalize_phone("22 123 45 67 w. 301"), "221234567");
        assert_eq!(normalize_phone("+48600234567 x9"), "600234567");
    }

    #[test]
    fn test_normalize_drops_trunk_marker() {
        assert_eq!(normalize_phone("+48 (0) 600 234 567"), "600234567");
        assert_eq!(normalize_phone("+48(0)22 123 45 67"), "221234567");
    }

    #[test]
    fn test_normalize_foreign_numbers_keep_subscriber_tail() {
        let normalized = normalize_phone("+44 7600 234 567");
        assert_eq!(last_digits(&normalized, NATIONAL_NUMBER_LEN), Some("600234567"));
        assert_eq!(normalize_phone(&normalized), normalized);
    }

    #[test]
    fn test_normalize_keeps_national_numbers_starting_with_48() {
        assert_eq!(normalize_phone("48 360 12 34"), "483601234");
    }

    #[test]
    fn test_normalize_without_digits_is_empty() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("brak"), "");
    }

    #[test]
    fn test_last_digits() {
        assert_eq!(last_digits("48600234567", 9), Some("600234567"));
        assert_eq!(last_digits("1234", 9), None);
    }

    #[test]
    fn test_contact_record_dedups_by_normalized_value() {
        let mut contact = ContactRecord::new(Some("+48 600 234 567"));
        assert!(!contact.add("600-234-567"));
        assert!(contact.add("501 000 111"));
        assert!(!contact.add("+48501000111"));
        assert!(!contact.add("n/a"));
        assert!(!contact.add("+48 (0) 501 000 111 wew. 7"));

        assert_eq!(contact.primary(), Some("+48 600 234 567"));
        assert_eq!(contact.alternates(), &["501 000 111".to_string()]);
    }

    #[test]
    fn test_first_phone_becomes_primary_when_missing() {
        let mut contact = ContactRecord::new(None);
        assert!(contact.add("600 234 567"));
        assert_eq!(contact.primary(), Some("600 234 567"));
        assert!(contact.alternates().is_empty());
    }
}
