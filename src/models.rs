use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============ Geocoding Models ============

/// How precisely a location pins down the queried address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccuracyTier {
    Rooftop,
    RangeInterpolated,
    GeometricCenter,
    Approximate,
}

impl AccuracyTier {
    /// Maps the provider's `location_type` string; unknown values become `Approximate`.
    pub fn from_provider(location_type: &str) -> Self {
        match location_type {
            "ROOFTOP" => AccuracyTier::Rooftop,
            "RANGE_INTERPOLATED" => AccuracyTier::RangeInterpolated,
            "GEOMETRIC_CENTER" => AccuracyTier::GeometricCenter,
            _ => AccuracyTier::Approximate,
        }
    }
}

/// Where a location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Provider,
    Fallback,
}

/// One element of the provider's address breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A resolved geocoordinate with its trust score.
///
/// `confidence` is always within [0.1, 1.0].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(rename = "address")]
    pub formatted_address: String,
    pub accuracy_tier: AccuracyTier,
    pub external_id: Option<String>,
    pub components: Vec<AddressComponent>,
    pub confidence: f64,
    pub source: LocationSource,
}

/// Result of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseLocation {
    pub address: String,
    pub components: Vec<AddressComponent>,
}

// ============ Transaction Store Models ============

/// One historical booking as read from the transaction store.
///
/// Every field is optional; the aggregator decides which gaps are fatal.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub client_id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub order_ref: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub device_type: Option<String>,
    pub brand: Option<String>,
    pub status: Option<String>,
    pub problem: Option<String>,
}

// ============ Client Models ============

/// One entry of a client's order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistoryEntry {
    pub order_ref: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub device_info: String,
    pub status: Option<String>,
    pub problem: Option<String>,
}

/// Aggregated view of one customer reconstructed from their transaction records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub client_id: String,
    pub name: String,
    pub email: Option<String>,
    pub primary_phone: Option<String>,
    pub alternate_phones: Vec<String>,
    pub address: String,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub order_count: usize,
    pub last_order_date: Option<DateTime<Utc>>,
    pub order_history: Vec<OrderHistoryEntry>,
}

/// A profile scored against a search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub profile: ClientProfile,
    pub match_score: f64,
    pub match_reason: String,
}

// ============ Request / Response Models ============

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReverseGeocodeParams {
    pub lat: f64,
    pub lng: f64,
}

/// Address part of a client search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressQuery {
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

/// Query string of `GET /api/v1/clients/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSearchParams {
    pub phone: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

impl ClientSearchParams {
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn address_query(&self) -> AddressQuery {
        AddressQuery {
            street: self.street.clone(),
            postal_code: self.postal_code.clone(),
            city: self.city.clone(),
        }
    }
}

/// Ranked match envelope returned by client searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEnvelope {
    pub success: bool,
    pub matches: Vec<MatchResult>,
    pub total_matches: usize,
    pub search_query: ClientSearchParams,
}

impl MatchEnvelope {
    pub fn new(matches: Vec<MatchResult>, search_query: ClientSearchParams) -> Self {
        Self {
            success: true,
            total_matches: matches.len(),
            matches,
            search_query,
        }
    }
}

/// `{success, data}` envelope for single-object responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
