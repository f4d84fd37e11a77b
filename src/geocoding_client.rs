use crate::errors::AppError;
use crate::models::AddressComponent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PROVIDER_REGION: &str = "pl";
pub const PROVIDER_LANGUAGE: &str = "pl";
pub const PROVIDER_COUNTRY_FILTER: &str = "country:PL";
pub const REVERSE_RESULT_TYPES: &str = "street_address|route|locality";

/// Status reported by the provider in the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    OverDailyLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderLatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderGeometry {
    pub location: ProviderLatLng,
    /// Precision tier, e.g. `ROOFTOP`.
    #[serde(default)]
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl From<ProviderAddressComponent> for AddressComponent {
    fn from(component: ProviderAddressComponent) -> Self {
        AddressComponent {
            long_name: component.long_name,
            short_name: component.short_name,
            types: component.types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub geometry: Option<ProviderGeometry>,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub partial_match: bool,
    #[serde(default)]
    pub address_components: Vec<ProviderAddressComponent>,
}

/// Body of a geocoding response, forward or reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub status: ProviderStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<ProviderResult>,
}

/// External geocoding service.
///
/// Implementations return `Err` only for transport-level failures; provider
/// statuses such as `ZERO_RESULTS` come back inside an `Ok` response and are
/// interpreted by the resolver.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<ProviderResponse, AppError>;

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<ProviderResponse, AppError>;
}

/// Client for the Google Geocoding API.
#[derive(Clone)]
pub struct GoogleGeocodingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocodingClient {
    /// Creates a new `GoogleGeocodingClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The provider base URL, without the `/maps/api/...` path.
    /// * `api_key` - The API key sent with every request.
    /// * `timeout` - Transport timeout for a single request.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create geocoding client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/maps/api/geocode/json", self.base_url)
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<ProviderResponse, AppError> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("key", self.api_key.as_str()));

        let url = reqwest::Url::parse_with_params(&self.endpoint(), &query)
            .map_err(|e| AppError::ProviderError(format!("Failed to build URL: {}", e)))?;

        // Redact key from logs to prevent credential exposure
        tracing::debug!("Geocoding URL: {}?{:?}&key=[REDACTED]", self.endpoint(), params);

        // Transport failures convert to ProviderError
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ProviderError(format!(
                "Geocoding provider returned {}: {}",
                status, error_text
            )));
        }

        let data: ProviderResponse = response.json().await?;

        Ok(data)
    }
}

#[async_trait]
impl GeocodingProvider for GoogleGeocodingClient {
    async fn geocode(&self, address: &str) -> Result<ProviderResponse, AppError> {
        tracing::info!("Geocoding address via provider: {}", address);
        self.fetch(&[
            ("address", address),
            ("region", PROVIDER_REGION),
            ("language", PROVIDER_LANGUAGE),
            ("components", PROVIDER_COUNTRY_FILTER),
        ])
        .await
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<ProviderResponse, AppError> {
        let latlng = format!("{},{}", lat, lng);
        tracing::info!("Reverse geocoding via provider: {}", latlng);
        self.fetch(&[
            ("latlng", latlng.as_str()),
            ("language", PROVIDER_LANGUAGE),
            ("result_type", REVERSE_RESULT_TYPES),
        ])
        .await
    }
}
