//! Forward and reverse geocoding with a trust score.
//!
//! Forward resolution asks the external provider first. Billing or
//! authorization denials degrade to the offline gazetteer; every other
//! failure is returned to the caller as a typed error. Reverse resolution has
//! no offline counterpart and always needs the provider.
use crate::address::enhance_address;
use crate::errors::AppError;
use crate::gazetteer::FallbackGazetteer;
use crate::geocoding_client::{GeocodingProvider, ProviderResponse, ProviderResult, ProviderStatus};
use crate::models::{AccuracyTier, AddressComponent, Location, LocationSource, ReverseLocation};
use std::sync::Arc;

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;
pub const PARTIAL_MATCH_PENALTY: f64 = 0.1;

/// Base confidence for a provider precision tier.
pub fn tier_confidence(tier: AccuracyTier) -> f64 {
    match tier {
        AccuracyTier::Rooftop => 0.95,
        AccuracyTier::RangeInterpolated => 0.85,
        AccuracyTier::GeometricCenter => 0.75,
        AccuracyTier::Approximate => 0.65,
    }
}

pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return MIN_CONFIDENCE;
    }
    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Why a provider response was answered from the gazetteer instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// No provider configured at all.
    ProviderDisabled,
    /// Billing is not enabled or the daily quota tied to billing ran out.
    Billing,
    /// The provider refused the request for another reason (often an invalid key).
    RequestDenied,
}

/// Classifies a non-OK provider status that should fall back instead of failing.
pub fn degradation_for(status: &ProviderStatus, error_message: Option<&str>) -> Option<Degradation> {
    let mentions_billing = error_message
        .map(|m| m.to_lowercase().contains("billing"))
        .unwrap_or(false);

    match status {
        ProviderStatus::Ok => None,
        ProviderStatus::OverDailyLimit => Some(Degradation::Billing),
        ProviderStatus::RequestDenied if mentions_billing => Some(Degradation::Billing),
        ProviderStatus::RequestDenied => Some(Degradation::RequestDenied),
        _ if mentions_billing => Some(Degradation::Billing),
        _ => None,
    }
}

/// Resolves addresses to locations.
///
/// Constructed once and shared; it owns the provider client (and with it the
/// credentials) so callers never pass keys around.
#[derive(Clone)]
pub struct GeocodingResolver {
    provider: Option<Arc<dyn GeocodingProvider>>,
    gazetteer: FallbackGazetteer,
}

impl GeocodingResolver {
    pub fn new(provider: Option<Arc<dyn GeocodingProvider>>, gazetteer: FallbackGazetteer) -> Self {
        Self {
            provider,
            gazetteer,
        }
    }

    /// Resolver that never calls out; every lookup is answered by the gazetteer.
    pub fn offline() -> Self {
        Self::new(None, FallbackGazetteer::default())
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Turns a free-text address into a location.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - the address is blank.
    /// * `NotFound` - the provider has no result for the address.
    /// * `RateLimited` - the provider quota is exhausted.
    /// * `ProviderError` - transport failure or any other provider status.
    pub async fn resolve(&self, address: &str) -> Result<Location, AppError> {
        if address.trim().is_empty() {
            return Err(AppError::ValidationError("Address is required".to_string()));
        }

        let Some(provider) = self.provider.as_ref() else {
            return Ok(self.degrade(address, Degradation::ProviderDisabled, None));
        };

        let enhanced = enhance_address(address);
        let response = provider.geocode(&enhanced).await?;

        match response.status {
            ProviderStatus::Ok => {
                let location = first_result_location(response)?;
                tracing::info!(
                    "Geocoded '{}' → ({}, {}) {:?} confidence {:.2}",
                    address,
                    location.latitude,
                    location.longitude,
                    location.accuracy_tier,
                    location.confidence
                );
                Ok(location)
            }
            ProviderStatus::ZeroResults => Err(AppError::NotFound(format!(
                "Address not found: {}",
                address
            ))),
            ProviderStatus::OverQueryLimit => Err(AppError::RateLimited(
                response
                    .error_message
                    .unwrap_or_else(|| "Geocoding query limit exceeded".to_string()),
            )),
            ref status => match degradation_for(status, response.error_message.as_deref()) {
                Some(reason) => Ok(self.degrade(address, reason, response.error_message.as_deref())),
                None => Err(AppError::ProviderError(format!(
                    "Geocoding failed with status {:?}: {}",
                    status,
                    response.error_message.as_deref().unwrap_or("no details")
                ))),
            },
        }
    }

    /// Turns coordinates into an address. There is no offline fallback.
    pub async fn reverse_resolve(&self, lat: f64, lng: f64) -> Result<ReverseLocation, AppError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::ValidationError(format!(
                "Coordinates out of range: ({}, {})",
                lat, lng
            )));
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            AppError::ProviderError("Reverse geocoding requires a configured provider".to_string())
        })?;

        let response = provider.reverse_geocode(lat, lng).await?;

        match response.status {
            ProviderStatus::Ok => {
                let first = response.results.into_iter().next().ok_or_else(|| {
                    AppError::NotFound(format!("No address found for ({}, {})", lat, lng))
                })?;
                Ok(ReverseLocation {
                    address: first.formatted_address,
                    components: first
                        .address_components
                        .into_iter()
                        .map(AddressComponent::from)
                        .collect(),
                })
            }
            ProviderStatus::ZeroResults => Err(AppError::NotFound(format!(
                "No address found for ({}, {})",
                lat, lng
            ))),
            ProviderStatus::OverQueryLimit => Err(AppError::RateLimited(
                response
                    .error_message
                    .unwrap_or_else(|| "Geocoding query limit exceeded".to_string()),
            )),
            status => Err(AppError::ProviderError(format!(
                "Reverse geocoding failed with status {:?}: {}",
                status,
                response.error_message.as_deref().unwrap_or("no details")
            ))),
        }
    }

    fn degrade(&self, address: &str, reason: Degradation, detail: Option<&str>) -> Location {
        match reason {
            Degradation::ProviderDisabled => {
                tracing::debug!("Geocoding provider disabled, using gazetteer for '{}'", address)
            }
            Degradation::Billing => tracing::warn!(
                "Geocoding provider billing unavailable ({}), falling back to gazetteer",
                detail.unwrap_or("no details")
            ),
            Degradation::RequestDenied => tracing::error!(
                "Geocoding request denied ({}), possible credential misconfiguration; falling back to gazetteer",
                detail.unwrap_or("no details")
            ),
        }
        self.gazetteer.resolve(address)
    }
}

fn first_result_location(response: ProviderResponse) -> Result<Location, AppError> {
    let first: ProviderResult = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Provider returned no results".to_string()))?;

    let geometry = first.geometry.ok_or_else(|| {
        AppError::ProviderError("Provider result is missing geometry".to_string())
    })?;

    let tier = geometry
        .location_type
        .as_deref()
        .map(AccuracyTier::from_provider)
        .unwrap_or(AccuracyTier::Approximate);

    let mut confidence = tier_confidence(tier);
    if first.partial_match {
        confidence -= PARTIAL_MATCH_PENALTY;
    }

    Ok(Location {
        latitude: geometry.location.lat,
        longitude: geometry.location.lng,
        formatted_address: first.formatted_address,
        accuracy_tier: tier,
        external_id: first.place_id,
        components: first
            .address_components
            .into_iter()
            .map(AddressComponent::from)
            .collect(),
        confidence: clamp_confidence(confidence),
        source: LocationSource::Provider,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::DEFAULT_LOCALITY_CONFIDENCE;
    use crate::geocoding_client::{ProviderGeometry, ProviderLatLng};
    use async_trait::async_trait;

    /// Provider double that answers every call with a canned response.
    struct CannedProvider(Result<ProviderResponse, AppError>);

    #[async_trait]
    impl GeocodingProvider for CannedProvider {
        async fn geocode(&self, _address: &str) -> Result<ProviderResponse, AppError> {
            self.0.clone()
        }

        async fn reverse_geocode(&self, _lat: f64, _lng: f64) -> Result<ProviderResponse, AppError> {
            self.0.clone()
        }
    }

    fn resolver_with(response: Result<ProviderResponse, AppError>) -> GeocodingResolver {
        GeocodingResolver::new(
            Some(Arc::new(CannedProvider(response))),
            FallbackGazetteer::default(),
        )
    }

    fn status_only(status: ProviderStatus, error_message: Option<&str>) -> ProviderResponse {
        ProviderResponse {
            status,
            error_message: error_message.map(String::from),
            results: vec![],
        }
    }

    fn ok_response(location_type: &str, partial_match: bool) -> ProviderResponse {
        ProviderResponse {
            status: ProviderStatus::Ok,
            error_message: None,
            results: vec![ProviderResult {
                geometry: Some(ProviderGeometry {
                    location: ProviderLatLng {
                        lat: 54.3489,
                        lng: 18.6532,
                    },
                    location_type: Some(location_type.to_string()),
                }),
                formatted_address: "Długa 78, 80-831 Gdańsk, Polska".to_string(),
                place_id: Some("place-123".to_string()),
                partial_match,
                address_components: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn test_ok_maps_precision_tier_to_confidence() {
        let location = resolver_with(Ok(ok_response("ROOFTOP", false)))
            .resolve("ul. Długa 78, Gdańsk")
            .await
            .unwrap();

        assert_eq!(location.confidence, 0.95);
        assert_eq!(location.accuracy_tier, AccuracyTier::Rooftop);
        assert_eq!(location.source, LocationSource::Provider);
        assert_eq!(location.external_id.as_deref(), Some("place-123"));
    }

    #[tokio::test]
    async fn test_partial_match_is_penalized() {
        let location = resolver_with(Ok(ok_response("GEOMETRIC_CENTER", true)))
            .resolve("Długa, Gdańsk")
            .await
            .unwrap();
        assert!((location.confidence - 0.65).abs() < 1e-9);

        let location = resolver_with(Ok(ok_response("APPROXIMATE", true)))
            .resolve("Gdańsk")
            .await
            .unwrap();
        assert!((location.confidence - 0.55).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_zero_results_is_not_found() {
        let err = resolver_with(Ok(status_only(ProviderStatus::ZeroResults, None)))
            .resolve("Nieistniejąca 1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_over_query_limit_is_rate_limited() {
        let err = resolver_with(Ok(status_only(ProviderStatus::OverQueryLimit, None)))
            .resolve("Kraków")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_request_denied_falls_back_to_gazetteer() {
        let location = resolver_with(Ok(status_only(
            ProviderStatus::RequestDenied,
            Some("The provided API key is invalid."),
        )))
        .resolve("Rynek Główny, Kraków")
        .await
        .unwrap();

        assert_eq!(location.source, LocationSource::Fallback);
        assert_eq!(location.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_billing_error_falls_back_even_with_other_status() {
        let location = resolver_with(Ok(status_only(
            ProviderStatus::UnknownError,
            Some("You must enable Billing on the Google Cloud Project"),
        )))
        .resolve("Gdańsk")
        .await
        .unwrap();

        assert_eq!(location.source, LocationSource::Fallback);
        assert_eq!(location.confidence, 0.8);
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_fall_back() {
        let err = resolver_with(Err(AppError::ProviderError("connection refused".to_string())))
            .resolve("Kraków")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProviderError(_)));
    }

    #[tokio::test]
    async fn test_other_status_is_provider_error() {
        let err = resolver_with(Ok(status_only(ProviderStatus::InvalidRequest, None)))
            .resolve("Kraków")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProviderError(_)));
    }

    #[tokio::test]
    async fn test_disabled_provider_uses_gazetteer() {
        let location = GeocodingResolver::offline()
            .resolve("Nieznane Miejsce 12")
            .await
            .unwrap();
        assert_eq!(location.confidence, DEFAULT_LOCALITY_CONFIDENCE);
        assert_eq!(location.accuracy_tier, AccuracyTier::Approximate);
    }

    #[tokio::test]
    async fn test_blank_address_is_rejected() {
        let err = GeocodingResolver::offline().resolve("   ").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_reverse_has_no_fallback() {
        let err = GeocodingResolver::offline()
            .reverse_resolve(50.06, 19.94)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProviderError(_)));

        let err = resolver_with(Ok(status_only(ProviderStatus::RequestDenied, None)))
            .reverse_resolve(50.06, 19.94)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProviderError(_)));
    }

    #[tokio::test]
    async fn test_reverse_rejects_out_of_range_coordinates() {
        let err = resolver_with(Ok(ok_response("ROOFTOP", false)))
            .reverse_resolve(91.0, 0.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.3), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.1);
        assert_eq!(clamp_confidence(f64::NAN), 0.1);
    }

    #[test]
    fn test_degradation_classification() {
        assert_eq!(
            degradation_for(&ProviderStatus::OverDailyLimit, None),
            Some(Degradation::Billing)
        );
        assert_eq!(
            degradation_for(&ProviderStatus::RequestDenied, Some("Billing not enabled")),
            Some(Degradation::Billing)
        );
        assert_eq!(
            degradation_for(&ProviderStatus::RequestDenied, None),
            Some(Degradation::RequestDenied)
        );
        assert_eq!(degradation_for(&ProviderStatus::InvalidRequest, None), None);
        assert_eq!(degradation_for(&ProviderStatus::ZeroResults, None), None);
    }
}
