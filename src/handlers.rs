use crate::auth::authorize_client_search;
use crate::config::Config;
use crate::contact::normalize_phone;
use crate::errors::AppError;
use crate::geocoding::GeocodingResolver;
use crate::matching::{search_by_address, search_by_phone};
use crate::models::*;
use crate::store::{load_client_profiles, TransactionStore};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Geocoder shared by all requests; owns the provider credentials.
    pub resolver: GeocodingResolver,
    /// Read-only transaction store.
    pub store: Arc<dyn TransactionStore>,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-booking-resolver",
            "version": env!("CARGO_PKG_VERSION"),
            "geocodingProvider": state.resolver.has_provider(),
        })),
    )
}

/// POST /api/v1/geocode
///
/// Resolves a free-text address. Falls back to the offline gazetteer when the
/// provider is disabled or refuses service for billing/authorization reasons.
pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeocodeRequest>,
) -> Result<Json<DataEnvelope<Location>>, AppError> {
    tracing::info!("POST /geocode - address: {}", request.address);

    let location = state.resolver.resolve(&request.address).await?;
    Ok(Json(DataEnvelope::ok(location)))
}

/// GET /api/v1/geocode/reverse
pub async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseGeocodeParams>,
) -> Result<Json<DataEnvelope<ReverseLocation>>, AppError> {
    tracing::info!("GET /geocode/reverse - ({}, {})", params.lat, params.lng);

    let reverse = state.resolver.reverse_resolve(params.lat, params.lng).await?;
    Ok(Json(DataEnvelope::ok(reverse)))
}

/// GET /api/v1/clients/search
///
/// Finds previously recorded clients by phone (when given) or by address.
/// Staff authorization is checked before the store is touched.
pub async fn search_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ClientSearchParams>,
) -> Result<Json<MatchEnvelope>, AppError> {
    let principal = authorize_client_search(&headers, state.config.internal_auth_token.as_deref())?;
    tracing::info!(
        "GET /clients/search by staff {} - params: {:?}",
        principal.staff_id,
        params
    );

    let address_query = params.address_query();
    if params.phone().is_none()
        && [&address_query.street, &address_query.postal_code, &address_query.city]
            .iter()
            .all(|field| field.as_deref().map(str::trim).unwrap_or("").is_empty())
    {
        return Err(AppError::ValidationError(
            "At least one search field required (phone, street, postalCode or city)".to_string(),
        ));
    }

    if params.phone().is_some_and(|phone| normalize_phone(phone).is_empty()) {
        return Err(AppError::ValidationError(
            "Phone number must contain digits".to_string(),
        ));
    }

    let outcome = load_client_profiles(state.store.as_ref()).await?;

    let matches = match params.phone() {
        Some(phone) => search_by_phone(phone, &outcome.profiles)?,
        None => search_by_address(&address_query, &outcome.profiles)?,
    };

    Ok(Json(MatchEnvelope::new(matches, params)))
}
