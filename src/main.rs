use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_booking_resolver::config::Config;
use rust_booking_resolver::db::Database;
use rust_booking_resolver::gazetteer::FallbackGazetteer;
use rust_booking_resolver::geocoding::GeocodingResolver;
use rust_booking_resolver::geocoding_client::{GeocodingProvider, GoogleGeocodingClient};
use rust_booking_resolver::handlers::{self, AppState};
use rust_booking_resolver::store::PgTransactionStore;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Database connection.
/// - The geocoding provider client (optional).
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_booking_resolver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Geocoding provider; without a key every lookup uses the gazetteer
    let provider: Option<Arc<dyn GeocodingProvider>> = match config.geocoding_api_key.clone() {
        Some(api_key) => match GoogleGeocodingClient::new(
            config.geocoding_base_url.clone(),
            api_key,
            Duration::from_secs(config.geocoding_timeout_secs),
        ) {
            Ok(client) => {
                tracing::info!("✓ Geocoding client initialized: {}", config.geocoding_base_url);
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::error!("Failed to initialize geocoding client: {}", e);
                None
            }
        },
        None => None,
    };

    let resolver = GeocodingResolver::new(provider, FallbackGazetteer::default());

    // Build application state
    let app_state = Arc::new(AppState {
        config: config.clone(),
        resolver,
        store: Arc::new(PgTransactionStore::new(db.pool.clone())),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/geocode", post(handlers::geocode))
        .route("/api/v1/geocode/reverse", get(handlers::reverse_geocode))
        .route("/api/v1/clients/search", get(handlers::search_clients))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
