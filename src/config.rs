use serde::Deserialize;

pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com";
pub const DEFAULT_GEOCODING_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// `None` disables the external provider; every lookup goes to the gazetteer.
    pub geocoding_api_key: Option<String>,
    pub geocoding_base_url: String,
    pub geocoding_timeout_secs: u64,
    /// Shared secret the auth gateway sends in `X-Internal-Token`.
    pub internal_auth_token: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            geocoding_api_key: std::env::var("GEOCODING_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            geocoding_base_url: std::env::var("GEOCODING_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| validate_http_url("GEOCODING_BASE_URL", url))
                .transpose()?
                .unwrap_or_else(|| DEFAULT_GEOCODING_BASE_URL.to_string()),
            geocoding_timeout_secs: std::env::var("GEOCODING_TIMEOUT_SECS")
                .ok()
                .map(|raw| {
                    raw.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                        anyhow::anyhow!("GEOCODING_TIMEOUT_SECS must be a positive number")
                    })
                })
                .transpose()?
                .unwrap_or(DEFAULT_GEOCODING_TIMEOUT_SECS),
            internal_auth_token: std::env::var("INTERNAL_AUTH_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Geocoding Base URL: {}", config.geocoding_base_url);
        if config.geocoding_api_key.is_none() {
            tracing::warn!("GEOCODING_API_KEY not set, geocoding will use the offline gazetteer only");
        }
        if config.internal_auth_token.is_none() {
            tracing::warn!("INTERNAL_AUTH_TOKEN not set, staff headers are trusted as-is");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn validate_http_url(name: &str, raw: String) -> anyhow::Result<String> {
    let parsed = url::Url::parse(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(raw.trim_end_matches('/').to_string())
}
