//! Process configuration.
//!
//! Everything comes from environment variables; `main` loads a `.env` file
//! first when one exists. The model backend section is delegated to
//! [`LlmBackendConfig`].

use karte_assistant::LlmBackendConfig;
use karte_server::ServerConfig;

use crate::error::AppError;

/// Default database location, created on first run.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://karte.db?mode=rwc";

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `SQLite` database URL (`DATABASE_URL`).
    pub database_url: String,
    /// Bind address (`KARTE_HOST`, `KARTE_PORT`).
    pub server: ServerConfig,
    /// Google Maps key for geocoding and the map page (`GOOGLE_MAPS_API_KEY`).
    pub google_maps_api_key: String,
    /// Model backend settings.
    pub llm: LlmBackendConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("KARTE_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| AppError::Config {
                message: format!("invalid KARTE_PORT {raw:?}: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            server: ServerConfig {
                host: get("KARTE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
                port,
            },
            google_maps_api_key: get("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
            llm: LlmBackendConfig::from_lookup(&lookup)?,
        })
    }
}
