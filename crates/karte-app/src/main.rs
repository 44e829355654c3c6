//! Karte map assistant binary.
//!
//! Wires together configuration, the `SQLite` store, the model backend,
//! the geocoder, and the HTTP server.
//!
//! # Startup Sequence
//!
//! 1. Load `.env` if present
//! 2. Initialize structured logging (tracing)
//! 3. Load configuration from the environment
//! 4. Build the model backend and prompt engine (fails fast on bad config)
//! 5. Connect to `SQLite` and run migrations
//! 6. Build the geocoder
//! 7. Serve until `Ctrl-C`

mod config;
mod error;

use std::sync::Arc;

use karte_assistant::{Assistant, PromptEngine, create_backend};
use karte_db::SqlitePool;
use karte_server::{AppState, GoogleGeocoder};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::AppError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the server itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load .env before anything reads the environment.
    let dotenv = dotenvy::dotenv();

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to load .env"),
    }

    info!("karte starting");

    // 3. Load configuration.
    let config = AppConfig::from_env()?;
    info!(
        provider = ?config.llm.backend_type,
        model = config.llm.model,
        api_url = config.llm.api_url,
        timeout_ms = config.llm.timeout.as_millis(),
        "Configuration loaded"
    );

    // 4. Build the assistant.
    let backend = create_backend(&config.llm)?;
    let prompts = match config.llm.templates_dir.as_deref() {
        Some(dir) => {
            info!(dir, "Loading prompt templates from disk");
            PromptEngine::from_dir(dir)?
        }
        None => PromptEngine::new()?,
    };
    let assistant = Assistant::new(Arc::new(backend), prompts, config.llm.timeout);

    // 5. Connect to SQLite.
    let db = SqlitePool::connect_url(&config.database_url).await.map_err(AppError::from)?;
    db.run_migrations().await.map_err(AppError::from)?;

    // 6. Build the geocoder.
    if config.google_maps_api_key.is_empty() {
        warn!("GOOGLE_MAPS_API_KEY is not set; geocoding and the map will not work");
    }
    let geocoder =
        GoogleGeocoder::new(&config.google_maps_api_key).map_err(|e| AppError::Geocoder {
            message: format!("failed to build HTTP client: {e}"),
        })?;

    // 7. Serve.
    let state = Arc::new(
        AppState::new(
            db.clone(),
            assistant,
            Arc::new(geocoder),
            config.google_maps_api_key.clone(),
        )
        .map_err(AppError::from)?,
    );
    let served = karte_server::start_server(&config.server, state).await;
    db.close().await;
    served.map_err(AppError::from)?;

    info!("karte stopped");
    Ok(())
}
