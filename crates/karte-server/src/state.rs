//! Shared application state for the HTTP layer.
//!
//! [`AppState`] bundles the capability handles every route needs: the
//! database pool, the assistant (prompt engine plus model client), and the
//! geocoder. It is built once by the binary and shared behind an `Arc`.

use std::sync::Arc;

use karte_assistant::Assistant;
use karte_db::SqlitePool;

use crate::geocode::Geocoder;
use crate::pages::Pages;
use crate::server::ServerError;

/// Shared state passed to every handler.
pub struct AppState {
    /// Pins and chat transcript.
    pub db: SqlitePool,
    /// The map assistant.
    pub assistant: Assistant,
    /// Address lookup.
    pub geocoder: Arc<dyn Geocoder>,
    /// HTML page templates.
    pub pages: Pages,
    /// Browser key for the Google Maps `JavaScript` API. Empty disables the map.
    pub google_maps_api_key: String,
}

impl AppState {
    /// Assemble the state from its capability handles.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Setup`] if the embedded page templates fail to
    /// parse.
    pub fn new(
        db: SqlitePool,
        assistant: Assistant,
        geocoder: Arc<dyn Geocoder>,
        google_maps_api_key: String,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            db,
            assistant,
            geocoder,
            pages: Pages::new()?,
            google_maps_api_key,
        })
    }
}
