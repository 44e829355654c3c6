//! Read-only endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Map page with transcript and pin list |
//! | `GET` | `/static/app.js` | Browser script |
//! | `GET` | `/map/pins` | All pins as JSON |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use karte_db::{ChatStore, PinStore};
use karte_types::Pin;

use crate::error::ApiError;
use crate::pages::APP_JS;
use crate::state::AppState;

/// Serve the map page.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let messages = ChatStore::new(state.db.pool()).list().await?;
    let pins = PinStore::new(state.db.pool()).list().await?;
    let page = state
        .pages
        .index(&messages, &pins, &state.google_maps_api_key)?;
    Ok(Html(page))
}

/// Serve the browser script.
#[allow(clippy::unused_async)]
pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// List every pin.
pub async fn list_pins(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Pin>>, ApiError> {
    Ok(Json(PinStore::new(state.db.pool()).list().await?))
}
