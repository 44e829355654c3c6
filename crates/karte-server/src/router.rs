//! Axum router construction.
//!
//! Assembles all routes into a single [`Router`] with CORS and request
//! tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{chat, handlers, map, pins};

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- map page
/// - `GET /static/app.js` -- browser script
/// - `GET /map/pins` -- all pins
/// - `POST /map/click` -- draft pin from a map click
/// - `POST /chat/send` -- chat turn
/// - `POST /pins/{id}/confirm` -- confirm a draft pin
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/static/app.js", get(handlers::app_js))
        .route("/map/pins", get(handlers::list_pins))
        .route("/map/click", post(map::click))
        .route("/chat/send", post(chat::send_message))
        .route("/pins/{id}/confirm", post(pins::confirm))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
