//! `POST /map/click`: a click on the map becomes a draft pin.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, State};
use karte_db::{ChatStore, NewPin, PinStore};
use karte_types::{ChatResponse, ChatTurn, Role};
use serde::Deserialize;
use tracing::info;

use crate::chat::{conversation, finish};
use crate::dispatch::Dispatcher;
use crate::error::ApiError;
use crate::state::AppState;

/// Form body of `POST /map/click`.
#[derive(Debug, Deserialize)]
pub struct ClickForm {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Create a draft pin at the clicked coordinates and ask the assistant to
/// classify the place.
///
/// The coordinates reach the model as a system turn appended to the
/// history for this call only; the transcript keeps just the draft note and
/// the reply.
pub async fn click(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ClickForm>,
) -> Result<Json<ChatResponse>, ApiError> {
    let ClickForm { lat, lng } = form;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::BadRequest(format!(
            "coordinates out of range: ({lat}, {lng})"
        )));
    }

    let pins = PinStore::new(state.db.pool());
    let chat = ChatStore::new(state.db.pool());

    let pin = pins.insert_draft(&NewPin::at(lat, lng)).await?;
    info!(pin_id = %pin.id, lat, lng, "draft pin created from map click");
    chat.append(
        Role::Assistant,
        &format!("Draft pin created at ({lat:.5}, {lng:.5}). Classifying…"),
    )
    .await?;

    let (mut history, snapshots) = conversation(&state).await?;
    history.push(ChatTurn::system(format!(
        "The user clicked the map at ({lat:.5}, {lng:.5}). Identify what is most likely \
         at these coordinates and reply with a classify action."
    )));
    let reply = state.assistant.respond(&history, Some(snapshots.as_slice())).await?;

    let mut outcome = Dispatcher::new(&state.db, state.geocoder.as_ref())
        .with_classify_target(pin.id)
        .dispatch(reply)
        .await?;
    if outcome.draft_pin.is_none() {
        outcome.draft_pin = pins.get(pin.id).await?;
    }

    Ok(Json(finish(&chat, outcome).await?))
}
