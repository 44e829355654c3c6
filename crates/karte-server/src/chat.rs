//! `POST /chat/send`: one user message in, one assistant reply out.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, State};
use karte_db::{ChatStore, PinStore};
use karte_types::{ChatMessage, ChatResponse, ChatTurn, MapPinSnapshot, Pin, Role};
use serde::Deserialize;

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::ApiError;
use crate::state::AppState;

/// Form body of `POST /chat/send`.
#[derive(Debug, Deserialize)]
pub struct SendForm {
    /// The user's message.
    #[serde(default)]
    pub message: String,
}

/// Store the user's message, ask the assistant, and act on its reply.
///
/// A blank message returns the transcript without calling the model.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SendForm>,
) -> Result<Json<ChatResponse>, ApiError> {
    let chat = ChatStore::new(state.db.pool());
    let message = form.message.trim();
    if message.is_empty() {
        return Ok(Json(ChatResponse::transcript(chat.list().await?)));
    }
    chat.append(Role::User, message).await?;

    let (history, pins) = conversation(&state).await?;
    let reply = state.assistant.respond(&history, Some(pins.as_slice())).await?;
    let outcome = Dispatcher::new(&state.db, state.geocoder.as_ref())
        .dispatch(reply)
        .await?;

    Ok(Json(finish(&chat, outcome).await?))
}

/// The stored transcript as model turns, plus the current pin snapshots.
pub(crate) async fn conversation(
    state: &AppState,
) -> Result<(Vec<ChatTurn>, Vec<MapPinSnapshot>), ApiError> {
    let history = ChatStore::new(state.db.pool())
        .list()
        .await?
        .iter()
        .map(ChatMessage::turn)
        .collect();
    let pins = PinStore::new(state.db.pool())
        .list()
        .await?
        .iter()
        .map(Pin::snapshot)
        .collect();
    Ok((history, pins))
}

/// Persist the dispatched reply and build the route response.
pub(crate) async fn finish(
    chat: &ChatStore<'_>,
    outcome: DispatchOutcome,
) -> Result<ChatResponse, ApiError> {
    if outcome.clear_chat {
        chat.clear().await?;
    }
    if !outcome.text.trim().is_empty() {
        chat.append(Role::Assistant, &outcome.text).await?;
    }
    Ok(ChatResponse {
        messages: chat.list().await?,
        request_click: outcome.request_click,
        draft_pin: outcome.draft_pin,
        move_map: outcome.move_map,
    })
}
