//! `POST /pins/{id}/confirm`: the user accepts a draft pin.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, Path, State};
use karte_db::{ChatStore, PinStore};
use karte_types::{ChatResponse, PinCategory, PinId, Role};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Form body of `POST /pins/{id}/confirm`.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    /// Chosen name; empty clears it.
    #[serde(default)]
    pub name: String,
    /// Chosen category tag; empty means `other`.
    #[serde(default)]
    pub category: String,
}

/// Confirm a pin with the user's name and category.
///
/// An unknown id leaves everything untouched and returns the transcript.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<ConfirmForm>,
) -> Result<Json<ChatResponse>, ApiError> {
    let chat = ChatStore::new(state.db.pool());
    let category = PinCategory::from_tag(&form.category);

    match PinStore::new(state.db.pool())
        .confirm(PinId(id), Some(&form.name), category)
        .await?
    {
        Some(pin) => {
            info!(pin_id = %pin.id, category = category.as_str(), "pin confirmed");
            chat.append(
                Role::Assistant,
                &format!(
                    "Pin confirmed: {} ({}) at ({:.5}, {:.5}).",
                    pin.display_name(),
                    pin.category.label(),
                    pin.lat,
                    pin.lng
                ),
            )
            .await?;
        }
        None => warn!(pin_id = id, "confirm requested for unknown pin"),
    }

    Ok(Json(ChatResponse::transcript(chat.list().await?)))
}
