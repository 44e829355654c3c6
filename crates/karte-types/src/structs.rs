//! Core entity structs: chat turns, pins, and the projections built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{PinCategory, PinStatus, Role};
use crate::ids::{MessageId, PinId};

/// One turn of the conversation as seen by the language model.
///
/// Turns are append-only and never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChatTurn {
    /// Who produced the turn.
    pub role: Role,
    /// The turn text.
    pub content: String,
}

impl ChatTurn {
    /// Create a turn with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Shorthand for a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Shorthand for a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Shorthand for an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Read-only projection of a pin used to describe the map to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MapPinSnapshot {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Optional display name.
    pub name: Option<String>,
    /// Place category.
    pub category: PinCategory,
    /// Draft or confirmed.
    pub status: PinStatus,
}

/// A persisted map pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Pin {
    /// Row id.
    pub id: PinId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Optional display name.
    pub name: Option<String>,
    /// Place category.
    pub category: PinCategory,
    /// Draft or confirmed.
    pub status: PinStatus,
    /// Classifier confidence in `0.0..=1.0`, if the pin was classified.
    pub confidence: Option<f64>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Pin {
    /// Project this pin into the shape the conversation builder consumes.
    pub fn snapshot(&self) -> MapPinSnapshot {
        MapPinSnapshot {
            lat: self.lat,
            lng: self.lng,
            name: self.name.clone(),
            category: self.category,
            status: self.status,
        }
    }

    /// The pin's name, or its title-cased category when unnamed.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map_or_else(|| self.category.title(), ToOwned::to_owned)
    }
}

/// A persisted chat transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChatMessage {
    /// Row id.
    pub id: MessageId,
    /// Who produced the message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// The message as a conversation turn.
    pub fn turn(&self) -> ChatTurn {
        ChatTurn::new(self.role, self.content.clone())
    }
}

/// A successful geocoding lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeocodeResult {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Canonical address returned by the provider.
    pub formatted_address: String,
}

/// Where the browser map should move after a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "target", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MapMove {
    /// Zoom out until every marker is visible.
    FitAll,
    /// Center on a coordinate.
    Center {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
        /// Map zoom level.
        zoom: u8,
    },
}

/// What every chat-affecting route returns to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChatResponse {
    /// The full transcript after the request.
    pub messages: Vec<ChatMessage>,
    /// Whether the browser should wait for a map click.
    pub request_click: bool,
    /// A draft pin created or updated by this request.
    pub draft_pin: Option<Pin>,
    /// A map movement requested by the assistant.
    pub move_map: Option<MapMove>,
}

impl ChatResponse {
    /// A response carrying only the transcript.
    pub const fn transcript(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            request_click: false,
            draft_pin: None,
            move_map: None,
        }
    }
}
