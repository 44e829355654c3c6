//! The action vocabulary the model may append to a reply.
//!
//! A reply carries at most one action. Each variant of [`ParsedAction`]
//! holds only the fields meaningful for that kind, so the dispatcher gets
//! exhaustiveness checking over the whole vocabulary.
//!
//! | Tag | Payload |
//! |-----|---------|
//! | `place_pin` | [`PlacePin`] |
//! | `request_click` | none |
//! | `classify` | [`Classification`] |
//! | `delete_pins` | [`DeletePins`] |
//! | `list_pins` | none |
//! | `move_map` | [`MoveMap`] |
//! | `clear_chat` | none |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::PinCategory;

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// Discriminant of a [`ParsedAction`], parsed from the `action` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Geocode an address and drop a draft pin.
    PlacePin,
    /// Ask the user to click the map.
    RequestClick,
    /// Classify the coordinates of a draft pin.
    Classify,
    /// Remove pins.
    DeletePins,
    /// Describe the current pins.
    ListPins,
    /// Move the browser map.
    MoveMap,
    /// Wipe the chat transcript.
    ClearChat,
}

impl ActionKind {
    /// Every kind, in the order the system prompt documents them.
    pub const ALL: [Self; 7] = [
        Self::PlacePin,
        Self::RequestClick,
        Self::Classify,
        Self::DeletePins,
        Self::ListPins,
        Self::MoveMap,
        Self::ClearChat,
    ];

    /// Look up a kind by its exact wire tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// The wire tag (`place_pin`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlacePin => "place_pin",
            Self::RequestClick => "request_click",
            Self::Classify => "classify",
            Self::DeletePins => "delete_pins",
            Self::ListPins => "list_pins",
            Self::MoveMap => "move_map",
            Self::ClearChat => "clear_chat",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload of `place_pin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlacePin {
    /// Free-text address or place name to geocode. Empty when the model
    /// omitted it.
    pub address: String,
    /// Place category, `other` when omitted.
    pub category: PinCategory,
    /// Place name guess.
    pub name: Option<String>,
    /// Confidence in `0.0..=1.0`.
    pub confidence: Option<f64>,
}

/// Payload of `classify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Classification {
    /// Place category, `other` when omitted.
    pub category: PinCategory,
    /// Place name guess.
    pub name: Option<String>,
    /// Confidence in `0.0..=1.0`.
    pub confidence: Option<f64>,
    /// Short explanation from the model.
    pub reasoning: Option<String>,
}

/// Which pins a `delete_pins` action removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DeleteScope {
    /// Every pin.
    #[default]
    All,
    /// Only unconfirmed pins.
    Drafts,
    /// Pins whose name is listed in [`DeletePins::names`].
    Named,
}

impl DeleteScope {
    /// The wire tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Drafts => "drafts",
            Self::Named => "named",
        }
    }
}

/// Payload of `delete_pins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeletePins {
    /// Which pins to remove.
    pub which: DeleteScope,
    /// Pin names, consulted only for [`DeleteScope::Named`]. May be empty.
    pub names: Vec<String>,
}

/// Where a `move_map` action points the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MapTarget {
    /// Fit every marker in view.
    #[default]
    FitAll,
    /// Center on `lat`/`lng`.
    Center,
    /// Geocode `address` and center on it.
    Location,
}

impl MapTarget {
    /// The wire tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FitAll => "fit_all",
            Self::Center => "center",
            Self::Location => "location",
        }
    }
}

/// Payload of `move_map`.
///
/// Which optional fields matter depends on [`MoveMap::target`]; the zoom
/// default is applied by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoveMap {
    /// Kind of move.
    pub target: MapTarget,
    /// Latitude for [`MapTarget::Center`].
    pub lat: Option<f64>,
    /// Longitude for [`MapTarget::Center`].
    pub lng: Option<f64>,
    /// Zoom level for [`MapTarget::Center`].
    pub zoom: Option<u8>,
    /// Address for [`MapTarget::Location`].
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// ParsedAction / AssistantReply
// ---------------------------------------------------------------------------

/// A structured intent extracted from a model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ParsedAction {
    /// Geocode and place a draft pin.
    PlacePin(PlacePin),
    /// Ask the user to click the map.
    RequestClick,
    /// Classify a draft pin.
    Classify(Classification),
    /// Remove pins.
    DeletePins(DeletePins),
    /// List the current pins.
    ListPins,
    /// Move the map.
    MoveMap(MoveMap),
    /// Clear the chat transcript.
    ClearChat,
}

impl ParsedAction {
    /// The discriminant of this action.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::PlacePin(_) => ActionKind::PlacePin,
            Self::RequestClick => ActionKind::RequestClick,
            Self::Classify(_) => ActionKind::Classify,
            Self::DeletePins(_) => ActionKind::DeletePins,
            Self::ListPins => ActionKind::ListPins,
            Self::MoveMap(_) => ActionKind::MoveMap,
            Self::ClearChat => ActionKind::ClearChat,
        }
    }
}

/// The assistant's answer to one conversation turn.
///
/// `visible_text` is what the user sees; it never contains the action
/// block, its code fence, or a dangling language label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AssistantReply {
    /// Prose shown in the chat transcript.
    pub visible_text: String,
    /// The structured action, if the reply carried one.
    pub action: Option<ParsedAction>,
}

impl AssistantReply {
    /// A reply with no action.
    pub fn text(visible_text: impl Into<String>) -> Self {
        Self {
            visible_text: visible_text.into(),
            action: None,
        }
    }
}
