//! Shared type definitions for the Karte map assistant.
//!
//! This crate is the single source of truth for the data that flows
//! between the assistant core, the store, and the HTTP layer. Types defined
//! here flow downstream to `TypeScript` via `ts-rs` for the browser map.
//!
//! # Modules
//!
//! - [`ids`] -- Typed row identifiers
//! - [`enums`] -- Roles, pin status, pin categories
//! - [`structs`] -- Chat turns, pins, snapshots, geocoding results, route envelope
//! - [`actions`] -- The model action vocabulary and the reply envelope

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{
    ActionKind, AssistantReply, Classification, DeletePins, DeleteScope, MapTarget, MoveMap,
    ParsedAction, PlacePin,
};
pub use enums::{PinCategory, PinStatus, Role};
pub use ids::{MessageId, PinId};
pub use structs::{ChatMessage, ChatResponse, ChatTurn, GeocodeResult, MapMove, MapPinSnapshot, Pin};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the browser client.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PinId::export_all();
        let _ = crate::ids::MessageId::export_all();

        // Enums
        let _ = crate::enums::Role::export_all();
        let _ = crate::enums::PinStatus::export_all();
        let _ = crate::enums::PinCategory::export_all();

        // Structs
        let _ = crate::structs::ChatTurn::export_all();
        let _ = crate::structs::MapPinSnapshot::export_all();
        let _ = crate::structs::Pin::export_all();
        let _ = crate::structs::ChatMessage::export_all();
        let _ = crate::structs::GeocodeResult::export_all();
        let _ = crate::structs::MapMove::export_all();
        let _ = crate::structs::ChatResponse::export_all();

        // Actions
        let _ = crate::actions::ActionKind::export_all();
        let _ = crate::actions::ParsedAction::export_all();
        let _ = crate::actions::AssistantReply::export_all();
    }
}
