//! Construction of typed actions from the JSON object the model emits.
//!
//! The model is asked to append an object such as
//! `{"action": "place_pin", "address": "...", "category": "bakery"}`. This
//! module maps that object onto [`ParsedAction`]. It is deliberately
//! forgiving: a missing required field becomes an empty/default value, a
//! field of the wrong JSON type is treated as absent, and unknown extra
//! fields are ignored. Only an unknown or missing `action` tag yields `None`.

use karte_types::{
    ActionKind, Classification, DeletePins, DeleteScope, MapTarget, MoveMap, ParsedAction,
    PinCategory, PlacePin,
};
use serde_json::{Map, Value};

/// Build a typed action from a parsed JSON object.
///
/// Returns `None` when the object has no `action` key or its value is not
/// one of the recognized tags.
pub fn action_from_object(object: &Map<String, Value>) -> Option<ParsedAction> {
    let kind = object
        .get("action")
        .and_then(Value::as_str)
        .and_then(ActionKind::from_tag)?;

    let action = match kind {
        ActionKind::PlacePin => ParsedAction::PlacePin(PlacePin {
            address: string_field(object, "address").unwrap_or_default(),
            category: category_field(object),
            name: string_field(object, "name"),
            confidence: confidence_field(object),
        }),
        ActionKind::RequestClick => ParsedAction::RequestClick,
        ActionKind::Classify => ParsedAction::Classify(Classification {
            category: category_field(object),
            name: string_field(object, "name"),
            confidence: confidence_field(object),
            reasoning: string_field(object, "reasoning"),
        }),
        ActionKind::DeletePins => ParsedAction::DeletePins(DeletePins {
            which: delete_scope_field(object),
            names: names_field(object),
        }),
        ActionKind::ListPins => ParsedAction::ListPins,
        ActionKind::MoveMap => ParsedAction::MoveMap(MoveMap {
            target: map_target_field(object),
            lat: number_field(object, "lat"),
            lng: number_field(object, "lng"),
            zoom: zoom_field(object),
            address: string_field(object, "address"),
        }),
        ActionKind::ClearChat => ParsedAction::ClearChat,
    };

    Some(action)
}

/// A non-empty, trimmed string field.
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// A finite numeric field. Numeric strings (`"0.8"`) are accepted.
fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = object.get(key)?;
    let number = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))?;
    number.is_finite().then_some(number)
}

/// The `category` field, `other` when missing.
fn category_field(object: &Map<String, Value>) -> PinCategory {
    string_field(object, "category")
        .map(|tag| PinCategory::from_tag(&tag))
        .unwrap_or_default()
}

/// The `confidence` field clamped into `0.0..=1.0`.
fn confidence_field(object: &Map<String, Value>) -> Option<f64> {
    number_field(object, "confidence").map(|c| c.clamp(0.0, 1.0))
}

/// The `which` field of `delete_pins`.
///
/// Missing means `all`. An unrecognized value narrows to `named` so a
/// garbled scope can only ever remove the pins the model listed by name.
fn delete_scope_field(object: &Map<String, Value>) -> DeleteScope {
    match string_field(object, "which").map(|s| s.to_ascii_lowercase()) {
        None => DeleteScope::All,
        Some(which) => match which.as_str() {
            "all" => DeleteScope::All,
            "drafts" | "draft" => DeleteScope::Drafts,
            _ => DeleteScope::Named,
        },
    }
}

/// The `names` field of `delete_pins`; non-string entries are skipped.
fn names_field(object: &Map<String, Value>) -> Vec<String> {
    object
        .get("names")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// The `target` field of `move_map`, `fit_all` when missing or unknown.
fn map_target_field(object: &Map<String, Value>) -> MapTarget {
    match string_field(object, "target")
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("center") => MapTarget::Center,
        Some("location") => MapTarget::Location,
        _ => MapTarget::FitAll,
    }
}

/// The `zoom` field of `move_map`, rounded into the web-map range `0..=22`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn zoom_field(object: &Map<String, Value>) -> Option<u8> {
    number_field(object, "zoom").map(|z| z.round().clamp(0.0, 22.0) as u8)
}
