//! Enumeration types shared by the assistant, the store, and the HTTP layer.
//!
//! Every enum here has a lossy string constructor because the values arrive
//! from untrusted places: model output, form posts, and database text
//! columns. Unknown strings collapse to a safe default instead of failing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Chat roles
// ---------------------------------------------------------------------------

/// The author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// Instructions or context injected by the application.
    System,
    /// A human typing into the chat box.
    User,
    /// The language model.
    Assistant,
}

impl Role {
    /// Parse a stored role. Anything unrecognized is treated as a user turn
    /// so that it is never dropped from the conversation.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "system" => Self::System,
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }

    /// The wire/database spelling of this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pin lifecycle
// ---------------------------------------------------------------------------

/// Whether a pin has been accepted by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PinStatus {
    /// Created from a click or a geocoded address, awaiting confirmation.
    #[default]
    Draft,
    /// Confirmed by the user.
    Confirmed,
}

impl PinStatus {
    /// Parse a stored status, defaulting to [`PinStatus::Draft`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Self::Confirmed,
            _ => Self::Draft,
        }
    }

    /// The wire/database spelling of this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
        }
    }
}

impl core::fmt::Display for PinStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pin categories
// ---------------------------------------------------------------------------

/// The kind of place a pin marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PinCategory {
    /// Schools and other teaching institutions.
    School,
    /// Clinics, health posts, hospitals.
    HealthClinic,
    /// Bakeries.
    Bakery,
    /// Supermarkets and grocery stores.
    Supermarket,
    /// Pharmacies and drugstores.
    Pharmacy,
    /// Restaurants.
    Restaurant,
    /// Cafes and coffee shops.
    Cafe,
    /// Banks and ATMs.
    Bank,
    /// Parks and squares.
    Park,
    /// Anything else.
    #[default]
    Other,
}

impl PinCategory {
    /// Every category, in the order presented to the model.
    pub const ALL: [Self; 10] = [
        Self::School,
        Self::HealthClinic,
        Self::Bakery,
        Self::Supermarket,
        Self::Pharmacy,
        Self::Restaurant,
        Self::Cafe,
        Self::Bank,
        Self::Park,
        Self::Other,
    ];

    /// Parse a category tag. Unknown tags become [`PinCategory::Other`].
    ///
    /// Accepts spaces or hyphens in place of underscores (`"health clinic"`).
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .unwrap_or_default()
    }

    /// The snake-case tag (`health_clinic`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::HealthClinic => "health_clinic",
            Self::Bakery => "bakery",
            Self::Supermarket => "supermarket",
            Self::Pharmacy => "pharmacy",
            Self::Restaurant => "restaurant",
            Self::Cafe => "cafe",
            Self::Bank => "bank",
            Self::Park => "park",
            Self::Other => "other",
        }
    }

    /// Human-readable label with underscores replaced by spaces
    /// (`health clinic`).
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Title-cased label (`Health Clinic`), used when a pin has no name.
    pub fn title(self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect::<String>()
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl core::fmt::Display for PinCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_is_user() {
        assert_eq!(Role::from_tag("tool"), Role::User);
        assert_eq!(Role::from_tag("Assistant"), Role::Assistant);
        assert_eq!(Role::from_tag("system"), Role::System);
    }

    #[test]
    fn category_tags_round_trip() {
        for category in PinCategory::ALL {
            assert_eq!(PinCategory::from_tag(category.as_str()), category);
        }
    }

    #[test]
    fn category_lenient_spelling() {
        assert_eq!(PinCategory::from_tag("Health Clinic"), PinCategory::HealthClinic);
        assert_eq!(PinCategory::from_tag("health-clinic"), PinCategory::HealthClinic);
        assert_eq!(PinCategory::from_tag("spaceport"), PinCategory::Other);
        assert_eq!(PinCategory::from_tag(""), PinCategory::Other);
    }

    #[test]
    fn category_labels() {
        assert_eq!(PinCategory::HealthClinic.label(), "health clinic");
        assert_eq!(PinCategory::HealthClinic.title(), "Health Clinic");
        assert_eq!(PinCategory::Cafe.title(), "Cafe");
    }

    #[test]
    fn status_defaults_to_draft() {
        assert_eq!(PinStatus::from_tag("confirmed"), PinStatus::Confirmed);
        assert_eq!(PinStatus::from_tag("pending"), PinStatus::Draft);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&PinCategory::HealthClinic).unwrap_or_default();
        assert_eq!(json, "\"health_clinic\"");
    }
}
