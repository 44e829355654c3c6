//! Action dispatch: turns an [`AssistantReply`] into side effects.
//!
//! The parser decides *what* the model asked for; this module decides what
//! that means for the map. Geocoding misses and unknown targets become
//! notes appended to the reply text, never errors. Only storage faults
//! propagate.

use karte_db::{DbError, NewPin, PinStore, SqlitePool};
use karte_types::{
    AssistantReply, Classification, DeletePins, DeleteScope, MapMove, MapTarget, MoveMap,
    ParsedAction, Pin, PinId, PlacePin,
};
use tracing::{debug, info};

use crate::geocode::Geocoder;

/// Two pins closer than this (in degrees, on both axes) are the same place.
/// Roughly 11 m at the equator.
pub const DUPLICATE_TOLERANCE: f64 = 0.0001;

/// Zoom used for `center` and `location` moves that do not name one.
pub const DEFAULT_CENTER_ZOOM: u8 = 15;

/// Appended when a `place_pin` address cannot be geocoded.
pub const ADDRESS_NOT_FOUND: &str =
    "\n\nI couldn't find that address. Could you be more specific, or click on the map instead?";

/// Appended when a `move_map` location cannot be geocoded.
pub const LOCATION_NOT_FOUND: &str = "\n\nI couldn't find that location on the map.";

/// Everything a route needs to build its response after dispatch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatchOutcome {
    /// Reply text with any dispatcher notes appended.
    pub text: String,
    /// Whether the browser should wait for a map click.
    pub request_click: bool,
    /// A pin created or updated by the action.
    pub draft_pin: Option<Pin>,
    /// Where the map should move.
    pub move_map: Option<MapMove>,
    /// Whether the transcript must be cleared before storing `text`.
    pub clear_chat: bool,
}

impl DispatchOutcome {
    /// Append a dispatcher note. Its leading blank line only separates it
    /// from prose, so it is dropped when the reply has none.
    fn note(&mut self, note: &str) {
        if self.text.is_empty() {
            self.text.push_str(note.trim_start_matches('\n'));
        } else {
            self.text.push_str(note);
        }
    }
}

/// Executes parsed actions against the pin store and geocoder.
pub struct Dispatcher<'a> {
    pins: PinStore<'a>,
    geocoder: &'a dyn Geocoder,
    classify_target: Option<PinId>,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over a connection pool and geocoder.
    pub const fn new(db: &'a SqlitePool, geocoder: &'a dyn Geocoder) -> Self {
        Self {
            pins: PinStore::new(db.pool()),
            geocoder,
            classify_target: None,
        }
    }

    /// Apply `classify` to this pin instead of the latest draft.
    #[must_use]
    pub const fn with_classify_target(mut self, pin: PinId) -> Self {
        self.classify_target = Some(pin);
        self
    }

    /// Perform the reply's action, if any.
    pub async fn dispatch(&self, reply: AssistantReply) -> Result<DispatchOutcome, DbError> {
        let mut out = DispatchOutcome {
            text: reply.visible_text,
            ..DispatchOutcome::default()
        };
        let Some(action) = reply.action else {
            return Ok(out);
        };
        info!(action = action.kind().as_str(), "dispatching action");

        match action {
            ParsedAction::PlacePin(request) => self.place_pin(request, &mut out).await?,
            ParsedAction::RequestClick => out.request_click = true,
            ParsedAction::Classify(classification) => {
                self.classify(&classification, &mut out).await?;
            }
            ParsedAction::DeletePins(request) => self.delete_pins(&request, &mut out).await?,
            ParsedAction::ListPins => self.list_pins(&mut out).await?,
            ParsedAction::MoveMap(request) => self.move_map(&request, &mut out).await,
            ParsedAction::ClearChat => out.clear_chat = true,
        }
        Ok(out)
    }

    async fn place_pin(&self, request: PlacePin, out: &mut DispatchOutcome) -> Result<(), DbError> {
        if request.address.is_empty() {
            out.request_click = true;
            return Ok(());
        }
        let Some(geo) = self.geocoder.geocode(&request.address).await else {
            out.note(ADDRESS_NOT_FOUND);
            out.request_click = true;
            return Ok(());
        };

        if self
            .pins
            .find_near(geo.lat, geo.lng, DUPLICATE_TOLERANCE)
            .await?
            .is_some()
        {
            out.note(&format!(
                "\n\nA pin already exists at that location ({}). No duplicate created.",
                geo.formatted_address
            ));
            return Ok(());
        }

        let pin = self
            .pins
            .insert_draft(&NewPin {
                lat: geo.lat,
                lng: geo.lng,
                name: request.name,
                category: request.category,
                confidence: request.confidence,
            })
            .await?;
        out.note(&format!("\n\n📍 Found at: {}", geo.formatted_address));
        out.draft_pin = Some(pin);
        Ok(())
    }

    async fn classify(
        &self,
        classification: &Classification,
        out: &mut DispatchOutcome,
    ) -> Result<(), DbError> {
        let target = match self.classify_target {
            Some(id) => Some(id),
            None => self.pins.latest_draft().await?.map(|p| p.id),
        };
        let Some(target) = target else {
            debug!("classify action with no draft pin to apply it to");
            return Ok(());
        };
        out.draft_pin = Some(self.pins.classify(target, classification).await?);
        Ok(())
    }

    async fn delete_pins(
        &self,
        request: &DeletePins,
        out: &mut DispatchOutcome,
    ) -> Result<(), DbError> {
        let removed = match request.which {
            DeleteScope::All => self.pins.delete_all().await?,
            DeleteScope::Drafts => self.pins.delete_drafts().await?,
            DeleteScope::Named => self.pins.delete_named(&request.names).await?,
        };
        info!(scope = request.which.as_str(), removed, "deleted pins");
        let noun = if removed == 1 { "pin" } else { "pins" };
        out.note(&format!("\n\n(Removed {removed} {noun}.)"));
        Ok(())
    }

    async fn list_pins(&self, out: &mut DispatchOutcome) -> Result<(), DbError> {
        let pins = self.pins.list().await?;
        out.note(&format_pin_listing(&pins));
        Ok(())
    }

    async fn move_map(&self, request: &MoveMap, out: &mut DispatchOutcome) {
        let zoom = request.zoom.unwrap_or(DEFAULT_CENTER_ZOOM);
        let target = match (request.target, request.lat, request.lng) {
            (MapTarget::FitAll, _, _) => Some(MapMove::FitAll),
            (MapTarget::Center, Some(lat), Some(lng)) => Some(MapMove::Center { lat, lng, zoom }),
            (MapTarget::Center, _, _) => Some(MapMove::FitAll),
            (MapTarget::Location, _, _) => {
                let geo = match request.address.as_deref() {
                    Some(address) => self.geocoder.geocode(address).await,
                    None => None,
                };
                if let Some(geo) = geo {
                    Some(MapMove::Center {
                        lat: geo.lat,
                        lng: geo.lng,
                        zoom,
                    })
                } else {
                    out.note(LOCATION_NOT_FOUND);
                    None
                }
            }
        };
        out.move_map = target;
    }
}

/// The numbered pin listing appended for `list_pins`.
pub fn format_pin_listing(pins: &[Pin]) -> String {
    if pins.is_empty() {
        return "\n\nThere are no pins on the map yet.".to_owned();
    }
    let mut listing = String::from("\n\nCurrent pins:");
    for (index, pin) in pins.iter().enumerate() {
        listing.push_str(&format!(
            "\n{}. [{}] {} ({}) at ({:.5}, {:.5})",
            index.saturating_add(1),
            pin.status.as_str(),
            pin.name.as_deref().unwrap_or("unnamed"),
            pin.category.label(),
            pin.lat,
            pin.lng,
        ));
    }
    listing
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use karte_types::{PinCategory, PinStatus};

    use super::*;

    fn pin(id: i64, name: Option<&str>, category: PinCategory, status: PinStatus) -> Pin {
        Pin {
            id: PinId(id),
            lat: -23.550_52,
            lng: -46.633_308,
            name: name.map(ToOwned::to_owned),
            category,
            status,
            confidence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn note_separator_is_dropped_without_prose() {
        let mut out = DispatchOutcome::default();
        out.note(LOCATION_NOT_FOUND);
        assert_eq!(out.text, "I couldn't find that location on the map.");

        let mut out = DispatchOutcome {
            text: "Looking.".to_owned(),
            ..DispatchOutcome::default()
        };
        out.note(LOCATION_NOT_FOUND);
        assert_eq!(out.text, "Looking.\n\nI couldn't find that location on the map.");
    }

    #[test]
    fn empty_listing() {
        assert_eq!(format_pin_listing(&[]), "\n\nThere are no pins on the map yet.");
    }

    #[test]
    fn numbered_listing() {
        let listing = format_pin_listing(&[
            pin(1, Some("Corner Bakery"), PinCategory::Bakery, PinStatus::Confirmed),
            pin(2, None, PinCategory::HealthClinic, PinStatus::Draft),
        ]);
        assert_eq!(
            listing,
            "\n\nCurrent pins:\
             \n1. [confirmed] Corner Bakery (bakery) at (-23.55052, -46.63331)\
             \n2. [draft] unnamed (health clinic) at (-23.55052, -46.63331)"
        );
    }
}
