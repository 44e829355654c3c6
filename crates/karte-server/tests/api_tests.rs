//! Integration tests for the Karte HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Each test gets a private in-memory database, a
//! model client that replays scripted replies, and a geocoder backed by a
//! fixed address table.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::FutureExt;
use futures::future::BoxFuture;
use karte_assistant::{Assistant, AssistantError, FALLBACK_REPLY, ModelClient, PromptEngine};
use karte_db::{ChatStore, NewPin, PinStore, SqlitePool};
use karte_server::router::build_router;
use karte_server::{AppState, Geocoder};
use karte_types::{ChatTurn, GeocodeResult, PinCategory, Role};
use serde_json::Value;
use tower::ServiceExt;

// =========================================================================
// Test doubles
// =========================================================================

/// Replays queued replies in order; an empty queue is a backend failure.
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedModel {
    fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            seen: Mutex::default(),
        }
    }
}

impl ModelClient for ScriptedModel {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatTurn],
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        async move {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AssistantError::LlmBackend("no scripted reply".to_owned()))
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Resolves only the addresses it was given.
#[derive(Default)]
struct TableGeocoder {
    table: HashMap<String, GeocodeResult>,
}

impl TableGeocoder {
    fn with(mut self, address: &str, lat: f64, lng: f64, formatted: &str) -> Self {
        self.table.insert(
            address.to_owned(),
            GeocodeResult {
                lat,
                lng,
                formatted_address: formatted.to_owned(),
            },
        );
        self
    }
}

impl Geocoder for TableGeocoder {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Option<GeocodeResult>> {
        let hit = self.table.get(address).cloned();
        async move { hit }.boxed()
    }
}

// =========================================================================
// Helpers
// =========================================================================

async fn make_state(model: Arc<ScriptedModel>, geocoder: TableGeocoder) -> Arc<AppState> {
    let db = SqlitePool::in_memory().await.unwrap();
    let assistant = Assistant::new(model, PromptEngine::new().unwrap(), Duration::from_secs(5));
    Arc::new(AppState::new(db, assistant, Arc::new(geocoder), String::new()).unwrap())
}

fn default_geocoder() -> TableGeocoder {
    TableGeocoder::default().with(
        "Rua Augusta 100",
        -23.553_1,
        -46.652_4,
        "R. Augusta, 100 - Consolação, São Paulo",
    )
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(Arc::clone(state)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn chat(state: &Arc<AppState>, message: &str) -> Value {
    let (status, json) = send(state, form("/chat/send", &format!("message={message}"))).await;
    assert_eq!(status, StatusCode::OK);
    json
}

fn last_text(json: &Value) -> String {
    json["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_owned()
}

// =========================================================================
// Read-only routes
// =========================================================================

#[tokio::test]
async fn index_returns_html() {
    let state = make_state(Arc::default(), TableGeocoder::default()).await;
    ChatStore::new(state.db.pool())
        .append(Role::User, "<b>hello</b>")
        .await
        .unwrap();

    let response = build_router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(content_type.contains("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("&lt;b&gt;hello"));
    assert!(!html.contains("<b>hello"));
    assert!(html.contains("Health Clinic"));
}

#[tokio::test]
async fn map_pins_lists_all_pins() {
    let state = make_state(Arc::default(), TableGeocoder::default()).await;
    let (_, empty) = send(&state, Request::get("/map/pins").body(Body::empty()).unwrap()).await;
    assert_eq!(empty, serde_json::json!([]));

    PinStore::new(state.db.pool())
        .insert_draft(&NewPin::at(1.5, 2.5))
        .await
        .unwrap();
    let (status, json) = send(&state, Request::get("/map/pins").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["lat"], 1.5);
    assert_eq!(json[0]["status"], "draft");
    assert_eq!(json[0]["category"], "other");
    assert!(json[0]["confidence"].is_null());
}

// =========================================================================
// Chat
// =========================================================================

#[tokio::test]
async fn place_pin_creates_draft() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "On it!\n```json\n{\"action\": \"place_pin\", \"address\": \"Rua Augusta 100\", \"category\": \"cafe\", \"name\": \"Café Augusta\", \"confidence\": 0.9}\n```",
    ]));
    let state = make_state(Arc::clone(&model), default_geocoder()).await;

    let json = chat(&state, "add+the+cafe+on+Rua+Augusta+100").await;
    assert_eq!(json["messages"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(
        last_text(&json),
        "On it!\n\n📍 Found at: R. Augusta, 100 - Consolação, São Paulo"
    );
    assert_eq!(json["draft_pin"]["category"], "cafe");
    assert_eq!(json["draft_pin"]["name"], "Café Augusta");
    assert_eq!(json["draft_pin"]["status"], "draft");
    assert_eq!(json["request_click"], false);

    // The model saw the system prompt, the map state, and the user turn.
    let seen = model.seen.lock().unwrap();
    let roles: Vec<Role> = seen[0].iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![Role::System, Role::System, Role::User]);
    assert!(seen[0][1].content.contains("no pins"));
}

#[tokio::test]
async fn place_pin_skips_duplicates() {
    let reply = "Adding. {\"action\": \"place_pin\", \"address\": \"Rua Augusta 100\"}";
    let model = Arc::new(ScriptedModel::with_replies(&[reply, reply]));
    let state = make_state(model, default_geocoder()).await;

    chat(&state, "add+it").await;
    let json = chat(&state, "add+it+again").await;
    assert_eq!(
        last_text(&json),
        "Adding.\n\nA pin already exists at that location (R. Augusta, 100 - Consolação, São Paulo). No duplicate created."
    );
    assert!(json["draft_pin"].is_null());
    assert_eq!(PinStore::new(state.db.pool()).list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn place_pin_geocode_miss_requests_click() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Let me look. {\"action\": \"place_pin\", \"address\": \"Atlantis\"}",
    ]));
    let state = make_state(model, default_geocoder()).await;

    let json = chat(&state, "add+Atlantis").await;
    assert_eq!(json["request_click"], true);
    assert!(last_text(&json).ends_with(
        "I couldn't find that address. Could you be more specific, or click on the map instead?"
    ));
    assert!(PinStore::new(state.db.pool()).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn request_click_sets_flag() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Sure, click the map! {\"action\": \"request_click\"}",
    ]));
    let state = make_state(model, TableGeocoder::default()).await;

    let json = chat(&state, "let+me+click").await;
    assert_eq!(json["request_click"], true);
    assert_eq!(last_text(&json), "Sure, click the map!");
}

#[tokio::test]
async fn list_and_delete_pins() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Here you go: {\"action\": \"list_pins\"}",
        "Removing drafts. {\"action\": \"delete_pins\", \"which\": \"drafts\"}",
        "{\"action\": \"list_pins\"}",
    ]));
    let state = make_state(model, TableGeocoder::default()).await;
    let pins = PinStore::new(state.db.pool());
    let kept = pins.insert_draft(&NewPin::at(1.0, 2.0)).await.unwrap();
    pins.confirm(kept.id, Some("Park Bench"), PinCategory::Park)
        .await
        .unwrap();
    pins.insert_draft(&NewPin::at(3.0, 4.0)).await.unwrap();

    let json = chat(&state, "list").await;
    assert_eq!(
        last_text(&json),
        "Here you go:\n\nCurrent pins:\
         \n1. [confirmed] Park Bench (park) at (1.00000, 2.00000)\
         \n2. [draft] unnamed (other) at (3.00000, 4.00000)"
    );

    let json = chat(&state, "delete+drafts").await;
    assert_eq!(last_text(&json), "Removing drafts.\n\n(Removed 1 pin.)");

    let json = chat(&state, "list+again").await;
    assert_eq!(
        last_text(&json),
        "Current pins:\n1. [confirmed] Park Bench (park) at (1.00000, 2.00000)"
    );
}

#[tokio::test]
async fn delete_named_pins_through_chat() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Removing those. {\"action\": \"delete_pins\", \"which\": \"named\", \"names\": [\"Park Bench\", \"Nowhere\"]}",
        "{\"action\": \"delete_pins\", \"which\": \"named\", \"names\": []}",
    ]));
    let state = make_state(model, TableGeocoder::default()).await;
    let pins = PinStore::new(state.db.pool());
    let bench = pins.insert_draft(&NewPin::at(1.0, 2.0)).await.unwrap();
    pins.confirm(bench.id, Some("Park Bench"), PinCategory::Park)
        .await
        .unwrap();
    let other = pins.insert_draft(&NewPin::at(3.0, 4.0)).await.unwrap();

    let json = chat(&state, "delete+the+park+bench").await;
    assert_eq!(last_text(&json), "Removing those.\n\n(Removed 1 pin.)");
    let remaining = pins.list().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, other.id);

    let json = chat(&state, "delete+nothing").await;
    assert_eq!(last_text(&json), "(Removed 0 pins.)");
    assert_eq!(pins.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn classify_in_chat_updates_latest_draft() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "That one is a pharmacy. {\"action\": \"classify\", \"category\": \"pharmacy\", \"name\": \"Drogaria\", \"confidence\": 0.6}",
    ]));
    let state = make_state(model, TableGeocoder::default()).await;
    let pins = PinStore::new(state.db.pool());
    let older = pins.insert_draft(&NewPin::at(1.0, 2.0)).await.unwrap();
    let latest = pins.insert_draft(&NewPin::at(3.0, 4.0)).await.unwrap();

    let json = chat(&state, "what+is+that").await;
    assert_eq!(last_text(&json), "That one is a pharmacy.");
    assert_eq!(json["draft_pin"]["id"], latest.id.0);
    assert_eq!(json["draft_pin"]["category"], "pharmacy");
    assert_eq!(json["draft_pin"]["name"], "Drogaria");

    let untouched = pins.get(older.id).await.unwrap().unwrap();
    assert_eq!(untouched.category, PinCategory::Other);
    assert!(untouched.name.is_none());
}

#[tokio::test]
async fn place_pin_without_address_requests_click() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Where exactly? {\"action\": \"place_pin\", \"address\": \"\", \"category\": \"cafe\"}",
    ]));
    let state = make_state(model, default_geocoder()).await;

    let json = chat(&state, "add+a+cafe").await;
    assert_eq!(json["request_click"], true);
    assert_eq!(last_text(&json), "Where exactly?");
    assert!(json["draft_pin"].is_null());
    assert!(PinStore::new(state.db.pool()).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn move_map_center_applies_default_zoom() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Centering. {\"action\": \"move_map\", \"target\": \"center\", \"lat\": 10.5, \"lng\": -20.25}",
        "Moving! {\"action\": \"move_map\"}",
        "Going there. {\"action\": \"move_map\", \"target\": \"location\", \"address\": \"Rua Augusta 100\"}",
    ]));
    let state = make_state(model, default_geocoder()).await;

    let json = chat(&state, "center").await;
    assert_eq!(
        json["move_map"],
        serde_json::json!({"target": "center", "lat": 10.5, "lng": -20.25, "zoom": 15})
    );

    let json = chat(&state, "show+all").await;
    assert_eq!(json["move_map"], serde_json::json!({"target": "fit_all"}));
    assert_eq!(last_text(&json), "Moving!");

    let json = chat(&state, "go+to+Augusta").await;
    assert_eq!(json["move_map"]["target"], "center");
    assert_eq!(json["move_map"]["lat"], -23.553_1);
}

#[tokio::test]
async fn move_map_unknown_location_adds_note() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Heading there. {\"action\": \"move_map\", \"target\": \"location\", \"address\": \"Atlantis\"}",
    ]));
    let state = make_state(model, default_geocoder()).await;

    let json = chat(&state, "go+to+Atlantis").await;
    assert!(json["move_map"].is_null());
    assert_eq!(
        last_text(&json),
        format!("Heading there.{}", karte_server::dispatch::LOCATION_NOT_FOUND)
    );
}

#[tokio::test]
async fn clear_chat_keeps_only_reply() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Hello!",
        "Chat cleared. {\"action\": \"clear_chat\"}",
    ]));
    let state = make_state(model, TableGeocoder::default()).await;

    chat(&state, "hi").await;
    let json = chat(&state, "clear+the+chat").await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "assistant");
    assert_eq!(messages[0]["content"], "Chat cleared.");
}

#[tokio::test]
async fn model_failure_yields_apology() {
    let state = make_state(Arc::default(), TableGeocoder::default()).await;
    let json = chat(&state, "hello").await;
    assert_eq!(last_text(&json), FALLBACK_REPLY);
    assert!(json["move_map"].is_null());
}

#[tokio::test]
async fn malformed_action_is_shown_verbatim() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Some text with json {\"foo\": \"bar\"}",
    ]));
    let state = make_state(model, TableGeocoder::default()).await;
    let json = chat(&state, "hello").await;
    assert_eq!(last_text(&json), "Some text with json {\"foo\": \"bar\"}");
}

// =========================================================================
// Map click
// =========================================================================

#[tokio::test]
async fn map_click_creates_and_classifies_draft() {
    let model = Arc::new(ScriptedModel::with_replies(&[
        "Looks like a bakery. {\"action\": \"classify\", \"category\": \"bakery\", \"name\": \"Padaria\", \"confidence\": 0.7, \"reasoning\": \"storefront\"}",
    ]));
    let state = make_state(Arc::clone(&model), TableGeocoder::default()).await;

    let (status, json) = send(&state, form("/map/click", "lat=-23.5505&lng=-46.6333")).await;
    assert_eq!(status, StatusCode::OK);

    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[0]["content"],
        "Draft pin created at (-23.55050, -46.63330). Classifying…"
    );
    assert_eq!(messages[1]["content"], "Looks like a bakery.");
    assert_eq!(json["draft_pin"]["category"], "bakery");
    assert_eq!(json["draft_pin"]["name"], "Padaria");
    assert_eq!(json["draft_pin"]["confidence"], 0.7);

    // The click coordinates were sent as a transient system turn.
    let seen = model.seen.lock().unwrap();
    let last = seen[0].last().unwrap();
    assert_eq!(last.role, Role::System);
    assert!(last.content.contains("(-23.55050, -46.63330)"));
    drop(seen);
    let stored = ChatStore::new(state.db.pool()).list().await.unwrap();
    assert!(stored.iter().all(|m| m.role == Role::Assistant));
}

#[tokio::test]
async fn map_click_rejects_out_of_range() {
    let state = make_state(Arc::default(), TableGeocoder::default()).await;
    let (status, json) = send(&state, form("/map/click", "lat=91&lng=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

// =========================================================================
// Confirm
// =========================================================================

#[tokio::test]
async fn confirm_pin_stores_note() {
    let state = make_state(Arc::default(), TableGeocoder::default()).await;
    let pin = PinStore::new(state.db.pool())
        .insert_draft(&NewPin::at(-23.550_52, -46.633_308))
        .await
        .unwrap();

    let uri = format!("/pins/{}/confirm", pin.id);
    let (status, json) = send(&state, form(&uri, "name=&category=health_clinic")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        last_text(&json),
        "Pin confirmed: Health Clinic (health clinic) at (-23.55052, -46.63331)."
    );

    let (_, pins) = send(&state, Request::get("/map/pins").body(Body::empty()).unwrap()).await;
    assert_eq!(pins[0]["status"], "confirmed");
    assert!(pins[0]["name"].is_null());
}

#[tokio::test]
async fn confirm_unknown_pin_returns_transcript() {
    let state = make_state(Arc::default(), TableGeocoder::default()).await;
    ChatStore::new(state.db.pool())
        .append(Role::User, "hello")
        .await
        .unwrap();

    let (status, json) = send(&state, form("/pins/999/confirm", "name=X&category=park")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["messages"].as_array().map(Vec::len), Some(1));
    assert_eq!(last_text(&json), "hello");
}
