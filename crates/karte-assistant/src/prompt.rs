//! Conversation assembly via `minijinja`.
//!
//! Every model call receives the same ordered message list:
//!
//! 1. the fixed system instruction (categories and action grammar),
//! 2. a map-state summary when the caller supplied pin snapshots,
//! 3. the chat history in order.
//!
//! Templates are embedded at compile time. Operators can override them by
//! pointing `PROMPT_TEMPLATES_DIR` at a directory containing `system.j2`
//! and `map_state.j2`.

use karte_types::{ChatTurn, MapPinSnapshot, PinCategory, PinStatus};
use minijinja::Environment;
use serde::Serialize;

use crate::error::AssistantError;

/// Embedded default for the system instruction.
const SYSTEM_TEMPLATE: &str = include_str!("../templates/system.j2");

/// Embedded default for the map-state summary.
const MAP_STATE_TEMPLATE: &str = include_str!("../templates/map_state.j2");

/// Builds the message list sent to the language model.
///
/// The system instruction does not depend on the conversation, so it is
/// rendered once at construction; a broken template fails there rather
/// than on the first chat message.
pub struct PromptEngine {
    env: Environment<'static>,
    system_prompt: String,
}

/// One pin line in the map-state template.
#[derive(Serialize)]
struct PinLine {
    status: &'static str,
    name: String,
    category: String,
    lat: String,
    lng: String,
}

/// Context for the map-state template.
#[derive(Serialize)]
struct MapStateContext {
    total: usize,
    confirmed: usize,
    draft: usize,
    pins: Vec<PinLine>,
}

impl PromptEngine {
    /// Create a prompt engine from the embedded templates.
    pub fn new() -> Result<Self, AssistantError> {
        Self::from_sources(SYSTEM_TEMPLATE.to_owned(), MAP_STATE_TEMPLATE.to_owned())
    }

    /// Create a prompt engine loading `system.j2` and `map_state.j2` from
    /// the given directory.
    pub fn from_dir(templates_dir: &str) -> Result<Self, AssistantError> {
        let system = load_template(templates_dir, "system.j2")?;
        let map_state = load_template(templates_dir, "map_state.j2")?;
        Self::from_sources(system, map_state)
    }

    fn from_sources(system: String, map_state: String) -> Result<Self, AssistantError> {
        let mut env = Environment::new();
        env.add_template_owned("system", system)
            .map_err(|e| AssistantError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("map_state", map_state).map_err(|e| {
            AssistantError::Template(format!("failed to add map_state template: {e}"))
        })?;

        let categories: Vec<&str> = PinCategory::ALL.iter().map(|c| c.as_str()).collect();
        let system_prompt = env
            .get_template("system")
            .map_err(|e| AssistantError::Template(format!("missing system template: {e}")))?
            .render(minijinja::context! { categories => categories })
            .map_err(|e| AssistantError::Template(format!("system render failed: {e}")))?
            .trim()
            .to_owned();

        Ok(Self { env, system_prompt })
    }

    /// The rendered system instruction.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Summarize the map for the model.
    ///
    /// One line per pin: `[status] name (category) at (lat, lng)` with
    /// coordinates at five decimals and `unnamed` for pins without a name.
    pub fn render_map_state(&self, pins: &[MapPinSnapshot]) -> Result<String, AssistantError> {
        let confirmed = pins
            .iter()
            .filter(|p| p.status == PinStatus::Confirmed)
            .count();
        let context = MapStateContext {
            total: pins.len(),
            confirmed,
            draft: pins.len().saturating_sub(confirmed),
            pins: pins
                .iter()
                .map(|p| PinLine {
                    status: p.status.as_str(),
                    name: p
                        .name
                        .as_deref()
                        .filter(|n| !n.is_empty())
                        .unwrap_or("unnamed")
                        .to_owned(),
                    category: p.category.label(),
                    lat: format!("{:.5}", p.lat),
                    lng: format!("{:.5}", p.lng),
                })
                .collect(),
        };

        let rendered = self
            .env
            .get_template("map_state")
            .map_err(|e| AssistantError::Template(format!("missing map_state template: {e}")))?
            .render(&context)
            .map_err(|e| AssistantError::Template(format!("map_state render failed: {e}")))?;
        Ok(rendered.trim().to_owned())
    }

    /// Assemble the full message list for one model call.
    ///
    /// `pins = None` omits the map-state turn entirely; `Some(&[])` still
    /// includes it, stating that the map is empty.
    pub fn build(
        &self,
        history: &[ChatTurn],
        pins: Option<&[MapPinSnapshot]>,
    ) -> Result<Vec<ChatTurn>, AssistantError> {
        let mut messages = Vec::with_capacity(history.len().saturating_add(2));
        messages.push(ChatTurn::system(self.system_prompt.clone()));
        if let Some(pins) = pins {
            messages.push(ChatTurn::system(self.render_map_state(pins)?));
        }
        messages.extend(history.iter().cloned());
        Ok(messages)
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, AssistantError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| AssistantError::Template(format!("failed to read {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use karte_types::Role;

    use super::*;

    fn engine() -> PromptEngine {
        match PromptEngine::new() {
            Ok(engine) => engine,
            Err(e) => panic!("embedded templates should load: {e}"),
        }
    }

    fn snapshot(name: Option<&str>, category: PinCategory, status: PinStatus) -> MapPinSnapshot {
        MapPinSnapshot {
            lat: -23.550_52,
            lng: -46.633_308,
            name: name.map(ToOwned::to_owned),
            category,
            status,
        }
    }

    #[test]
    fn system_prompt_lists_categories_and_actions() {
        let engine = engine();
        let prompt = engine.system_prompt();
        assert!(prompt.contains("school, health_clinic, bakery"));
        for tag in karte_types::ActionKind::ALL {
            assert!(prompt.contains(&format!("\"action\": \"{tag}\"")), "missing {tag}");
        }
        assert!(prompt.contains("\"which\""));
        assert!(prompt.contains("\"target\""));
    }

    #[test]
    fn empty_pins_still_produce_map_state() {
        let engine = engine();
        let history = vec![ChatTurn::user("hi")];
        let with_empty = engine.build(&history, Some(&[])).unwrap_or_default();
        let without = engine.build(&history, None).unwrap_or_default();

        assert_eq!(with_empty.len(), 3);
        assert_eq!(without.len(), 2);
        let system_turns = |m: &[ChatTurn]| m.iter().filter(|t| t.role == Role::System).count();
        assert_eq!(system_turns(&with_empty), system_turns(&without).saturating_add(1));
        assert!(
            with_empty
                .get(1)
                .is_some_and(|t| t.content.contains("no pins on the map yet"))
        );
    }

    #[test]
    fn map_state_lines() {
        let engine = engine();
        let pins = vec![
            snapshot(Some("Corner Bakery"), PinCategory::Bakery, PinStatus::Confirmed),
            snapshot(None, PinCategory::HealthClinic, PinStatus::Draft),
        ];
        let text = engine.render_map_state(&pins).unwrap_or_default();
        assert!(text.starts_with("Current map state: 2 pins (1 confirmed, 1 draft)."));
        assert!(text.contains("- [confirmed] Corner Bakery (bakery) at (-23.55052, -46.63331)"));
        assert!(text.contains("- [draft] unnamed (health clinic) at (-23.55052, -46.63331)"));
    }

    #[test]
    fn single_pin_is_singular() {
        let engine = engine();
        let pins = vec![snapshot(Some("Park"), PinCategory::Park, PinStatus::Draft)];
        let text = engine.render_map_state(&pins).unwrap_or_default();
        assert!(text.starts_with("Current map state: 1 pin (0 confirmed, 1 draft)."));
    }

    #[test]
    fn history_order_and_roles_are_preserved() {
        let engine = engine();
        let history = vec![
            ChatTurn::user("Add the bakery on Rua Augusta"),
            ChatTurn::assistant("Done!"),
            ChatTurn::system("User clicked the map at lat=1.00000, lng=2.00000."),
            ChatTurn::new(Role::from_tag("tool"), "odd role"),
        ];
        let messages = engine.build(&history, None).unwrap_or_default();
        let tail: Vec<_> = messages.iter().skip(1).cloned().collect();
        assert_eq!(tail.len(), 4);
        assert_eq!(tail.first().map(|t| t.role), Some(Role::User));
        assert_eq!(tail.get(1).map(|t| t.role), Some(Role::Assistant));
        assert_eq!(tail.get(2).map(|t| t.role), Some(Role::System));
        assert_eq!(tail.get(3).map(|t| t.role), Some(Role::User));
        assert_eq!(tail.get(3).map(|t| t.content.as_str()), Some("odd role"));
    }

    #[test]
    fn templates_from_dir() {
        let unique = format!(
            "karte_test_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("system.j2"), "Categories: {{ categories | length }}").ok();
        std::fs::write(dir.join("map_state.j2"), "Pins: {{ total }}").ok();

        let engine = PromptEngine::from_dir(dir.to_str().unwrap_or(""));
        assert!(engine.is_ok(), "from_dir should succeed with both templates");
        if let Ok(engine) = engine {
            assert_eq!(engine.system_prompt(), "Categories: 10");
            assert_eq!(engine.render_map_state(&[]).unwrap_or_default(), "Pins: 0");
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_template_returns_error() {
        let unique = format!(
            "karte_missing_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("system.j2"), "test").ok();

        let result = PromptEngine::from_dir(dir.to_str().unwrap_or(""));
        assert!(matches!(result, Err(AssistantError::Template(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
