//! LLM response parsing into a visible message plus an optional action.
//!
//! The model answers in prose and may append one JSON object describing an
//! action. This module finds that object, turns it into a [`ParsedAction`],
//! and returns the surrounding prose with the block and its decoration
//! (code fences, a dangling `json` label, stray backticks) removed.
//!
//! Nothing here returns an error. Output that cannot be understood is shown
//! to the user verbatim with no action attached.
//!
//! # Boundary heuristic
//!
//! The block is located by scanning backwards for the last `}` and then
//! backwards again for the nearest `{` before it. This is not a balanced
//! brace parser: an action object containing a nested object, or several
//! JSON objects at the end of a reply, will fail to parse and degrade to
//! "no action". Models are instructed to emit a flat object, so the simple
//! scan is kept for predictable tie-breaking.

use std::borrow::Cow;

use karte_types::{AssistantReply, ParsedAction};
use serde_json::Value;
use tracing::debug;

use crate::schema::action_from_object;

/// Markdown code fence delimiter.
const FENCE: &str = "```";

/// Language labels that may be left dangling in front of an action block.
const LANGUAGE_LABELS: [&str; 3] = ["json", "jsonc", "json5"];

/// Parse a raw model reply into an [`AssistantReply`].
///
/// 1. A trailing fenced block whose body is a single JSON object is unwrapped.
/// 2. The last `}` and the nearest preceding `{` delimit the action block.
/// 3. The block must parse as JSON and carry a recognized `action` tag;
///    otherwise `raw` is returned unchanged with no action.
/// 4. The prose before and after the block is cleaned and rejoined.
pub fn parse_llm_response(raw: &str) -> AssistantReply {
    match extract_action(raw) {
        Some((visible_text, action)) => AssistantReply {
            visible_text,
            action: Some(action),
        },
        None => AssistantReply::text(raw),
    }
}

/// Locate, validate, and cut the action block out of `raw`.
fn extract_action(raw: &str) -> Option<(String, ParsedAction)> {
    let text = unwrap_action_fence(raw);
    let (before, block, after) = split_at_action_block(&text)?;

    let object = match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return None,
        Err(e) => {
            debug!(error = %e, "trailing brace block is not valid JSON, showing reply as-is");
            return None;
        }
    };

    let Some(action) = action_from_object(&object) else {
        debug!(
            tag = ?object.get("action"),
            "JSON block has no recognized action, showing reply as-is"
        );
        return None;
    };

    // Inline backticks are only decoration when they wrap the block itself.
    let open_run = backtick_run(before.trim_end().chars().rev());
    let wrapped = open_run > 0 && open_run == backtick_run(after.trim_start().chars());

    let before = clean_before(before, wrapped);
    let after = clean_after(after, wrapped);
    let visible_text = match (before.is_empty(), after.is_empty()) {
        (_, true) => before.to_owned(),
        (true, false) => after.to_owned(),
        (false, false) => format!("{before}\n{after}"),
    };

    debug!(action = %action.kind(), "parsed action from model reply");
    Some((visible_text, action))
}

/// Split `text` around the last `{ ... }` span.
///
/// Returns `(before, block, after)` where `block` includes both braces.
fn split_at_action_block(text: &str) -> Option<(&str, &str, &str)> {
    let close = text.rfind('}')?;
    let (head, from_close) = text.split_at(close);
    let open = head.rfind('{')?;
    let before = head.get(..open)?;
    let block = text.get(open..=close)?;
    let after = from_close.strip_prefix('}')?;
    Some((before, block, after))
}

/// Replace the fence around the action block with the bare object, so the
/// brace scan sees raw braces.
///
/// Only the last fenced block is considered, and only when nothing after it
/// contains a `}`. Fenced JSON elsewhere in the prose keeps its fences.
fn unwrap_action_fence(text: &str) -> Cow<'_, str> {
    match action_fence(text) {
        Some((head, object, tail)) => Cow::Owned(format!("{head}{object}{tail}")),
        None => Cow::Borrowed(text),
    }
}

/// `(head, object, tail)` around the trailing fenced JSON object, if any.
fn action_fence(text: &str) -> Option<(&str, &str, &str)> {
    let close = text.rfind(FENCE)?;
    let (through_body, from_close) = text.split_at(close);
    let tail = from_close.strip_prefix(FENCE)?;
    if tail.contains('}') {
        return None;
    }
    let open = through_body.rfind(FENCE)?;
    let (head, from_open) = through_body.split_at(open);
    let inside = from_open.strip_prefix(FENCE)?;
    let object = fenced_json_object(inside)?;
    Some((head, object, tail))
}

/// The body of a fence if, after an optional language label, it is
/// exactly one JSON object.
fn fenced_json_object(inside: &str) -> Option<&str> {
    let body = inside
        .trim_start_matches([' ', '\t'])
        .trim_start_matches(is_label_char)
        .trim();
    let is_object = body.starts_with('{')
        && body.ends_with('}')
        && matches!(serde_json::from_str::<Value>(body), Ok(Value::Object(_)));
    is_object.then_some(body)
}

/// Characters that may appear in a fence language label.
const fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')
}

/// Length of the run of backticks at the start of `chars`.
fn backtick_run(chars: impl Iterator<Item = char>) -> usize {
    chars.take_while(|&c| c == '`').count()
}

/// Strip fence markers, a dangling language label, and backticks wrapping
/// the block from the end of the prose that precedes it.
fn clean_before(segment: &str, wrapped: bool) -> &str {
    let mut current = segment.trim_end();
    let mut inline = wrapped;
    loop {
        let run = backtick_run(current.chars().rev());
        let next = if run >= FENCE.len() || (inline && run > 0) {
            current.trim_end_matches('`').trim_end()
        } else {
            current
        };
        inline = false;
        let next = strip_trailing_label(next).trim_end();
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

/// Remove a trailing language label (plus stray quotes or backslashes after
/// it) when it stands as its own token.
fn strip_trailing_label(s: &str) -> &str {
    let without_stray = s.trim_end_matches(['"', '\'', '\\']);
    let token = without_stray
        .rsplit(|c: char| !is_label_char(c))
        .next()
        .unwrap_or_default();
    if token.is_empty() || !LANGUAGE_LABELS.iter().any(|l| token.eq_ignore_ascii_case(l)) {
        return s;
    }
    let Some(head) = without_stray.strip_suffix(token) else {
        return s;
    };
    let standalone = head.is_empty() || head.ends_with(|c: char| c.is_whitespace() || c == '`');
    if standalone { head } else { s }
}

/// Strip a closing fence or wrapping backticks and surrounding whitespace
/// from the prose that follows the block.
fn clean_after(segment: &str, wrapped: bool) -> &str {
    let current = segment.trim_start();
    let run = backtick_run(current.chars());
    let current = if run >= FENCE.len() || (wrapped && run > 0) {
        current.trim_start_matches('`')
    } else {
        current
    };
    current.trim()
}
