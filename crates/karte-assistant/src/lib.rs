//! Assistant core for the Karte map assistant.
//!
//! This crate owns everything between the stored chat transcript and a
//! structured assistant reply:
//!
//! - [`parse`]: extracts the single trailing JSON action block from raw
//!   model text and returns the cleaned visible text.
//! - [`schema`]: validates an action object into a typed
//!   [`ParsedAction`](karte_types::ParsedAction).
//! - [`prompt`]: renders the system prompt and map-state summary and
//!   assembles the message list.
//! - [`llm`]: the [`ModelClient`] trait and HTTP backends for `OpenAI`,
//!   Anthropic, and Google.
//! - [`assistant`]: the invocation boundary with deadline and fallback.
//! - [`config`]: environment-driven backend configuration.

pub mod assistant;
pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod schema;

pub use assistant::{Assistant, FALLBACK_REPLY};
pub use config::{BackendType, LlmBackendConfig};
pub use error::AssistantError;
pub use llm::{LlmBackend, ModelClient, create_backend};
pub use parse::parse_llm_response;
pub use prompt::PromptEngine;
