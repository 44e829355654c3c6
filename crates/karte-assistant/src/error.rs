//! Error types for the assistant core.
//!
//! Uses `thiserror` for typed errors that surface from configuration,
//! prompt rendering, and model calls. The response parser never returns an
//! error: malformed model output degrades to a reply without an action.

/// Errors that can occur while configuring or invoking the assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Configuration is invalid or a credential is missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The model call exceeded its deadline.
    #[error("timeout: model call exceeded {0} ms")]
    Timeout(u128),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
