//! Configuration types for the model backend.
//!
//! All configuration is loaded from environment variables. Validation is
//! eager: an unsupported provider or a missing credential is reported when
//! the configuration is read, long before the first chat message.

use std::time::Duration;

use crate::error::AssistantError;

/// Default model when `LLM_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature when `LLM_TEMPERATURE` is unset.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default model call deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the language model backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// Which wire protocol to speak.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g. `gpt-4o-mini`).
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Deadline for a single model call.
    pub timeout: Duration,
    /// Optional directory with `system.j2` / `map_state.j2` overrides.
    pub templates_dir: Option<String>,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenAI`, `DeepSeek`, Ollama, `LiteLLM`).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Google Gemini `generateContent` API.
    Google,
}

impl BackendType {
    /// Parse a provider name as written in `LLM_PROVIDER`.
    pub fn from_provider(provider: &str) -> Result<Self, AssistantError> {
        match provider.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" | "litellm" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "google" | "gemini" => Ok(Self::Google),
            other => Err(AssistantError::Config(format!(
                "unsupported LLM provider: {other}"
            ))),
        }
    }

    /// Environment variable holding this provider's credential.
    pub const fn api_key_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
        }
    }

    /// Base URL used when `LLM_BASE_URL` is unset.
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta",
        }
    }
}

impl LlmBackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LLM_PROVIDER` -- `openai` (default), `anthropic`, or `google`
    /// - `LLM_MODEL` -- model name (default `gpt-4o-mini`)
    /// - `LLM_TEMPERATURE` -- sampling temperature (default `0.3`)
    /// - `LLM_BASE_URL` -- API base URL (default depends on provider)
    /// - `LLM_TIMEOUT_MS` -- model call deadline (default 30000)
    /// - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` / `GOOGLE_API_KEY` -- required
    ///   for the selected provider
    /// - `PROMPT_TEMPLATES_DIR` -- optional template override directory
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = get("LLM_PROVIDER").unwrap_or_else(|| "openai".to_owned());
        let backend_type = BackendType::from_provider(&provider)?;

        let key_var = backend_type.api_key_var();
        let api_key = get(key_var).ok_or_else(|| {
            AssistantError::Config(format!(
                "missing required env var {key_var} for provider {provider}"
            ))
        })?;

        let model = get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned());

        let temperature = match get("LLM_TEMPERATURE") {
            Some(raw) => raw
                .trim()
                .parse::<f32>()
                .map_err(|e| AssistantError::Config(format!("invalid LLM_TEMPERATURE: {e}")))?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout_ms = match get("LLM_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| AssistantError::Config(format!("invalid LLM_TIMEOUT_MS: {e}")))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let api_url = get("LLM_BASE_URL")
            .map_or_else(
                || backend_type.default_api_url().to_owned(),
                |url| url.trim_end_matches('/').to_owned(),
            );

        Ok(Self {
            backend_type,
            api_url,
            api_key,
            model,
            temperature,
            timeout: Duration::from_millis(timeout_ms),
            templates_dir: get("PROMPT_TEMPLATES_DIR"),
        })
    }
}
