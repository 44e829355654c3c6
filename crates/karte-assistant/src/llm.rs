//! LLM backend abstraction and implementations.
//!
//! Concrete backends exist for OpenAI-compatible APIs, the Anthropic
//! Messages API, and Google Gemini. They are grouped in the [`LlmBackend`]
//! enum and exposed to the rest of the application through the
//! [`ModelClient`] capability trait, which returns boxed futures so it can
//! be used as a trait object (`Arc<dyn ModelClient>`) and substituted in
//! tests.

use futures::future::BoxFuture;
use futures::FutureExt;
use karte_types::{ChatTurn, Role};
use serde_json::{Value, json};

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::AssistantError;

/// Upper bound on generated tokens per reply.
const MAX_TOKENS: u32 = 1024;

/// Something that turns a message list into the model's raw reply text.
pub trait ModelClient: Send + Sync {
    /// Send the conversation and return the raw reply text.
    fn complete<'a>(&'a self, messages: &'a [ChatTurn])
    -> BoxFuture<'a, Result<String, AssistantError>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An LLM backend selected by configuration.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
    /// Google Gemini API.
    Google(GoogleBackend),
}

impl ModelClient for LlmBackend {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatTurn],
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        async move {
            match self {
                Self::OpenAi(backend) => backend.complete(messages).await,
                Self::Anthropic(backend) => backend.complete(messages).await,
                Self::Google(backend) => backend.complete(messages).await,
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Google(_) => "google",
        }
    }
}

/// Connection details shared by every backend.
struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl HttpBackend {
    fn new(config: &LlmBackendConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Send a prepared request and decode the JSON body of a 2xx response.
    async fn send_json(
        &self,
        provider: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, AssistantError> {
        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| AssistantError::LlmBackend(format!("{provider} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(AssistantError::LlmBackend(format!(
                "{provider} returned {status}: {error_body}"
            )));
        }

        response.json().await.map_err(|e| {
            AssistantError::LlmBackend(format!("{provider} response parse failed: {e}"))
        })
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, Ollama, and `LiteLLM` proxies.
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    http: HttpBackend,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmBackendConfig) -> Result<Self, AssistantError> {
        Ok(Self {
            http: HttpBackend::new(config)?,
        })
    }

    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, AssistantError> {
        let url = format!("{}/chat/completions", self.http.api_url);
        let body = openai_request_body(&self.http.model, self.http.temperature, messages);
        let request = self
            .http
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.http.api_key))
            .json(&body);
        let json = self.http.send_json("OpenAI", request).await?;
        extract_openai_content(&json)
    }
}

/// Build the `OpenAI` chat completions request body.
fn openai_request_body(model: &str, temperature: f32, messages: &[ChatTurn]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
        .collect();
    json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "max_tokens": MAX_TOKENS,
    })
}

/// Extract the text content from an `OpenAI` chat completions response.
///
/// A `null` content (e.g. a refusal) is treated as an empty reply.
fn extract_openai_content(json: &Value) -> Result<String, AssistantError> {
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| {
            AssistantError::LlmBackend("OpenAI response missing choices[0].message".to_owned())
        })?;
    Ok(message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned())
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic uses a different request format from `OpenAI`:
/// - Uses `x-api-key` header instead of `Authorization: Bearer`
/// - System instructions are a top-level field, not messages
/// - Roles must alternate, so consecutive same-role turns are merged
/// - Response structure differs: `content[0].text`
pub struct AnthropicBackend {
    http: HttpBackend,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &LlmBackendConfig) -> Result<Self, AssistantError> {
        Ok(Self {
            http: HttpBackend::new(config)?,
        })
    }

    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, AssistantError> {
        let url = format!("{}/messages", self.http.api_url);
        let body = anthropic_request_body(&self.http.model, self.http.temperature, messages);
        let request = self
            .http
            .client
            .post(&url)
            .header("x-api-key", &self.http.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body);
        let json = self.http.send_json("Anthropic", request).await?;
        extract_anthropic_content(&json)
    }
}

/// Build the Anthropic Messages request body.
fn anthropic_request_body(model: &str, temperature: f32, messages: &[ChatTurn]) -> Value {
    let (system, turns) = split_leading_system(messages);
    let messages: Vec<Value> = merge_turns(turns, "assistant")
        .into_iter()
        .map(|(role, content)| json!({"role": role, "content": content}))
        .collect();
    json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "temperature": temperature,
        "system": system,
        "messages": messages,
    })
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &Value) -> Result<String, AssistantError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AssistantError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Google Gemini backend
// ---------------------------------------------------------------------------

/// Backend for the Google Gemini `generateContent` API.
///
/// Leading system turns become `systemInstruction`; the assistant role is
/// called `model`.
pub struct GoogleBackend {
    http: HttpBackend,
}

impl GoogleBackend {
    /// Create a new Gemini backend.
    pub fn new(config: &LlmBackendConfig) -> Result<Self, AssistantError> {
        Ok(Self {
            http: HttpBackend::new(config)?,
        })
    }

    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, AssistantError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.http.api_url, self.http.model
        );
        let body = google_request_body(self.http.temperature, messages);
        let request = self
            .http
            .client
            .post(&url)
            .header("x-goog-api-key", &self.http.api_key)
            .json(&body);
        let json = self.http.send_json("Google", request).await?;
        extract_google_content(&json)
    }
}

/// Build the Gemini `generateContent` request body.
fn google_request_body(temperature: f32, messages: &[ChatTurn]) -> Value {
    let (system, turns) = split_leading_system(messages);
    let contents: Vec<Value> = merge_turns(turns, "model")
        .into_iter()
        .map(|(role, text)| json!({"role": role, "parts": [{"text": text}]}))
        .collect();
    json!({
        "systemInstruction": {"parts": [{"text": system}]},
        "contents": contents,
        "generationConfig": {
            "temperature": temperature,
            "maxOutputTokens": MAX_TOKENS,
        },
    })
}

/// Extract the text from a Gemini response, joining all text parts.
fn extract_google_content(json: &Value) -> Result<String, AssistantError> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AssistantError::LlmBackend(
                "Google response missing candidates[0].content.parts".to_owned(),
            )
        })?;
    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect())
}

// ---------------------------------------------------------------------------
// Message shaping shared by Anthropic and Google
// ---------------------------------------------------------------------------

/// Split off the leading run of system turns, joined by blank lines.
fn split_leading_system(messages: &[ChatTurn]) -> (String, &[ChatTurn]) {
    let leading = messages
        .iter()
        .take_while(|m| m.role == Role::System)
        .count();
    let (system, rest) = messages.split_at(leading);
    let system = system
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    (system, rest)
}

/// Map turns onto a user/assistant-only vocabulary and merge consecutive
/// turns of the same role.
///
/// System turns after the preamble (such as map-click coordinates) are sent
/// as user turns. `assistant_role` is the provider's name for the model.
fn merge_turns(turns: &[ChatTurn], assistant_role: &'static str) -> Vec<(&'static str, String)> {
    let mut merged: Vec<(&'static str, String)> = Vec::with_capacity(turns.len());
    for turn in turns {
        let role = match turn.role {
            Role::Assistant => assistant_role,
            Role::User | Role::System => "user",
        };
        match merged.last_mut() {
            Some((last_role, content)) if *last_role == role => {
                content.push_str("\n\n");
                content.push_str(&turn.content);
            }
            _ => merged.push((role, turn.content.clone())),
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
///
/// Fails if the credential is blank or the HTTP client cannot be built, so
/// misconfiguration is reported at startup.
pub fn create_backend(config: &LlmBackendConfig) -> Result<LlmBackend, AssistantError> {
    if config.api_key.trim().is_empty() {
        return Err(AssistantError::Config(format!(
            "{} is empty",
            config.backend_type.api_key_var()
        )));
    }
    Ok(match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)?),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)?),
        BackendType::Google => LlmBackend::Google(GoogleBackend::new(config)?),
    })
}
