//! The invocation boundary: build the conversation, call the model under a
//! deadline, and parse the reply.
//!
//! Model failures never reach the caller as errors. A failed or timed-out
//! call yields [`FALLBACK_REPLY`] with no action, so the chat keeps going.
//! Template failures are configuration bugs and are propagated.

use std::sync::Arc;
use std::time::Duration;

use karte_types::{AssistantReply, ChatTurn, MapPinSnapshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::AssistantError;
use crate::llm::ModelClient;
use crate::parse::parse_llm_response;
use crate::prompt::PromptEngine;

/// Reply shown when the model cannot be reached.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting to my brain right now. Please try again.";

/// The map assistant: a prompt engine bound to a model client.
pub struct Assistant {
    client: Arc<dyn ModelClient>,
    prompts: PromptEngine,
    deadline: Duration,
}

impl Assistant {
    /// Create an assistant from its parts.
    pub const fn new(
        client: Arc<dyn ModelClient>,
        prompts: PromptEngine,
        deadline: Duration,
    ) -> Self {
        Self {
            client,
            prompts,
            deadline,
        }
    }

    /// Produce the assistant's next reply for `history`.
    ///
    /// `pins` is the current map state; `None` omits it from the prompt.
    pub async fn respond(
        &self,
        history: &[ChatTurn],
        pins: Option<&[MapPinSnapshot]>,
    ) -> Result<AssistantReply, AssistantError> {
        let messages = self.prompts.build(history, pins)?;

        debug!(
            backend = self.client.name(),
            messages = messages.len(),
            "calling model"
        );

        match timeout(self.deadline, self.client.complete(&messages)).await {
            Ok(Ok(raw)) => {
                let reply = parse_llm_response(&raw);
                debug!(
                    backend = self.client.name(),
                    action = reply.action.as_ref().map(|a| a.kind().as_str()),
                    "model replied"
                );
                Ok(reply)
            }
            Ok(Err(e)) => {
                warn!(
                    backend = self.client.name(),
                    error = %e,
                    "model call failed, using fallback reply"
                );
                Ok(fallback())
            }
            Err(_) => {
                warn!(
                    backend = self.client.name(),
                    timeout_ms = self.deadline.as_millis(),
                    "model deadline exceeded, using fallback reply"
                );
                Ok(fallback())
            }
        }
    }
}

fn fallback() -> AssistantReply {
    AssistantReply::text(FALLBACK_REPLY)
}
