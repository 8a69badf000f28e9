//! Generative fallback: prompt the generation service and answer with its cleaned output.
//! Never declines; failures become fixed user-facing replies.

use super::sanitize::strip_reasoning;
use super::{Reply, Responder, ResponderOutcome};
use crate::config::{GenerationConfig, ReasoningDelimiters};
use crate::llm::{OllamaClient, OllamaError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Reply when the service cannot be reached, times out, or returns a non-success status.
pub const UNREACHABLE_REPLY: &str = "抱歉，目前無法連線到 AI 服務，請稍後再試。";

/// Reply when the service answers with something that has no usable text.
pub const MALFORMED_REPLY: &str = "抱歉，AI 服務回傳的內容無法解析，請稍後再試。";

const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Terminal responder backed by an Ollama-compatible generate endpoint.
pub struct GenerativeResponder {
    client: OllamaClient,
    model: String,
    prompt_template: String,
    delimiters: ReasoningDelimiters,
    /// Caps concurrent outbound generation calls.
    permits: Arc<Semaphore>,
}

impl GenerativeResponder {
    pub fn new(client: OllamaClient, config: &GenerationConfig) -> Self {
        Self {
            client,
            model: config.model.trim().to_string(),
            prompt_template: config.prompt_template.clone(),
            delimiters: config.reasoning.clone(),
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        }
    }

    /// Build the client from config (endpoint and timeout) and wrap it.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let client = OllamaClient::new(
            Some(config.endpoint.clone()),
            Duration::from_secs(config.timeout_secs),
        );
        Self::new(client, config)
    }

    fn build_prompt(&self, text: &str) -> String {
        if self.prompt_template.contains(MESSAGE_PLACEHOLDER) {
            self.prompt_template.replace(MESSAGE_PLACEHOLDER, text)
        } else if self.prompt_template.trim().is_empty() {
            text.to_string()
        } else {
            format!("{}\n{}", self.prompt_template, text)
        }
    }

    /// Map a generation result to the reply text.
    fn reply_text(&self, result: Result<String, OllamaError>) -> String {
        match result {
            Ok(raw) => {
                let cleaned = strip_reasoning(&raw, &self.delimiters);
                if cleaned.is_empty() {
                    log::warn!("generative: response had no visible text after cleanup");
                    MALFORMED_REPLY.to_string()
                } else {
                    cleaned
                }
            }
            Err(e) if e.is_unreachable() => {
                log::warn!("generative: {}", e);
                UNREACHABLE_REPLY.to_string()
            }
            Err(e) => {
                log::warn!("generative: {}", e);
                MALFORMED_REPLY.to_string()
            }
        }
    }
}

#[async_trait]
impl Responder for GenerativeResponder {
    fn name(&self) -> &str {
        "generative"
    }

    async fn attempt(&self, text: &str) -> ResponderOutcome {
        let prompt = self.build_prompt(text);
        let reply = match self.permits.acquire().await {
            Ok(_permit) => self.reply_text(self.client.generate(&self.model, &prompt).await),
            Err(_) => {
                log::warn!("generative: concurrency limiter closed, not calling the service");
                UNREACHABLE_REPLY.to_string()
            }
        };
        ResponderOutcome::Answered(Reply::new(reply))
    }
}
