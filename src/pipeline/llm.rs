//! Structured-data request: send the extracted text to the language model.
//!
//! The request is a single chat call:
//!
//! 1. **System message**: [`JSON_ONLY_DIRECTIVE`]
//! 2. **User message**: [`extraction_prompt`] with the document text appended
//!
//! with `response_format = {"type": "json_object"}` on the wire. The model's
//! content is returned byte-for-byte. It is not parsed, re-serialised or
//! schema-checked, so a non-compliant answer reaches the caller unchanged.
//! There is no retry: a failed call fails the request.
//!
//! The production model talks to the chat completions API through
//! `edgequake-llm`'s OpenAI-compatible provider, which forwards
//! `CompletionOptions::response_format` into the request body.

use crate::config::ServiceConfig;
use crate::error::ModelError;
use crate::prompts::{extraction_prompt, JSON_ONLY_DIRECTIVE};
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, LLMProvider, OpenAICompatibleProvider, ProviderConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Name the provider reports in its own logs and errors.
const PROVIDER_NAME: &str = "openai";

/// A model that answers a prompt with JSON-formatted text.
#[async_trait]
pub trait StructuredDataModel: Send + Sync {
    /// Send the user `prompt` and return the raw completion content.
    async fn complete_json(&self, prompt: &str) -> Result<String, ModelError>;
}

/// [`StructuredDataModel`] backed by an `edgequake-llm` provider.
#[derive(Clone)]
pub struct LlmStructuredModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl LlmStructuredModel {
    /// Wrap an already constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Build an OpenAI chat model for `config.model` at `config.api_base_url`.
    ///
    /// The key is attached to every request as a bearer header; nothing is
    /// read from or written to the process environment.
    pub fn openai(config: &ServiceConfig, api_key: &str) -> Result<Self, ModelError> {
        if api_key.trim().is_empty() {
            return Err(ModelError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
                hint: "The API key is empty. Set OPENAI_API_KEY or pass --openai-api-key."
                    .to_string(),
            });
        }

        let provider = OpenAICompatibleProvider::from_config(provider_config(config, api_key))
            .map_err(|e| ModelError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
                hint: e.to_string(),
            })?;

        info!(
            "LLM provider ready: {} / {} at {}",
            PROVIDER_NAME, config.model, config.api_base_url
        );
        Ok(Self::new(Arc::new(provider), config.model.clone()))
    }
}

/// Provider settings for an OpenAI-style endpoint with a fixed key.
fn provider_config(config: &ServiceConfig, api_key: &str) -> ProviderConfig {
    let mut headers = HashMap::new();
    headers.insert(
        "Authorization".to_string(),
        format!("Bearer {}", api_key.trim()),
    );

    ProviderConfig {
        name: PROVIDER_NAME.to_string(),
        display_name: "OpenAI".to_string(),
        base_url: Some(config.api_base_url.clone()),
        default_llm_model: Some(config.model.clone()),
        headers,
        ..Default::default()
    }
}

#[async_trait]
impl StructuredDataModel for LlmStructuredModel {
    async fn complete_json(&self, prompt: &str) -> Result<String, ModelError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(JSON_ONLY_DIRECTIVE),
            ChatMessage::user(prompt),
        ];
        let options = json_options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelError::Request {
                message: format!("{}", e),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(response.content)
    }
}

/// Completion options requesting JSON-only output.
fn json_options() -> CompletionOptions {
    CompletionOptions {
        response_format: Some("json_object".to_string()),
        ..Default::default()
    }
}

/// Build the prompt for `text` and return the model's raw JSON answer.
pub async fn request_structured_data(
    model: &dyn StructuredDataModel,
    text: &str,
) -> Result<String, ModelError> {
    let prompt = extraction_prompt(text);
    debug!("Prompt built: {} chars", prompt.len());

    match model.complete_json(&prompt).await {
        Ok(content) => {
            info!("Model returned {} chars", content.len());
            Ok(content)
        }
        Err(e) => {
            warn!("Structured-data request failed: {}", e);
            Err(e)
        }
    }
}
