//! VLM interaction: one chat turn with a text part and an image part.
//!
//! [`VisionModel`] is the only boundary to the inference service. The protocol
//! in [`crate::pipeline::protocol`] talks to it and never to a concrete
//! provider, so tests can substitute a scripted model and callers can plug in
//! their own backend through [`crate::config::ExtractionConfig::vision_model`].
//!
//! Calls are not retried. A failed call is returned once and the caller
//! records it against the image.

use crate::config::ExtractionConfig;
use crate::error::ModelError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// A multimodal chat-completion endpoint.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Identifier of the model answering the requests.
    fn model_id(&self) -> &str;

    /// Send a single user turn made of `prompt` followed by `image`, and
    /// return the text of the completion.
    async fn complete_chat(&self, prompt: &str, image: &EncodedImage) -> Result<String, ModelError>;
}

/// [`VisionModel`] backed by an edgequake-llm provider.
pub struct ProviderVisionModel {
    provider: Arc<dyn LLMProvider>,
    model_id: String,
    options: CompletionOptions,
    timeout_secs: u64,
}

impl ProviderVisionModel {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        model_id: impl Into<String>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            options: build_options(config),
            timeout_secs: config.api_timeout_secs,
        }
    }
}

#[async_trait]
impl VisionModel for ProviderVisionModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete_chat(&self, prompt: &str, image: &EncodedImage) -> Result<String, ModelError> {
        let messages = vec![ChatMessage::user_with_images(
            prompt,
            vec![image.to_image_data()],
        )];

        let start = Instant::now();
        let response = timeout(
            Duration::from_secs(self.timeout_secs),
            self.provider.chat(&messages, Some(&self.options)),
        )
        .await
        .map_err(|_| ModelError::Timeout {
            secs: self.timeout_secs,
        })?
        .map_err(|e| ModelError::Provider(e.to_string()))?;

        debug!(
            "{}: {} chars in {:?}",
            self.model_id,
            response.content.len(),
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
