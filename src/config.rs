//! Configuration types for ID document extraction.
//!
//! All batch behaviour is controlled through [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. The config is passed into the pipeline
//! explicitly: there is no process-wide API key or result accumulator.
//! Credentials are never stored here; edgequake-llm reads them from the
//! environment (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, …).

use crate::error::IdExtractError;
use crate::pipeline::input::SUPPORTED_EXTENSIONS;
use crate::pipeline::llm::VisionModel;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for an extraction batch.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_idextract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4.1-mini")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed vision model. Takes precedence over everything else.
    pub vision_model: Option<Arc<dyn VisionModel>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Field transcription wants the model to copy what it sees, not to be
    /// creative.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 1024.
    ///
    /// The largest template (passport, 9 fields) needs well under 300.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Accepted file extensions without the dot, matched case-insensitively.
    /// Default: png, jpg, jpeg.
    pub extensions: Vec<String>,

    /// Receives per-image progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            vision_model: None,
            temperature: 0.1,
            max_tokens: 1024,
            api_timeout_secs: 60,
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "vision_model",
                &self.vision_model.as_ref().map(|m| m.model_id().to_string()),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("extensions", &self.extensions)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured model, or [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn vision_model(mut self, model: Arc<dyn VisionModel>) -> Self {
        self.config.vision_model = Some(model);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, IdExtractError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(IdExtractError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(IdExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.extensions.iter().all(|e| e.is_empty()) {
            return Err(IdExtractError::InvalidConfig(
                "At least one file extension is required".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.extensions, ["png", "jpg", "jpeg"]);
        assert_eq!(c.api_timeout_secs, 60);
        assert_eq!(c.model_or_default(), DEFAULT_MODEL);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ExtractionConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn extensions_lose_leading_dot() {
        let c = ExtractionConfig::builder()
            .extensions([".png", "webp"])
            .build()
            .unwrap();
        assert_eq!(c.extensions, ["png", "webp"]);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ExtractionConfig::builder()
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, IdExtractError::InvalidConfig(_)));
    }

    #[test]
    fn empty_extensions_rejected() {
        let err = ExtractionConfig::builder()
            .extensions(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("extension"));
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = ExtractionConfig::builder().model("m").build().unwrap();
        let s = format!("{c:?}");
        assert!(s.contains("model: Some(\"m\")"));
        assert!(s.contains("provider: None"));
    }
}
