//! Batch extraction entry points.
//!
//! Images are processed strictly one after another: each image gets its
//! classification call, optional extraction call and parse before the next
//! image is read. A failure on one image is recorded against its filename
//! and never aborts the batch.

use crate::config::ExtractionConfig;
use crate::error::{IdExtractError, ImageError};
use crate::output::{BatchStats, ErrorRecord, ExtractionOutput, ImageRecord, ResultSet};
use crate::pipeline::llm::{ProviderVisionModel, VisionModel};
use crate::pipeline::{encode, input, protocol};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Extract fields from every supported image in `dir`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ExtractionOutput)` once every image has a record, even if some of
/// them are error records (check `output.stats`).
///
/// # Errors
/// Returns `Err(IdExtractError)` only for fatal errors:
/// - input directory missing or unreadable
/// - no LLM provider could be configured
pub async fn extract_dir(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, IdExtractError> {
    let dir = dir.as_ref();
    info!("Starting extraction: {}", dir.display());

    let images = input::scan_images(dir, &config.extensions)?;
    let model = resolve_vision_model(config).await?;

    Ok(extract_images(model.as_ref(), &images, config).await)
}

/// Extract fields from an explicit list of image paths with a given model.
///
/// Every path gets exactly one record, keyed by its file name, in list order.
pub async fn extract_images(
    model: &dyn VisionModel,
    images: &[PathBuf],
    config: &ExtractionConfig,
) -> ExtractionOutput {
    let start = Instant::now();
    let total = images.len();
    let mut results = ResultSet::new();

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    for (i, path) in images.iter().enumerate() {
        let file_name = input::file_name(path);
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(&file_name, i + 1, total);
        }

        let record = match process_image(model, path).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Error processing {}: {}", file_name, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_error(&file_name, &e.to_string());
                }
                ErrorRecord::processing(&e).into()
            }
        };

        if let Some(ref cb) = config.progress_callback {
            cb.on_image_complete(&file_name, &record);
        }
        results.insert(file_name, record);
    }

    let stats = BatchStats::from_results(&results, start.elapsed().as_millis() as u64);
    info!(
        "Extraction complete: {}/{} images extracted, {}ms total",
        stats.extracted, stats.total_images, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(&stats);
    }

    ExtractionOutput { results, stats }
}

/// Encode one image and run the classify/extract protocol on it.
///
/// Unsupported types and unparseable replies come back as `Ok` error
/// records; only read and model-call failures are `Err`.
pub async fn process_image(model: &dyn VisionModel, path: &Path) -> Result<ImageRecord, ImageError> {
    let image = encode::encode_image(path)
        .await
        .map_err(|e| ImageError::ReadFailed {
            file: path.display().to_string(),
            detail: e.to_string(),
        })?;
    protocol::extract_document(model, &image).await
}

/// Extract a directory and write the ResultSet as pretty JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial reports.
pub async fn extract_to_file(
    dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, IdExtractError> {
    let output = extract_dir(dir, config).await?;
    write_report(output_path.as_ref(), &output.results).await?;
    Ok(output)
}

/// Persist a ResultSet as 2-space-indented JSON.
pub async fn write_report(path: &Path, results: &ResultSet) -> Result<(), IdExtractError> {
    let json = results.to_json_pretty()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| IdExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| IdExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| IdExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Report written to {}", path.display());
    Ok(())
}

/// Synchronous wrapper around [`extract_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_dir_sync(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, IdExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| IdExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_dir(dir, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, IdExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        IdExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the vision model, from most-specific to least-specific.
///
/// 1. **Pre-built vision model** (`config.vision_model`): used as-is.
/// 2. **Pre-built provider** (`config.provider`): wrapped with the
///    configured model id, temperature and timeout.
/// 3. **Named provider + model** (`config.provider_name`): the factory reads
///    the matching API key from the environment.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **`OPENAI_API_KEY`** present → OpenAI with the configured model.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
async fn resolve_vision_model(
    config: &ExtractionConfig,
) -> Result<Arc<dyn VisionModel>, IdExtractError> {
    if let Some(ref model) = config.vision_model {
        return Ok(Arc::clone(model));
    }

    let model_id = config.model_or_default().to_string();
    let wrap = |provider: Arc<dyn LLMProvider>, model_id: String| -> Arc<dyn VisionModel> {
        Arc::new(ProviderVisionModel::new(provider, model_id, config))
    };

    if let Some(ref provider) = config.provider {
        return Ok(wrap(Arc::clone(provider), model_id));
    }

    if let Some(ref name) = config.provider_name {
        return Ok(wrap(create_provider(name, &model_id)?, model_id));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return Ok(wrap(create_provider(&prov, &model)?, model));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return Ok(wrap(create_provider("openai", &model_id)?, model_id));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| IdExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(wrap(llm_provider, "auto".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::pipeline::encode::EncodedImage;
    use async_trait::async_trait;

    struct AlwaysOther;

    #[async_trait]
    impl VisionModel for AlwaysOther {
        fn model_id(&self) -> &str {
            "always-other"
        }

        async fn complete_chat(&self, _prompt: &str, _image: &EncodedImage) -> Result<String, ModelError> {
            Ok("OTHER".into())
        }
    }

    #[tokio::test]
    async fn vision_model_takes_precedence() {
        let config = ExtractionConfig::builder()
            .vision_model(Arc::new(AlwaysOther))
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        let model = resolve_vision_model(&config).await.unwrap();
        assert_eq!(model.model_id(), "always-other");
    }

    #[tokio::test]
    async fn unreadable_image_is_recorded_not_fatal() {
        let paths = vec![PathBuf::from("/definitely/not/here.jpg")];
        let output = extract_images(&AlwaysOther, &paths, &ExtractionConfig::default()).await;

        let record = output.results.get("here.jpg").unwrap();
        let err = record.as_error().unwrap();
        assert!(err.error.contains("/definitely/not/here.jpg"), "got: {}", err.error);
        assert!(err.raw_response.is_none() && err.document_type.is_none());
        assert_eq!(output.stats.failed, 1);
    }

    #[tokio::test]
    async fn write_report_creates_parents_and_indents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/report.json");
        let mut results = ResultSet::new();
        results.insert("x.png", ErrorRecord::unsupported("OTHER").into());

        write_report(&path, &results).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "{\n  \"x.png\": {\n    \"error\": \"Unsupported document type\",\n    \"type\": \"OTHER\"\n  }\n}"
        );
        assert!(!path.with_extension("json.tmp").exists());
    }
}
