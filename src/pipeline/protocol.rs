//! Two-stage prompting protocol: classify, then extract by type.
//!
//! ```text
//! image ──▶ classify ──┬─ DRIVERS_LICENSE ─▶ extract (7 fields) ─▶ sanitize
//!                      ├─ PASSPORT ────────▶ extract (9 fields) ─▶ sanitize
//!                      └─ anything else ───▶ "Unsupported document type"
//! ```
//!
//! A recognised document costs two model calls, anything else costs one.
//! Model failures are returned as [`ImageError`]; the batch loop turns them
//! into an error record for the image.

use crate::document::{DocumentType, ExtractionTemplate};
use crate::error::{CallStage, ImageError};
use crate::output::{ErrorRecord, ImageRecord};
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::llm::VisionModel;
use crate::pipeline::sanitize::parse_extraction;
use crate::prompts::CLASSIFY_PROMPT;
use tracing::{debug, info};

/// Ask the model which kind of document the image shows.
pub async fn classify(
    model: &dyn VisionModel,
    image: &EncodedImage,
) -> Result<DocumentType, ImageError> {
    let reply = model
        .complete_chat(CLASSIFY_PROMPT, image)
        .await
        .map_err(|source| ImageError::Model {
            stage: CallStage::Classify,
            source,
        })?;
    debug!("Classifier reply: {:?}", reply);
    Ok(DocumentType::from_label(&reply))
}

/// Send the template's instruction with the image and return the raw reply.
pub async fn request_fields(
    model: &dyn VisionModel,
    image: &EncodedImage,
    template: &ExtractionTemplate,
) -> Result<String, ImageError> {
    model
        .complete_chat(template.instruction, image)
        .await
        .map_err(|source| ImageError::Model {
            stage: CallStage::Extract,
            source,
        })
}

/// Run the full protocol for one encoded image.
pub async fn extract_document(
    model: &dyn VisionModel,
    image: &EncodedImage,
) -> Result<ImageRecord, ImageError> {
    let document_type = classify(model, image).await?;

    let Some(template) = document_type.template() else {
        info!("Unsupported document type {:?}, skipping extraction", document_type.as_label());
        return Ok(ErrorRecord::unsupported(document_type.as_label()).into());
    };

    let reply = request_fields(model, image, template).await?;
    debug!("Extraction reply: {} chars", reply.len());
    Ok(parse_extraction(&reply, &document_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::prompts::{DRIVERS_LICENSE_PROMPT, PASSPORT_PROMPT};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records the prompts it received.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, ModelError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VisionModel for Scripted {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete_chat(&self, prompt: &str, image: &EncodedImage) -> Result<String, ModelError> {
            assert!(image.data_uri().starts_with("data:image/jpeg;base64,"));
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected model call")
        }
    }

    fn image() -> EncodedImage {
        EncodedImage::from_bytes(b"\xFF\xD8\xFF\xE0fake jpeg")
    }

    #[tokio::test]
    async fn drivers_license_uses_license_template() {
        let model = Scripted::new(vec![
            Ok("DRIVERS_LICENSE\n".into()),
            Ok(r#"{"license_number": "D1", "sex": "F"}"#.into()),
        ]);
        let record = extract_document(&model, &image()).await.unwrap();

        let rec = record.as_extracted().unwrap();
        assert_eq!(rec.document_type(), Some("DRIVERS_LICENSE"));
        assert_eq!(model.prompts(), vec![CLASSIFY_PROMPT, DRIVERS_LICENSE_PROMPT]);
    }

    #[tokio::test]
    async fn passport_uses_passport_template() {
        let model = Scripted::new(vec![
            Ok("  PASSPORT ".into()),
            Ok(r#"{"passport_number": "P1"}"#.into()),
        ]);
        let record = extract_document(&model, &image()).await.unwrap();

        assert_eq!(record.as_extracted().unwrap().get("passport_number"), Some("P1"));
        assert_eq!(model.prompts()[1], PASSPORT_PROMPT);
    }

    #[tokio::test]
    async fn unsupported_type_skips_second_call() {
        let model = Scripted::new(vec![Ok("I think this is a library card".into())]);
        let record = extract_document(&model, &image()).await.unwrap();

        let err = record.as_error().unwrap();
        assert_eq!(err.error, "Unsupported document type");
        assert_eq!(err.raw_type.as_deref(), Some("I think this is a library card"));
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn classify_failure_is_propagated() {
        let model = Scripted::new(vec![Err(ModelError::Timeout { secs: 5 })]);
        let err = extract_document(&model, &image()).await.unwrap_err();
        assert!(matches!(
            err,
            ImageError::Model {
                stage: CallStage::Classify,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn extract_failure_is_propagated() {
        let model = Scripted::new(vec![
            Ok("PASSPORT".into()),
            Err(ModelError::Provider("HTTP 503".into())),
        ]);
        let err = extract_document(&model, &image()).await.unwrap_err();
        assert_eq!(err.to_string(), "extraction call failed: HTTP 503");
    }
}
