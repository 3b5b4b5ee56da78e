//! # edgequake-idextract
//!
//! Extract structured identity fields (names, document numbers, dates) from
//! photographs of driver's licenses and passports using Vision Language
//! Models (VLMs).
//!
//! ## Pipeline Overview
//!
//! ```text
//! directory of images
//!  │
//!  ├─ 1. Input     list .png / .jpg / .jpeg files (case-insensitive), sorted
//!  ├─ 2. Encode    file bytes → base64, labelled image/jpeg
//!  ├─ 3. Classify  VLM call #1: DRIVERS_LICENSE | PASSPORT | anything else
//!  ├─ 4. Extract   VLM call #2 with the type's template (recognised types only)
//!  ├─ 5. Sanitize  recover the JSON object from the free-text reply
//!  └─ 6. Output    filename → record ResultSet, persisted as pretty JSON
//! ```
//!
//! Every image ends up in the report exactly once, either as its extracted
//! fields plus `document_type`, or as an error record explaining what went
//! wrong. A single bad image never aborts the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_idextract::{extract_to_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let output = extract_to_file("data", "extracted_data.json", &config).await?;
//!     for (file, record) in output.results.iter() {
//!         println!("{file}: {}", serde_json::to_string(record)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `idextract` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, DEFAULT_MODEL};
pub use document::{DocumentType, ExtractionTemplate};
pub use error::{CallStage, IdExtractError, ImageError, ModelError, SanitizeError};
pub use extract::{extract_dir, extract_dir_sync, extract_images, extract_to_file, process_image, write_report};
pub use output::{
    BatchStats, ErrorRecord, ExtractedRecord, ExtractionOutput, FailureKind, ImageRecord, ResultSet,
};
pub use pipeline::encode::EncodedImage;
pub use pipeline::llm::{ProviderVisionModel, VisionModel};
pub use pipeline::sanitize::{clean_json_response, parse_extraction, recover_json_object};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
