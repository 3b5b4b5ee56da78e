//! Error types for the edgequake-idextract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`IdExtractError`] is **fatal**: the batch cannot run at all (input
//!   directory missing, provider not configured, report not writable).
//!   Returned as `Err(IdExtractError)` from the top-level `extract*` functions.
//!
//! * [`ImageError`] is **non-fatal**: a single image failed (unreadable file,
//!   model call failed or timed out) but every other image still runs. It is
//!   converted into an [`crate::output::ErrorRecord`] for that filename so the
//!   report always has one entry per processed image.
//!
//! Two smaller error types sit underneath: [`ModelError`] for the remote
//! vision call and [`SanitizeError`] for JSON recovery from model text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-idextract library.
///
/// Image-level failures use [`ImageError`] and are recorded in the
/// [`crate::output::ResultSet`] rather than propagated here.
#[derive(Debug, Error)]
pub enum IdExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input directory was not found at the given path.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// The input path exists but is a file, not a directory.
    #[error("Input path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Process does not have permission to list the directory.
    #[error("Permission denied reading '{path}'\nTry: chmod +rx {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the JSON report.
    #[error("Failed to write report '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ResultSet could not be serialised to JSON.
    #[error("Failed to serialise report: {0}")]
    ReportSerialisation(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which of the two model calls an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStage {
    /// The document-type classification call.
    Classify,
    /// The type-specific field extraction call.
    Extract,
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStage::Classify => f.write_str("classification"),
            CallStage::Extract => f.write_str("extraction"),
        }
    }
}

/// A failed call to the remote vision model.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ModelError {
    /// The provider returned an error (HTTP status, auth, connectivity…).
    #[error("{0}")]
    Provider(String),

    /// The call did not complete within the configured timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// A non-fatal error for a single image.
///
/// Recorded in the report as `{ "error": "<display text>" }`. The batch
/// continues with the next image.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ImageError {
    /// The image file could not be opened or read.
    #[error("{file}: {detail}")]
    ReadFailed { file: String, detail: String },

    /// One of the two model calls failed. No retry is attempted.
    #[error("{stage} call failed: {source}")]
    Model {
        stage: CallStage,
        #[source]
        source: ModelError,
    },
}

/// Why a model reply could not be turned into a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// The reply has no `{` or no `}`.
    #[error("No JSON object found in response")]
    NoJsonObject,

    /// The outer-brace span was found but is not valid JSON.
    #[error("{0}")]
    InvalidJson(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_not_found_display() {
        let e = IdExtractError::InputNotFound {
            path: PathBuf::from("data"),
        };
        assert!(e.to_string().contains("'data'"), "got: {e}");
    }

    #[test]
    fn model_timeout_display() {
        let e = ImageError::Model {
            stage: CallStage::Classify,
            source: ModelError::Timeout { secs: 60 },
        };
        let msg = e.to_string();
        assert!(msg.contains("classification"), "got: {msg}");
        assert!(msg.contains("60s"), "got: {msg}");
    }

    #[test]
    fn provider_error_display() {
        let e = ImageError::Model {
            stage: CallStage::Extract,
            source: ModelError::Provider("HTTP 401 invalid key".into()),
        };
        assert_eq!(e.to_string(), "extraction call failed: HTTP 401 invalid key");
    }

    #[test]
    fn read_failed_display() {
        let e = ImageError::ReadFailed {
            file: "front.jpg".into(),
            detail: "Permission denied (os error 13)".into(),
        };
        assert!(e.to_string().starts_with("front.jpg: "));
    }

    #[test]
    fn no_json_object_message() {
        assert_eq!(
            SanitizeError::NoJsonObject.to_string(),
            "No JSON object found in response"
        );
    }
}
