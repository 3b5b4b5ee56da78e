//! Progress-callback trait for per-image batch events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the batch processes each image. The CLI uses it to print
//! `Processing <file>...` lines and drive its progress bar; library callers
//! can forward events anywhere without the pipeline knowing how.
//!
//! # Example
//!
//! ```rust
//! use edgequake_idextract::{ExtractionConfig, ExtractionProgressCallback, ImageRecord};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     extracted: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, file_name: &str, record: &ImageRecord) {
//!         if record.is_extracted() {
//!             self.extracted.fetch_add(1, Ordering::SeqCst);
//!         }
//!         eprintln!("{file_name} done");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { extracted: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{BatchStats, ImageRecord};
use std::sync::Arc;

/// Called by the batch loop as it processes each image.
///
/// Images are processed one at a time, so calls never overlap, but the trait
/// is `Send + Sync` so a callback can be shared with other tasks. All methods
/// default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first image.
    fn on_batch_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called before an image is read.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the batch
    fn on_image_start(&self, file_name: &str, index: usize, total_images: usize) {
        let _ = (file_name, index, total_images);
    }

    /// Called once the record for an image is final, whatever its shape.
    fn on_image_complete(&self, file_name: &str, record: &ImageRecord) {
        let _ = (file_name, record);
    }

    /// Called when reading the image or a model call failed.
    /// `on_image_complete` follows with the resulting error record.
    fn on_image_error(&self, file_name: &str, error: &str) {
        let _ = (file_name, error);
    }

    /// Called once after every image has a record.
    fn on_batch_complete(&self, stats: &BatchStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
