//! Pipeline stages for ID document field extraction.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the model backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ protocol (llm ×1 or ×2) ──▶ sanitize
//! (dir)     (base64)   (classify, extract)         (JSON recovery)
//! ```
//!
//! 1. [`input`]     list supported images in the input directory
//! 2. [`encode`]    base64-wrap the file bytes for the multimodal request
//! 3. [`llm`]       the [`llm::VisionModel`] seam; the only stage with
//!    network I/O
//! 4. [`protocol`]  classification call, type dispatch, extraction call
//! 5. [`sanitize`]  recover the JSON object from the extraction reply

pub mod encode;
pub mod input;
pub mod llm;
pub mod protocol;
pub mod sanitize;
