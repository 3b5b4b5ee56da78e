//! Output types: per-image records, the batch ResultSet and run statistics.
//!
//! Every record serialises as a bare JSON object so the persisted report is a
//! plain `filename → object` mapping that downstream tools can key into
//! without knowing about Rust enums.

use crate::document::{DocumentType, ExtractionTemplate, DOCUMENT_TYPE_KEY};
use crate::error::ImageError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Message recorded when the classifier returns an unsupported label.
pub const UNSUPPORTED_DOCUMENT_TYPE: &str = "Unsupported document type";

/// Fields recovered from the model's extraction reply, plus `document_type`.
///
/// Values are kept exactly as the model returned them: no coercion and no
/// date-format validation. Key order follows the reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    fields: Map<String, Value>,
}

impl ExtractedRecord {
    /// Stamp `document_type` onto a parsed object.
    ///
    /// If the model already emitted a `document_type` key its value is
    /// replaced in place; otherwise the key is appended last.
    pub fn new(mut fields: Map<String, Value>, document_type: &DocumentType) -> Self {
        fields.insert(
            DOCUMENT_TYPE_KEY.to_string(),
            Value::String(document_type.as_label().to_string()),
        );
        Self { fields }
    }

    /// String value of a field, if present and a string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn document_type(&self) -> Option<&str> {
        self.get(DOCUMENT_TYPE_KEY)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Template keys the model did not return.
    pub fn missing_fields(&self, template: &ExtractionTemplate) -> Vec<&'static str> {
        template
            .fields
            .iter()
            .copied()
            .filter(|f| !self.fields.contains_key(*f))
            .collect()
    }

    /// Keys the model returned that the template did not ask for.
    pub fn extra_fields(&self, template: &ExtractionTemplate) -> Vec<&str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|k| !template.record_keys().any(|f| f == *k))
            .collect()
    }
}

/// What kind of failure an [`ErrorRecord`] describes. Not serialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The classifier returned neither known label; extraction was skipped.
    Unsupported,
    /// The extraction reply could not be turned into a JSON object.
    Parse,
    /// The image could not be read or a model call failed.
    Processing,
}

/// Diagnostic record stored in place of an [`ExtractedRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub raw_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip)]
    kind: FailureKind,
}

impl ErrorRecord {
    /// `{ "error": "Unsupported document type", "type": <raw label> }`
    pub fn unsupported(raw_label: impl Into<String>) -> Self {
        Self {
            error: UNSUPPORTED_DOCUMENT_TYPE.to_string(),
            raw_response: None,
            raw_type: Some(raw_label.into()),
            document_type: None,
            kind: FailureKind::Unsupported,
        }
    }

    /// `{ "error": <message>, "raw_response": <reply>, "document_type": <label> }`
    pub fn parse_failure(
        message: impl Into<String>,
        raw_response: impl Into<String>,
        document_type: &DocumentType,
    ) -> Self {
        Self {
            error: message.into(),
            raw_response: Some(raw_response.into()),
            raw_type: None,
            document_type: Some(document_type.as_label().to_string()),
            kind: FailureKind::Parse,
        }
    }

    /// `{ "error": <message> }`
    pub fn processing(error: &ImageError) -> Self {
        Self {
            error: error.to_string(),
            raw_response: None,
            raw_type: None,
            document_type: None,
            kind: FailureKind::Processing,
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }
}

/// Outcome for one image: exactly one of the two record shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImageRecord {
    Extracted(ExtractedRecord),
    Failed(ErrorRecord),
}

impl ImageRecord {
    pub fn is_extracted(&self) -> bool {
        matches!(self, ImageRecord::Extracted(_))
    }

    pub fn as_extracted(&self) -> Option<&ExtractedRecord> {
        match self {
            ImageRecord::Extracted(r) => Some(r),
            ImageRecord::Failed(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorRecord> {
        match self {
            ImageRecord::Extracted(_) => None,
            ImageRecord::Failed(e) => Some(e),
        }
    }
}

impl From<ExtractedRecord> for ImageRecord {
    fn from(r: ExtractedRecord) -> Self {
        ImageRecord::Extracted(r)
    }
}

impl From<ErrorRecord> for ImageRecord {
    fn from(e: ErrorRecord) -> Self {
        ImageRecord::Failed(e)
    }
}

/// Filename → record for a whole batch, in insertion order.
///
/// Records are only ever read or serialised after insertion; there is no
/// mutable access to a stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: Vec<(String, ImageRecord)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `file_name`.
    ///
    /// A filename appears at most once: inserting it again replaces the
    /// previous record in its original position and returns the old one.
    pub fn insert(&mut self, file_name: impl Into<String>, record: ImageRecord) -> Option<ImageRecord> {
        let file_name = file_name.into();
        match self.entries.iter().position(|(name, _)| *name == file_name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, record)),
            None => {
                self.entries.push((file_name, record));
                None
            }
        }
    }

    pub fn get(&self, file_name: &str) -> Option<&ImageRecord> {
        self.entries
            .iter()
            .find(|(name, _)| name == file_name)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageRecord)> {
        self.entries.iter().map(|(name, r)| (name.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON (2-space indentation) of the whole set.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, record) in &self.entries {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

/// Aggregate counters for a batch run, derived from its [`ResultSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_images: usize,
    pub extracted: usize,
    pub unsupported: usize,
    pub parse_failures: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub fn from_results(results: &ResultSet, total_duration_ms: u64) -> Self {
        let mut stats = BatchStats {
            total_images: results.len(),
            total_duration_ms,
            ..Default::default()
        };
        for (_, record) in results.iter() {
            match record {
                ImageRecord::Extracted(_) => stats.extracted += 1,
                ImageRecord::Failed(e) => match e.kind() {
                    FailureKind::Unsupported => stats.unsupported += 1,
                    FailureKind::Parse => stats.parse_failures += 1,
                    FailureKind::Processing => stats.failed += 1,
                },
            }
        }
        stats
    }
}

/// Everything a batch run produces.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub results: ResultSet,
    pub stats: BatchStats,
}
