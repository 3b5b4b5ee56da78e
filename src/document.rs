//! Document types and their extraction templates.
//!
//! The classifier's reply is an open string. Rather than branching on string
//! equality at the call site, it is parsed once into [`DocumentType`], whose
//! [`DocumentType::Unrecognized`] variant keeps the raw text so the
//! "OTHER / garbage" path is an explicit, testable case.

use crate::prompts::{DRIVERS_LICENSE_PROMPT, PASSPORT_PROMPT};
use std::fmt;

/// Key stamped onto every successfully parsed record by the pipeline.
pub const DOCUMENT_TYPE_KEY: &str = "document_type";

/// Coarse category assigned to an image by the classification call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// Label `DRIVERS_LICENSE`.
    DriversLicense,
    /// Label `PASSPORT`.
    Passport,
    /// Anything else the classifier said, verbatim after trimming.
    /// Includes `OTHER`, the empty string and lowercase variants.
    Unrecognized(String),
}

impl DocumentType {
    /// Parse a classifier reply.
    ///
    /// Surrounding whitespace is trimmed; the rest is matched exactly and
    /// case-sensitively. `"passport"` is therefore `Unrecognized`.
    pub fn from_label(reply: &str) -> Self {
        match reply.trim() {
            "DRIVERS_LICENSE" => DocumentType::DriversLicense,
            "PASSPORT" => DocumentType::Passport,
            other => DocumentType::Unrecognized(other.to_string()),
        }
    }

    /// The label written into reports (`document_type` / `type` fields).
    pub fn as_label(&self) -> &str {
        match self {
            DocumentType::DriversLicense => "DRIVERS_LICENSE",
            DocumentType::Passport => "PASSPORT",
            DocumentType::Unrecognized(raw) => raw,
        }
    }

    /// The extraction template for this type, or `None` when unsupported.
    pub fn template(&self) -> Option<&'static ExtractionTemplate> {
        match self {
            DocumentType::DriversLicense => Some(&DRIVERS_LICENSE),
            DocumentType::Passport => Some(&PASSPORT),
            DocumentType::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Fixed instruction and expected output keys for one document type.
///
/// `fields` lists the keys the model is asked to return, in prompt order.
/// The trailing `document_type` key is not part of the list: the pipeline
/// adds it after parsing.
#[derive(Debug)]
pub struct ExtractionTemplate {
    pub instruction: &'static str,
    pub fields: &'static [&'static str],
}

pub static DRIVERS_LICENSE: ExtractionTemplate = ExtractionTemplate {
    instruction: DRIVERS_LICENSE_PROMPT,
    fields: &[
        "license_number",
        "expiration_date",
        "class",
        "last_name",
        "first_name",
        "date_of_birth",
        "sex",
    ],
};

pub static PASSPORT: ExtractionTemplate = ExtractionTemplate {
    instruction: PASSPORT_PROMPT,
    fields: &[
        "passport_number",
        "country_code",
        "last_name",
        "first_name",
        "nationality",
        "date_of_birth",
        "sex",
        "date_of_issue",
        "date_of_expiry",
    ],
};

impl ExtractionTemplate {
    /// Field keys of a complete record: template fields plus `document_type`.
    pub fn record_keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields
            .iter()
            .copied()
            .chain(std::iter::once(DOCUMENT_TYPE_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_parse() {
        assert_eq!(
            DocumentType::from_label("DRIVERS_LICENSE"),
            DocumentType::DriversLicense
        );
        assert_eq!(DocumentType::from_label("  PASSPORT\n"), DocumentType::Passport);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(
            DocumentType::from_label("passport"),
            DocumentType::Unrecognized("passport".into())
        );
    }

    #[test]
    fn other_and_empty_are_unrecognized() {
        let other = DocumentType::from_label("OTHER");
        assert_eq!(other, DocumentType::Unrecognized("OTHER".into()));
        assert!(other.template().is_none());

        let empty = DocumentType::from_label("   ");
        assert_eq!(empty.as_label(), "");
        assert!(empty.template().is_none());
    }

    #[test]
    fn quoted_label_is_not_normalised() {
        let t = DocumentType::from_label("'PASSPORT'");
        assert_eq!(t.as_label(), "'PASSPORT'");
    }

    #[test]
    fn template_field_counts() {
        assert_eq!(DRIVERS_LICENSE.fields.len(), 7);
        assert_eq!(PASSPORT.fields.len(), 9);
        assert_eq!(DRIVERS_LICENSE.record_keys().last(), Some(DOCUMENT_TYPE_KEY));
        assert_eq!(PASSPORT.record_keys().count(), 10);
    }

    #[test]
    fn prompts_request_every_template_field() {
        for template in [&DRIVERS_LICENSE, &PASSPORT] {
            for field in template.fields {
                assert!(
                    template.instruction.contains(&format!("\"{field}\"")),
                    "prompt is missing field {field}"
                );
            }
            assert!(!template.instruction.contains(DOCUMENT_TYPE_KEY));
        }
    }
}
