//! Prompts for the two-stage classify-then-extract protocol.
//!
//! The field lists in the extraction prompts must stay in sync with the
//! `fields` arrays in [`crate::document`]; a unit test there enforces it.

/// Instruction for the classification call.
///
/// The reply is trimmed and matched verbatim against the known labels, so the
/// prompt insists on the bare label with no punctuation or prose.
pub const CLASSIFY_PROMPT: &str =
    "What type of document is this? Please respond with only: 'DRIVERS_LICENSE' or 'PASSPORT' or 'OTHER'";

/// Extraction instruction for driver's licenses (7 fields).
pub const DRIVERS_LICENSE_PROMPT: &str = r#"
Extract the following information from this driver's license and return ONLY a JSON object with no additional text or markdown:
- License Number
- Expiration Date
- Class
- Last Name
- First Name
- Date of Birth
- Sex

Use this exact format:
{
    "license_number": "",
    "expiration_date": "",
    "class": "",
    "last_name": "",
    "first_name": "",
    "date_of_birth": "",
    "sex": ""
}
"#;

/// Extraction instruction for passports (9 fields).
pub const PASSPORT_PROMPT: &str = r#"
Extract the following information from this passport and return ONLY a JSON object with no additional text or markdown:
- Passport Number
- Country Code
- Last Name
- First Name
- Nationality
- Date of Birth
- Sex
- Date of Issue
- Date of Expiry

Use this exact format:
{
    "passport_number": "",
    "country_code": "",
    "last_name": "",
    "first_name": "",
    "nationality": "",
    "date_of_birth": "",
    "sex": "",
    "date_of_issue": "",
    "date_of_expiry": ""
}
"#;
