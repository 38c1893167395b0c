//! Decode boundary for queue bodies.
//!
//! The only place raw bytes become an [`ImportedContentInput`]. A record that
//! is not valid JSON, misses a key, or carries a blank name/type/link is
//! rejected here so partially populated payloads never reach the handler.

use crate::errors::DripError;
use crate::types::ImportedContentInput;

pub fn decode_content(body: &[u8]) -> Result<ImportedContentInput, DripError> {
    let input: ImportedContentInput = serde_json::from_slice(body)?;
    validate(&input)?;
    Ok(input)
}

fn validate(input: &ImportedContentInput) -> Result<(), DripError> {
    for (field, value) in [
        ("content_name", &input.content_name),
        ("content_type", &input.content_type),
        ("link", &input.link),
    ] {
        if value.trim().is_empty() {
            return Err(DripError::Decode(format!("{field} must not be blank")));
        }
    }
    Ok(())
}
