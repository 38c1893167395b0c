//! Stored record encoding
//!
//! Overview
//! --------
//! Imported content is persisted as one self-contained JSON object per record
//! (`application/json`). New fields should be added as optional keys so older
//! readers keep working.

use bytes::Bytes;

use crate::errors::DripError;
use crate::types::ImportedContent;

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub fn encode_content_record(record: &ImportedContent) -> Result<Bytes, DripError> {
    serde_json::to_vec(record)
        .map(Bytes::from)
        .map_err(|e| DripError::Submit(format!("encode record: {e}")))
}
