//! Imported content payloads
//!
//! `ImportedContentInput` is what producers enqueue; `ImportedContent` is the
//! record the content store persists for it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of imported content as carried by a queue message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedContentInput {
    pub content_name: String,
    pub content_type: String,
    pub link: String,
    pub overview: String,
    pub source: String,
    /// Comma-separated tag string, possibly empty.
    pub tags: String,
}

impl ImportedContentInput {
    /// Tags split on `,`, trimmed, with empty entries dropped.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedContent {
    pub id: Uuid,
    pub content_name: String,
    pub content_type: String,
    pub link: String,
    pub overview: String,
    pub source: String,
    pub tags: Vec<String>,
    pub created_at: u64,
}

impl ImportedContent {
    pub fn from_input(input: &ImportedContentInput, created_at: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_name: input.content_name.clone(),
            content_type: input.content_type.clone(),
            link: input.link.clone(),
            overview: input.overview.clone(),
            source: input.source.clone(),
            tags: input.tag_list(),
            created_at,
        }
    }
}
