//! Payload and record types shared across the crate.
//!
//! This module remains dependency-light to avoid cyclic build edges.
pub mod content;

pub use content::{ImportedContent, ImportedContentInput};
