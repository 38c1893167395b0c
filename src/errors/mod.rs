//! Error types for drip-worker
//!
//! Overview
//! --------
//! Canonical error enumeration used across ingestion, decoding, the worker
//! pool and the content store. Keep variants stable and descriptive; map
//! external library errors into these variants at module boundaries.
//!
//! Usage
//! -----
//! - Convert low-level errors at the edge (SQS, S3, serde_json, env).
//! - Only `Receive` is fatal to a running pool; every other variant is a
//!   per-message outcome that ends in a log line and queue redelivery.
//!
//! Concurrency / Logging
//! ---------------------
//! Errors are `Send + Sync` and implement Display via `thiserror`.
//! Use `tracing` (through the pool observer) for context at call sites.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DripError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure to initialize external services (client wiring, queue lookup).
    #[error("Message source initialization failed: {0}")]
    SourceInit(String),

    /// The queue poll call itself failed (transport/auth). Fatal to the source.
    #[error("Queue receive failed: {0}")]
    Receive(String),

    /// A single queue body could not be turned into a payload.
    #[error("Queue message decode error: {0}")]
    Decode(String),

    /// Deleting a handled delivery from the queue failed.
    #[error("Acknowledge failed: {0}")]
    Ack(String),

    /// The injected business operation rejected a payload.
    #[error("Submit failed: {0}")]
    Submit(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Shutdown requested")]
    Shutdown,

    #[error("Unknown error: {0}")]
    Unknown(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl DripError {
    /// True for errors that end a message source rather than one message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DripError::Receive(_) | DripError::SourceInit(_))
    }
}

impl From<serde_json::Error> for DripError {
    fn from(err: serde_json::Error) -> Self {
        DripError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_source_errors_are_fatal() {
        assert!(DripError::Receive("denied".into()).is_fatal());
        assert!(DripError::SourceInit("no queue".into()).is_fatal());
        assert!(!DripError::Decode("bad json".into()).is_fatal());
        assert!(!DripError::Ack("expired".into()).is_fatal());
        assert!(!DripError::Shutdown.is_fatal());
    }

    #[test]
    fn serde_errors_map_to_decode() {
        let err: DripError = serde_json::from_slice::<serde_json::Value>(b"{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DripError::Decode(_)));
    }
}
