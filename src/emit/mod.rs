//! Content store: the production `Submit` for imported content.
//!
//! Each accepted payload becomes one [`ImportedContent`] record (fresh id,
//! split tag list) written as a JSON object to blob storage under a key from
//! a [`ContentKeyBuilder`].

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::app::Submit;
use crate::errors::DripError;
use crate::transform::encode::{encode_content_record, CONTENT_TYPE_JSON};
use crate::types::{ImportedContent, ImportedContentInput};
use crate::util::shutdown::Shutdown;
use crate::util::time::now_unix;

pub mod uploader;

#[async_trait]
pub trait BlobStore: Clone + Send + Sync + 'static {
    async fn put_bytes(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), DripError>;
}

pub trait ContentKeyBuilder: Send + Sync + 'static {
    fn content_key(&self, record: &ImportedContent, secs: u64, nanos: u32) -> String;
}

/// `{prefix}/imported-content/{id}/{secs}-{nanos:09}.json`
#[derive(Clone, Debug)]
pub struct SimpleKeyBuilder {
    prefix: String,
}

impl SimpleKeyBuilder {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl ContentKeyBuilder for SimpleKeyBuilder {
    fn content_key(&self, record: &ImportedContent, secs: u64, nanos: u32) -> String {
        format!(
            "{}/imported-content/{}/{}-{:09}.json",
            self.prefix, record.id, secs, nanos
        )
    }
}

pub struct ContentStore<B, K = SimpleKeyBuilder> {
    store: B,
    bucket: String,
    keys: K,
}

impl<B: BlobStore, K: ContentKeyBuilder> ContentStore<B, K> {
    pub fn new(store: B, bucket: &str, keys: K) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            keys,
        }
    }

    /// Build, encode and upload the record for `input`; returns what was stored.
    pub async fn put_imported_content(
        &self,
        input: &ImportedContentInput,
    ) -> Result<ImportedContent, DripError> {
        let (secs, nanos) = now_unix();
        let record = ImportedContent::from_input(input, secs);
        let key = self.keys.content_key(&record, secs, nanos);
        let body = encode_content_record(&record)?;

        self.store
            .put_bytes(&self.bucket, &key, body, Some(CONTENT_TYPE_JSON))
            .await
            .map_err(|e| DripError::Submit(format!("store {key}: {e}")))?;

        debug!(content_id = %record.id, tags = record.tags.len(), %key, "stored imported content");
        Ok(record)
    }
}

#[async_trait]
impl<B: BlobStore, K: ContentKeyBuilder> Submit<ImportedContentInput> for ContentStore<B, K> {
    async fn submit(
        &self,
        payload: &ImportedContentInput,
        shutdown: &Shutdown,
    ) -> Result<(), DripError> {
        if shutdown.is_shutdown() {
            return Err(DripError::Shutdown);
        }
        self.put_imported_content(payload).await.map(|_| ())
    }
}
