//! S3 client utilities and the S3-backed [`BlobStore`].

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::config::Config;
use crate::emit::BlobStore;
use crate::errors::DripError;

/// Build an S3 client from the shared AWS config. Local stacks (S3 mocks)
/// need path-style addressing, so it is forced whenever an endpoint override is set.
pub fn create_s3_client(shared: &aws_config::SdkConfig, cfg: &Config) -> Client {
    let conf = aws_sdk_s3::config::Builder::from(shared)
        .force_path_style(cfg.aws_endpoint_url.is_some())
        .build();
    Client::from_conf(conf)
}

/// Simple single-object PUT.
pub async fn upload_bytes_to_s3(
    client: &Client,
    bucket: &str,
    key: &str,
    data: Bytes,
    content_type: Option<&str>,
) -> Result<()> {
    let len = data.len() as i64;
    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_length(len)
        .body(ByteStream::from(data));

    if let Some(ct) = content_type {
        req = req.content_type(ct);
    }

    req.send()
        .await
        .map_err(|e| anyhow::anyhow!("put_object {key}: {}", DisplayErrorContext(&e)))?;
    Ok(())
}

#[derive(Clone, Debug)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_bytes(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), DripError> {
        upload_bytes_to_s3(&self.client, bucket, key, bytes, content_type)
            .await
            .map_err(|e| DripError::Upload(format!("{e:#}")))
    }
}
