use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::DripError;

/// SQS caps a single receive at 10 entries.
pub const MAX_BATCH_SIZE: i32 = 10;

pub const DEFAULT_MAX_WORKERS: usize = 10;
pub const DEFAULT_RESTART_DELAY_MS: u64 = 1_000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub drip_queue_url: String,
    pub max_workers: usize,
    pub batch_size: i32,
    pub wait_time_secs: i32,
    pub visibility_timeout_secs: i32,
    pub aws_region: String,
    pub aws_endpoint_url: Option<String>,
    pub s3_bucket_name: String,
    pub s3_prefix: String,
    pub restart_delay_ms: u64,
}

impl Config {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            batch_size: self.batch_size,
            wait_time_secs: self.wait_time_secs,
            visibility_timeout_secs: self.visibility_timeout_secs,
        }
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Shared AWS config (credentials from the usual AWS_* sources).
    pub async fn load_aws_config(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.aws_region.clone()));
        if let Some(endpoint) = &self.aws_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        loader.load().await
    }
}

/// Receive parameters for one queue poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Max entries per receive.
    pub batch_size: i32,
    /// Server-side long-poll window when the queue is empty.
    pub wait_time_secs: i32,
    /// Grace period during which a received entry is hidden from other pollers.
    pub visibility_timeout_secs: i32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            wait_time_secs: 5,
            visibility_timeout_secs: 20,
        }
    }
}

pub fn load_config() -> Result<Config, DripError> {
    dotenv().ok();
    let defaults = PollSettings::default();

    let drip_queue_url = required("SQS_DRIP_URL")?;
    let max_workers: usize = optional("SQS_MAX_WORKERS", DEFAULT_MAX_WORKERS)?;
    if max_workers == 0 {
        return Err(DripError::Config("SQS_MAX_WORKERS must be positive".into()));
    }
    let batch_size: i32 = optional("SQS_BATCH_SIZE", defaults.batch_size)?;
    if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
        return Err(DripError::Config(format!(
            "SQS_BATCH_SIZE must be within 1..={MAX_BATCH_SIZE}, got {batch_size}"
        )));
    }
    let wait_time_secs = optional("SQS_WAIT_TIME_SECS", defaults.wait_time_secs)?;
    let visibility_timeout_secs =
        optional("SQS_VISIBILITY_TIMEOUT_SECS", defaults.visibility_timeout_secs)?;
    let aws_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into());
    let aws_endpoint_url = env::var("AWS_ENDPOINT_URL").ok().filter(|s| !s.is_empty());
    let s3_bucket_name = required("S3_BUCKET_NAME")?;
    let s3_prefix = env::var("S3_PREFIX").unwrap_or_else(|_| "imported-content".into());
    let restart_delay_ms = optional("RESTART_DELAY_MS", DEFAULT_RESTART_DELAY_MS)?;

    Ok(Config {
        drip_queue_url,
        max_workers,
        batch_size,
        wait_time_secs,
        visibility_timeout_secs,
        aws_region,
        aws_endpoint_url,
        s3_bucket_name,
        s3_prefix,
        restart_delay_ms,
    })
}

fn required(key: &str) -> Result<String, DripError> {
    env::var(key).map_err(|_| DripError::Config(format!("{key} is not set")))
}

fn optional<T: FromStr>(key: &str, default: T) -> Result<T, DripError> {
    match env::var(key) {
        Ok(raw) => parse_var(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T, DripError> {
    raw.trim()
        .parse()
        .map_err(|_| DripError::Config(format!("{key} has invalid value {raw:?}")))
}
