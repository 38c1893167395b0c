//! drip-worker: entrypoint
//!
//! Overview
//! --------
//! Connects to the drip SQS queue, decodes imported content messages, stores
//! each one through the content store and deletes handled messages.
//!
//! Responsibilities
//! ----------------
//! - Initialize logging, configuration and the AWS clients.
//! - Run the worker pool under the restart loop with graceful shutdown.
//!
//! Error Model
//! -----------
//! - Initialization failures are fatal.
//! - Per-message failures are logged and left to SQS redelivery.
//! - Queue receive failures end one pool; the restart loop starts a new one.

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use drip_worker::app::{self, TracingObserver, WorkerPool};
use drip_worker::config::load_config;
use drip_worker::emit::uploader::{create_s3_client, S3BlobStore};
use drip_worker::emit::{ContentStore, SimpleKeyBuilder};
use drip_worker::ingest::sqs::SqsQueue;
use drip_worker::util::shutdown::Shutdown;

pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().compact())
        .with(ErrorLayer::default())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    info!("drip worker starting");

    let config = load_config()?;
    let shared = config.load_aws_config().await;

    let sqs = aws_sdk_sqs::Client::new(&shared);
    let queue = Arc::new(
        SqsQueue::new(sqs, &config.drip_queue_url).with_settings(config.poll_settings()),
    );
    queue.ensure_queue().await?;

    let s3 = create_s3_client(&shared, &config);
    let store = Arc::new(ContentStore::new(
        S3BlobStore::new(s3),
        &config.s3_bucket_name,
        SimpleKeyBuilder::new(&config.s3_prefix),
    ));

    let (trigger, shutdown) = Shutdown::new();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("ctrl-c: draining"),
            Err(e) => error!(error = %e, "ctrl-c handler failed; shutting down"),
        }
        trigger.trigger();
    });

    let observer = Arc::new(TracingObserver);
    let max_workers = config.max_workers;
    let source_buffer = config.batch_size as usize;
    app::run(
        || {
            WorkerPool::new(queue.clone(), store.clone(), max_workers)
                .with_source_buffer(source_buffer)
                .with_observer(observer.clone())
        },
        shutdown,
        config.restart_delay(),
    )
    .await;

    info!("drip worker exited");
    Ok(())
}
