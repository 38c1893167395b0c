//! App runtime: business-operation seam, worker pool and the restart loop.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::errors::DripError;
use crate::ingest::Queue;
use crate::types::ImportedContentInput;
use crate::util::shutdown::Shutdown;

pub mod observer;
pub mod pool;

pub use observer::{PoolObserver, TracingObserver};
pub use pool::WorkerPool;

/// The business operation a worker runs for every decoded payload.
///
/// `Ok` leads to the message being acknowledged; `Err` leaves it on the queue
/// for redelivery. The pool never aborts a running call: implementations that
/// should stop early on shutdown must check `shutdown` themselves.
#[async_trait]
pub trait Submit<P: Send + Sync>: Send + Sync + 'static {
    async fn submit(&self, payload: &P, shutdown: &Shutdown) -> Result<(), DripError>;
}

/// Keep a drip worker running until shutdown.
///
/// Every attempt gets a fresh pool from `make_pool`. When an attempt ends
/// (fatal source error or the source running dry) the loop waits
/// `restart_delay` and starts again.
pub async fn run<F, Q, S>(mut make_pool: F, mut shutdown: Shutdown, restart_delay: Duration)
where
    F: FnMut() -> WorkerPool<Q, S>,
    Q: Queue + ?Sized,
    S: Submit<ImportedContentInput>,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        let pool = make_pool();
        info!(attempt, max_workers = pool.max_workers(), "starting drip worker");

        match pool.start(shutdown.clone()).await {
            Ok(()) => info!(attempt, "drip worker stopped"),
            Err(e) => error!(attempt, fatal = e.is_fatal(), error = %e, "drip worker failed"),
        }

        if shutdown.is_shutdown() {
            info!("shutdown: drip worker drained");
            return;
        }

        warn!(?restart_delay, "restarting drip worker");
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(restart_delay) => {}
        }
    }
}
