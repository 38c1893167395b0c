//! Structured events emitted by the message source and the worker pool.
//!
//! Call sites report through an injected [`PoolObserver`] instead of logging
//! directly, so tests can count outcomes and deployments can route them.

use crate::errors::DripError;
use tracing::{debug, error, warn};

/// Every event defaults to a no-op; implement the ones you care about.
#[allow(unused_variables)]
pub trait PoolObserver: Send + Sync {
    fn worker_started(&self, worker: usize) {}
    fn worker_stopped(&self, worker: usize) {}
    fn message_received(&self, receipt_handle: &str) {}
    /// A queue entry was skipped at the decode boundary and left for redelivery.
    fn decode_failed(&self, receipt_handle: &str, err: &DripError) {}
    fn submit_failed(&self, receipt_handle: &str, err: &DripError) {}
    fn acknowledged(&self, receipt_handle: &str) {}
    fn ack_failed(&self, receipt_handle: &str, err: &DripError) {}
    fn source_failed(&self, err: &DripError) {}
    fn worker_panicked(&self, reason: &str) {}
}

/// Default observer: one `tracing` event per outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PoolObserver for TracingObserver {
    fn worker_started(&self, worker: usize) {
        debug!(worker, "drip worker started");
    }

    fn worker_stopped(&self, worker: usize) {
        debug!(worker, "drip worker stopped");
    }

    fn message_received(&self, receipt_handle: &str) {
        #[cfg(debug_assertions)]
        debug!(receipt = %short(receipt_handle), "received message from queue");
        #[cfg(not(debug_assertions))]
        let _ = receipt_handle;
    }

    fn decode_failed(&self, receipt_handle: &str, err: &DripError) {
        error!(error = %err, receipt = %short(receipt_handle), "skipping undecodable message");
    }

    fn submit_failed(&self, receipt_handle: &str, err: &DripError) {
        error!(error = %err, receipt = %short(receipt_handle), "failed to handle message");
    }

    fn acknowledged(&self, receipt_handle: &str) {
        debug!(receipt = %short(receipt_handle), "message acknowledged");
    }

    fn ack_failed(&self, receipt_handle: &str, err: &DripError) {
        warn!(error = %err, receipt = %short(receipt_handle), "ack failed; message may be redelivered");
    }

    fn source_failed(&self, err: &DripError) {
        error!(error = %err, "message source stopped");
    }

    fn worker_panicked(&self, reason: &str) {
        error!(reason, "drip worker task panicked");
    }
}

/// Receipt handles run to hundreds of bytes; the head is enough to correlate.
fn short(receipt_handle: &str) -> &str {
    match receipt_handle.char_indices().nth(24) {
        Some((idx, _)) => &receipt_handle[..idx],
        None => receipt_handle,
    }
}
