//! Worker pool: one producer, `max_workers` consumers, ack on success.
//!
//! ```text
//! queue --poll task--> Cursor --producer--> mpsc(max_workers) --> consumer × N --> Submit --> ack
//! ```
//!
//! At most `max_workers` payloads are inside `Submit` at any moment: each
//! consumer handles one message at a time on its own task. When every
//! consumer is busy and the channel is full the producer blocks, which in
//! turn stalls the poll task.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::app::observer::{PoolObserver, TracingObserver};
use crate::app::Submit;
use crate::config::MAX_BATCH_SIZE;
use crate::errors::DripError;
use crate::ingest::{read_messages, Cursor, Message, Queue};
use crate::types::ImportedContentInput;
use crate::util::shutdown::Shutdown;

type ContentMessage = Message<ImportedContentInput>;
type SharedReceiver = Arc<Mutex<mpsc::Receiver<ContentMessage>>>;

pub struct WorkerPool<Q: ?Sized, S> {
    source: Arc<Q>,
    submitter: Arc<S>,
    observer: Arc<dyn PoolObserver>,
    max_workers: usize,
    source_buffer: usize,
}

impl<Q, S> WorkerPool<Q, S>
where
    Q: Queue + ?Sized,
    S: Submit<ImportedContentInput>,
{
    /// `max_workers` below one is raised to one.
    pub fn new(source: Arc<Q>, submitter: Arc<S>, max_workers: usize) -> Self {
        Self {
            source,
            submitter,
            observer: Arc::new(TracingObserver),
            max_workers: max_workers.max(1),
            source_buffer: MAX_BATCH_SIZE as usize,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PoolObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// How many decoded messages the poll task may hold ahead of the producer.
    pub fn with_source_buffer(mut self, buffer: usize) -> Self {
        self.source_buffer = buffer.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run until shutdown or until the source stops, then wait for every
    /// consumer to exit.
    ///
    /// Consumes the pool; a stopped pool cannot be restarted. Per-message
    /// failures never surface here; the only error returned is the fatal
    /// source error that ended production.
    pub async fn start(self, shutdown: Shutdown) -> Result<(), DripError> {
        let cursor = read_messages(
            self.source.clone(),
            self.source_buffer,
            self.observer.clone(),
            shutdown.clone(),
        );

        let (tx, rx) = mpsc::channel::<ContentMessage>(self.max_workers);
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for worker in 0..self.max_workers {
            workers.spawn(consume(
                worker,
                rx.clone(),
                self.submitter.clone(),
                self.observer.clone(),
                shutdown.clone(),
            ));
        }
        // Consumers hold the only receivers now; if they all die the producer's send fails.
        drop(rx);

        let producer = tokio::spawn(produce(cursor, tx, shutdown));

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                self.observer.worker_panicked(&e.to_string());
            }
        }

        match producer.await {
            Ok(closed) => closed,
            Err(e) => Err(DripError::Unknown(Box::new(e))),
        }
    }
}

/// Forward cursor items into the work channel; returns the source's terminal state.
async fn produce(
    mut cursor: Cursor<ContentMessage>,
    tx: mpsc::Sender<ContentMessage>,
    mut shutdown: Shutdown,
) -> Result<(), DripError> {
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = cursor.next() => next,
        };
        let Some(msg) = next else { break };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            sent = tx.send(msg) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    // Closing the channel lets consumers drain what is buffered and exit.
    drop(tx);
    cursor.close()
}

async fn consume<S>(
    worker: usize,
    rx: SharedReceiver,
    submitter: Arc<S>,
    observer: Arc<dyn PoolObserver>,
    mut shutdown: Shutdown,
) where
    S: Submit<ImportedContentInput>,
{
    observer.worker_started(worker);

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = async { rx.lock().await.recv().await } => next,
        };
        let Some(msg) = next else { break };

        // A panicking handler costs one unacknowledged message, not the worker.
        let handled = AssertUnwindSafe(handle_message(
            submitter.as_ref(),
            observer.as_ref(),
            msg,
            &shutdown,
        ))
        .catch_unwind()
        .await;
        if let Err(panic) = handled {
            observer.worker_panicked(&panic_reason(panic.as_ref()));
        }
    }

    observer.worker_stopped(worker);
}

/// Submit one payload; acknowledge only if the submit succeeded.
async fn handle_message<S>(
    submitter: &S,
    observer: &dyn PoolObserver,
    msg: ContentMessage,
    shutdown: &Shutdown,
) where
    S: Submit<ImportedContentInput> + ?Sized,
{
    if let Err(e) = submitter.submit(&msg.payload, shutdown).await {
        // Left unacknowledged: the queue redelivers after the visibility timeout.
        observer.submit_failed(msg.receipt_handle(), &e);
        return;
    }

    let receipt = msg.receipt_handle().to_string();
    match msg.acknowledge().await {
        Ok(()) => observer.acknowledged(&receipt),
        Err(e) => observer.ack_failed(&receipt, &e),
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
