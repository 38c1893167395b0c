//! Ingest abstraction
//!
//! Overview
//! --------
//! Minimal trait representing a durable, at-least-once queue plus the poll
//! task that turns it into a cursor of decoded [`Message`]s. The concrete
//! implementation is SQS ([`sqs::SqsQueue`]).
//!
//! Error Model
//! -----------
//! - A body that fails to decode is reported and skipped; the entry is not
//!   deleted, so the queue redelivers it after the visibility timeout.
//! - A failing `receive` is fatal: the poll task records the error on the
//!   cursor and stops. Messages already buffered are still handed out.
//! - A closed queue (`receive` yielding `None`) ends the cursor cleanly.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::app::observer::PoolObserver;
use crate::errors::DripError;
use crate::transform::decode::decode_content;
use crate::types::ImportedContentInput;
use crate::util::shutdown::Shutdown;

pub mod cursor;
pub mod sqs;

pub use cursor::{cursor, Cursor, CursorWriter};

/// One raw queue entry.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Delivery handle; deleting by it removes this delivery from the queue.
    pub receipt_handle: String,
    pub body: Bytes,
}

#[async_trait::async_trait]
pub trait Queue: Send + Sync + 'static {
    /// One poll. An empty batch means the wait window elapsed with nothing to
    /// read; `None` means the queue is closed for good and polling should stop.
    async fn receive(&self) -> Result<Option<Vec<QueueMessage>>, DripError>;

    /// Acknowledge successful processing so the backend stops redelivering.
    async fn delete(&self, receipt_handle: &str) -> Result<(), DripError>;
}

type AckFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), DripError>> + Send>;

/// A decoded payload bound to the delivery it came from.
pub struct Message<P> {
    pub payload: P,
    receipt_handle: String,
    ack: AckFn,
}

impl<P> Message<P> {
    pub fn new<F>(payload: P, receipt_handle: impl Into<String>, ack: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, Result<(), DripError>> + Send + 'static,
    {
        Self {
            payload,
            receipt_handle: receipt_handle.into(),
            ack: Box::new(ack),
        }
    }

    pub fn receipt_handle(&self) -> &str {
        &self.receipt_handle
    }

    /// Deletes the delivery from the queue. Consumes the message, so it can
    /// only be acknowledged once.
    pub async fn acknowledge(self) -> Result<(), DripError> {
        (self.ack)().await
    }
}

impl<P: fmt::Debug> fmt::Debug for Message<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("payload", &self.payload)
            .field("receipt_handle", &self.receipt_handle)
            .finish_non_exhaustive()
    }
}

/// Spawn the poll task and return a cursor over decoded messages.
///
/// `buffer` bounds how many decoded messages may wait in the cursor; the poll
/// task stalls (and stops polling) while it is full.
pub fn read_messages<Q>(
    queue: Arc<Q>,
    buffer: usize,
    observer: Arc<dyn PoolObserver>,
    shutdown: Shutdown,
) -> Cursor<Message<ImportedContentInput>>
where
    Q: Queue + ?Sized,
{
    let (writer, cur) = cursor(buffer);
    tokio::spawn(poll_loop(queue, writer, observer, shutdown));
    cur
}

async fn poll_loop<Q>(
    queue: Arc<Q>,
    writer: CursorWriter<Message<ImportedContentInput>>,
    observer: Arc<dyn PoolObserver>,
    mut shutdown: Shutdown,
) where
    Q: Queue + ?Sized,
{
    while !shutdown.is_shutdown() {
        let polled = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            polled = queue.receive() => polled,
        };

        let batch = match polled {
            Ok(Some(batch)) => batch,
            Ok(None) => return,
            Err(e) => {
                observer.source_failed(&e);
                writer.fail(e);
                return;
            }
        };

        for raw in batch {
            let payload = match decode_content(&raw.body) {
                Ok(p) => p,
                Err(e) => {
                    observer.decode_failed(&raw.receipt_handle, &e);
                    continue;
                }
            };

            let q = queue.clone();
            let handle = raw.receipt_handle.clone();
            let ack = move || -> BoxFuture<'static, Result<(), DripError>> {
                Box::pin(async move { q.delete(&handle).await })
            };
            observer.message_received(&raw.receipt_handle);
            let msg = Message::new(payload, raw.receipt_handle, ack);

            if writer.send(msg).await.is_err() {
                // Cursor closed: nobody is reading any more.
                return;
            }
        }
    }
}
