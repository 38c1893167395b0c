//! Generic pull cursor over a background producer.
//!
//! The producer side ([`CursorWriter`]) pushes items into a bounded channel and
//! may record one fatal error before it stops. The consumer side ([`Cursor`])
//! hands out buffered items first and only reports the error once the buffer
//! has drained and the producer is gone.

use tokio::sync::{mpsc, oneshot};

use crate::errors::DripError;

pub fn cursor<T>(capacity: usize) -> (CursorWriter<T>, Cursor<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (fatal_tx, fatal_rx) = oneshot::channel();
    (
        CursorWriter {
            items: tx,
            fatal: fatal_tx,
        },
        Cursor {
            items: rx,
            fatal: fatal_rx,
            err: None,
        },
    )
}

pub struct CursorWriter<T> {
    items: mpsc::Sender<T>,
    fatal: oneshot::Sender<DripError>,
}

impl<T> CursorWriter<T> {
    /// Waits for buffer space. Hands the item back if the cursor was dropped.
    pub async fn send(&self, item: T) -> Result<(), T> {
        self.items.send(item).await.map_err(|e| e.0)
    }

    /// Records the error that stopped production and closes the stream.
    pub fn fail(self, err: DripError) {
        // The error lands before `items` is dropped, so a drained cursor always sees it.
        let _ = self.fatal.send(err);
    }
}

pub struct Cursor<T> {
    items: mpsc::Receiver<T>,
    fatal: oneshot::Receiver<DripError>,
    err: Option<DripError>,
}

impl<T> Cursor<T> {
    /// Next buffered item, waiting if needed. `None` once the producer has
    /// stopped and everything it produced has been handed out.
    pub async fn next(&mut self) -> Option<T> {
        if self.err.is_some() {
            return None;
        }
        match self.items.recv().await {
            Some(item) => Some(item),
            None => {
                self.take_fatal();
                None
            }
        }
    }

    /// First fatal error the producer recorded, if any. Stops the producer.
    pub fn close(mut self) -> Result<(), DripError> {
        self.items.close();
        self.take_fatal();
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn take_fatal(&mut self) {
        if self.err.is_none() {
            if let Ok(err) = self.fatal.try_recv() {
                self.err = Some(err);
            }
        }
    }
}
