//! Cooperative shutdown signal
//!
//! A `watch` channel carrying a single "stop" flag. The trigger side is held
//! by whoever owns process lifetime (ctrl-c handler, tests); every task gets a
//! cloned [`Shutdown`] and checks it between units of work. Dropping the
//! trigger counts as a shutdown request.

use tokio::sync::watch;

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace never fails, even with no receivers left.
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested. Cancel-safe.
    pub async fn cancelled(&mut self) {
        // Err means the trigger is gone, which we treat as a stop request.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
