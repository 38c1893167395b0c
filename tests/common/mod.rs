//! ---- Fakes shared by the integration tests ----
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;

use drip_worker::app::{PoolObserver, Submit};
use drip_worker::errors::DripError;
use drip_worker::ingest::{Queue, QueueMessage};
use drip_worker::types::ImportedContentInput;
use drip_worker::util::shutdown::Shutdown;

/// What the queue does once its scripted polls run out.
#[derive(Clone, Copy, Debug)]
pub enum WhenDrained {
    /// Report the queue as closed.
    Close,
    /// Fail every further poll like a revoked credential would.
    Fail,
    /// Behave like an empty long poll.
    Idle,
}

pub struct ScriptedQueue {
    polls: Mutex<VecDeque<Result<Vec<QueueMessage>, DripError>>>,
    when_drained: WhenDrained,
    fail_delete: bool,
    pub receive_calls: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
}

impl ScriptedQueue {
    pub fn new(when_drained: WhenDrained) -> Self {
        Self {
            polls: Mutex::new(VecDeque::new()),
            when_drained,
            fail_delete: false,
            receive_calls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_batch(self, batch: Vec<QueueMessage>) -> Self {
        self.polls.lock().unwrap().push_back(Ok(batch));
        self
    }

    pub fn with_failed_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn deleted_sorted(&self) -> Vec<String> {
        let mut d = self.deleted.lock().unwrap().clone();
        d.sort();
        d
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Queue for ScriptedQueue {
    async fn receive(&self) -> Result<Option<Vec<QueueMessage>>, DripError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(Ok(batch)) => Ok(Some(batch)),
            Some(Err(e)) => Err(e),
            None => match self.when_drained {
                WhenDrained::Close => Ok(None),
                WhenDrained::Fail => Err(DripError::Receive("AccessDenied".into())),
                WhenDrained::Idle => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(Some(Vec::new()))
                }
            },
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), DripError> {
        if self.fail_delete {
            return Err(DripError::Ack("ReceiptHandleIsInvalid".into()));
        }
        self.deleted.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }
}

/// Submitter that records names, fails for chosen names and can be held
/// at a gate to keep calls in flight.
#[derive(Default)]
pub struct RecordingSubmit {
    pub seen: Mutex<Vec<String>>,
    fail_names: HashSet<String>,
    panic_names: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RecordingSubmit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_names.insert(name.to_string());
        self
    }

    pub fn panicking_on(mut self, name: &str) -> Self {
        self.panic_names.insert(name.to_string());
        self
    }

    /// Every call waits for one permit from `gate` before returning.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn seen_sorted(&self) -> Vec<String> {
        let mut s = self.seen.lock().unwrap().clone();
        s.sort();
        s
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Submit<ImportedContentInput> for RecordingSubmit {
    async fn submit(
        &self,
        payload: &ImportedContentInput,
        _shutdown: &Shutdown,
    ) -> Result<(), DripError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.seen.lock().unwrap().push(payload.content_name.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.panic_names.contains(&payload.content_name) {
            panic!("handler blew up on {}", payload.content_name);
        }
        if self.fail_names.contains(&payload.content_name) {
            return Err(DripError::Submit(format!("rejected {}", payload.content_name)));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingObserver {
    pub received: AtomicUsize,
    pub decode_failed: AtomicUsize,
    pub submit_failed: AtomicUsize,
    pub acknowledged: AtomicUsize,
    pub ack_failed: AtomicUsize,
    pub source_failed: AtomicUsize,
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    pub panicked: AtomicUsize,
}

impl CountingObserver {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl PoolObserver for CountingObserver {
    fn worker_started(&self, _worker: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn worker_stopped(&self, _worker: usize) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
    fn message_received(&self, _receipt_handle: &str) {
        self.received.fetch_add(1, Ordering::SeqCst);
    }
    fn decode_failed(&self, _receipt_handle: &str, _err: &DripError) {
        self.decode_failed.fetch_add(1, Ordering::SeqCst);
    }
    fn submit_failed(&self, _receipt_handle: &str, _err: &DripError) {
        self.submit_failed.fetch_add(1, Ordering::SeqCst);
    }
    fn acknowledged(&self, _receipt_handle: &str) {
        self.acknowledged.fetch_add(1, Ordering::SeqCst);
    }
    fn ack_failed(&self, _receipt_handle: &str, _err: &DripError) {
        self.ack_failed.fetch_add(1, Ordering::SeqCst);
    }
    fn source_failed(&self, _err: &DripError) {
        self.source_failed.fetch_add(1, Ordering::SeqCst);
    }
    fn worker_panicked(&self, _reason: &str) {
        self.panicked.fetch_add(1, Ordering::SeqCst);
    }
}

/// ---- Helpers to build queue entries ----

pub fn content(name: &str) -> ImportedContentInput {
    ImportedContentInput {
        content_name: name.to_string(),
        content_type: "article".into(),
        link: format!("https://example.com/{name}"),
        overview: format!("about {name}"),
        source: "rss".into(),
        tags: "news,tech".into(),
    }
}

pub fn entry(name: &str) -> QueueMessage {
    QueueMessage {
        receipt_handle: format!("r-{name}"),
        body: Bytes::from(serde_json::to_vec(&content(name)).unwrap()),
    }
}

pub fn garbage(receipt: &str) -> QueueMessage {
    QueueMessage {
        receipt_handle: receipt.to_string(),
        body: Bytes::from_static(b"{\"content_name\": 42"),
    }
}

pub fn entries(names: &[&str]) -> Vec<QueueMessage> {
    names.iter().map(|n| entry(n)).collect()
}

/// Poll `cond` every few ms until it holds or `within` elapses.
pub async fn eventually(within: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
