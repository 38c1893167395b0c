//! drip-worker: pulls imported content off SQS, hands each payload to a
//! bounded pool of workers and deletes what was handled.
pub mod app;
pub mod config;
pub mod emit;
pub mod errors;
pub mod ingest;
pub mod transform;
pub mod types;
pub mod util;

pub use app::{PoolObserver, Submit, TracingObserver, WorkerPool};
pub use errors::DripError;
pub use util::shutdown::{Shutdown, ShutdownTrigger};

// Configure a global allocator optimized for throughput.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
