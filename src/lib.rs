// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod app;
pub mod classify;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod scheduler;
pub mod store;
pub mod summarize;

pub use crate::classify::Classifier;
pub use crate::ingest::types::{Collector, CollectorError, RawItem};
pub use crate::ingest::{Orchestrator, OrchestratorCfg};
pub use crate::notify::{Message, Notifier, NotifierMux};
pub use crate::scheduler::{AnalysisReport, FastReport, JobScheduler, SchedulerCfg};
pub use crate::store::{PendingQueue, SeenLedger};
