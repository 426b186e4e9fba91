// src/metrics.rs
//! Prometheus exposition for the relay. Counters are recorded where the work
//! happens; this module installs the recorder and exports the run settings.

use anyhow::Context;
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::scheduler::JobScheduler;

/// Settings fixed for the life of the process, exported once as gauges so the
/// counters can be read against the caps that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayInfo {
    pub collectors: usize,
    pub fast_interval_secs: u64,
    pub analysis_interval_secs: u64,
    /// `(stage, policy cap, general cap)` for immediate, enqueue and analysis.
    pub caps: Vec<(&'static str, usize, usize)>,
}

impl RelayInfo {
    pub fn from_scheduler(sched: &JobScheduler) -> Self {
        let cfg = sched.cfg();
        Self {
            collectors: sched.orchestrator().collector_names().len(),
            fast_interval_secs: cfg.fast_interval.as_secs(),
            analysis_interval_secs: cfg.analysis_interval.as_secs(),
            caps: vec![
                ("immediate", cfg.immediate.policy, cfg.immediate.general),
                ("enqueue", cfg.enqueue.policy, cfg.enqueue.general),
                ("analysis", cfg.analysis.policy, cfg.analysis.general),
            ],
        }
    }

    pub fn record(&self) {
        gauge!("process_start_ts").set(chrono::Utc::now().timestamp() as f64);
        gauge!("relay_collectors").set(self.collectors as f64);
        gauge!("relay_fast_interval_seconds").set(self.fast_interval_secs as f64);
        gauge!("relay_analysis_interval_seconds").set(self.analysis_interval_secs as f64);
        for &(stage, policy, general) in &self.caps {
            gauge!("relay_bucket_cap", "stage" => stage, "bucket" => "policy").set(policy as f64);
            gauge!("relay_bucket_cap", "stage" => stage, "bucket" => "general").set(general as f64);
        }
    }
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub const SERVICE: &'static str = "sector-news-relay";

    fn builder() -> PrometheusBuilder {
        PrometheusBuilder::new().add_global_label("service", Self::SERVICE)
    }

    /// Install the global Prometheus recorder. Call at most once per process.
    pub fn init(info: &RelayInfo) -> anyhow::Result<Self> {
        let handle = Self::builder()
            .install_recorder()
            .context("prometheus: install recorder")?;
        info.record();
        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format, plus a bare `/healthz`.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new()
            .route(
                "/metrics",
                get(move || {
                    let h = handle.clone();
                    async move { h.render() }
                }),
            )
            .route("/healthz", get(|| async { "ok" }))
    }
}
