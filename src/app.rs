// src/app.rs
//! Wiring from [`AppConfig`] to a ready [`JobScheduler`].

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::classify::Classifier;
use crate::config::AppConfig;
use crate::ingest::providers::{default_registry, http_client};
use crate::ingest::{Orchestrator, OrchestratorCfg};
use crate::notify::{
    EmailNotifier, LogNotifier, Notifier, NotifierMux, SlackNotifier, WxPusherNotifier,
};
use crate::scheduler::{JobScheduler, SchedulerCfg};
use crate::store::{PendingQueue, SeenLedger};
use crate::summarize::{DisabledSummarizer, OpenAiSummarizer, Summarizer};

/// Every configured channel; the log channel when none is.
pub fn build_notifier(cfg: &AppConfig, client: &reqwest::Client) -> anyhow::Result<NotifierMux> {
    let mut mux = NotifierMux::new();
    if let Some(wx) = &cfg.notify.wxpusher {
        mux = mux.with(Arc::new(WxPusherNotifier::new(
            client.clone(),
            wx.app_token.clone(),
            wx.uid.clone(),
        )));
    }
    if let Some(url) = &cfg.notify.slack_webhook {
        mux = mux.with(Arc::new(SlackNotifier::new(client.clone(), url.clone())));
    }
    if let Some(email) = &cfg.notify.email {
        mux = mux.with(Arc::new(
            EmailNotifier::from_config(email).context("email notifier")?,
        ));
    }
    if mux.is_empty() {
        tracing::warn!("no notification channel configured; messages go to the log");
        mux = mux.with(Arc::new(LogNotifier));
    }
    Ok(mux)
}

pub fn build_summarizer(cfg: &AppConfig, client: &reqwest::Client) -> Arc<dyn Summarizer> {
    let s = &cfg.summarizer;
    match &s.api_key {
        Some(key) => Arc::new(
            OpenAiSummarizer::new(client.clone(), key.clone())
                .with_base_url(s.base_url.clone())
                .with_model(s.model.clone())
                .with_limits(s.max_tokens, s.temperature),
        ),
        None => {
            tracing::warn!("no summarizer api key; analysis uses fallback text");
            Arc::new(DisabledSummarizer)
        }
    }
}

/// Build every collaborator. Any error here is a startup failure.
pub fn build_scheduler(
    cfg: &AppConfig,
    fast_interval: Duration,
    analysis_interval: Duration,
) -> anyhow::Result<JobScheduler> {
    let timeout = Duration::from_secs(cfg.ingest.collector_timeout_secs);
    let client = http_client(&cfg.ingest.user_agent, timeout).context("building http client")?;

    let ledger = SeenLedger::open(&cfg.state.ledger_path, cfg.state.ledger_retention_days);
    let queue = PendingQueue::open(&cfg.state.queue_path, cfg.state.queue_retention_days);

    let (collectors, groups) = default_registry(client.clone(), timeout);
    let mut orchestrator = Orchestrator::new(
        ledger,
        Classifier::default(),
        OrchestratorCfg {
            max_workers: cfg.ingest.max_workers,
            collector_timeout: timeout,
        },
    )
    .with_collectors(collectors);
    for g in groups {
        orchestrator = orchestrator.with_collapse_group(g);
    }

    let mux = build_notifier(cfg, &client)?;
    let channels = mux.channel_names();
    let notifier: Arc<dyn Notifier> = Arc::new(mux);
    let summarizer = build_summarizer(cfg, &client);
    let sched_cfg = SchedulerCfg::from_buckets(&cfg.buckets)
        .with_summarize(cfg.summarizer.concurrency, cfg.summarizer.fallback_chars)
        .with_intervals(fast_interval, analysis_interval);

    tracing::info!(
        collectors = ?orchestrator.collector_names(),
        channels = ?channels,
        summarizer = summarizer.name(),
        ledger = %cfg.state.ledger_path.display(),
        queue = %cfg.state.queue_path.display(),
        "collaborators ready"
    );

    Ok(JobScheduler::new(
        orchestrator,
        queue,
        summarizer,
        notifier,
        sched_cfg,
    ))
}
