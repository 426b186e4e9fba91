// src/scheduler/mod.rs
//! Two-phase job scheduler.
//!
//! The fast job runs the orchestrator, pushes flagship items one by one, sends
//! one capped title+link digest per bucket and enqueues a larger capped slice
//! for later. The analysis job pops a bounded batch, summarizes a capped subset
//! and sends one aggregated message per bucket; the rest of the batch is dropped.
//! Both jobs run on the same task, so they never overlap.

pub mod buckets;
pub mod format;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::BucketConfig;
use crate::ingest::types::RawItem;
use crate::ingest::Orchestrator;
use crate::notify::{Message, Notifier};
use crate::store::PendingQueue;
use crate::summarize::{summarize_batch, Summarizer, Summary};
use buckets::{bucket_of, partition, Bucket, BucketCaps, Partition};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pending_enqueued_total", "Items added to the pending queue.");
        describe_counter!("scheduler_fast_runs_total", "Fast job runs.");
        describe_counter!("scheduler_analysis_runs_total", "Analysis job runs.");
    });
}

#[derive(Debug, Clone)]
pub struct SchedulerCfg {
    pub flagship_tag: String,
    pub immediate: BucketCaps,
    pub enqueue: BucketCaps,
    pub analysis_batch: usize,
    pub analysis: BucketCaps,
    pub summarize_concurrency: usize,
    pub fallback_chars: usize,
    pub fast_interval: Duration,
    pub analysis_interval: Duration,
}

impl SchedulerCfg {
    pub fn from_buckets(b: &BucketConfig) -> Self {
        Self {
            flagship_tag: b.flagship_tag.clone(),
            immediate: BucketCaps::new(b.immediate_policy, b.immediate_general),
            enqueue: BucketCaps::new(
                b.enqueue_policy.max(b.immediate_policy),
                b.enqueue_general.max(b.immediate_general),
            ),
            analysis_batch: b.analysis_batch,
            analysis: BucketCaps::new(b.analysis_policy, b.analysis_general),
            ..Self::default()
        }
    }

    pub fn with_summarize(mut self, concurrency: usize, fallback_chars: usize) -> Self {
        self.summarize_concurrency = concurrency.max(1);
        self.fallback_chars = fallback_chars;
        self
    }

    pub fn with_intervals(mut self, fast: Duration, analysis: Duration) -> Self {
        self.fast_interval = fast;
        self.analysis_interval = analysis;
        self
    }
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        let b = BucketConfig::default();
        Self {
            flagship_tag: b.flagship_tag,
            immediate: BucketCaps::new(b.immediate_policy, b.immediate_general),
            enqueue: BucketCaps::new(b.enqueue_policy, b.enqueue_general),
            analysis_batch: b.analysis_batch,
            analysis: BucketCaps::new(b.analysis_policy, b.analysis_general),
            summarize_concurrency: 4,
            fallback_chars: 500,
            fast_interval: Duration::from_secs(300),
            analysis_interval: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FastReport {
    pub collected_novel: usize,
    pub flagship_pushed: usize,
    pub immediate_policy: usize,
    pub immediate_general: usize,
    pub enqueued: usize,
    /// Non-flagship items beyond the enqueue caps; neither queued nor analysed.
    pub dropped: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub popped: usize,
    pub ignored_flagship: usize,
    pub summarized: usize,
    pub fallbacks: usize,
    pub dropped: usize,
    pub messages: usize,
}

pub struct JobScheduler {
    orchestrator: Orchestrator,
    queue: PendingQueue,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
    cfg: SchedulerCfg,
}

impl JobScheduler {
    pub fn new(
        orchestrator: Orchestrator,
        queue: PendingQueue,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
        cfg: SchedulerCfg,
    ) -> Self {
        Self {
            orchestrator,
            queue,
            summarizer,
            notifier,
            cfg,
        }
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn cfg(&self) -> &SchedulerCfg {
        &self.cfg
    }

    async fn deliver(&self, msg: Message) -> bool {
        match self.notifier.send(&msg).await {
            Ok(()) => true,
            Err(e) => {
                counter!("notify_errors_total", "channel" => self.notifier.name()).increment(1);
                tracing::warn!(title = %msg.title, error = %e, "notification failed");
                false
            }
        }
    }

    /// Fast job: collect, then dispatch.
    pub async fn run_fast(&mut self) -> FastReport {
        let novel = self.orchestrator.run_all().await;
        self.dispatch_fast(novel).await
    }

    /// Route already-novel items: flagship push, capped digests, capped enqueue.
    pub async fn dispatch_fast(&mut self, novel: Vec<RawItem>) -> FastReport {
        ensure_metrics_described();
        counter!("scheduler_fast_runs_total").increment(1);

        let mut report = FastReport {
            collected_novel: novel.len(),
            ..FastReport::default()
        };
        let Partition {
            flagship,
            policy,
            general,
        } = partition(novel, &self.cfg.flagship_tag);

        for item in &flagship {
            self.deliver(format::flagship_message(item)).await;
        }
        report.flagship_pushed = flagship.len();

        for (bucket, items) in [(Bucket::Policy, &policy), (Bucket::General, &general)] {
            let cap = self.cfg.immediate.for_bucket(bucket);
            let slice = &items[..items.len().min(cap)];
            if slice.is_empty() {
                continue;
            }
            self.deliver(format::immediate_message(bucket, slice)).await;
            match bucket {
                Bucket::Policy => report.immediate_policy = slice.len(),
                _ => report.immediate_general = slice.len(),
            }
        }

        let enq_p = self.cfg.enqueue.policy;
        let enq_g = self.cfg.enqueue.general;
        report.dropped =
            policy.len().saturating_sub(enq_p) + general.len().saturating_sub(enq_g);
        let to_queue: Vec<RawItem> = policy
            .into_iter()
            .take(enq_p)
            .chain(general.into_iter().take(enq_g))
            .collect();
        report.enqueued = self.queue.add_many(to_queue);
        counter!("pending_enqueued_total").increment(report.enqueued as u64);

        tracing::info!(
            target: "scheduler",
            novel = report.collected_novel,
            flagship = report.flagship_pushed,
            immediate_policy = report.immediate_policy,
            immediate_general = report.immediate_general,
            enqueued = report.enqueued,
            dropped = report.dropped,
            queue_len = self.queue.len(),
            "fast job finished"
        );
        report
    }

    /// Analysis job: pop, cap, summarize, one message per non-empty bucket.
    pub async fn run_analysis(&mut self) -> AnalysisReport {
        ensure_metrics_described();
        counter!("scheduler_analysis_runs_total").increment(1);

        let popped = self.queue.pop_many(self.cfg.analysis_batch);
        let mut report = AnalysisReport {
            popped: popped.len(),
            ..AnalysisReport::default()
        };
        if popped.is_empty() {
            tracing::debug!(target: "scheduler", "analysis job: queue empty");
            return report;
        }

        let Partition {
            flagship,
            policy,
            general,
        } = partition(popped, &self.cfg.flagship_tag);
        report.ignored_flagship = flagship.len();

        let cap_p = self.cfg.analysis.policy;
        let cap_g = self.cfg.analysis.general;
        report.dropped = policy.len().saturating_sub(cap_p) + general.len().saturating_sub(cap_g);
        let selected: Vec<RawItem> = policy
            .into_iter()
            .take(cap_p)
            .chain(general.into_iter().take(cap_g))
            .collect();

        let summaries = summarize_batch(
            self.summarizer.as_ref(),
            selected,
            self.cfg.summarize_concurrency,
            self.cfg.fallback_chars,
        )
        .await;
        report.summarized = summaries.len();
        report.fallbacks = summaries.iter().filter(|s| s.fallback).count();

        for bucket in [Bucket::Policy, Bucket::General] {
            let group: Vec<&Summary> = summaries
                .iter()
                .filter(|s| bucket_of(&s.item, &self.cfg.flagship_tag) == bucket)
                .collect();
            if group.is_empty() {
                continue;
            }
            self.deliver(format::analysis_message(bucket, &group)).await;
            report.messages += 1;
        }

        tracing::info!(
            target: "scheduler",
            popped = report.popped,
            ignored_flagship = report.ignored_flagship,
            summarized = report.summarized,
            fallbacks = report.fallbacks,
            dropped = report.dropped,
            messages = report.messages,
            "analysis job finished"
        );
        report
    }

    /// One fast run now, then both jobs on their intervals until `shutdown`
    /// resolves. Due ticks are handled one at a time.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.run_fast().await;

        let fast_every = self.cfg.fast_interval.max(Duration::from_secs(1));
        let analysis_every = self.cfg.analysis_interval.max(Duration::from_secs(1));
        let mut fast = interval_at(Instant::now() + fast_every, fast_every);
        fast.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut analysis = interval_at(Instant::now() + analysis_every, analysis_every);
        analysis.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(target: "scheduler", "shutdown requested");
                    break;
                }
                _ = fast.tick() => {
                    self.run_fast().await;
                }
                _ = analysis.tick() => {
                    self.run_analysis().await;
                }
            }
        }
    }

    /// Loop until Ctrl-C.
    pub async fn run_loop(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable; running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }
}
