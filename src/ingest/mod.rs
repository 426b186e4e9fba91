// src/ingest/mod.rs
pub mod collapse;
pub mod dedup;
pub mod providers;
pub mod types;

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::classify::Classifier;
use crate::store::{now_unix, SeenLedger};
use collapse::{apply_collapse, CollapseGroup, CollectorBatch};
use dedup::DedupKey;
use types::{Collector, CollectorError, RawItem};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Orchestrator runs.");
        describe_counter!("ingest_items_total", "Items returned by collectors.");
        describe_counter!(
            "ingest_collector_errors_total",
            "Collector failures (error or timeout)."
        );
        describe_counter!(
            "ingest_collapsed_total",
            "Items discarded by source-collapse groups."
        );
        describe_counter!(
            "ingest_untagged_total",
            "Items dropped because no tag matched."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Items dropped as already seen or duplicated across sources."
        );
        describe_counter!("ingest_novel_total", "Novel tagged items emitted.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the orchestrator last ran."
        );
    });
}

/// Normalize collector text: decode entities, strip tags, fold quotes and
/// whitespace, cap at 1500 chars.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();

    let decoded = html_escape::decode_html_entities(s);
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    let stripped = re_tags.replace_all(&decoded, " ");

    let folded = stripped
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    let collapsed = re_ws.replace_all(&folded, " ");
    let out = collapsed.trim();

    if out.chars().count() > 1500 {
        out.chars().take(1500).collect()
    } else {
        out.to_string()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OrchestratorCfg {
    /// Upper bound on concurrently running collectors.
    pub max_workers: usize,
    pub collector_timeout: Duration,
}

impl Default for OrchestratorCfg {
    fn default() -> Self {
        Self {
            max_workers: 8,
            collector_timeout: Duration::from_secs(10),
        }
    }
}

/// Per-run counters, logged and exported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub collected: usize,
    pub failed_collectors: usize,
    pub collapsed: usize,
    pub empty: usize,
    pub untagged: usize,
    pub seen_before: usize,
    pub cross_source_dups: usize,
    pub novel: usize,
}

/// Runs every registered collector, merges, collapses, tags and dedups.
pub struct Orchestrator {
    collectors: Vec<Arc<dyn Collector>>,
    groups: Vec<CollapseGroup>,
    classifier: Classifier,
    ledger: SeenLedger,
    cfg: OrchestratorCfg,
}

impl Orchestrator {
    pub fn new(ledger: SeenLedger, classifier: Classifier, cfg: OrchestratorCfg) -> Self {
        Self {
            collectors: Vec::new(),
            groups: Vec::new(),
            classifier,
            ledger,
            cfg,
        }
    }

    pub fn with_collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collectors.push(collector);
        self
    }

    pub fn with_collectors<I>(mut self, collectors: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Collector>>,
    {
        self.collectors.extend(collectors);
        self
    }

    pub fn with_collapse_group(mut self, group: CollapseGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn collector_names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn ledger(&self) -> &SeenLedger {
        &self.ledger
    }

    /// Fan out to all collectors on a bounded pool and gather their results in
    /// registration order. A failing or slow collector yields an empty batch.
    pub async fn collect(&self) -> Vec<CollectorBatch> {
        let workers = self.cfg.max_workers.min(self.collectors.len()).max(1);
        let timeout = self.cfg.collector_timeout;

        stream::iter(self.collectors.iter().cloned())
            .map(|c| async move {
                let name = c.name().to_string();
                let res = match tokio::time::timeout(timeout, c.crawl()).await {
                    Ok(r) => r,
                    Err(_) => Err(CollectorError::Timeout(timeout.as_secs())),
                };
                let (items, failed) = match res {
                    Ok(mut items) => {
                        for it in items.iter_mut().filter(|it| it.source.is_empty()) {
                            it.source = name.clone();
                        }
                        tracing::debug!(collector = %name, count = items.len(), "collector done");
                        (items, false)
                    }
                    Err(e) => {
                        tracing::warn!(collector = %name, error = %e, "collector failed");
                        counter!("ingest_collector_errors_total").increment(1);
                        (Vec::new(), true)
                    }
                };
                CollectorBatch {
                    collector: name,
                    items,
                    failed,
                }
            })
            .buffered(workers)
            .collect()
            .await
    }

    pub async fn run_all(&mut self) -> Vec<RawItem> {
        self.run_all_with_stats().await.0
    }

    pub async fn run_all_with_stats(&mut self) -> (Vec<RawItem>, RunStats) {
        ensure_metrics_described();

        let batches = self.collect().await;
        let failed_collectors = batches.iter().filter(|b| b.failed).count();
        let collected: usize = batches.iter().map(|b| b.items.len()).sum();

        let (candidates, collapsed) = apply_collapse(batches, &self.groups);

        let now = now_unix();
        let (novel, mut stats) = tag_and_dedup(candidates, &self.classifier, &mut self.ledger, now);
        stats.collected = collected;
        stats.failed_collectors = failed_collectors;
        stats.collapsed = collapsed;

        if let Err(e) = self.ledger.flush_at(now) {
            tracing::warn!(error = %e, "seen-ledger flush failed; marks kept in memory only");
        }

        counter!("ingest_runs_total").increment(1);
        counter!("ingest_items_total").increment(collected as u64);
        counter!("ingest_collapsed_total").increment(collapsed as u64);
        counter!("ingest_untagged_total").increment(stats.untagged as u64);
        counter!("ingest_dedup_total")
            .increment((stats.seen_before + stats.cross_source_dups) as u64);
        counter!("ingest_novel_total").increment(novel.len() as u64);
        metrics::gauge!("ingest_pipeline_last_run_ts").set(now as f64);

        tracing::info!(
            target: "ingest",
            collected = stats.collected,
            failed_collectors = stats.failed_collectors,
            collapsed = stats.collapsed,
            untagged = stats.untagged,
            seen_before = stats.seen_before,
            novel = stats.novel,
            "orchestrator run finished"
        );

        (novel, stats)
    }
}

/// Single-threaded post-collection pass: purge expired ledger entries, tag
/// (keeping collector-assigned tags), drop untagged, drop keys the ledger
/// already holds, mark the rest, then a final cross-source dedup by key.
pub fn tag_and_dedup(
    candidates: Vec<RawItem>,
    classifier: &Classifier,
    ledger: &mut SeenLedger,
    now: i64,
) -> (Vec<RawItem>, RunStats) {
    let mut stats = RunStats::default();
    let mut kept = Vec::with_capacity(candidates.len());

    let expired = ledger.purge(now);
    if expired > 0 {
        tracing::debug!(expired, "seen-ledger entries expired before dedup");
    }

    for mut item in candidates {
        if !item.has_text() {
            stats.empty += 1;
            continue;
        }
        if item.tags.is_empty() {
            item.tags = classifier.classify(&item.match_text());
        }
        if item.tags.is_empty() {
            stats.untagged += 1;
            continue;
        }
        let key = DedupKey::of(&item);
        if ledger.seen(key.as_str()) {
            stats.seen_before += 1;
            continue;
        }
        ledger.mark_at(key.as_str(), now);
        kept.push(item);
    }

    let mut keys = HashSet::with_capacity(kept.len());
    let before = kept.len();
    kept.retain(|it| keys.insert(DedupKey::of(it)));
    stats.cross_source_dups = before - kept.len();
    stats.novel = kept.len();

    (kept, stats)
}
